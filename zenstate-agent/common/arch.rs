// CPU architecture detection

use once_cell::sync::Lazy;

use crate::common::cpuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuArchitecture {
    /// Family 17h: Zen, Zen+, Zen 2
    Zen,
    /// Family 19h: Zen 3, Zen 4
    Zen3,
    /// Family 1Ah: Zen 5
    Zen5,
    /// AMD, but older than family 17h
    LegacyAmd,
    /// Not an AMD processor
    Foreign,
}

impl CpuArchitecture {
    pub fn name(&self) -> &'static str {
        match self {
            CpuArchitecture::Zen => "Zen / Zen+ / Zen 2 (family 17h)",
            CpuArchitecture::Zen3 => "Zen 3 / Zen 4 (family 19h)",
            CpuArchitecture::Zen5 => "Zen 5 (family 1Ah)",
            CpuArchitecture::LegacyAmd => "pre-Zen AMD",
            CpuArchitecture::Foreign => "non-AMD",
        }
    }

    /// Whether the P-State and C6 register layout applies to this processor
    pub fn has_zen_msrs(&self) -> bool {
        matches!(
            self,
            CpuArchitecture::Zen | CpuArchitecture::Zen3 | CpuArchitecture::Zen5
        )
    }

    fn classify(vendor: &str, family: u32) -> Self {
        if vendor != "AuthenticAMD" {
            return CpuArchitecture::Foreign;
        }

        match family {
            0x17 => CpuArchitecture::Zen,
            0x19 => CpuArchitecture::Zen3,
            0x1A => CpuArchitecture::Zen5,
            _ => CpuArchitecture::LegacyAmd,
        }
    }
}

pub static CPU_ARCH: Lazy<CpuArchitecture> = Lazy::new(detect_architecture);

/// Probe the processor, warning once if it is not a Zen part
///
/// Detection runs on first call whatever the log level is.
pub fn detect() -> CpuArchitecture {
    let arch = *CPU_ARCH;
    tracing::debug!("Detected CPU architecture: {}", arch.name());
    arch
}

fn detect_architecture() -> CpuArchitecture {
    let vendor = cpuid::vendor();
    let (family, model) = cpuid::family_model();

    tracing::debug!("CPU: {vendor}, Family {family:X}h, Model {model:X}h");

    let arch = CpuArchitecture::classify(&vendor, family);
    if !arch.has_zen_msrs() {
        tracing::warn!(
            "{} processor detected, P-State registers may be absent or laid out differently",
            arch.name()
        );
    }

    arch
}
