use zenstate_raw::current_arch::cstate::{msr, C6Config, CoreC6, PackageC6};
use zenstate_raw::RegisterLayout;

use crate::common::msr::{RegisterTransport, WriteTarget};
use crate::error::{Result, ZenstateError};
use crate::orchestrator::Step;

/// Register values around a C6 toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct C6Report {
    pub enable: bool,
    pub package_before: u64,
    pub package_after: u64,
    pub core_before: u64,
    pub core_after: u64,
}

/// Decode both C6 registers as seen by `cpu`
pub fn read_c6<T: RegisterTransport + ?Sized>(transport: &T, cpu: u32) -> Result<C6Config> {
    let package = transport
        .read(cpu, msr::C6_PACKAGE)
        .map_err(ZenstateError::access(Step::ReadC6Package))?;
    let core = transport
        .read(cpu, msr::C6_CORE)
        .map_err(ZenstateError::access(Step::ReadC6Core))?;

    Ok(C6Config::decode(package, core))
}

/// Enable or disable C6 at package and core level on every CPU
///
/// Both registers are read from the primary CPU, the C6 bits are set or
/// cleared together, and each result is broadcast. The package register is
/// written before the core register is read.
pub fn set_c6<T: RegisterTransport + ?Sized>(transport: &T, enable: bool) -> Result<C6Report> {
    let primary = transport.primary_cpu();

    let package_before = transport
        .read(primary, msr::C6_PACKAGE)
        .map_err(ZenstateError::access(Step::ReadC6Package))?;
    let package_after = PackageC6 { enabled: enable }.merge_into(package_before);
    transport
        .write(WriteTarget::All, msr::C6_PACKAGE, package_after)
        .map_err(ZenstateError::access(Step::WriteC6Package))?;

    let core_before = transport
        .read(primary, msr::C6_CORE)
        .map_err(ZenstateError::access(Step::ReadC6Core))?;
    let core_after = CoreC6 { enabled: enable }.merge_into(core_before);
    transport
        .write(WriteTarget::All, msr::C6_CORE, core_after)
        .map_err(ZenstateError::access(Step::WriteC6Core))?;

    tracing::debug!("{} C6 state", if enable { "Enabled" } else { "Disabled" });

    Ok(C6Report {
        enable,
        package_before,
        package_after,
        core_before,
        core_after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory::MemoryTransport;
    use zenstate_raw::current_arch::cstate::CORE_C6_MASK;

    #[test]
    fn test_enable_sets_package_and_core_bits() {
        let bank = MemoryTransport::new(&[0, 1]);
        bank.set_all(msr::C6_CORE, 0x0101_0101);

        let report = set_c6(&bank, true).unwrap();

        assert_eq!(report.package_before, 0x0);
        assert_eq!(report.package_after, 0x1_0000_0000);
        assert_eq!(report.core_after, 0x0101_0101 | CORE_C6_MASK);
        for cpu in [0, 1] {
            assert_eq!(bank.get(cpu, msr::C6_PACKAGE), 0x1_0000_0000);
            assert_eq!(bank.get(cpu, msr::C6_CORE), 0x0101_0101 | CORE_C6_MASK);
        }
        assert_eq!(
            read_c6(&bank, 1).unwrap(),
            C6Config {
                package: true,
                core: true
            }
        );
    }

    #[test]
    fn test_disable_clears_all_bits() {
        let bank = MemoryTransport::new(&[0, 1]);
        bank.set_all(msr::C6_PACKAGE, 0x1_0000_0000);
        bank.set_all(msr::C6_CORE, CORE_C6_MASK);

        let report = set_c6(&bank, false).unwrap();

        assert_eq!(report.package_after, 0x0);
        assert_eq!(report.core_after, 0x0);
        assert_eq!(read_c6(&bank, 0).unwrap(), C6Config::default());
    }

    #[test]
    fn test_partial_core_bits_read_as_disabled() {
        let bank = MemoryTransport::new(&[0]);
        bank.set(0, msr::C6_CORE, 1 << 14);

        assert!(!read_c6(&bank, 0).unwrap().core);
    }

    #[test]
    fn test_package_write_failure_skips_core() {
        let bank = MemoryTransport::new(&[0, 1]);
        bank.fail(1, msr::C6_PACKAGE);

        let err = set_c6(&bank, true).unwrap_err();

        assert_eq!(err.step(), Some(Step::WriteC6Package));
        assert_eq!(bank.get(0, msr::C6_PACKAGE), 0x1_0000_0000);
        assert!(bank.writes().iter().all(|w| w.1 == msr::C6_PACKAGE));
    }
}
