/// Registers returned by one CPUID leaf
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Leaf {
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
}

/// Execute CPUID for `leaf` and `subleaf`
#[cfg(target_arch = "x86_64")]
pub fn cpuid(leaf: u32, subleaf: u32) -> Leaf {
    let eax: u32;
    let ebx: u32;
    let ecx: u32;
    let edx: u32;

    // SAFETY: CPUID exists on every x86_64 processor and only writes the four
    // registers named here. rbx is reserved by LLVM, hence the swap.
    unsafe {
        std::arch::asm!(
            "mov {saved:r}, rbx",
            "cpuid",
            "xchg {saved:r}, rbx",
            saved = out(reg) ebx,
            inout("eax") leaf => eax,
            inout("ecx") subleaf => ecx,
            out("edx") edx,
            options(nostack, preserves_flags),
        );
    }

    Leaf { eax, ebx, ecx, edx }
}

/// No CPUID outside x86_64; every leaf reads as zero
#[cfg(not(target_arch = "x86_64"))]
pub fn cpuid(_leaf: u32, _subleaf: u32) -> Leaf {
    Leaf::default()
}

/// 12-byte vendor identification string from leaf 0 (e.g. "AuthenticAMD")
pub fn vendor() -> String {
    let leaf = cpuid(0, 0);
    vendor_from_registers(leaf.ebx, leaf.edx, leaf.ecx)
}

fn vendor_from_registers(ebx: u32, edx: u32, ecx: u32) -> String {
    let mut bytes = Vec::with_capacity(12);
    for reg in [ebx, edx, ecx] {
        bytes.extend_from_slice(&reg.to_le_bytes());
    }
    String::from_utf8_lossy(&bytes).trim_end_matches('\0').to_string()
}

/// Display family and model from leaf 1
pub fn family_model() -> (u32, u32) {
    decode_family_model(cpuid(1, 0).eax)
}

fn decode_family_model(eax: u32) -> (u32, u32) {
    let model = (eax >> 4) & 0xF;
    let family = (eax >> 8) & 0xF;
    let extended_model = (eax >> 16) & 0xF;
    let extended_family = (eax >> 20) & 0xFF;

    // AMD only applies the extended fields for base family 0xF
    if family == 0xF {
        (family + extended_family, (extended_model << 4) + model)
    } else {
        (family, model)
    }
}
