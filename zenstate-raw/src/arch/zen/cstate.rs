//! C6 idle state control register definitions for AMD Zen
//!
//! C6 is gated at two levels: a single package enable bit, and three
//! core-complex enable bits that are always programmed together.
//!
//! ## References
//!
//! - AMD PPR for Family 17h, MSRC001_0292 (PMGT_MISC) and MSRC001_0296 (CSTATE_CONFIG)

use crate::register::{with_mask, RegisterLayout};

/// MSR addresses for C-State control
pub mod msr {
    /// Package power management, holds the package C6 enable
    pub const C6_PACKAGE: u32 = 0xC001_0292;

    /// Core C-State configuration, holds the per-CCX C6 enables
    pub const C6_CORE: u32 = 0xC001_0296;
}

/// Package C6 enable bit in [`msr::C6_PACKAGE`]
pub const PACKAGE_C6_MASK: u64 = 1 << 32;

/// Core C6 enable bits in [`msr::C6_CORE`]
pub const CORE_C6_MASK: u64 = (1 << 22) | (1 << 14) | (1 << 6);

/// Package-level C6 control layout (partial)
///
/// | Bits | Field   | Description        |
/// |------|---------|--------------------|
/// | 32   | enabled | Package C6 enable  |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageC6 {
    pub enabled: bool,
}

impl RegisterLayout for PackageC6 {
    const MASK: u64 = PACKAGE_C6_MASK;

    fn to_msr_value(&self) -> u64 {
        with_mask(0, Self::MASK, self.enabled)
    }

    fn from_msr_value(value: u64) -> Self {
        Self {
            enabled: value & Self::MASK != 0,
        }
    }
}

/// Core-level C6 control layout (partial)
///
/// | Bits | Field   | Description               |
/// |------|---------|---------------------------|
/// | 6    | enabled | CCX0 C6 enable            |
/// | 14   | enabled | CCX1 C6 enable            |
/// | 22   | enabled | CCX2 C6 enable            |
///
/// The state only reads as enabled when all three bits are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreC6 {
    pub enabled: bool,
}

impl RegisterLayout for CoreC6 {
    const MASK: u64 = CORE_C6_MASK;

    fn to_msr_value(&self) -> u64 {
        with_mask(0, Self::MASK, self.enabled)
    }

    fn from_msr_value(value: u64) -> Self {
        Self {
            enabled: value & Self::MASK == Self::MASK,
        }
    }
}

/// Decoded view of both C6 control registers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct C6Config {
    pub package: bool,
    pub core: bool,
}

impl C6Config {
    /// Decode the raw package and core register values
    pub fn decode(package: u64, core: u64) -> Self {
        Self {
            package: PackageC6::from_msr_value(package).enabled,
            core: CoreC6::from_msr_value(core).enabled,
        }
    }
}
