//! Hardware configuration register (HWCR) definitions for AMD Zen
//!
//! Only the TSC frequency lock is described; every other bit of HWCR must be
//! carried through unchanged on writes.
//!
//! ## References
//!
//! - AMD PPR for Family 17h, MSRC001_0015 (HWCR)

use crate::register::{get_bits, with_mask, RegisterLayout};

/// MSR addresses for hardware configuration
pub mod msr {
    /// Hardware Configuration Register
    pub const HWCR: u32 = 0xC001_0015;
}

/// TSC frequency lock bit: the TSC keeps counting at the P0 frequency
/// regardless of the active P-State
pub const TSC_FREQ_SEL_BIT: u32 = 21;

/// HWCR layout (partial)
///
/// ## Register Format
///
/// | Bits   | Field        | Description                          |
/// |--------|--------------|--------------------------------------|
/// | 21     | tsc_freq_sel | TSC increments at the P0 frequency   |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hwcr {
    /// TSC frequency lock (bit 21)
    pub tsc_freq_sel: bool,
}

impl RegisterLayout for Hwcr {
    const MASK: u64 = 1 << TSC_FREQ_SEL_BIT;

    fn to_msr_value(&self) -> u64 {
        if self.tsc_freq_sel {
            Self::MASK
        } else {
            0
        }
    }

    fn from_msr_value(value: u64) -> Self {
        Self {
            tsc_freq_sel: get_bits(value, TSC_FREQ_SEL_BIT, 1) != 0,
        }
    }
}

/// Whether `value` has the TSC frequency lock set
pub fn tsc_locked(value: u64) -> bool {
    Hwcr::from_msr_value(value).tsc_freq_sel
}

/// `value` with the TSC frequency lock set, all other bits unchanged
pub fn lock_tsc(value: u64) -> u64 {
    with_mask(value, Hwcr::MASK, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tsc_lock_bit() {
        assert!(!tsc_locked(0));
        assert!(tsc_locked(0x20_0000));
        assert_eq!(lock_tsc(0x0100_0010), 0x0120_0010);
    }

    #[test]
    fn test_lock_is_idempotent() {
        let locked = lock_tsc(0xDEAD_0000);
        assert_eq!(lock_tsc(locked), locked);
    }

    #[test]
    fn test_merge_into_keeps_other_bits() {
        let hwcr = Hwcr { tsc_freq_sel: false };
        assert_eq!(hwcr.merge_into(0x0120_0010), 0x0100_0010);
    }
}
