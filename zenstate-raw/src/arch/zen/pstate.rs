//! P-State definition register layout for AMD Zen
//!
//! Each of the eight P-State definition MSRs encodes one operating point as
//! a core frequency ID (FID), a divisor ID (DID) and a voltage ID (VID).
//!
//! ## References
//!
//! - AMD PPR for Family 17h, MSRC001_0064..MSRC001_006B (PStateDef)

use crate::register::{get_bits, set_bits, RegisterLayout};

/// Number of P-State definition registers
pub const PSTATE_COUNT: usize = 8;

/// Largest encodable DID (6 bits)
pub const DID_MAX: u8 = 0x3F;

/// Voltage at VID 0, in volts
pub const VCORE_BASE: f64 = 1.55;

/// Voltage decrement per VID step, in volts
pub const VID_STEP: f64 = 0.006_25;

/// MSR addresses for P-State definitions
pub mod msr {
    use super::PSTATE_COUNT;

    /// First P-State definition register (P0)
    pub const PSTATE_DEF_BASE: u32 = 0xC001_0064;

    /// All P-State definition registers, P0 through P7
    pub const PSTATE_DEF: [u32; PSTATE_COUNT] = [
        PSTATE_DEF_BASE,
        PSTATE_DEF_BASE + 1,
        PSTATE_DEF_BASE + 2,
        PSTATE_DEF_BASE + 3,
        PSTATE_DEF_BASE + 4,
        PSTATE_DEF_BASE + 5,
        PSTATE_DEF_BASE + 6,
        PSTATE_DEF_BASE + 7,
    ];

    /// Address of the definition register for P-State `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= PSTATE_COUNT`.
    pub const fn pstate_def(index: usize) -> u32 {
        PSTATE_DEF[index]
    }
}

/// Bit positions within a P-State definition
pub mod field {
    pub const FID_SHIFT: u32 = 0;
    pub const FID_WIDTH: u32 = 8;
    pub const DID_SHIFT: u32 = 8;
    pub const DID_WIDTH: u32 = 6;
    pub const VID_SHIFT: u32 = 14;
    pub const VID_WIDTH: u32 = 8;
    pub const ENABLE_BIT: u32 = 63;
}

/// P-State definition register layout
///
/// ## Register Format
///
/// | Bits   | Field    | Description                              |
/// |--------|----------|------------------------------------------|
/// | 0-7    | fid      | Core frequency ID                        |
/// | 8-13   | did      | Core divisor ID                          |
/// | 14-21  | vid      | Core voltage ID                          |
/// | 22-62  | -        | Not described here, preserved on writes  |
/// | 63     | enabled  | P-State enable                           |
///
/// The effective multiplier is `25 * fid / (12.5 * did)` and the voltage is
/// `1.55 - 0.00625 * vid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PStateDef {
    /// P-State enable (bit 63)
    pub enabled: bool,

    /// Core frequency ID (bits 0-7)
    pub fid: u8,

    /// Core divisor ID (bits 8-13)
    pub did: u8,

    /// Core voltage ID (bits 14-21)
    pub vid: u8,
}

impl RegisterLayout for PStateDef {
    const MASK: u64 = (1 << field::ENABLE_BIT) | 0x3F_FFFF;

    fn to_msr_value(&self) -> u64 {
        let value = set_bits(0, field::FID_SHIFT, field::FID_WIDTH, self.fid as u64);
        let value = set_bits(value, field::DID_SHIFT, field::DID_WIDTH, self.did as u64);
        let value = set_bits(value, field::VID_SHIFT, field::VID_WIDTH, self.vid as u64);
        set_enabled(value, self.enabled)
    }

    fn from_msr_value(value: u64) -> Self {
        Self {
            enabled: get_bits(value, field::ENABLE_BIT, 1) != 0,
            fid: get_bits(value, field::FID_SHIFT, field::FID_WIDTH) as u8,
            did: get_bits(value, field::DID_SHIFT, field::DID_WIDTH) as u8,
            vid: get_bits(value, field::VID_SHIFT, field::VID_WIDTH) as u8,
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.did > DID_MAX {
            return Err("DID must be <= 0x3F (6 bits)");
        }
        Ok(())
    }
}

impl PStateDef {
    /// Core clock multiplier, or `None` when the DID is zero
    pub fn ratio(&self) -> Option<f64> {
        if self.did == 0 {
            return None;
        }
        Some(25.0 * f64::from(self.fid) / (12.5 * f64::from(self.did)))
    }

    /// Core voltage in volts
    pub fn vcore(&self) -> f64 {
        vid_to_vcore(self.vid)
    }
}

/// Set or clear the enable bit
pub const fn set_enabled(value: u64, enabled: bool) -> u64 {
    set_bits(value, field::ENABLE_BIT, 1, enabled as u64)
}

/// Replace the FID field
pub const fn set_fid(value: u64, fid: u8) -> u64 {
    set_bits(value, field::FID_SHIFT, field::FID_WIDTH, fid as u64)
}

/// Replace the DID field; `did` must not exceed [`DID_MAX`]
pub const fn set_did(value: u64, did: u8) -> u64 {
    set_bits(value, field::DID_SHIFT, field::DID_WIDTH, did as u64)
}

/// Replace the VID field
pub const fn set_vid(value: u64, vid: u8) -> u64 {
    set_bits(value, field::VID_SHIFT, field::VID_WIDTH, vid as u64)
}

/// Voltage encoded by `vid`
pub fn vid_to_vcore(vid: u8) -> f64 {
    VCORE_BASE - VID_STEP * f64::from(vid)
}

/// Nearest VID for `vcore` volts
///
/// Halfway cases round to the even VID. Returns `None` when the voltage is
/// not finite or the rounded VID falls outside `0..=255`.
pub fn vcore_to_vid(vcore: f64) -> Option<u8> {
    if !vcore.is_finite() {
        return None;
    }

    let vid = ((VCORE_BASE - vcore) / VID_STEP).round_ties_even();
    if (0.0..=f64::from(u8::MAX)).contains(&vid) {
        Some(vid as u8)
    } else {
        None
    }
}
