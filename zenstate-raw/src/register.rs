//! Generic register abstractions for type-safe MSR programming

/// Extract `length` bits of `value` starting at bit `base`
#[inline]
pub const fn get_bits(value: u64, base: u32, length: u32) -> u64 {
    (value >> base) & field_mask(length)
}

/// Replace `length` bits of `value` starting at bit `base` with `new`
///
/// Every bit outside the field is preserved. `new` is masked to `length`
/// bits, so callers are expected to range-check it beforehand; an oversized
/// value is truncated rather than spilled into the neighbouring field.
///
/// # Example
///
/// ```
/// use zenstate_raw::register::set_bits;
///
/// // Replace the DID field (bits 8-13) and keep everything else
/// let value = set_bits(0x8000_0000_0000_3F05, 8, 6, 0x08);
/// assert_eq!(value, 0x8000_0000_0000_0805);
/// ```
#[inline]
pub const fn set_bits(value: u64, base: u32, length: u32, new: u64) -> u64 {
    let mask = field_mask(length);
    debug_assert!(new <= mask, "field value does not fit");
    (value & !(mask << base)) | ((new & mask) << base)
}

/// Set or clear every bit in `mask`
#[inline]
pub const fn with_mask(value: u64, mask: u64, set: bool) -> u64 {
    if set {
        value | mask
    } else {
        value & !mask
    }
}

const fn field_mask(length: u32) -> u64 {
    if length >= 64 {
        u64::MAX
    } else {
        (1u64 << length) - 1
    }
}

/// Trait for register layouts that can be converted to/from raw MSR values
///
/// This trait provides type-safe conversion between structured register
/// layouts and the raw 64-bit values that are written to/read from MSRs.
///
/// Layouts that only describe part of a register should be applied to the
/// current hardware value with [`RegisterLayout::merge_into`] so that
/// reserved and unrelated bits survive a read-modify-write.
pub trait RegisterLayout: Sized {
    /// Bits of the register described by this layout
    const MASK: u64 = u64::MAX;

    /// Convert this register layout to a raw MSR value
    fn to_msr_value(&self) -> u64;

    /// Parse a raw MSR value into this register layout
    fn from_msr_value(value: u64) -> Self;

    /// Validate that the register values are within acceptable ranges
    ///
    /// Returns `Ok(())` if valid, or an error message if invalid.
    fn validate(&self) -> Result<(), &'static str> {
        Ok(())
    }

    /// Write this layout over `current`, leaving bits outside [`Self::MASK`] intact
    fn merge_into(&self, current: u64) -> u64 {
        (current & !Self::MASK) | (self.to_msr_value() & Self::MASK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_bits_preserves_neighbours() {
        let value = 0xFFFF_FFFF_FFFF_FFFF;
        let updated = set_bits(value, 8, 6, 0);
        assert_eq!(updated, 0xFFFF_FFFF_FFFF_C0FF);
        assert_eq!(get_bits(updated, 0, 8), 0xFF);
        assert_eq!(get_bits(updated, 14, 8), 0xFF);
    }

    #[test]
    fn test_set_bits_top_bit() {
        assert_eq!(set_bits(0, 63, 1, 1), 1 << 63);
        assert_eq!(set_bits(u64::MAX, 63, 1, 0), u64::MAX >> 1);
    }

    #[test]
    fn test_get_bits_full_width() {
        assert_eq!(get_bits(0xDEAD_BEEF, 0, 64), 0xDEAD_BEEF);
    }

    #[test]
    fn test_with_mask() {
        let mask = (1 << 22) | (1 << 14) | (1 << 6);
        assert_eq!(with_mask(0, mask, true), mask);
        assert_eq!(with_mask(u64::MAX, mask, false), u64::MAX & !mask);
    }
}
