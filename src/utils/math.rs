//! Integer helpers for serialization.

use crate::Result;

/// Converts a `usize` to `u32`, returning an error if the value exceeds `u32::MAX`.
///
/// Every offset, size and index of a metadata image is bounded by this limit.
///
/// # Errors
///
/// Returns an error if `value` exceeds `u32::MAX`.
pub fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| malformed_error!("Value {value} exceeds u32::MAX"))
}

/// Round `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two, an alignment of 0 is treated as 1.
///
/// ```rust
/// use dotmodel::utils::align_to;
///
/// assert_eq!(align_to(5, 4), 8);
/// assert_eq!(align_to(8, 4), 8);
/// assert_eq!(align_to(0, 512), 0);
/// ```
#[must_use]
pub fn align_to(value: usize, alignment: usize) -> usize {
    let alignment = alignment.max(1);
    (value + alignment - 1) & !(alignment - 1)
}

/// Round `value` up to the next 4-byte boundary, the alignment of every metadata stream.
#[must_use]
pub fn align_to_4(value: usize) -> usize {
    align_to(value, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment() {
        assert_eq!(align_to(1, 8), 8);
        assert_eq!(align_to(0x201, 0x200), 0x400);
        assert_eq!(align_to(3, 0), 3);
        assert_eq!(align_to_4(13), 16);
        assert_eq!(align_to_4(16), 16);
    }

    #[test]
    fn narrowing() {
        assert_eq!(to_u32(0x1234).unwrap(), 0x1234);
        #[cfg(target_pointer_width = "64")]
        assert!(to_u32(usize::MAX).is_err());
    }
}
