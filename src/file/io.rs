//! Low-level byte order and bounds-checked reading/writing utilities.
//!
//! Everything in a metadata image is little-endian, the helpers here are the single place where
//! raw bytes are turned into integers (and back). All functions validate the available space and
//! return [`crate::Error::OutOfBounds`] instead of panicking.
//!
//! # Key Components
//!
//! - [`CilIO`] - Trait implemented for the primitive integer types
//! - [`read_le`] / [`read_le_at`] - Read a value, optionally advancing an offset
//! - [`read_le_at_dyn`] - Read a 2 or 4 byte index, widened to `u32`
//! - [`write_le_at`] / [`write_le_at_dyn`] - The inverse operations
//! - [`write_compressed_uint`] - The compressed integer encoding of blob lengths
//!
//! # Examples
//!
//! ```rust
//! use dotmodel::file::io::{read_le_at, write_le_at};
//!
//! let mut data = [0u8; 6];
//! let mut offset = 0;
//! write_le_at(&mut data, &mut offset, 0x0102u16)?;
//! write_le_at(&mut data, &mut offset, 0x0304_0506u32)?;
//!
//! let mut offset = 0;
//! assert_eq!(read_le_at::<u16>(&data, &mut offset)?, 0x0102);
//! assert_eq!(read_le_at::<u32>(&data, &mut offset)?, 0x0304_0506);
//! # Ok::<(), dotmodel::Error>(())
//! ```

use crate::Result;

/// Trait for primitive types that can be read from and written to little-endian byte buffers.
pub trait CilIO: Sized {
    /// The fixed size byte array representation of the type
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Build the value from its little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Convert the value into its little-endian bytes
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_cil_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_cil_io!(u8, i8, u16, i16, u32, i32, u64, i64);

/// Read a value of type `T` from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is too short.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Read a value of type `T` at `offset`, and advance `offset` by the size of `T`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit into `data`.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_bounds_error!());
    };

    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

/// Read a 2 or 4 byte value (depending on `is_large`) at `offset` as `u32`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit into `data`.
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, is_large: bool) -> Result<u32> {
    let res = if is_large {
        read_le_at::<u32>(data, offset)?
    } else {
        u32::from(read_le_at::<u16>(data, offset)?)
    };

    Ok(res)
}

/// Write `value` at `offset` and advance `offset` by the size of `T`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit into `data`.
pub fn write_le_at<T: CilIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_bounds_error!());
    };

    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    data[*offset..end].copy_from_slice(value.to_le_bytes().as_ref());
    *offset = end;
    Ok(())
}

/// Write `value` as 2 or 4 bytes (depending on `is_large`) at `offset`.
///
/// The value is truncated to 16 bits when `is_large` is false.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit into `data`.
#[allow(clippy::cast_possible_truncation)]
pub fn write_le_at_dyn(data: &mut [u8], offset: &mut usize, value: u32, is_large: bool) -> Result<()> {
    if is_large {
        write_le_at::<u32>(data, offset, value)
    } else {
        write_le_at::<u16>(data, offset, value as u16)
    }
}

/// Append `value` in the ECMA-335 compressed unsigned integer encoding (II.23.2).
///
/// Values up to 0x7F take one byte, up to 0x3FFF two bytes and up to 0x1FFF_FFFF four bytes.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the value is larger than 0x1FFF_FFFF.
#[allow(clippy::cast_possible_truncation)]
pub fn write_compressed_uint(value: u32, buffer: &mut Vec<u8>) -> Result<()> {
    match value {
        0..=0x7F => buffer.push(value as u8),
        0x80..=0x3FFF => {
            buffer.push(((value >> 8) as u8) | 0x80);
            buffer.push(value as u8);
        }
        0x4000..=0x1FFF_FFFF => {
            buffer.push(((value >> 24) as u8) | 0xC0);
            buffer.push((value >> 16) as u8);
            buffer.push((value >> 8) as u8);
            buffer.push(value as u8);
        }
        _ => {
            return Err(malformed_error!(
                "Value 0x{:X} is too large for a compressed integer",
                value
            ))
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_le_u8() {
        let result = read_le::<u8>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x01);
    }

    #[test]
    fn read_le_u16() {
        let result = read_le::<u16>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0201);
    }

    #[test]
    fn read_le_u32() {
        let result = read_le::<u32>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0403_0201);
    }

    #[test]
    fn read_le_u64() {
        let result = read_le::<u64>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0807_0605_0403_0201);
    }

    #[test]
    fn read_le_at_advances() {
        let mut offset = 2;
        assert_eq!(read_le_at::<u16>(&TEST_BUFFER, &mut offset).unwrap(), 0x0403);
        assert_eq!(offset, 4);
    }

    #[test]
    fn read_dyn() {
        let mut offset = 0;
        assert_eq!(read_le_at_dyn(&TEST_BUFFER, &mut offset, false).unwrap(), 0x0201);
        assert_eq!(read_le_at_dyn(&TEST_BUFFER, &mut offset, true).unwrap(), 0x0605_0403);
        assert_eq!(offset, 6);
    }

    #[test]
    fn compressed_uint() {
        for (value, expected) in [
            (0x03u32, vec![0x03u8]),
            (0x7F, vec![0x7F]),
            (0x80, vec![0x80, 0x80]),
            (0x2E57, vec![0xAE, 0x57]),
            (0x4000, vec![0xC0, 0x00, 0x40, 0x00]),
            (0x1FFF_FFFF, vec![0xDF, 0xFF, 0xFF, 0xFF]),
        ] {
            let mut buffer = Vec::new();
            write_compressed_uint(value, &mut buffer).unwrap();
            assert_eq!(buffer, expected);
        }

        assert!(write_compressed_uint(0x2000_0000, &mut Vec::new()).is_err());
    }

    #[test]
    fn errors() {
        let buffer = [0xFF, 0xFF, 0xFF];
        assert!(read_le::<u32>(&buffer).is_err());

        let mut offset = usize::MAX;
        assert!(read_le_at::<u8>(&buffer, &mut offset).is_err());

        let mut out = [0u8; 3];
        let mut offset = 0;
        assert!(write_le_at(&mut out, &mut offset, 1u32).is_err());
        assert_eq!(offset, 0);
    }

    #[test]
    fn write_dyn_truncates() {
        let mut out = [0u8; 6];
        let mut offset = 0;
        write_le_at_dyn(&mut out, &mut offset, 0x0001_FFFF, false).unwrap();
        write_le_at_dyn(&mut out, &mut offset, 0x0001_FFFF, true).unwrap();
        assert_eq!(out, [0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00]);
    }
}
