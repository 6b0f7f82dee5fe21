//! Blob Heap (`#Blob`) for .NET Metadata
//!
//! Provides access to the ECMA-335 `#Blob` heap, which stores signatures, custom attribute
//! values and other binary data referenced by metadata tables. Every blob starts with its
//! compressed length.
//!
//! # Reference
//! - [ECMA-335 II.24.2.4](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::parser::Parser, Result};

/// A view of the `#Blob` heap: byte sequences prefixed with a compressed length
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Create a `Blob` view over the heap data
    ///
    /// # Errors
    /// Returns an error if the heap is empty or does not start with the empty blob
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Blob heap"));
        }

        Ok(Blob { data })
    }

    /// Get the blob at `index`, without its length prefix
    ///
    /// # Errors
    /// Returns an error if the index or the encoded length is out of bounds
    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        if index >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser.read_compressed_uint()? as usize;
        parser.read_bytes(len)
    }

    /// The raw heap bytes
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data = [
            0x00,
            0x03, 0x20, 0x00, 0x01,
            0x80, 0x02, 0xAA, 0xBB,
            0x05, 0x01,
        ];

        let blob = Blob::from(&data).unwrap();
        assert!(blob.get(0).unwrap().is_empty());
        assert_eq!(blob.get(1).unwrap(), &[0x20, 0x00, 0x01]);
        assert_eq!(blob.get(5).unwrap(), &[0xAA, 0xBB]);
        assert!(blob.get(9).is_err());
        assert!(blob.get(11).is_err());
    }
}
