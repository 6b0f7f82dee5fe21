//! Stream Header for .NET Metadata Streams
//!
//! Provides parsing of the stream headers of the metadata root, which describe the name,
//! offset and size of each metadata stream.
//!
//! # Reference
//! - [ECMA-335 II.24.2.2](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::io::read_le, Result};

/// Names of the streams that may appear in a metadata root
pub const STREAM_NAMES: [&str; 6] = ["#~", "#-", "#Strings", "#US", "#Blob", "#GUID"];

/// A stream header of the metadata root (ECMA-335 II.24.2.2)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamHeader {
    /// Offset of the stream, relative to the start of the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Name of the stream
    pub name: String,
}

impl StreamHeader {
    /// Parse a stream header from the start of `data`
    ///
    /// # Errors
    /// Returns an error if the data is too short or the stream name is unknown
    pub fn from(data: &[u8]) -> Result<StreamHeader> {
        if data.len() < 9 {
            return Err(out_of_bounds_error!());
        }

        let mut name = String::with_capacity(32);
        for counter in 0..std::cmp::min(32, data.len() - 8) {
            let name_char = read_le::<u8>(&data[8 + counter..])?;
            if name_char == 0 {
                break;
            }

            name.push(char::from(name_char));
        }

        if !STREAM_NAMES.iter().any(|valid_name| name == *valid_name) {
            return Err(malformed_error!("Invalid stream header name - {}", name));
        }

        Ok(StreamHeader {
            offset: read_le::<u32>(data)?,
            size: read_le::<u32>(&data[4..])?,
            name,
        })
    }

    /// Size of this header once serialized: 8 bytes plus the name, null terminated and padded
    /// to 4 bytes
    #[must_use]
    pub fn header_size(&self) -> usize {
        8 + ((self.name.len() + 1 + 3) & !3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x6C, 0x00, 0x00, 0x00,
            0xA4, 0x45, 0x00, 0x00,
            0x23, 0x7E, 0x00,
        ];

        let parsed_header = StreamHeader::from(&header_bytes).unwrap();

        assert_eq!(parsed_header.offset, 0x6C);
        assert_eq!(parsed_header.size, 0x45A4);
        assert_eq!(parsed_header.name, "#~");
        assert_eq!(parsed_header.header_size(), 12);
    }

    #[test]
    fn crafted_invalid() {
        #[rustfmt::skip]
        let header_bytes = [
            0x6C, 0x00, 0x00, 0x00,
            0xA4, 0x45, 0x00, 0x00,
            0x24, 0x7E, 0x00,
        ];

        assert!(StreamHeader::from(&header_bytes).is_err());
        assert!(StreamHeader::from(&header_bytes[..8]).is_err());
    }
}
