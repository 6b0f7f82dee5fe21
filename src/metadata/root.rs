//! Metadata root header and stream directory (ECMA-335 II.24.2.1).
//!
//! The root is the first structure of the metadata blob: the `BSJB` signature, the version
//! string and the stream headers locating `#~`, `#Strings`, `#US`, `#Blob` and `#GUID`.
//!
//! # Example
//!
//! ```rust
//! use dotmodel::metadata::root::Root;
//! let root = Root::read(&[
//!            0x42, 0x53, 0x4A, 0x42,
//!            0x01, 0x00,
//!            0x01, 0x00,
//!            0x00, 0x00, 0x00, 0x00,
//!            0x04, 0x00, 0x00, 0x00,
//!            b'v', b'4', 0x00, 0x00,
//!            0x00, 0x00,
//!            0x01, 0x00,
//!            0x20, 0x00, 0x00, 0x00, // StreamHeader
//!            0x04, 0x00, 0x00, 0x00,
//!            0x23, 0x7E, 0x00, 0x00,
//!            0x00, 0x00, 0x00, 0x00,
//!        ])?;
//! assert_eq!(root.version, "v4");
//! assert_eq!(root.stream_headers[0].name, "#~");
//! # Ok::<(), dotmodel::Error>(())
//! ```

use crate::{
    file::io::{read_le, read_le_at},
    metadata::streams::StreamHeader,
    Result,
};

/// The magic value of the metadata root, `BSJB`
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// The metadata root
#[derive(Clone, Debug)]
pub struct Root {
    /// Magic signature for physical metadata: 0x424A5342
    pub signature: u32,
    /// `MajorVersion`
    pub major_version: u16,
    /// `MinorVersion`
    pub minor_version: u16,
    /// Always 0
    pub reserved: u32,
    /// Number of bytes allocated to hold the version string, including padding
    pub length: u32,
    /// The version string, without its terminating zeros
    pub version: String,
    /// Reserved, always 0
    pub flags: u16,
    /// Number of streams
    pub stream_number: u16,
    /// Stream headers, in directory order
    pub stream_headers: Vec<StreamHeader>,
}

impl Root {
    /// Reads a [`Root`] from the start of the metadata blob.
    ///
    /// # Errors
    /// Returns an error if the data is too short, the signature is invalid, or a stream lies
    /// outside of the metadata.
    pub fn read(data: &[u8]) -> Result<Root> {
        if data.len() < 20 {
            return Err(out_of_bounds_error!());
        }

        let signature = read_le::<u32>(data)?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!(
                "CIL_HEADER_MAGIC does not match - {:#x}",
                signature
            ));
        }

        let length = read_le_at::<u32>(data, &mut 12)?;
        let Some(version_end) = (length as usize).checked_add(16) else {
            return Err(malformed_error!("Version string length overflows - {}", length));
        };
        if version_end + 4 > data.len() {
            return Err(out_of_bounds_error!());
        }

        let version = data[16..version_end]
            .iter()
            .take_while(|byte| **byte != 0)
            .map(|byte| char::from(*byte))
            .collect::<String>();

        let mut offset = version_end;
        let flags = read_le_at::<u16>(data, &mut offset)?;
        let stream_number = read_le_at::<u16>(data, &mut offset)?;
        if stream_number == 0 || stream_number as usize > 6 {
            return Err(malformed_error!("Invalid stream count - {}", stream_number));
        }

        let mut stream_headers: Vec<StreamHeader> = Vec::with_capacity(stream_number as usize);
        for _ in 0..stream_number {
            if offset >= data.len() {
                return Err(out_of_bounds_error!());
            }

            let header = StreamHeader::from(&data[offset..])?;
            match header.offset.checked_add(header.size) {
                Some(end) if end as usize <= data.len() => {}
                _ => return Err(out_of_bounds_error!()),
            }

            if stream_headers.iter().any(|other| other.name == header.name) {
                return Err(malformed_error!("Duplicate stream - {}", header.name));
            }

            offset += header.header_size();
            stream_headers.push(header);
        }

        Ok(Root {
            signature,
            major_version: read_le::<u16>(&data[4..])?,
            minor_version: read_le::<u16>(&data[6..])?,
            reserved: read_le::<u32>(&data[8..])?,
            length,
            version,
            flags,
            stream_number,
            stream_headers,
        })
    }

    /// The header of the stream called `name`
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&StreamHeader> {
        self.stream_headers.iter().find(|header| header.name == name)
    }

    /// Size of the root including all stream headers, which is where stream data may start
    #[must_use]
    pub fn header_size(&self) -> usize {
        20 + self.length as usize
            + self
                .stream_headers
                .iter()
                .map(StreamHeader::header_size)
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    const ROOT: [u8; 60] = [
        0x42, 0x53, 0x4A, 0x42,
        0x01, 0x00,
        0x01, 0x00,
        0x00, 0x00, 0x00, 0x00,
        0x0C, 0x00, 0x00, 0x00,
        b'v', b'4', b'.', b'0', b'.', b'3', b'0', b'3', b'1', b'9', 0x00, 0x00,
        0x00, 0x00,
        0x02, 0x00,
        0x3C, 0x00, 0x00, 0x00, // #~
        0x04, 0x00, 0x00, 0x00,
        0x23, 0x7E, 0x00, 0x00,
        0x40, 0x00, 0x00, 0x00, // #GUID
        0x00, 0x00, 0x00, 0x00,
        0x23, 0x47, 0x55, 0x49, 0x44, 0x00, 0x00, 0x00,
    ];

    #[test]
    fn crafted() {
        let mut data = ROOT.to_vec();
        data.extend_from_slice(&[0, 0, 0, 0]);

        let root = Root::read(&data).unwrap();
        assert_eq!(root.signature, CIL_HEADER_MAGIC);
        assert_eq!(root.major_version, 1);
        assert_eq!(root.length, 12);
        assert_eq!(root.version, "v4.0.30319");
        assert_eq!(root.stream_number, 2);
        assert_eq!(root.stream("#~").unwrap().size, 4);
        assert_eq!(root.stream("#GUID").unwrap().offset, 0x40);
        assert!(root.stream("#Blob").is_none());
        assert_eq!(root.header_size(), 0x3C);
    }

    #[test]
    fn crafted_invalid() {
        let mut data = ROOT.to_vec();
        data[0] = 0x41;
        assert!(Root::read(&data).is_err());

        // #~ extends past the end of the data
        assert!(Root::read(&ROOT).is_err());

        let mut data = ROOT.to_vec();
        data.extend_from_slice(&[0, 0, 0, 0]);
        data[52..60].copy_from_slice(&[0x23, 0x7E, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert!(Root::read(&data).is_err());
    }
}
