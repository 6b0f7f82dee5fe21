//! The CLI header (`IMAGE_COR20_HEADER`, ECMA-335 II.25.3.3).
//!
//! The header is the entry into all managed data of an image: it locates the metadata root,
//! the managed resources and the strong name signature, and carries the runtime version, the
//! image flags and the entry point token.

use crate::{file::parser::Parser, Result};

/// Size of the CLI header in bytes
pub const COR20_HEADER_SIZE: u32 = 72;

/// A (virtual address, size) pair pointing at an optional sub-structure
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DataDirectory {
    /// Relative virtual address, 0 when absent
    pub rva: u32,
    /// Size in bytes, 0 when absent
    pub size: u32,
}

impl DataDirectory {
    /// Returns true if the directory does not point anywhere
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rva == 0 && self.size == 0
    }

    fn read(parser: &mut Parser) -> Result<Self> {
        Ok(DataDirectory {
            rva: parser.read_le::<u32>()?,
            size: parser.read_le::<u32>()?,
        })
    }
}

/// The parsed CLI header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cor20Header {
    /// Size of the header, always 72
    pub cb: u32,
    /// Major runtime version required
    pub major_runtime_version: u16,
    /// Minor runtime version required
    pub minor_runtime_version: u16,
    /// The metadata root
    pub meta_data: DataDirectory,
    /// `COMIMAGE_FLAGS_*`
    pub flags: u32,
    /// Token of the entry point method (or RVA of a native entry point)
    pub entry_point_token: u32,
    /// Managed resources
    pub resources: DataDirectory,
    /// Strong name signature
    pub strong_name_signature: DataDirectory,
    /// Reserved, always zero
    pub code_manager_table: DataDirectory,
    /// VTable fixups for mixed mode images
    pub vtable_fixups: DataDirectory,
    /// Reserved, always zero
    pub export_address_table_jumps: DataDirectory,
    /// Reserved for precompiled images
    pub managed_native_header: DataDirectory,
}

impl Cor20Header {
    /// Create a [`Cor20Header`] from a sequence of bytes
    ///
    /// # Errors
    /// Returns an error if the data is shorter than the header, the size field is not 72, or
    /// the header does not point at any metadata.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        if data.len() < COR20_HEADER_SIZE as usize {
            return Err(out_of_bounds_error!());
        }

        let mut parser = Parser::new(data);
        let cb = parser.read_le::<u32>()?;
        if cb != COR20_HEADER_SIZE {
            return Err(malformed_error!(
                "Invalid CLR header size: expected 72, got {}",
                cb
            ));
        }

        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;
        let meta_data = DataDirectory::read(&mut parser)?;
        if meta_data.rva == 0 || meta_data.size == 0 {
            return Err(malformed_error!("CLR header does not point at any metadata"));
        }

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data,
            flags: parser.read_le::<u32>()?,
            entry_point_token: parser.read_le::<u32>()?,
            resources: DataDirectory::read(&mut parser)?,
            strong_name_signature: DataDirectory::read(&mut parser)?,
            code_manager_table: DataDirectory::read(&mut parser)?,
            vtable_fixups: DataDirectory::read(&mut parser)?,
            export_address_table_jumps: DataDirectory::read(&mut parser)?,
            managed_native_header: DataDirectory::read(&mut parser)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x48, 0x00, 0x00, 0x00, // cb
            0x02, 0x00, 0x05, 0x00, // runtime 2.5
            0x48, 0x20, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, // metadata
            0x01, 0x00, 0x00, 0x00, // flags
            0x01, 0x00, 0x00, 0x06, // entry point
            0x48, 0x30, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, // resources
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // strong name
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // code manager
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // vtable fixups
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // export address table jumps
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // managed native header
        ];

        let header = Cor20Header::read(&header_bytes).unwrap();
        assert_eq!(header.cb, 72);
        assert_eq!(header.major_runtime_version, 2);
        assert_eq!(header.minor_runtime_version, 5);
        assert_eq!(header.meta_data, DataDirectory { rva: 0x2048, size: 0x1000 });
        assert_eq!(header.flags, 1);
        assert_eq!(header.entry_point_token, 0x0600_0001);
        assert_eq!(header.resources, DataDirectory { rva: 0x3048, size: 0x10 });
        assert!(header.strong_name_signature.is_empty());
        assert!(header.managed_native_header.is_empty());

        assert!(Cor20Header::read(&header_bytes[..71]).is_err());

        let mut bad_size = header_bytes;
        bad_size[0] = 0x40;
        assert!(Cor20Header::read(&bad_size).is_err());

        let mut no_metadata = header_bytes;
        no_metadata[12..16].copy_from_slice(&[0, 0, 0, 0]);
        assert!(Cor20Header::read(&no_metadata).is_err());
    }
}
