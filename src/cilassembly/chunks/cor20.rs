//! The CLI header chunk.
//!
//! [`ImageCor20Header`] writes the 72 byte header that points at the metadata, the managed
//! resources and the strong name signature of the output.
//!
//! # Reference
//! - [ECMA-335 II.25.3.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::io::Write;

use bitflags::bitflags;

use crate::{
    cilassembly::chunks::{Chunk, ChunkPlacement},
    metadata::cor20header::{Cor20Header, DataDirectory, COR20_HEADER_SIZE},
    Result,
};

/// Runtime major version written when none is configured
pub const DEFAULT_MAJOR_RUNTIME_VERSION: u16 = 2;
/// Runtime minor version written when none is configured
pub const DEFAULT_MINOR_RUNTIME_VERSION: u16 = 5;

bitflags! {
    /// `COMIMAGE_FLAGS_*` of the CLI header
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ComImageFlags: u32 {
        /// The image contains only IL code
        const ILONLY = 0x0000_0001;
        /// The image can only be loaded into a 32-bit process
        const REQUIRED_32BIT = 0x0000_0002;
        /// The image is a library of IL code
        const IL_LIBRARY = 0x0000_0004;
        /// The image is strong name signed
        const STRONG_NAME_SIGNED = 0x0000_0008;
        /// The entry point is an RVA of native code
        const NATIVE_ENTRYPOINT = 0x0000_0010;
        /// Debug data is tracked
        const TRACK_DEBUG_DATA = 0x0001_0000;
        /// Prefer a 32-bit process
        const PREFER_32BIT = 0x0002_0000;
    }
}

/// Configuration of the CLI header, `None` fields take their defaults
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cor20HeaderOptions {
    /// Entry point method token, or RVA for native entry points. Defaults to 0.
    pub entry_point: Option<u32>,
    /// Image flags. Defaults to [`ComImageFlags::ILONLY`].
    pub flags: Option<ComImageFlags>,
    /// Defaults to [`DEFAULT_MAJOR_RUNTIME_VERSION`]
    pub major_runtime_version: Option<u16>,
    /// Defaults to [`DEFAULT_MINOR_RUNTIME_VERSION`]
    pub minor_runtime_version: Option<u16>,
}

impl Cor20HeaderOptions {
    /// Options with explicit flags
    #[must_use]
    pub fn with_flags(flags: ComImageFlags) -> Self {
        Cor20HeaderOptions {
            flags: Some(flags),
            ..Cor20HeaderOptions::default()
        }
    }

    /// Options reproducing the values of an existing header
    #[must_use]
    pub fn from_header(header: &Cor20Header) -> Self {
        Cor20HeaderOptions {
            entry_point: Some(header.entry_point_token),
            flags: Some(ComImageFlags::from_bits_retain(header.flags)),
            major_runtime_version: Some(header.major_runtime_version),
            minor_runtime_version: Some(header.minor_runtime_version),
        }
    }
}

/// The CLI header chunk.
///
/// The header has a fixed size of 72 bytes. Its directories point at the metadata, the managed
/// resources and the strong name signature and are filled in once those chunks are laid out.
/// The code manager table, vtable fixups, export address table jumps and managed native header
/// directories are always written as zero.
pub struct ImageCor20Header {
    placement: ChunkPlacement,
    options: Cor20HeaderOptions,
    metadata: DataDirectory,
    resources: DataDirectory,
    strong_name_signature: DataDirectory,
}

impl ImageCor20Header {
    /// Create a header chunk with `options`
    #[must_use]
    pub fn new(options: Cor20HeaderOptions) -> Self {
        ImageCor20Header {
            placement: ChunkPlacement::new(),
            options,
            metadata: DataDirectory::default(),
            resources: DataDirectory::default(),
            strong_name_signature: DataDirectory::default(),
        }
    }

    /// The options of this header
    #[must_use]
    pub fn options(&self) -> &Cor20HeaderOptions {
        &self.options
    }

    /// Point the header at the laid out metadata, resources and strong name signature chunks
    pub fn set_directories(
        &mut self,
        metadata: &dyn Chunk,
        resources: Option<&dyn Chunk>,
        strong_name_signature: Option<&dyn Chunk>,
    ) {
        self.metadata = metadata.directory();
        self.resources = resources.map(Chunk::directory).unwrap_or_default();
        self.strong_name_signature = strong_name_signature
            .map(Chunk::directory)
            .unwrap_or_default();
    }
}

fn write_directory(out: &mut dyn Write, directory: DataDirectory) -> Result<()> {
    out.write_all(&directory.rva.to_le_bytes())?;
    out.write_all(&directory.size.to_le_bytes())?;
    Ok(())
}

impl Chunk for ImageCor20Header {
    fn placement(&self) -> &ChunkPlacement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut ChunkPlacement {
        &mut self.placement
    }

    fn file_length(&self) -> u32 {
        COR20_HEADER_SIZE
    }

    fn alignment(&self) -> u32 {
        4
    }

    fn emit(&self, out: &mut dyn Write) -> Result<()> {
        let options = &self.options;
        out.write_all(&COR20_HEADER_SIZE.to_le_bytes())?;
        out.write_all(
            &options
                .major_runtime_version
                .unwrap_or(DEFAULT_MAJOR_RUNTIME_VERSION)
                .to_le_bytes(),
        )?;
        out.write_all(
            &options
                .minor_runtime_version
                .unwrap_or(DEFAULT_MINOR_RUNTIME_VERSION)
                .to_le_bytes(),
        )?;
        write_directory(out, self.metadata)?;
        out.write_all(
            &options
                .flags
                .unwrap_or(ComImageFlags::ILONLY)
                .bits()
                .to_le_bytes(),
        )?;
        out.write_all(&options.entry_point.unwrap_or(0).to_le_bytes())?;
        write_directory(out, self.resources)?;
        write_directory(out, self.strong_name_signature)?;

        // code manager table, vtable fixups, export address table jumps, managed native header
        for _ in 0..4 {
            write_directory(out, DataDirectory::default())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cilassembly::chunks::{ByteArrayChunk, FileOffset, Rva};

    fn emit(header: &mut ImageCor20Header) -> Vec<u8> {
        header.set_offset(FileOffset(0), Rva(0x2000));
        let mut out = Vec::new();
        header.write_to(&mut out).unwrap();
        out
    }

    #[test]
    fn defaults() {
        let mut header = ImageCor20Header::new(Cor20HeaderOptions::default());
        let data = emit(&mut header);

        assert_eq!(data.len(), 72);
        assert_eq!(&data[0..4], &[0x48, 0, 0, 0]);
        assert_eq!(&data[4..6], &[2, 0]);
        assert_eq!(&data[6..8], &[5, 0]);
        assert_eq!(&data[16..20], &ComImageFlags::ILONLY.bits().to_le_bytes());
        assert_eq!(&data[20..24], &[0, 0, 0, 0]);
        assert!(data[40..72].iter().all(|byte| *byte == 0));
        assert!(data[8..16].iter().all(|byte| *byte == 0));

        let parsed = Cor20Header::read(&{
            let mut data = data.clone();
            data[8..16].copy_from_slice(&[0x48, 0x20, 0, 0, 0x10, 0, 0, 0]);
            data
        })
        .unwrap();
        assert_eq!(parsed.major_runtime_version, 2);
        assert_eq!(parsed.minor_runtime_version, 5);
        assert!(parsed.code_manager_table.is_empty());
        assert!(parsed.export_address_table_jumps.is_empty());
        assert!(parsed.managed_native_header.is_empty());
    }

    #[test]
    fn overrides_and_directories() {
        let mut metadata = ByteArrayChunk::new(vec![0; 0x20]);
        metadata.set_offset(FileOffset(0x48), Rva(0x2048));
        let mut resources = ByteArrayChunk::new(vec![0; 12]);
        resources.set_offset(FileOffset(0x68), Rva(0x2068));

        let mut header = ImageCor20Header::new(Cor20HeaderOptions {
            entry_point: Some(0x0600_0001),
            flags: Some(ComImageFlags::ILONLY | ComImageFlags::STRONG_NAME_SIGNED),
            major_runtime_version: Some(2),
            minor_runtime_version: Some(6),
        });
        header.set_directories(&metadata, Some(&resources), None);
        let data = emit(&mut header);

        assert_eq!(&data[6..8], &[6, 0]);
        assert_eq!(&data[8..16], &[0x48, 0x20, 0, 0, 0x20, 0, 0, 0]);
        assert_eq!(&data[16..20], &[9, 0, 0, 0]);
        assert_eq!(&data[20..24], &[1, 0, 0, 6]);
        assert_eq!(&data[24..32], &[0x68, 0x20, 0, 0, 12, 0, 0, 0]);
        assert!(data[32..40].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn options_from_header() {
        let header = Cor20Header {
            cb: 72,
            major_runtime_version: 2,
            minor_runtime_version: 5,
            meta_data: DataDirectory {
                rva: 0x2050,
                size: 0x100,
            },
            flags: 0x0002_0003,
            entry_point_token: 0x0600_0002,
            resources: DataDirectory::default(),
            strong_name_signature: DataDirectory::default(),
            code_manager_table: DataDirectory::default(),
            vtable_fixups: DataDirectory::default(),
            export_address_table_jumps: DataDirectory::default(),
            managed_native_header: DataDirectory::default(),
        };

        let options = Cor20HeaderOptions::from_header(&header);
        assert_eq!(options.entry_point, Some(0x0600_0002));
        assert_eq!(
            options.flags,
            Some(
                ComImageFlags::ILONLY | ComImageFlags::REQUIRED_32BIT | ComImageFlags::PREFER_32BIT
            )
        );
        assert_eq!(
            Cor20HeaderOptions::with_flags(ComImageFlags::IL_LIBRARY).flags,
            Some(ComImageFlags::IL_LIBRARY)
        );
    }
}
