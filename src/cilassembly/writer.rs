//! Writing a module back to a CLI image.
//!
//! The output is a flat CLI payload: the CLI header, the metadata, the managed resources and
//! the strong name signature placeholder, laid out from a caller supplied file offset and RVA.
//! Embedding the payload into a PE section is left to the caller; [`crate::File::from_flat`]
//! reads it back directly.

use std::path::Path;

use crate::{
    cilassembly::{
        chunks::{
            Chunk, ChunkList, Cor20HeaderOptions, FileOffset, ImageCor20Header, MetadataChunk,
            NetResources, Rva, StrongNameSignature,
        },
        metadata::{serialize_metadata, RootHeader},
        tables::TablesBuilder,
    },
    metadata::module::ModuleDef,
    Result,
};

/// RVA of the first chunk when none is configured
pub const DEFAULT_BASE_RVA: u32 = 0x2000;

/// Placement and header configuration of a written image
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriterOptions {
    /// File offset of the CLI header
    pub base_offset: u32,
    /// RVA of the CLI header
    pub base_rva: u32,
    /// Minimum alignment of every chunk
    pub alignment: u32,
    /// Bytes reserved for a strong name signature, none if 0
    pub strong_name_size: u32,
    /// Values of the CLI header
    pub cor20: Cor20HeaderOptions,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            base_offset: 0,
            base_rva: DEFAULT_BASE_RVA,
            alignment: 4,
            strong_name_size: 0,
            cor20: Cor20HeaderOptions::default(),
        }
    }
}

impl WriterOptions {
    /// Options reproducing the CLI header and strong name reservation of `module`
    #[must_use]
    pub fn from_module(module: &ModuleDef) -> Self {
        let cor20 = module.image().cor20();
        WriterOptions {
            strong_name_size: cor20.strong_name_signature.size,
            cor20: Cor20HeaderOptions::from_header(cor20),
            ..WriterOptions::default()
        }
    }
}

/// Lay out and write the chunks of a CLI payload
///
/// # Errors
/// Returns an error if the layout overflows the 32-bit address space
pub(crate) fn write_image(
    metadata: Vec<u8>,
    resources: Option<NetResources>,
    options: &WriterOptions,
) -> Result<Vec<u8>> {
    let mut header = ImageCor20Header::new(options.cor20.clone());
    let mut metadata = MetadataChunk::new(metadata);
    let mut resources = resources.filter(|resources| !resources.is_empty());
    let mut signature =
        (options.strong_name_size > 0).then(|| StrongNameSignature::new(options.strong_name_size));

    let (end, end_rva) = {
        let mut chunks = ChunkList::new();
        chunks.push(&mut header);
        chunks.push(&mut metadata);
        if let Some(resources) = resources.as_mut() {
            chunks.push(resources);
        }
        if let Some(signature) = signature.as_mut() {
            chunks.push(signature);
        }
        chunks.lay_out(
            FileOffset(options.base_offset),
            Rva(options.base_rva),
            options.alignment,
        )?
    };
    log::debug!("Image laid out up to offset {} rva {}", end, end_rva);

    header.set_directories(
        &metadata,
        resources.as_ref().map(|chunk| chunk as &dyn Chunk),
        signature.as_ref().map(|chunk| chunk as &dyn Chunk),
    );

    let mut data = Vec::with_capacity((end.0 - options.base_offset) as usize);
    let mut chunks = ChunkList::with_base(FileOffset(options.base_offset));
    chunks.push(&mut header);
    chunks.push(&mut metadata);
    if let Some(resources) = resources.as_mut() {
        chunks.push(resources);
    }
    if let Some(signature) = signature.as_mut() {
        chunks.push(signature);
    }
    chunks.write_to(&mut data)?;

    Ok(data)
}

/// Writes a module, including every edit made through its model
pub struct ImageWriter<'m> {
    module: &'m ModuleDef,
    options: WriterOptions,
}

impl<'m> ImageWriter<'m> {
    /// A writer that keeps the CLI header values of `module`
    #[must_use]
    pub fn new(module: &'m ModuleDef) -> Self {
        ImageWriter {
            module,
            options: WriterOptions::from_module(module),
        }
    }

    /// A writer with explicit `options`
    #[must_use]
    pub fn with_options(module: &'m ModuleDef, options: WriterOptions) -> Self {
        ImageWriter { module, options }
    }

    /// The options used for layout
    #[must_use]
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Serialize the metadata of the module: the root, the tables stream and the heaps.
    ///
    /// Streams keep the order and names of the original image. The `#US` heap is copied
    /// unchanged.
    ///
    /// # Errors
    /// Returns [`crate::Error::RowNotRegistered`] if a row references a user row that was
    /// never added to the module, or an error if the image can not be read
    pub fn write_metadata(&self) -> Result<Vec<u8>> {
        let image = self.module.image();
        let tables = TablesBuilder::build(self.module)?;

        let strings = tables.strings.finish();
        let blobs = tables.blobs.finish();
        let guids = tables.guids.finish();
        let tables_stream = tables
            .stream
            .serialize(strings.len(), blobs.len(), guids.len())?;

        let mut pending = vec![
            ("#Strings", strings),
            ("#US", image.stream_data("#US").unwrap_or_default().to_vec()),
            ("#GUID", guids),
            ("#Blob", blobs),
        ];
        let mut tables_stream = Some(tables_stream);

        let mut streams = Vec::with_capacity(5);
        for header in &image.root().stream_headers {
            if header.name == "#~" || header.name == "#-" {
                if let Some(data) = tables_stream.take() {
                    streams.push((header.name.clone(), data));
                }
            } else if let Some(position) = pending
                .iter()
                .position(|(name, _)| *name == header.name)
            {
                let (name, data) = pending.remove(position);
                streams.push((name.to_string(), data));
            } else {
                log::warn!("Dropping unknown stream {}", header.name);
            }
        }

        if let Some(data) = tables_stream {
            streams.insert(0, ("#~".to_string(), data));
        }
        for (name, data) in pending {
            if !data.iter().all(|byte| *byte == 0) {
                streams.push((name.to_string(), data));
            }
        }

        serialize_metadata(&RootHeader::from_root(image.root()), &streams)
    }

    /// Write the module as a flat CLI payload
    ///
    /// # Errors
    /// Returns an error if the metadata can not be serialized or the layout overflows
    pub fn write(&self) -> Result<Vec<u8>> {
        let metadata = self.write_metadata()?;
        let resources = self
            .module
            .image()
            .resources()?
            .map(NetResources::from_raw);

        write_image(metadata, resources, &self.options)
    }

    /// Write the module as a flat CLI payload to `path`
    ///
    /// # Errors
    /// Returns an error if writing fails
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.write()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::cor20header::Cor20Header;

    #[test]
    fn image_layout() {
        let mut resources = NetResources::new();
        resources.add(&[1, 2, 3]).unwrap();
        let options = WriterOptions {
            strong_name_size: 0x80,
            ..WriterOptions::default()
        };

        let data = write_image(vec![0xAA; 0x1E], Some(resources), &options).unwrap();
        let header = Cor20Header::read(&data).unwrap();
        assert_eq!(header.meta_data.rva, 0x2048);
        assert_eq!(header.meta_data.size, 0x1E);
        assert_eq!(header.resources.rva, 0x2068);
        assert_eq!(header.resources.size, 7);
        assert_eq!(header.strong_name_signature.rva, 0x2070);
        assert_eq!(header.strong_name_signature.size, 0x80);
        assert_eq!(data.len(), 0xF0);
        assert_eq!(&data[0x48..0x66], &[0xAA; 0x1E]);
        assert_eq!(&data[0x68..0x6F], &[3, 0, 0, 0, 1, 2, 3]);
    }

    #[test]
    fn empty_resources_are_skipped() {
        let data = write_image(vec![0; 8], Some(NetResources::new()), &WriterOptions::default())
            .unwrap();
        let header = Cor20Header::read(&data).unwrap();
        assert!(header.resources.is_empty());
        assert!(header.strong_name_signature.is_empty());
        assert_eq!(data.len(), 0x50);
    }

    #[test]
    fn base_offset() {
        let options = WriterOptions {
            base_offset: 0x200,
            base_rva: 0x4000,
            ..WriterOptions::default()
        };
        let data = write_image(vec![0; 8], None, &options).unwrap();
        assert_eq!(data.len(), 0x50);
        assert_eq!(Cor20Header::read(&data).unwrap().meta_data.rva, 0x4048);
    }
}
