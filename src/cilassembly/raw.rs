//! Building metadata from raw rows.
//!
//! [`RawMetadataBuilder`] serializes rows given as column values, together with the heaps they
//! index, into a complete metadata blob or a flat CLI payload. It is the tool for producing
//! small images without a compiler.
//!
//! # Examples
//!
//! ```rust
//! use dotmodel::{cilassembly::RawMetadataBuilder, metadata::tables::TableId, File, ModuleDef};
//!
//! let mut builder = RawMetadataBuilder::new();
//! let name = builder.string("Sample.dll")?;
//! builder.add_row(TableId::Module, vec![0, name, 0, 0, 0])?;
//! let module_type = builder.string("<Module>")?;
//! builder.add_row(TableId::TypeDef, vec![0, module_type, 0, 0, 1, 1])?;
//!
//! let image = builder.build_image()?;
//! let module = ModuleDef::load(File::from_flat(image, 0x2000)?)?;
//! assert_eq!(module.name()?, "Sample.dll");
//! # Ok::<(), dotmodel::Error>(())
//! ```

use crate::{
    cilassembly::{
        heaps::{BlobHeapBuilder, GuidHeapBuilder, StringsHeapBuilder},
        metadata::{serialize_metadata, RootHeader, TablesStream},
        writer::{write_image, WriterOptions},
        chunks::NetResources,
    },
    metadata::tables::{columns, TableId},
    utils::to_u32,
    Result,
};

/// Collects rows and heap values and serializes them as metadata
pub struct RawMetadataBuilder {
    root: RootHeader,
    tables: TablesStream,
    strings: StringsHeapBuilder,
    blobs: BlobHeapBuilder,
    guids: GuidHeapBuilder,
    resources: NetResources,
}

impl RawMetadataBuilder {
    /// An empty builder with the default root version
    #[must_use]
    pub fn new() -> Self {
        RawMetadataBuilder {
            root: RootHeader::default(),
            tables: TablesStream::new(),
            strings: StringsHeapBuilder::new(),
            blobs: BlobHeapBuilder::new(),
            guids: GuidHeapBuilder::new(),
            resources: NetResources::new(),
        }
    }

    /// Replace the root header
    #[must_use]
    pub fn with_root(mut self, root: RootHeader) -> Self {
        self.root = root;
        self
    }

    /// The `#Strings` index of `value`
    ///
    /// # Errors
    /// Returns an error if the heap grows beyond 4 GiB
    pub fn string(&mut self, value: &str) -> Result<u32> {
        self.strings.add(value)
    }

    /// The `#Blob` index of `value`
    ///
    /// # Errors
    /// Returns an error if the heap grows beyond 4 GiB
    pub fn blob(&mut self, value: &[u8]) -> Result<u32> {
        self.blobs.add(value)
    }

    /// The `#GUID` index of `value`
    ///
    /// # Errors
    /// Returns an error if the heap grows beyond 4 GiB
    pub fn guid(&mut self, value: &[u8; 16]) -> Result<u32> {
        self.guids.add(value)
    }

    /// Add a managed resource, returning its offset for a `ManifestResource` row
    ///
    /// # Errors
    /// Returns an error if the resources grow beyond 4 GiB
    pub fn resource(&mut self, data: &[u8]) -> Result<u32> {
        self.resources.add(data)
    }

    /// Append a row to `table` and return its rid.
    ///
    /// Rows are written in the order they are added; sorted tables must be filled in key
    /// order.
    ///
    /// # Errors
    /// Returns an error if the number of values does not match the columns of `table`
    pub fn add_row(&mut self, table: TableId, row: Vec<u32>) -> Result<u32> {
        let expected = columns(table).len();
        if row.len() != expected {
            return Err(malformed_error!(
                "{:?} rows have {} columns, got {}",
                table,
                expected,
                row.len()
            ));
        }

        let rows = self.tables.rows_mut(table);
        rows.push(row);
        to_u32(rows.len())
    }

    /// Number of rows added to `table`
    #[must_use]
    pub fn row_count(&self, table: TableId) -> usize {
        self.tables.rows(table).len()
    }

    fn streams(self) -> Result<(RootHeader, Vec<(String, Vec<u8>)>, NetResources)> {
        let strings = self.strings.finish();
        let blobs = self.blobs.finish();
        let guids = self.guids.finish();
        let tables = self
            .tables
            .serialize(strings.len(), blobs.len(), guids.len())?;

        let streams = vec![
            ("#~".to_string(), tables),
            ("#Strings".to_string(), strings),
            ("#US".to_string(), vec![0; 4]),
            ("#GUID".to_string(), guids),
            ("#Blob".to_string(), blobs),
        ];
        Ok((self.root, streams, self.resources))
    }

    /// Serialize the metadata blob
    ///
    /// # Errors
    /// Returns an error if a table has too many rows or the metadata grows beyond 4 GiB
    pub fn build(self) -> Result<Vec<u8>> {
        let (root, streams, _) = self.streams()?;
        serialize_metadata(&root, &streams)
    }

    /// Serialize a flat CLI payload with the default [`WriterOptions`], readable with
    /// [`crate::File::from_flat`] at RVA 0x2000
    ///
    /// # Errors
    /// Returns an error if the metadata can not be serialized
    pub fn build_image(self) -> Result<Vec<u8>> {
        self.build_image_with(&WriterOptions::default())
    }

    /// Serialize a flat CLI payload laid out with `options`
    ///
    /// # Errors
    /// Returns an error if the metadata can not be serialized
    pub fn build_image_with(self, options: &WriterOptions) -> Result<Vec<u8>> {
        let (root, streams, resources) = self.streams()?;
        let metadata = serialize_metadata(&root, &streams)?;
        write_image(metadata, Some(resources), options)
    }
}

impl Default for RawMetadataBuilder {
    fn default() -> Self {
        RawMetadataBuilder::new()
    }
}
