//! A parsed metadata image.
//!
//! [`MetadataImage`] owns the loaded [`File`] and the headers needed to address every table row
//! and heap entry: the CLI header, the metadata root and the tables stream header. Nothing
//! beyond these headers is decoded when the image is loaded.

use std::ops::Range;

use crate::{
    file::File,
    metadata::{
        cor20header::Cor20Header,
        root::Root,
        streams::{Blob, Guid, Strings, TablesHeader},
        tables::{MetadataTable, TableId, TableInfoRef},
    },
    Result,
};

/// The headers and stream locations of a loaded image
pub struct MetadataImage {
    file: File,
    cor20: Cor20Header,
    root: Root,
    metadata: Range<usize>,
    tables: TablesHeader,
    tables_stream: Range<usize>,
}

impl MetadataImage {
    /// Parse the CLI header, the metadata root and the tables header of `file`
    ///
    /// # Errors
    /// Returns an error if any of the headers is malformed or the image has no tables stream
    pub fn load(file: File) -> Result<MetadataImage> {
        let (clr_rva, clr_size) = file.clr();
        let clr_offset = file.rva_to_offset(clr_rva)?;
        let cor20 = Cor20Header::read(file.data_slice(clr_offset, clr_size)?)?;

        let metadata_offset = file.rva_to_offset(cor20.meta_data.rva as usize)?;
        let metadata_size = cor20.meta_data.size as usize;
        let root = Root::read(file.data_slice(metadata_offset, metadata_size)?)?;

        let Some(header) = root
            .stream("#~")
            .or_else(|| root.stream("#-"))
        else {
            return Err(malformed_error!("Metadata has no tables stream"));
        };

        let tables_stream =
            header.offset as usize..header.offset as usize + header.size as usize;
        let metadata = metadata_offset..metadata_offset + metadata_size;
        let tables = TablesHeader::read(&file.data()[metadata.clone()][tables_stream.clone()])?;

        log::debug!(
            "Loaded metadata {} with {} streams, {} tables present",
            root.version,
            root.stream_number,
            tables.valid.count_ones()
        );

        Ok(MetadataImage {
            file,
            cor20,
            root,
            metadata,
            tables,
            tables_stream,
        })
    }

    /// The underlying file
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// The CLI header
    #[must_use]
    pub fn cor20(&self) -> &Cor20Header {
        &self.cor20
    }

    /// The metadata root
    #[must_use]
    pub fn root(&self) -> &Root {
        &self.root
    }

    /// The complete metadata blob, starting at the root
    #[must_use]
    pub fn metadata(&self) -> &[u8] {
        &self.file.data()[self.metadata.clone()]
    }

    /// The data of the stream called `name`, if present
    #[must_use]
    pub fn stream_data(&self, name: &str) -> Option<&[u8]> {
        let header = self.root.stream(name)?;
        let start = header.offset as usize;
        self.metadata().get(start..start + header.size as usize)
    }

    /// The tables stream header
    #[must_use]
    pub fn tables_header(&self) -> &TablesHeader {
        &self.tables
    }

    /// Row counts and column widths of all tables
    #[must_use]
    pub fn table_info(&self) -> TableInfoRef {
        self.tables.info.clone()
    }

    /// Number of rows of `table`
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.tables.rows(table)
    }

    /// Returns true if the tables header marks `table` as sorted
    #[must_use]
    pub fn is_sorted(&self, table: TableId) -> bool {
        self.tables.is_sorted(table)
    }

    /// A view of `table`
    ///
    /// # Errors
    /// Returns an error if the table does not fit the tables stream
    pub fn table(&self, table: TableId) -> Result<MetadataTable<'_>> {
        let data = &self.metadata()[self.tables_stream.clone()];
        self.tables.table(data, table)
    }

    /// The `#Strings` heap
    ///
    /// # Errors
    /// Returns an error if the heap is missing or malformed
    pub fn strings(&self) -> Result<Strings<'_>> {
        match self.stream_data("#Strings") {
            Some(data) => Strings::from(data),
            None => Err(malformed_error!("Metadata has no #Strings heap")),
        }
    }

    /// The `#Blob` heap
    ///
    /// # Errors
    /// Returns an error if the heap is missing or malformed
    pub fn blobs(&self) -> Result<Blob<'_>> {
        match self.stream_data("#Blob") {
            Some(data) => Blob::from(data),
            None => Err(malformed_error!("Metadata has no #Blob heap")),
        }
    }

    /// The `#GUID` heap
    ///
    /// # Errors
    /// Returns an error if the heap is malformed
    pub fn guids(&self) -> Result<Guid<'_>> {
        Guid::from(self.stream_data("#GUID").unwrap_or_default())
    }

    /// The string at `index` of the `#Strings` heap, index 0 is the empty string
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds or the heap is missing
    pub fn string(&self, index: u32) -> Result<&str> {
        if index == 0 {
            return Ok("");
        }

        self.strings()?.get(index as usize)
    }

    /// The blob at `index` of the `#Blob` heap, index 0 is the empty blob
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds or the heap is missing
    pub fn blob(&self, index: u32) -> Result<&[u8]> {
        if index == 0 {
            return Ok(&[]);
        }

        self.blobs()?.get(index as usize)
    }

    /// The managed resources referenced by the CLI header, if any
    ///
    /// # Errors
    /// Returns an error if the resources directory points outside of the file
    pub fn resources(&self) -> Result<Option<&[u8]>> {
        let directory = self.cor20.resources;
        if directory.is_empty() {
            return Ok(None);
        }

        let offset = self.file.rva_to_offset(directory.rva as usize)?;
        Ok(Some(self.file.data_slice(offset, directory.size as usize)?))
    }
}
