//! Serialization of the metadata root, the tables stream and the stream directory.

use strum::{EnumCount, IntoEnumIterator};

use crate::{
    cilassembly::heaps::LARGE_HEAP_SIZE,
    metadata::{
        root::{Root, CIL_HEADER_MAGIC},
        streams::TablesHeader,
        tables::{
            sorted_mask, TableId, TableInfo, TableLayout, HEAP_EXTRA_DATA, HEAP_LARGE_BLOB,
            HEAP_LARGE_GUID, HEAP_LARGE_STRINGS,
        },
    },
    utils::{align_to_4, to_u32},
    Result,
};

/// Version string of newly created metadata
pub const DEFAULT_VERSION: &str = "v4.0.30319";

/// The fixed fields of the metadata root
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootHeader {
    /// `MajorVersion`, 1
    pub major_version: u16,
    /// `MinorVersion`, 1
    pub minor_version: u16,
    /// Reserved, 0
    pub reserved: u32,
    /// The runtime version string
    pub version: String,
    /// Space reserved for the version string, raised to fit the string when too small
    pub version_length: u32,
    /// Reserved, 0
    pub flags: u16,
}

impl RootHeader {
    /// The root fields of an existing image
    #[must_use]
    pub fn from_root(root: &Root) -> Self {
        RootHeader {
            major_version: root.major_version,
            minor_version: root.minor_version,
            reserved: root.reserved,
            version: root.version.clone(),
            version_length: root.length,
            flags: root.flags,
        }
    }

    fn padded_version_length(&self) -> usize {
        std::cmp::max(
            align_to_4(self.version.len() + 1),
            align_to_4(self.version_length as usize),
        )
    }
}

impl Default for RootHeader {
    fn default() -> Self {
        RootHeader {
            major_version: 1,
            minor_version: 1,
            reserved: 0,
            version: DEFAULT_VERSION.to_string(),
            version_length: 0,
            flags: 0,
        }
    }
}

/// Serialize the metadata root followed by `streams`, in the given order.
///
/// Every stream is padded to 4 bytes.
///
/// # Errors
/// Returns an error if the metadata grows beyond 4 GiB
pub fn serialize_metadata(root: &RootHeader, streams: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let version_length = root.padded_version_length();
    let directory_size: usize = streams
        .iter()
        .map(|(name, _)| 8 + align_to_4(name.len() + 1))
        .sum();
    let header_size = 20 + version_length + directory_size;

    let mut data = Vec::with_capacity(
        header_size
            + streams
                .iter()
                .map(|(_, stream)| align_to_4(stream.len()))
                .sum::<usize>(),
    );
    data.extend_from_slice(&CIL_HEADER_MAGIC.to_le_bytes());
    data.extend_from_slice(&root.major_version.to_le_bytes());
    data.extend_from_slice(&root.minor_version.to_le_bytes());
    data.extend_from_slice(&root.reserved.to_le_bytes());
    data.extend_from_slice(&to_u32(version_length)?.to_le_bytes());
    data.extend_from_slice(root.version.as_bytes());
    data.resize(16 + version_length, 0);
    data.extend_from_slice(&root.flags.to_le_bytes());
    #[allow(clippy::cast_possible_truncation)]
    data.extend_from_slice(&(streams.len() as u16).to_le_bytes());

    let mut offset = header_size;
    for (name, stream) in streams {
        data.extend_from_slice(&to_u32(offset)?.to_le_bytes());
        data.extend_from_slice(&to_u32(align_to_4(stream.len()))?.to_le_bytes());
        let name_start = data.len();
        data.extend_from_slice(name.as_bytes());
        data.resize(name_start + align_to_4(name.len() + 1), 0);
        offset += align_to_4(stream.len());
    }

    for (name, stream) in streams {
        data.extend_from_slice(stream);
        data.resize(align_to_4(data.len()), 0);
        log::debug!("Stream {} with {} bytes", name, stream.len());
    }

    Ok(data)
}

/// The rows of all tables together with the fixed fields of the tables stream header
#[derive(Clone, Debug)]
pub(crate) struct TablesStream {
    pub(crate) reserved: u32,
    pub(crate) major_version: u8,
    pub(crate) minor_version: u8,
    pub(crate) heap_sizes: u8,
    pub(crate) reserved2: u8,
    pub(crate) valid: u64,
    pub(crate) sorted: u64,
    pub(crate) extra_data: Option<u32>,
    /// Rows of every table, indexed by [`TableId`], as raw column values
    pub(crate) tables: Vec<Vec<Vec<u32>>>,
}

impl TablesStream {
    /// An empty stream with the header values of newly created metadata
    pub(crate) fn new() -> Self {
        TablesStream {
            reserved: 0,
            major_version: 2,
            minor_version: 0,
            heap_sizes: 0,
            reserved2: 1,
            valid: 0,
            sorted: sorted_mask(),
            extra_data: None,
            tables: vec![Vec::new(); TableId::COUNT],
        }
    }

    /// An empty stream with the header values of an existing image
    pub(crate) fn from_header(header: &TablesHeader) -> Self {
        TablesStream {
            reserved: header.reserved,
            major_version: header.major_version,
            minor_version: header.minor_version,
            heap_sizes: header.heap_sizes,
            reserved2: header.reserved2,
            valid: header.valid,
            sorted: header.sorted,
            extra_data: header.extra_data,
            tables: vec![Vec::new(); TableId::COUNT],
        }
    }

    pub(crate) fn rows(&self, table: TableId) -> &[Vec<u32>] {
        &self.tables[table as usize]
    }

    pub(crate) fn rows_mut(&mut self, table: TableId) -> &mut Vec<Vec<u32>> {
        &mut self.tables[table as usize]
    }

    /// Serialize the stream. Index widths follow from the row counts and from the sizes of
    /// the heaps the stream is written with.
    ///
    /// # Errors
    /// Returns an error if a table has more rows than a rid can address
    pub(crate) fn serialize(
        &self,
        strings_size: usize,
        blob_size: usize,
        guid_size: usize,
    ) -> Result<Vec<u8>> {
        let mut heap_sizes = self.heap_sizes;
        if strings_size >= LARGE_HEAP_SIZE {
            heap_sizes |= HEAP_LARGE_STRINGS;
        }
        if blob_size >= LARGE_HEAP_SIZE {
            heap_sizes |= HEAP_LARGE_BLOB;
        }
        if guid_size >= LARGE_HEAP_SIZE {
            heap_sizes |= HEAP_LARGE_GUID;
        }
        if self.extra_data.is_some() {
            heap_sizes |= HEAP_EXTRA_DATA;
        } else {
            heap_sizes &= !HEAP_EXTRA_DATA;
        }

        let mut counts = Vec::with_capacity(TableId::COUNT);
        let mut valid = self.valid;
        for table in TableId::iter() {
            let rows = to_u32(self.rows(table).len())?;
            if rows > 0x00FF_FFFF {
                return Err(malformed_error!(
                    "Table {:?} has too many rows - {}",
                    table,
                    rows
                ));
            }
            if rows > 0 {
                valid |= 1 << table as u64;
            }
            counts.push((table, rows));
        }

        let info = TableInfo::from_counts(&counts, heap_sizes);
        let layouts = TableLayout::all(&info);

        let mut data = Vec::new();
        data.extend_from_slice(&self.reserved.to_le_bytes());
        data.push(self.major_version);
        data.push(self.minor_version);
        data.push(heap_sizes);
        data.push(self.reserved2);
        data.extend_from_slice(&valid.to_le_bytes());
        data.extend_from_slice(&self.sorted.to_le_bytes());
        for (table, rows) in &counts {
            if valid & (1 << *table as u64) != 0 {
                data.extend_from_slice(&rows.to_le_bytes());
            }
        }
        if let Some(extra_data) = self.extra_data {
            data.extend_from_slice(&extra_data.to_le_bytes());
        }

        for table in TableId::iter() {
            let layout = &layouts[table as usize];
            let rows = self.rows(table);
            if rows.is_empty() {
                continue;
            }

            let start = data.len();
            data.resize(start + rows.len() * layout.row_size(), 0);
            let mut offset = start;
            for row in rows {
                for column in layout.columns() {
                    let value = row.get(column.index()).copied().unwrap_or(0);
                    column.write(&mut data, &mut offset, value)?;
                }
            }

            log::trace!(
                "Table {:?}: {} rows of {} bytes",
                table,
                rows.len(),
                layout.row_size()
            );
        }

        data.resize(align_to_4(data.len()), 0);
        Ok(data)
    }
}
