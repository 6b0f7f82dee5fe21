//! Row counts and heap size flags of a tables stream, and the index widths derived from them.

use std::sync::Arc;
use strum::{EnumCount, IntoEnumIterator};

use crate::{
    file::io::read_le_at,
    metadata::tables::types::{CodedIndexType, TableId},
    Result,
};

/// Heap-size flag: `#Strings` indexes are 4 bytes wide
pub const HEAP_LARGE_STRINGS: u8 = 0x01;
/// Heap-size flag: `#GUID` indexes are 4 bytes wide
pub const HEAP_LARGE_GUID: u8 = 0x02;
/// Heap-size flag: `#Blob` indexes are 4 bytes wide
pub const HEAP_LARGE_BLOB: u8 = 0x04;
/// Heap-size flag: an extra 4 byte value follows the row counts
pub const HEAP_EXTRA_DATA: u8 = 0x40;

/// Holds information about the size that reference index fields have
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct TableRowInfo {
    /// The count of rows in this table
    pub rows: u32,
    /// Number of bits required to represent any valid row index
    pub bits: u8,
    /// If the count is > `u16::max`, the indexes of other tables into this table will be 4 bytes instead of 2
    pub is_large: bool,
}

impl TableRowInfo {
    /// Creates a new `TableRowInfo` instance with the given row count.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(rows: u32) -> Self {
        let bits = if rows == 0 {
            1
        } else {
            (32 - rows.leading_zeros()) as u8
        };

        Self {
            rows,
            bits,
            is_large: rows > u32::from(u16::MAX),
        }
    }
}

/// `TableInfo` holds the row count of every table and the resulting widths of heap, table and
/// coded index columns.
///
/// It is computed once per image (or once per write), every column width derives from it.
#[derive(Clone, PartialEq, Debug)]
pub struct TableInfo {
    rows: Vec<TableRowInfo>,
    coded_indexes: Vec<u8>,
    heap_sizes: u8,
}

/// Cheap-copy reference to a `TableInfo` structure
pub type TableInfoRef = Arc<TableInfo>;

impl Default for TableInfo {
    fn default() -> Self {
        TableInfo::from_counts(&[], 0)
    }
}

impl TableInfo {
    /// Parse the row counts that follow the fixed part of a tables stream header.
    ///
    /// ## Arguments
    /// * 'data'        - The row count array, one `u32` per set bit of `valid`
    /// * 'valid'       - The valid bitvector from the header, showing which tables are present
    /// * 'heap_sizes'  - The heap size flags from the header
    ///
    /// # Errors
    /// Returns an error if the row count array is truncated or `valid` names an unknown table
    pub fn read(data: &[u8], valid: u64, heap_sizes: u8) -> Result<Self> {
        if valid >> TableId::COUNT != 0 {
            return Err(malformed_error!(
                "Valid bitvector refers to unknown tables - 0x{:x}",
                valid
            ));
        }

        let mut counts = Vec::with_capacity(TableId::COUNT);
        let mut offset = 0;
        for table_id in TableId::iter() {
            if (valid & (1 << table_id as usize)) == 0 {
                continue;
            }

            let row_count = read_le_at::<u32>(data, &mut offset)?;
            counts.push((table_id, row_count));
        }

        Ok(TableInfo::from_counts(&counts, heap_sizes))
    }

    /// Build a `TableInfo` from explicit row counts and heap size flags.
    ///
    /// ## Arguments
    /// * 'counts'      - (table, row count) pairs, absent tables have 0 rows
    /// * 'heap_sizes'  - Combination of [`HEAP_LARGE_STRINGS`], [`HEAP_LARGE_GUID`], [`HEAP_LARGE_BLOB`]
    #[must_use]
    pub fn from_counts(counts: &[(TableId, u32)], heap_sizes: u8) -> Self {
        let mut table_info = TableInfo {
            rows: vec![TableRowInfo::default(); TableId::COUNT],
            coded_indexes: vec![0; CodedIndexType::COUNT],
            heap_sizes,
        };

        for (table_id, rows) in counts {
            table_info.rows[*table_id as usize] = TableRowInfo::new(*rows);
        }

        table_info.calculate_coded_index_bits();
        table_info
    }

    #[cfg(test)]
    /// Special constructor for unit-tests
    ///
    /// ## Arguments
    /// * 'valid_tables'    - A slice of tuples, which provides (table_id, row_count) of the valid tables
    /// * 'large_str'       - Specify if the #String heap indexes are 4 or 2 bytes
    /// * 'large_blob'      - Specify if the #Blob heap indexes are 4 or 2 bytes
    /// * 'large_guid'      - Specify if the #GUID heap indexes are 4 or 2 bytes
    pub fn new_test(
        valid_tables: &[(TableId, u32)],
        large_str: bool,
        large_blob: bool,
        large_guid: bool,
    ) -> Self {
        let mut heap_sizes = 0;
        if large_str {
            heap_sizes |= HEAP_LARGE_STRINGS;
        }
        if large_guid {
            heap_sizes |= HEAP_LARGE_GUID;
        }
        if large_blob {
            heap_sizes |= HEAP_LARGE_BLOB;
        }

        TableInfo::from_counts(valid_tables, heap_sizes)
    }

    /// Returns the number of rows of `table`
    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.rows[table as usize].rows
    }

    /// Returns the metadata for a specific table.
    #[must_use]
    pub fn get(&self, table: TableId) -> &TableRowInfo {
        &self.rows[table as usize]
    }

    /// The `Valid` bit vector: one bit per table with at least one row
    #[must_use]
    pub fn valid_mask(&self) -> u64 {
        TableId::iter()
            .filter(|table| self.rows(*table) > 0)
            .fold(0, |mask, table| mask | (1 << table as u64))
    }

    /// The heap size flags this info was built with
    #[must_use]
    pub fn heap_sizes(&self) -> u8 {
        self.heap_sizes
    }

    /// Returns true, if a requested table is larger than 2^16 rows and hence requires 4 bytes instead of 2 bytes
    #[must_use]
    pub fn is_large(&self, id: TableId) -> bool {
        self.rows[id as usize].is_large
    }

    /// Indicates the size of indexes referring into the '#Strings' heap. True means 4 bytes, False is 2 bytes
    #[must_use]
    pub fn is_large_str(&self) -> bool {
        self.heap_sizes & HEAP_LARGE_STRINGS != 0
    }

    /// Indicates the size of indexes referring into the '#GUID' heap. True means 4 bytes, False is 2 bytes
    #[must_use]
    pub fn is_large_guid(&self) -> bool {
        self.heap_sizes & HEAP_LARGE_GUID != 0
    }

    /// Indicates the size of indexes referring into the '#Blob' heap. True means 4 bytes, False is 2 bytes
    #[must_use]
    pub fn is_large_blob(&self) -> bool {
        self.heap_sizes & HEAP_LARGE_BLOB != 0
    }

    /// Returns the width of '#Strings' heap indexes in bytes
    #[must_use]
    pub fn str_bytes(&self) -> u8 {
        if self.is_large_str() {
            4
        } else {
            2
        }
    }

    /// Returns the width of '#GUID' heap indexes in bytes
    #[must_use]
    pub fn guid_bytes(&self) -> u8 {
        if self.is_large_guid() {
            4
        } else {
            2
        }
    }

    /// Returns the width of '#Blob' heap indexes in bytes
    #[must_use]
    pub fn blob_bytes(&self) -> u8 {
        if self.is_large_blob() {
            4
        } else {
            2
        }
    }

    /// Returns the number of bytes required to represent an index into a specific table.
    #[must_use]
    pub fn table_index_bytes(&self, table_id: TableId) -> u8 {
        if self.rows[table_id as usize].bits > 16 {
            4
        } else {
            2
        }
    }

    /// Returns the cached bit size for a specific coded index type.
    #[must_use]
    pub fn coded_index_bits(&self, coded_index_type: CodedIndexType) -> u8 {
        self.coded_indexes[coded_index_type as usize]
    }

    /// Returns the byte size of a coded index column.
    ///
    /// 2 bytes when every referenced table has fewer than `2^(16 - tag_bits)` rows, else 4.
    #[must_use]
    pub fn coded_index_bytes(&self, coded_index_type: CodedIndexType) -> u8 {
        if self.coded_indexes[coded_index_type as usize] > 16 {
            4
        } else {
            2
        }
    }

    fn calculate_coded_index_size(&self, coded_index_type: CodedIndexType) -> u8 {
        let max_bits = coded_index_type
            .tables()
            .map(|table| self.rows[table as usize].bits)
            .max()
            .unwrap_or(1);

        max_bits + coded_index_type.tag_bits()
    }

    fn calculate_coded_index_bits(&mut self) {
        for coded_index in CodedIndexType::iter() {
            let size = self.calculate_coded_index_size(coded_index);
            self.coded_indexes[coded_index as usize] = size;
        }
    }
}
