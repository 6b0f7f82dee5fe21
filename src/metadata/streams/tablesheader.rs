//! Tables Stream (`#~`) header
//!
//! Parses the header of the compressed tables stream: schema version, heap size flags, the
//! `Valid` and `Sorted` bit vectors and the row counts, and gives access to every present
//! table through a [`MetadataTable`] view.
//!
//! # Reference
//! - [ECMA-335 II.24.2.6](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use strum::IntoEnumIterator;

use crate::{
    file::parser::Parser,
    metadata::tables::{
        MetadataTable, TableId, TableInfo, TableInfoRef, TableLayout, HEAP_EXTRA_DATA,
    },
    Result,
};

/// The header of the `#~` tables stream (ECMA-335 II.24.2.6) and the location of every table
/// inside the stream.
///
/// The header itself does not borrow the stream, [`TablesHeader::table`] builds views over the
/// stream data on demand.
#[derive(Clone, Debug)]
pub struct TablesHeader {
    /// Reserved, usually 0
    pub reserved: u32,
    /// Major version of the table schema
    pub major_version: u8,
    /// Minor version of the table schema
    pub minor_version: u8,
    /// Heap size flags
    pub heap_sizes: u8,
    /// Reserved, usually 1
    pub reserved2: u8,
    /// Bit vector of present tables
    pub valid: u64,
    /// Bit vector of sorted tables
    pub sorted: u64,
    /// The extra value following the row counts when [`HEAP_EXTRA_DATA`] is set
    pub extra_data: Option<u32>,
    /// Row counts and column widths
    pub info: TableInfoRef,
    layouts: Vec<TableLayout>,
    offsets: Vec<usize>,
}

impl TablesHeader {
    /// Parse the tables stream header and locate all tables
    ///
    /// # Errors
    /// Returns an error if the header is truncated or the tables exceed the stream
    pub fn read(data: &[u8]) -> Result<TablesHeader> {
        if data.len() < 24 {
            return Err(out_of_bounds_error!());
        }

        let mut parser = Parser::new(data);
        let reserved = parser.read_le::<u32>()?;
        let major_version = parser.read_le::<u8>()?;
        let minor_version = parser.read_le::<u8>()?;
        let heap_sizes = parser.read_le::<u8>()?;
        let reserved2 = parser.read_le::<u8>()?;
        let valid = parser.read_le::<u64>()?;
        let sorted = parser.read_le::<u64>()?;

        let info = TableInfo::read(&data[parser.pos()..], valid, heap_sizes)?;
        parser.advance_by(valid.count_ones() as usize * 4)?;

        let extra_data = if heap_sizes & HEAP_EXTRA_DATA != 0 {
            Some(parser.read_le::<u32>()?)
        } else {
            None
        };

        let layouts = TableLayout::all(&info);
        let mut offsets = Vec::with_capacity(layouts.len());
        let mut offset = parser.pos();
        for table in TableId::iter() {
            offsets.push(offset);

            let size = info.rows(table) as usize * layouts[table as usize].row_size();
            offset = match offset.checked_add(size) {
                Some(end) if end <= data.len() => end,
                _ => {
                    return Err(malformed_error!(
                        "Table {:?} exceeds the tables stream",
                        table
                    ))
                }
            };
        }

        Ok(TablesHeader {
            reserved,
            major_version,
            minor_version,
            heap_sizes,
            reserved2,
            valid,
            sorted,
            extra_data,
            info: TableInfoRef::new(info),
            layouts,
            offsets,
        })
    }

    /// Number of rows of `table`
    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.info.rows(table)
    }

    /// The layout of `table`
    #[must_use]
    pub fn layout(&self, table: TableId) -> &TableLayout {
        &self.layouts[table as usize]
    }

    /// Returns true if `table` is marked as sorted in the header
    #[must_use]
    pub fn is_sorted(&self, table: TableId) -> bool {
        self.sorted & (1 << table as u64) != 0
    }

    /// A view of `table` over the tables stream `data`
    ///
    /// # Errors
    /// Returns an error if `data` is not the stream this header was read from
    pub fn table<'a>(&'a self, data: &'a [u8], table: TableId) -> Result<MetadataTable<'a>> {
        let offset = self.offsets[table as usize];
        if offset > data.len() {
            return Err(out_of_bounds_error!());
        }

        MetadataTable::new(self.layout(table), &data[offset..], self.rows(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data = [
            0x00, 0x00, 0x00, 0x00, // reserved
            0x02, 0x00,             // version 2.0
            0x00, 0x01,             // heap sizes, reserved
            0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // valid: Module, TypeDef
            0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // sorted: InterfaceImpl
            0x01, 0x00, 0x00, 0x00, // Module rows
            0x01, 0x00, 0x00, 0x00, // TypeDef rows
            // Module: Generation, Name, Mvid, EncId, EncBaseId
            0x00, 0x00, 0x0A, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
            // TypeDef: Flags, TypeName, TypeNamespace, Extends, FieldList, MethodList
            0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00,
        ];

        let header = TablesHeader::read(&data).unwrap();
        assert_eq!(header.major_version, 2);
        assert_eq!(header.reserved2, 1);
        assert_eq!(header.rows(TableId::Module), 1);
        assert_eq!(header.rows(TableId::TypeDef), 1);
        assert!(header.is_sorted(TableId::InterfaceImpl));
        assert!(!header.is_sorted(TableId::TypeDef));
        assert_eq!(header.extra_data, None);

        let module = header.table(&data, TableId::Module).unwrap();
        assert_eq!(module.read_column(1, 1).unwrap(), 0x0A);

        let typedef = header.table(&data, TableId::TypeDef).unwrap();
        assert_eq!(typedef.read_row(1).unwrap(), vec![1, 1, 0, 0, 1, 1]);

        let fields = header.table(&data, TableId::Field).unwrap();
        assert_eq!(fields.row_count(), 0);

        assert!(TablesHeader::read(&data[..data.len() - 1]).is_err());
    }
}
