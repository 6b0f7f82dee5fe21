//! Column descriptors and width-dispatched column access.
//!
//! Every column of a table has a logical [`ColumnSize`]. Once the row counts and heap sizes of
//! an image are known, the layout pass ([`crate::metadata::tables::TableLayout`]) turns it into a
//! [`ColumnInfo`] with a fixed byte offset inside the row and a physical width of 1, 2 or 4
//! bytes. Column values are always handled as `u32`, reads widen and writes narrow.

use crate::{
    file::{
        io::{read_le_at, write_le_at},
        parser::Parser,
    },
    metadata::tables::types::{CodedIndexType, TableId, TableInfo},
    Result,
};

/// The logical size class of a column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnSize {
    /// A single byte
    Byte,
    /// A signed 16-bit value
    Int16,
    /// An unsigned 16-bit value
    UInt16,
    /// A signed 32-bit value
    Int32,
    /// An unsigned 32-bit value
    UInt32,
    /// An index into the `#Strings` heap
    Strings,
    /// An index into the `#GUID` heap
    Guid,
    /// An index into the `#Blob` heap
    Blob,
    /// A row id of the given table
    Table(TableId),
    /// A coded index
    Coded(CodedIndexType),
}

impl ColumnSize {
    /// Returns the physical width of this size class under `info`
    #[must_use]
    pub fn width(&self, info: &TableInfo) -> u8 {
        match self {
            ColumnSize::Byte => 1,
            ColumnSize::Int16 | ColumnSize::UInt16 => 2,
            ColumnSize::Int32 | ColumnSize::UInt32 => 4,
            ColumnSize::Strings => info.str_bytes(),
            ColumnSize::Guid => info.guid_bytes(),
            ColumnSize::Blob => info.blob_bytes(),
            ColumnSize::Table(table) => info.table_index_bytes(*table),
            ColumnSize::Coded(coded) => info.coded_index_bytes(*coded),
        }
    }
}

/// A column with its finalized layout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnInfo {
    index: usize,
    name: &'static str,
    size: ColumnSize,
    offset: usize,
    width: u8,
}

impl ColumnInfo {
    /// Create a column description with an explicit layout.
    ///
    /// ## Arguments
    /// * 'index'   - Zero based column index
    /// * 'name'    - Column name, only used for diagnostics
    /// * 'size'    - Logical size class
    /// * 'offset'  - Byte offset of the column inside a row
    /// * 'width'   - Physical width in bytes
    #[must_use]
    pub fn new(index: usize, name: &'static str, size: ColumnSize, offset: usize, width: u8) -> Self {
        ColumnInfo {
            index,
            name,
            size,
            offset,
            width,
        }
    }

    /// Zero based index of the column
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Name of the column
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Logical size class of the column
    #[must_use]
    pub fn size(&self) -> ColumnSize {
        self.size
    }

    /// Byte offset of the column inside a row
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Physical width of the column
    #[must_use]
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Read the column value at the current position of `parser`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the data is truncated.
    ///
    /// # Panics
    /// Panics if the width of this column is not 1, 2 or 4.
    pub fn read(&self, parser: &mut Parser) -> Result<u32> {
        match self.width {
            1 => Ok(u32::from(parser.read_le::<u8>()?)),
            2 => Ok(u32::from(parser.read_le::<u16>()?)),
            4 => parser.read_le::<u32>(),
            width => self.invalid_width(width),
        }
    }

    /// Write `value` at `offset`, narrowed to the width of this column, and advance `offset`.
    ///
    /// Values that do not fit are truncated, `0x1FFFF` written to a 2 byte column is `0xFFFF`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the buffer is too small.
    ///
    /// # Panics
    /// Panics if the width of this column is not 1, 2 or 4.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write(&self, data: &mut [u8], offset: &mut usize, value: u32) -> Result<()> {
        match self.width {
            1 => write_le_at::<u8>(data, offset, value as u8),
            2 => write_le_at::<u16>(data, offset, value as u16),
            4 => write_le_at::<u32>(data, offset, value),
            width => self.invalid_width(width),
        }
    }

    /// Read this column from a complete row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the row is too short.
    ///
    /// # Panics
    /// Panics if the width of this column is not 1, 2 or 4.
    pub fn read_row(&self, row: &[u8]) -> Result<u32> {
        let mut offset = self.offset;
        match self.width {
            1 => Ok(u32::from(read_le_at::<u8>(row, &mut offset)?)),
            2 => Ok(u32::from(read_le_at::<u16>(row, &mut offset)?)),
            4 => read_le_at::<u32>(row, &mut offset),
            width => self.invalid_width(width),
        }
    }

    /// Write this column into a complete row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the row is too short.
    ///
    /// # Panics
    /// Panics if the width of this column is not 1, 2 or 4.
    pub fn write_row(&self, row: &mut [u8], value: u32) -> Result<()> {
        let mut offset = self.offset;
        self.write(row, &mut offset, value)
    }

    fn invalid_width<T>(&self, width: u8) -> T {
        panic!(
            "column {} ({}) has invalid width {}",
            self.index, self.name, width
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(width: u8) -> ColumnInfo {
        ColumnInfo::new(0, "Test", ColumnSize::UInt32, 0, width)
    }

    #[test]
    fn width_dispatch() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut parser = Parser::new(&data);

        assert_eq!(column(1).read(&mut parser).unwrap(), 0x01);
        assert_eq!(column(2).read(&mut parser).unwrap(), 0x0302);
        assert_eq!(column(4).read(&mut parser).unwrap(), 0x0706_0504);
        assert!(column(1).read(&mut parser).is_err());
    }

    #[test]
    fn write_read_every_width() {
        for (width, values) in [
            (1u8, vec![0u32, 1, 0x7F, 0xFF]),
            (2, vec![0, 0x100, 0xFFFF]),
            (4, vec![0, 0x1_0000, 0xDEAD_BEEF, u32::MAX]),
        ] {
            let column = column(width);
            for value in values {
                let mut data = [0u8; 4];
                let mut offset = 0;
                column.write(&mut data, &mut offset, value).unwrap();
                assert_eq!(offset, width as usize);

                let mut parser = Parser::new(&data[..width as usize]);
                assert_eq!(column.read(&mut parser).unwrap(), value);
            }
        }
    }

    #[test]
    fn write_truncates() {
        let mut data = [0u8; 4];
        let mut offset = 0;
        column(2).write(&mut data, &mut offset, 0x1FFFF).unwrap();
        assert_eq!(offset, 2);
        assert_eq!(data, [0xFF, 0xFF, 0x00, 0x00]);

        let mut parser = Parser::new(&data);
        assert_eq!(column(2).read(&mut parser).unwrap(), 0xFFFF);

        let mut offset = 0;
        column(1).write(&mut data, &mut offset, 0x1234).unwrap();
        assert_eq!(data[0], 0x34);
    }

    #[test]
    fn row_access() {
        let column = ColumnInfo::new(1, "Name", ColumnSize::Strings, 2, 2);
        let mut row = [0u8; 6];
        column.write_row(&mut row, 0xABCD).unwrap();
        assert_eq!(row, [0x00, 0x00, 0xCD, 0xAB, 0x00, 0x00]);
        assert_eq!(column.read_row(&row).unwrap(), 0xABCD);
        assert!(column.read_row(&row[..3]).is_err());
    }

    #[test]
    #[should_panic(expected = "invalid width 3")]
    fn invalid_width_read() {
        let data = [0u8; 4];
        let mut parser = Parser::new(&data);
        let _ = column(3).read(&mut parser);
    }

    #[test]
    #[should_panic(expected = "invalid width 0")]
    fn invalid_width_write() {
        let mut data = [0u8; 4];
        let mut offset = 0;
        let _ = column(0).write(&mut data, &mut offset, 1);
    }

    #[test]
    fn size_widths() {
        let info = TableInfo::new_test(&[(TableId::TypeDef, 0x1_0000)], true, false, false);
        assert_eq!(ColumnSize::Byte.width(&info), 1);
        assert_eq!(ColumnSize::Int16.width(&info), 2);
        assert_eq!(ColumnSize::UInt32.width(&info), 4);
        assert_eq!(ColumnSize::Strings.width(&info), 4);
        assert_eq!(ColumnSize::Blob.width(&info), 2);
        assert_eq!(ColumnSize::Table(TableId::TypeDef).width(&info), 4);
        assert_eq!(ColumnSize::Table(TableId::Field).width(&info), 2);
        assert_eq!(
            ColumnSize::Coded(CodedIndexType::TypeDefOrRef).width(&info),
            4
        );
    }
}
