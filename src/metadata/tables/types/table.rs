//! Row access to one table of the tables stream, including the key column searches of
//! sorted tables.

use crate::{
    file::parser::Parser,
    metadata::tables::types::{RandomRidList, RidList, TableId, TableLayout},
    Result,
};

/// A read-only view of one table inside the tables stream.
///
/// Rows are not decoded up front, every access reads the requested column straight from the
/// image data using the table's [`TableLayout`].
#[derive(Clone, Copy)]
pub struct MetadataTable<'a> {
    layout: &'a TableLayout,
    data: &'a [u8],
    rows: u32,
}

impl<'a> MetadataTable<'a> {
    /// Create a view over `rows` rows stored at the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` can not hold all rows.
    pub fn new(layout: &'a TableLayout, data: &'a [u8], rows: u32) -> Result<Self> {
        let Some(size) = (rows as usize).checked_mul(layout.row_size()) else {
            return Err(out_of_bounds_error!());
        };

        if size > data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(MetadataTable {
            layout,
            data: &data[..size],
            rows,
        })
    }

    /// The table this view covers
    #[must_use]
    pub fn id(&self) -> TableId {
        self.layout.table()
    }

    /// Number of rows in the table
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.rows
    }

    /// The layout of this table
    #[must_use]
    pub fn layout(&self) -> &'a TableLayout {
        self.layout
    }

    /// Size of the table in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns true if `rid` does not address a row of this table
    #[must_use]
    pub fn is_invalid_rid(&self, rid: u32) -> bool {
        rid == 0 || rid > self.rows
    }

    /// The raw bytes of row `rid`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `rid` is not a row of this table.
    pub fn row_data(&self, rid: u32) -> Result<&'a [u8]> {
        if self.is_invalid_rid(rid) {
            return Err(out_of_bounds_error!());
        }

        let row_size = self.layout.row_size();
        let start = (rid as usize - 1) * row_size;
        Ok(&self.data[start..start + row_size])
    }

    /// Read the value of `column` in row `rid`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `rid` is not a row of this table.
    pub fn read_column(&self, rid: u32, column: usize) -> Result<u32> {
        self.layout.column(column).read_row(self.row_data(rid)?)
    }

    /// Read all column values of row `rid`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `rid` is not a row of this table.
    pub fn read_row(&self, rid: u32) -> Result<Vec<u32>> {
        let mut parser = Parser::new(self.row_data(rid)?);
        self.layout
            .columns()
            .iter()
            .map(|column| column.read(&mut parser))
            .collect()
    }

    /// Find the rows whose `column` equals `key`, in a table sorted by `column`.
    ///
    /// Two binary searches locate the first and one past the last match, the result is a
    /// contiguous list (or [`RidList::EMPTY`]).
    ///
    /// # Errors
    /// Returns an error if a row can not be read.
    pub fn equal_range(&self, column: usize, key: u32) -> Result<RidList> {
        let lower = self.partition_point(column, |value| value < key)?;
        let upper = self.partition_point(column, |value| value <= key)?;

        Ok(RidList::contiguous(lower + 1, upper - lower))
    }

    /// Find the rows whose `column` equals `key` by scanning the whole table.
    ///
    /// # Errors
    /// Returns an error if a row can not be read.
    pub fn find_all(&self, column: usize, key: u32) -> Result<RidList> {
        let mut list = RandomRidList::default();
        for rid in 1..=self.rows {
            if self.read_column(rid, column)? == key {
                list.append(rid);
            }
        }

        if list.length() == 0 {
            return Ok(RidList::EMPTY);
        }

        Ok(RidList::from(list))
    }

    /// Find the rows whose `column` equals `key`, using a binary search when `sorted`.
    ///
    /// # Errors
    /// Returns an error if a row can not be read.
    pub fn children(&self, column: usize, key: u32, sorted: bool) -> Result<RidList> {
        if sorted {
            self.equal_range(column, key)
        } else {
            self.find_all(column, key)
        }
    }

    /// The rids `[list(rid), list(rid + 1))` that a list column (e.g. `FieldList`) assigns to
    /// row `rid`, clamped to `target_rows`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `rid` is not a row of this table.
    pub fn list_range(&self, rid: u32, column: usize, target_rows: u32) -> Result<RidList> {
        let start = self.read_column(rid, column)?;
        let end = if rid < self.rows {
            self.read_column(rid + 1, column)?
        } else {
            target_rows + 1
        };

        if start == 0 || start > target_rows || end <= start {
            return Ok(RidList::EMPTY);
        }

        let end = end.min(target_rows + 1);
        Ok(RidList::contiguous(start, end - start))
    }

    // Number of leading rows (0 based) for which `predicate` holds
    fn partition_point<F>(&self, column: usize, predicate: F) -> Result<u32>
    where
        F: Fn(u32) -> bool,
    {
        let mut low = 0;
        let mut high = self.rows;
        while low < high {
            let mid = low + (high - low) / 2;
            if predicate(self.read_column(mid + 1, column)?) {
                low = mid + 1;
            } else {
                high = mid;
            }
        }

        Ok(low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::types::TableInfo;

    // ClassLayout rows: PackingSize (2), ClassSize (4), Parent (2)
    #[rustfmt::skip]
    const CLASS_LAYOUT: [u8; 40] = [
        0x01, 0x00, 0x10, 0x00, 0x00, 0x00, 0x01, 0x00,
        0x02, 0x00, 0x20, 0x00, 0x00, 0x00, 0x03, 0x00,
        0x04, 0x00, 0x30, 0x00, 0x00, 0x00, 0x03, 0x00,
        0x08, 0x00, 0x40, 0x00, 0x00, 0x00, 0x03, 0x00,
        0x10, 0x00, 0x50, 0x00, 0x00, 0x00, 0x07, 0x00,
    ];

    fn layout() -> TableLayout {
        let info = TableInfo::new_test(&[(TableId::ClassLayout, 5), (TableId::TypeDef, 8)], false, false, false);
        TableLayout::new(TableId::ClassLayout, &info)
    }

    #[test]
    fn rows() {
        let layout = layout();
        let table = MetadataTable::new(&layout, &CLASS_LAYOUT, 5).unwrap();

        assert_eq!(table.id(), TableId::ClassLayout);
        assert_eq!(table.size(), 40);
        assert_eq!(table.read_row(2).unwrap(), vec![2, 0x20, 3]);
        assert_eq!(table.read_column(5, 2).unwrap(), 7);
        assert!(table.is_invalid_rid(0));
        assert!(table.is_invalid_rid(6));
        assert!(table.read_row(6).is_err());
        assert!(MetadataTable::new(&layout, &CLASS_LAYOUT[..39], 5).is_err());
    }

    #[test]
    fn sorted_lookup() {
        let layout = layout();
        let table = MetadataTable::new(&layout, &CLASS_LAYOUT, 5).unwrap();

        assert_eq!(table.equal_range(2, 3).unwrap(), RidList::contiguous(2, 3));
        assert_eq!(table.equal_range(2, 1).unwrap(), RidList::contiguous(1, 1));
        assert_eq!(table.equal_range(2, 7).unwrap(), RidList::contiguous(5, 1));
        assert_eq!(table.equal_range(2, 2).unwrap(), RidList::EMPTY);
        assert_eq!(table.equal_range(2, 9).unwrap(), RidList::EMPTY);
    }

    #[test]
    fn linear_lookup() {
        let layout = layout();
        let table = MetadataTable::new(&layout, &CLASS_LAYOUT, 5).unwrap();

        let list = table.find_all(2, 3).unwrap();
        assert!(matches!(list, RidList::Random(_)));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(table.find_all(2, 5).unwrap(), RidList::EMPTY);
        assert_eq!(table.children(2, 3, true).unwrap().length(), 3);
    }

    #[test]
    fn list_ranges() {
        // ClassSize column used as a list column: 0x10, 0x20, ... against a table of 0x45 rows
        let layout = layout();
        let table = MetadataTable::new(&layout, &CLASS_LAYOUT, 5).unwrap();

        assert_eq!(table.list_range(1, 1, 0x45).unwrap(), RidList::contiguous(0x10, 0x10));
        assert_eq!(table.list_range(5, 1, 0x55).unwrap(), RidList::contiguous(0x50, 6));
        assert_eq!(table.list_range(5, 1, 0x40).unwrap(), RidList::EMPTY);
    }
}
