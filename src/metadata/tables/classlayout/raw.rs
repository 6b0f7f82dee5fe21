use std::sync::{atomic::AtomicU32, Arc};

use crate::{
    metadata::{
        tables::{ClassLayout, MetadataTable, RowId, TableId},
        token::Token,
    },
    Result,
};

/// The `ClassLayout` row as stored in the image
#[derive(Clone, Debug)]
pub struct ClassLayoutRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a 2-byte constant
    pub packing_size: u32,
    /// a 4-byte constant
    pub class_size: u32,
    /// an index into the `TypeDef` table
    pub parent: u32,
}

impl ClassLayoutRaw {
    /// Decode row `rid`
    ///
    /// # Errors
    /// Returns an error if the row can not be read
    pub fn read(table: &MetadataTable<'_>, rid: u32) -> Result<Self> {
        let row = table.read_row(rid)?;
        Ok(ClassLayoutRaw {
            rid,
            token: Token::from_parts(TableId::ClassLayout, rid),
            packing_size: row[0],
            class_size: row[1],
            parent: row[2],
        })
    }

    /// Build the entity of this row
    #[must_use]
    pub fn to_owned(&self, row: RowId) -> Arc<ClassLayout> {
        Arc::new(ClassLayout {
            row,
            packing_size: AtomicU32::new(self.packing_size),
            class_size: AtomicU32::new(self.class_size),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::{TableInfo, TableLayout};

    #[test]
    fn crafted_long() {
        #[rustfmt::skip]
        let data = vec![
            0x08, 0x00,             // packing_size
            0x00, 0x01, 0x00, 0x00, // class_size
            0x01, 0x00, 0x01, 0x00, // parent
        ];

        let info = TableInfo::new_test(
            &[(TableId::ClassLayout, 1), (TableId::TypeDef, 0x10001)],
            false,
            false,
            false,
        );
        let layout = TableLayout::new(TableId::ClassLayout, &info);
        let table = MetadataTable::new(&layout, &data, 1).unwrap();

        let row = ClassLayoutRaw::read(&table, 1).unwrap();
        assert_eq!(row.token.value(), 0x0F00_0001);
        assert_eq!(row.packing_size, 8);
        assert_eq!(row.class_size, 0x100);
        assert_eq!(row.parent, 0x0001_0001);
    }
}
