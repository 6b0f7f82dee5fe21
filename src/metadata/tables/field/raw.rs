use std::sync::{atomic::AtomicU32, Arc};

use crate::{
    metadata::{
        module::ModuleDef,
        tables::{Field, HeapBlob, HeapString, MetadataTable, RowId, TableId},
        token::Token,
    },
    utils::LazySlot,
    Result,
};

/// The `Field` row as stored in the image
#[derive(Clone, Debug)]
pub struct FieldRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a 2-byte bitmask of type `FieldAttributes`
    pub flags: u32,
    /// an index into the String heap
    pub name: u32,
    /// an index into the Blob heap
    pub signature: u32,
}

impl FieldRaw {
    /// Decode row `rid`
    ///
    /// # Errors
    /// Returns an error if the row can not be read
    pub fn read(table: &MetadataTable<'_>, rid: u32) -> Result<Self> {
        let row = table.read_row(rid)?;
        Ok(FieldRaw {
            rid,
            token: Token::from_parts(TableId::Field, rid),
            flags: row[0],
            name: row[1],
            signature: row[2],
        })
    }

    /// Build the entity of this row
    ///
    /// # Errors
    /// Returns an error if the name or signature is not present in its heap
    pub fn to_owned(&self, module: &ModuleDef, row: RowId) -> Result<Arc<Field>> {
        Ok(Arc::new(Field {
            row,
            flags: AtomicU32::new(self.flags),
            name: HeapString::image(self.name, module.string(self.name)?),
            signature: HeapBlob::image(self.signature, module.blob(self.signature)?),
            custom_attributes: LazySlot::empty(),
        }))
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
            0x11, 0x00,             // flags
            0x01, 0x02, 0x03, 0x04, // name
            0x05, 0x06, 0x07, 0x08, // signature
        ];

        let info = TableInfo::new_test(&[(TableId::Field, 1)], true, true, true);
        let layout = TableLayout::new(TableId::Field, &info);
        let table = MetadataTable::new(&layout, &data, 1).unwrap();

        let row = FieldRaw::read(&table, 1).unwrap();
        assert_eq!(row.token.value(), 0x0400_0001);
        assert_eq!(row.flags, 0x11);
        assert_eq!(row.name, 0x0403_0201);
        assert_eq!(row.signature, 0x0807_0605);
    }
}
