use std::sync::{atomic::AtomicU32, Arc};

use crate::{
    metadata::{
        module::ModuleDef,
        tables::{
            CodedIndex, CodedIndexType, HeapString, MetadataTable, RowId, TableId, TypeDef,
        },
        token::Token,
    },
    utils::{LazySlot, LazyValue},
    Result,
};

/// The `TypeDef` row as stored in the image
#[derive(Clone, Debug)]
pub struct TypeDefRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a 4-byte bitmask of type `TypeAttributes`
    pub flags: u32,
    /// an index into the String heap
    pub type_name: u32,
    /// an index into the String heap
    pub type_namespace: u32,
    /// an index into the `TypeDef`, `TypeRef`, or `TypeSpec` table
    pub extends: CodedIndex,
    /// an index into the Field table
    pub field_list: u32,
    /// an index into the `MethodDef` table
    pub method_list: u32,
}

impl TypeDefRaw {
    /// Decode row `rid`
    ///
    /// # Errors
    /// Returns an error if the row can not be read or the extends column is invalid
    pub fn read(table: &MetadataTable<'_>, rid: u32) -> Result<Self> {
        let row = table.read_row(rid)?;
        Ok(TypeDefRaw {
            rid,
            token: Token::from_parts(TableId::TypeDef, rid),
            flags: row[0],
            type_name: row[1],
            type_namespace: row[2],
            extends: CodedIndex::decode(row[3], CodedIndexType::TypeDefOrRef)?,
            field_list: row[4],
            method_list: row[5],
        })
    }

    /// Build the entity of this row, its collections stay unmaterialized
    ///
    /// # Errors
    /// Returns an error if a name is not present in the `#Strings` heap
    pub fn to_owned(&self, module: &ModuleDef, row: RowId) -> Result<Arc<TypeDef>> {
        Ok(Arc::new(TypeDef {
            row,
            flags: AtomicU32::new(self.flags),
            name: HeapString::image(self.type_name, module.string(self.type_name)?),
            namespace: HeapString::image(
                self.type_namespace,
                module.string(self.type_namespace)?,
            ),
            extends_index: self.extends,
            extends: LazyValue::empty(),
            fields: LazySlot::empty(),
            methods: LazySlot::empty(),
            interfaces: LazySlot::empty(),
            generic_params: LazySlot::empty(),
            class_layout: LazyValue::empty(),
            nested_types: LazySlot::empty(),
            custom_attributes: LazySlot::empty(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::{TableInfo, TableLayout};

    #[test]
    fn crafted_short() {
        #[rustfmt::skip]
        let data = vec![
            0x01, 0x00, 0x10, 0x00, // flags
            0x42, 0x00,             // type_name
            0x43, 0x00,             // type_namespace
            0x0D, 0x00,             // extends, TypeRef 3
            0x01, 0x00,             // field_list
            0x02, 0x00,             // method_list
        ];

        let info = TableInfo::new_test(&[(TableId::TypeDef, 1)], false, false, false);
        let layout = TableLayout::new(TableId::TypeDef, &info);
        let table = MetadataTable::new(&layout, &data, 1).unwrap();

        let row = TypeDefRaw::read(&table, 1).unwrap();
        assert_eq!(row.token.value(), 0x0200_0001);
        assert_eq!(row.flags, 0x0010_0001);
        assert_eq!(row.type_name, 0x42);
        assert_eq!(row.type_namespace, 0x43);
        assert_eq!(row.extends, CodedIndex::new(TableId::TypeRef, 3));
        assert_eq!(row.field_list, 1);
        assert_eq!(row.method_list, 2);
    }
}
