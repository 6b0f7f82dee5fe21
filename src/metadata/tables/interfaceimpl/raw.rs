use std::sync::{Arc, RwLock};

use crate::{
    metadata::{
        module::ModuleDef,
        resolver::GenericParamContext,
        tables::{CodedIndex, CodedIndexType, InterfaceImpl, MetadataTable, RowId, TableId},
        token::Token,
    },
    utils::LazySlot,
    Result,
};

/// The `InterfaceImpl` row as stored in the image
#[derive(Clone, Debug)]
pub struct InterfaceImplRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// an index into the `TypeDef` table
    pub class: u32,
    /// an index into the `TypeDef`, `TypeRef`, or `TypeSpec` table
    pub interface: CodedIndex,
}

impl InterfaceImplRaw {
    /// Decode row `rid`
    ///
    /// # Errors
    /// Returns an error if the row can not be read or the interface column is invalid
    pub fn read(table: &MetadataTable<'_>, rid: u32) -> Result<Self> {
        let row = table.read_row(rid)?;
        Ok(InterfaceImplRaw {
            rid,
            token: Token::from_parts(TableId::InterfaceImpl, rid),
            class: row[0],
            interface: CodedIndex::decode(row[1], CodedIndexType::TypeDefOrRef)?,
        })
    }

    /// Build the entity of this row, resolving the interface in the generic context of the
    /// implementing type
    ///
    /// # Errors
    /// Returns an error if the interface column references a row that does not exist
    pub fn to_owned(&self, module: &ModuleDef, row: RowId) -> Result<Arc<InterfaceImpl>> {
        let context = module
            .type_def(self.class)
            .map(GenericParamContext::for_type)
            .unwrap_or_default();
        let interface = module
            .type_def_or_ref(self.interface)?
            .map(|interface| module.instantiate(interface, &context));

        Ok(Arc::new(InterfaceImpl {
            row,
            class: self.class,
            interface: RwLock::new(interface),
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
            0x01, 0x00, // class
            0x06, 0x00, // interface, TypeSpec 1
            0x02, 0x00, // class
            0x04, 0x00, // interface, TypeDef 1
        ];

        let info = TableInfo::new_test(
            &[(TableId::InterfaceImpl, 2), (TableId::TypeDef, 2)],
            false,
            false,
            false,
        );
        let layout = TableLayout::new(TableId::InterfaceImpl, &info);
        let table = MetadataTable::new(&layout, &data, 2).unwrap();

        let row = InterfaceImplRaw::read(&table, 1).unwrap();
        assert_eq!(row.token.value(), 0x0900_0001);
        assert_eq!(row.class, 1);
        assert_eq!(row.interface, CodedIndex::new(TableId::TypeSpec, 1));

        let row = InterfaceImplRaw::read(&table, 2).unwrap();
        assert_eq!(row.interface, CodedIndex::new(TableId::TypeDef, 1));
    }
}
