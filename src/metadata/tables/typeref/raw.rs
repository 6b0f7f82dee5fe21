use std::sync::Arc;

use crate::{
    metadata::{
        module::ModuleDef,
        tables::{CodedIndex, CodedIndexType, HeapString, MetadataTable, RowId, TableId, TypeRef},
        token::Token,
    },
    utils::{LazySlot, LazyValue},
    Result,
};

/// The `TypeRef` row as stored in the image
#[derive(Clone, Debug)]
pub struct TypeRefRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// an index into a `Module`, `ModuleRef`, `AssemblyRef` or `TypeRef` table
    pub resolution_scope: CodedIndex,
    /// an index into the String heap
    pub type_name: u32,
    /// an index into the String heap
    pub type_namespace: u32,
}

impl TypeRefRaw {
    /// Decode row `rid`
    ///
    /// # Errors
    /// Returns an error if the row can not be read or the scope column is invalid
    pub fn read(table: &MetadataTable<'_>, rid: u32) -> Result<Self> {
        let row = table.read_row(rid)?;
        Ok(TypeRefRaw {
            rid,
            token: Token::from_parts(TableId::TypeRef, rid),
            resolution_scope: CodedIndex::decode(row[0], CodedIndexType::ResolutionScope)?,
            type_name: row[1],
            type_namespace: row[2],
        })
    }

    /// Build the entity of this row
    ///
    /// # Errors
    /// Returns an error if a name is not present in the `#Strings` heap
    pub fn to_owned(&self, module: &ModuleDef, row: RowId) -> Result<Arc<TypeRef>> {
        Ok(Arc::new(TypeRef {
            row,
            scope_index: self.resolution_scope,
            scope: LazyValue::empty(),
            name: HeapString::image(self.type_name, module.string(self.type_name)?),
            namespace: HeapString::image(
                self.type_namespace,
                module.string(self.type_namespace)?,
            ),
            custom_attributes: LazySlot::empty(),
        }))
    }
}
