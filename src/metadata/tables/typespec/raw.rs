use std::sync::Arc;

use crate::{
    metadata::{
        module::ModuleDef,
        tables::{MetadataTable, RowId, TableId, TypeSpec},
        token::Token,
    },
    utils::LazySlot,
    Result,
};

/// The `TypeSpec` row as stored in the image
#[derive(Clone, Debug)]
pub struct TypeSpecRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// an index into the Blob heap
    pub signature: u32,
}

impl TypeSpecRaw {
    /// Decode row `rid`
    ///
    /// # Errors
    /// Returns an error if the row can not be read
    pub fn read(table: &MetadataTable<'_>, rid: u32) -> Result<Self> {
        Ok(TypeSpecRaw {
            rid,
            token: Token::from_parts(TableId::TypeSpec, rid),
            signature: table.read_column(rid, 0)?,
        })
    }

    /// Build the entity of this row, the signature is parsed on first access
    ///
    /// # Errors
    /// Returns an error if the signature is not present in the `#Blob` heap
    pub fn to_owned(&self, module: &ModuleDef, row: RowId) -> Result<Arc<TypeSpec>> {
        Ok(Arc::new(TypeSpec {
            row,
            signature_index: self.signature,
            signature: module.blob(self.signature)?.to_vec(),
            parsed: LazySlot::empty(),
            custom_attributes: LazySlot::empty(),
        }))
    }
}
