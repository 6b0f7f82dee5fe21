use std::sync::{atomic::AtomicU32, Arc};

use crate::{
    metadata::{
        module::ModuleDef,
        tables::{
            CodedIndex, CodedIndexType, GenericParam, HeapString, MetadataTable, RowId, TableId,
        },
        token::Token,
    },
    utils::LazySlot,
    Result,
};

/// The `GenericParam` row as stored in the image
#[derive(Clone, Debug)]
pub struct GenericParamRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a 2-byte index of the parameter, numbered left-to-right from zero
    pub number: u32,
    /// a 2-byte bitmask of type `GenericParamAttributes`
    pub flags: u32,
    /// a `TypeOrMethodDef` coded index
    pub owner: CodedIndex,
    /// an index into the String heap
    pub name: u32,
}

impl GenericParamRaw {
    /// Decode row `rid`
    ///
    /// # Errors
    /// Returns an error if the row can not be read or the owner column is invalid
    pub fn read(table: &MetadataTable<'_>, rid: u32) -> Result<Self> {
        let row = table.read_row(rid)?;
        Ok(GenericParamRaw {
            rid,
            token: Token::from_parts(TableId::GenericParam, rid),
            number: row[0],
            flags: row[1],
            owner: CodedIndex::decode(row[2], CodedIndexType::TypeOrMethodDef)?,
            name: row[3],
        })
    }

    /// Build the entity of this row
    ///
    /// # Errors
    /// Returns an error if the name is not present in the `#Strings` heap
    pub fn to_owned(&self, module: &ModuleDef, row: RowId) -> Result<Arc<GenericParam>> {
        Ok(Arc::new(GenericParam {
            row,
            number: AtomicU32::new(self.number),
            flags: AtomicU32::new(self.flags),
            name: HeapString::image(self.name, module.string(self.name)?),
            custom_attributes: LazySlot::empty(),
        }))
    }
}
