use std::sync::{atomic::AtomicU32, Arc};

use crate::{
    metadata::{
        module::ModuleDef,
        tables::{HeapBlob, HeapString, MetadataTable, MethodDef, RowId, TableId},
        token::Token,
    },
    utils::LazySlot,
    Result,
};

/// The `MethodDef` row as stored in the image
#[derive(Clone, Debug)]
pub struct MethodDefRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a 4-byte constant
    pub rva: u32,
    /// a 2-byte bitmask of type `MethodImplAttributes`
    pub impl_flags: u32,
    /// a 2-byte bitmask of type `MethodAttributes`
    pub flags: u32,
    /// an index into the String heap
    pub name: u32,
    /// an index into the Blob heap
    pub signature: u32,
    /// an index into the Param table
    pub param_list: u32,
}

impl MethodDefRaw {
    /// Decode row `rid`
    ///
    /// # Errors
    /// Returns an error if the row can not be read
    pub fn read(table: &MetadataTable<'_>, rid: u32) -> Result<Self> {
        let row = table.read_row(rid)?;
        Ok(MethodDefRaw {
            rid,
            token: Token::from_parts(TableId::MethodDef, rid),
            rva: row[0],
            impl_flags: row[1],
            flags: row[2],
            name: row[3],
            signature: row[4],
            param_list: row[5],
        })
    }

    /// Build the entity of this row
    ///
    /// # Errors
    /// Returns an error if the name or signature is not present in its heap
    pub fn to_owned(&self, module: &ModuleDef, row: RowId) -> Result<Arc<MethodDef>> {
        Ok(Arc::new(MethodDef {
            row,
            rva: AtomicU32::new(self.rva),
            impl_flags: AtomicU32::new(self.impl_flags),
            flags: AtomicU32::new(self.flags),
            name: HeapString::image(self.name, module.string(self.name)?),
            signature: HeapBlob::image(self.signature, module.blob(self.signature)?),
            param_list: self.param_list,
            generic_params: LazySlot::empty(),
            custom_attributes: LazySlot::empty(),
        }))
    }
}
