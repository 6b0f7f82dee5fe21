use std::sync::{Arc, RwLock};

use crate::{
    metadata::{
        module::ModuleDef,
        tables::{
            CodedIndex, CodedIndexType, HeapBlob, HeapString, MemberRef, MemberRefParent,
            MetadataTable, RowId, TableId,
        },
        token::Token,
    },
    utils::LazySlot,
    Result,
};

/// The `MemberRef` row as stored in the image
#[derive(Clone, Debug)]
pub struct MemberRefRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// an index into the `MethodDef`, `ModuleRef`, `TypeDef`, `TypeRef`, or `TypeSpec` table
    pub class: CodedIndex,
    /// an index into the String heap
    pub name: u32,
    /// an index into the Blob heap
    pub signature: u32,
}

impl MemberRefRaw {
    /// Decode row `rid`
    ///
    /// # Errors
    /// Returns an error if the row can not be read or the class column is invalid
    pub fn read(table: &MetadataTable<'_>, rid: u32) -> Result<Self> {
        let row = table.read_row(rid)?;
        Ok(MemberRefRaw {
            rid,
            token: Token::from_parts(TableId::MemberRef, rid),
            class: CodedIndex::decode(row[0], CodedIndexType::MemberRefParent)?,
            name: row[1],
            signature: row[2],
        })
    }

    /// Build the entity of this row, resolving its parent
    ///
    /// # Errors
    /// Returns an error if the parent does not exist or a heap value is missing
    pub fn to_owned(&self, module: &ModuleDef, row: RowId) -> Result<Arc<MemberRef>> {
        let class = match self.class.tag {
            TableId::TypeDef => MemberRefParent::TypeDef(module.type_def(self.class.row)?),
            TableId::TypeRef => MemberRefParent::TypeRef(module.type_ref(self.class.row)?),
            TableId::TypeSpec => MemberRefParent::TypeSpec(module.type_spec(self.class.row)?),
            TableId::MethodDef => MemberRefParent::MethodDef(module.method_def(self.class.row)?),
            TableId::ModuleRef => MemberRefParent::ModuleRef(self.class.row),
            _ => {
                return Err(malformed_error!(
                    "Invalid MemberRef parent {:?} for {}",
                    self.class.tag,
                    self.token
                ))
            }
        };

        Ok(Arc::new(MemberRef {
            row,
            class: RwLock::new(class),
            name: HeapString::image(self.name, module.string(self.name)?),
            signature: HeapBlob::image(self.signature, module.blob(self.signature)?),
            custom_attributes: LazySlot::empty(),
        }))
    }
}
