use std::sync::{Arc, RwLock};

use crate::{
    metadata::{
        module::ModuleDef,
        tables::{
            CodedIndex, CodedIndexType, CustomAttribute, HeapBlob, MetadataTable, MethodDefOrRef,
            RowId, TableId,
        },
        token::Token,
    },
    Result,
};

/// The `CustomAttribute` row as stored in the image
#[derive(Clone, Debug)]
pub struct CustomAttributeRaw {
    /// `RowID`
    pub rid: u32,
    /// `Token`
    pub token: Token,
    /// a `HasCustomAttribute` coded index
    pub parent: CodedIndex,
    /// a `CustomAttributeType` coded index
    pub constructor: CodedIndex,
    /// an index into the Blob heap
    pub value: u32,
}

impl CustomAttributeRaw {
    /// Decode row `rid`
    ///
    /// # Errors
    /// Returns an error if the row can not be read or a coded index is invalid
    pub fn read(table: &MetadataTable<'_>, rid: u32) -> Result<Self> {
        let row = table.read_row(rid)?;
        Ok(CustomAttributeRaw {
            rid,
            token: Token::from_parts(TableId::CustomAttribute, rid),
            parent: CodedIndex::decode(row[0], CodedIndexType::HasCustomAttribute)?,
            constructor: CodedIndex::decode(row[1], CodedIndexType::CustomAttributeType)?,
            value: row[2],
        })
    }

    /// Build the entity of this row, resolving the constructor
    ///
    /// # Errors
    /// Returns an error if the constructor does not exist or the value is not in the `#Blob`
    /// heap
    pub fn to_owned(&self, module: &ModuleDef, row: RowId) -> Result<Arc<CustomAttribute>> {
        let constructor = match self.constructor.tag {
            _ if self.constructor.is_null() => None,
            TableId::MethodDef => Some(MethodDefOrRef::MethodDef(
                module.method_def(self.constructor.row)?,
            )),
            TableId::MemberRef => Some(MethodDefOrRef::MemberRef(
                module.member_ref(self.constructor.row)?,
            )),
            _ => {
                return Err(malformed_error!(
                    "Invalid attribute constructor {:?} for {}",
                    self.constructor.tag,
                    self.token
                ))
            }
        };

        Ok(Arc::new(CustomAttribute {
            row,
            constructor: RwLock::new(constructor),
            value: HeapBlob::image(self.value, module.blob(self.value)?),
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
            0x2E, 0x00, // parent, Assembly 1
            0x0B, 0x00, // constructor, MemberRef 1
            0x10, 0x00, // value
            0x23, 0x00, // parent, TypeDef 1
            0x0A, 0x00, // constructor, MethodDef 1
            0x00, 0x00, // value
        ];

        let info = TableInfo::new_test(
            &[(TableId::CustomAttribute, 2), (TableId::TypeDef, 1)],
            false,
            false,
            false,
        );
        let layout = TableLayout::new(TableId::CustomAttribute, &info);
        let table = MetadataTable::new(&layout, &data, 2).unwrap();

        let row = CustomAttributeRaw::read(&table, 1).unwrap();
        assert_eq!(row.token.value(), 0x0C00_0001);
        assert_eq!(row.parent, CodedIndex::new(TableId::Assembly, 1));
        assert_eq!(row.constructor, CodedIndex::new(TableId::MemberRef, 1));
        assert_eq!(row.value, 0x10);

        let row = CustomAttributeRaw::read(&table, 2).unwrap();
        assert_eq!(row.parent, CodedIndex::new(TableId::TypeDef, 1));
        assert_eq!(row.constructor, CodedIndex::new(TableId::MethodDef, 1));
    }
}
