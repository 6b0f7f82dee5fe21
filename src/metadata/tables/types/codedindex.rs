//! Coded indexes (ECMA-335 II.24.2.6).
//!
//! A coded index packs a table selector into the low bits of a column value and the row id into
//! the remaining bits. The number of tag bits depends on how many tables the index can refer to,
//! the column width depends on the largest referenced table (see
//! [`crate::metadata::tables::TableInfo::coded_index_bytes`]).

use strum::{EnumCount, EnumIter};

use crate::{
    metadata::{tables::TableId, token::Token},
    Result,
};

/// The kinds of coded index used by the metadata table schema.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, EnumIter, EnumCount)]
#[repr(usize)]
pub enum CodedIndexType {
    /// `TypeDef`, `TypeRef` or `TypeSpec`
    TypeDefOrRef,
    /// `Field`, `Param` or `Property`
    HasConstant,
    /// Any row that can own a custom attribute
    HasCustomAttribute,
    /// `Field` or `Param`
    HasFieldMarshal,
    /// `TypeDef`, `MethodDef` or `Assembly`
    HasDeclSecurity,
    /// `TypeDef`, `TypeRef`, `ModuleRef`, `MethodDef` or `TypeSpec`
    MemberRefParent,
    /// `Event` or `Property`
    HasSemantics,
    /// `MethodDef` or `MemberRef`
    MethodDefOrRef,
    /// `Field` or `MethodDef`
    MemberForwarded,
    /// `File`, `AssemblyRef` or `ExportedType`
    Implementation,
    /// `MethodDef` (tag 2) or `MemberRef` (tag 3). Tags 0, 1 and 4 are reserved.
    CustomAttributeType,
    /// `Module`, `ModuleRef`, `AssemblyRef` or `TypeRef`
    ResolutionScope,
    /// `TypeDef` or `MethodDef`
    TypeOrMethodDef,
}

impl CodedIndexType {
    /// Returns the tag slots of this coded index, in encoding order.
    ///
    /// Reserved tags are `None`; they take part in the tag width but can never be decoded.
    #[must_use]
    pub fn slots(&self) -> &'static [Option<TableId>] {
        match self {
            CodedIndexType::TypeDefOrRef => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasConstant => &[
                Some(TableId::Field),
                Some(TableId::Param),
                Some(TableId::Property),
            ],
            CodedIndexType::HasCustomAttribute => &[
                Some(TableId::MethodDef),
                Some(TableId::Field),
                Some(TableId::TypeRef),
                Some(TableId::TypeDef),
                Some(TableId::Param),
                Some(TableId::InterfaceImpl),
                Some(TableId::MemberRef),
                Some(TableId::Module),
                // 'Permission' in the standard, which is the DeclSecurity table
                Some(TableId::DeclSecurity),
                Some(TableId::Property),
                Some(TableId::Event),
                Some(TableId::StandAloneSig),
                Some(TableId::ModuleRef),
                Some(TableId::TypeSpec),
                Some(TableId::Assembly),
                Some(TableId::AssemblyRef),
                Some(TableId::File),
                Some(TableId::ExportedType),
                Some(TableId::ManifestResource),
                Some(TableId::GenericParam),
                Some(TableId::GenericParamConstraint),
                Some(TableId::MethodSpec),
            ],
            CodedIndexType::HasFieldMarshal => &[Some(TableId::Field), Some(TableId::Param)],
            CodedIndexType::HasDeclSecurity => &[
                Some(TableId::TypeDef),
                Some(TableId::MethodDef),
                Some(TableId::Assembly),
            ],
            CodedIndexType::MemberRefParent => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::ModuleRef),
                Some(TableId::MethodDef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasSemantics => &[Some(TableId::Event), Some(TableId::Property)],
            CodedIndexType::MethodDefOrRef => {
                &[Some(TableId::MethodDef), Some(TableId::MemberRef)]
            }
            CodedIndexType::MemberForwarded => &[Some(TableId::Field), Some(TableId::MethodDef)],
            CodedIndexType::Implementation => &[
                Some(TableId::File),
                Some(TableId::AssemblyRef),
                Some(TableId::ExportedType),
            ],
            CodedIndexType::CustomAttributeType => &[
                None,
                None,
                Some(TableId::MethodDef),
                Some(TableId::MemberRef),
                None,
            ],
            CodedIndexType::ResolutionScope => &[
                Some(TableId::Module),
                Some(TableId::ModuleRef),
                Some(TableId::AssemblyRef),
                Some(TableId::TypeRef),
            ],
            CodedIndexType::TypeOrMethodDef => &[Some(TableId::TypeDef), Some(TableId::MethodDef)],
        }
    }

    /// Returns the tables this coded index can refer to.
    pub fn tables(&self) -> impl Iterator<Item = TableId> {
        self.slots().iter().filter_map(|slot| *slot)
    }

    /// Returns the number of low bits used for the tag.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn tag_bits(&self) -> u8 {
        let slots = self.slots().len();
        // ceil(log2(slots))
        (usize::BITS - (slots - 1).leading_zeros()) as u8
    }

    /// Returns true if `table` can be encoded by this coded index.
    #[must_use]
    pub fn contains(&self, table: TableId) -> bool {
        self.tables().any(|candidate| candidate == table)
    }
}

/// A decoded coded index value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CodedIndex {
    /// The table this index is referring to
    pub tag: TableId,
    /// The 1-based row id, 0 for a null reference
    pub row: u32,
    /// The token of the referenced row
    pub token: Token,
}

impl CodedIndex {
    /// Creates a new `CodedIndex` for `row` in table `tag`.
    #[must_use]
    pub fn new(tag: TableId, row: u32) -> CodedIndex {
        CodedIndex {
            tag,
            row,
            token: Token::from_parts(tag, row),
        }
    }

    /// A null reference, tagged with the first table of `ci_type`
    #[must_use]
    pub fn null(ci_type: CodedIndexType) -> CodedIndex {
        let tag = ci_type.tables().next().unwrap_or(TableId::Module);
        CodedIndex::new(tag, 0)
    }

    /// Returns true if this index does not refer to a row.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row == 0
    }

    /// Decode a raw column value of coded index type `ci_type`.
    ///
    /// A value with row 0 is a null reference and decodes even when its tag is reserved.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the tag is out of range or reserved.
    pub fn decode(value: u32, ci_type: CodedIndexType) -> Result<CodedIndex> {
        let tag_bits = ci_type.tag_bits();
        let tag = (value & ((1 << tag_bits) - 1)) as usize;
        let row = value >> tag_bits;

        match ci_type.slots().get(tag) {
            Some(Some(table)) => Ok(CodedIndex::new(*table, row)),
            Some(None) if row == 0 => Ok(CodedIndex::null(ci_type)),
            _ => Err(malformed_error!(
                "Invalid tag {} for coded index {:?}",
                tag,
                ci_type
            )),
        }
    }

    /// Encode this index as a raw column value of coded index type `ci_type`.
    ///
    /// A null reference always encodes to 0.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the table is not part of `ci_type`.
    pub fn encode(&self, ci_type: CodedIndexType) -> Result<u32> {
        if self.row == 0 {
            return Ok(0);
        }

        let Some(tag) = ci_type
            .slots()
            .iter()
            .position(|slot| *slot == Some(self.tag))
        else {
            return Err(malformed_error!(
                "Table {:?} can not be encoded as {:?}",
                self.tag,
                ci_type
            ));
        };

        #[allow(clippy::cast_possible_truncation)]
        Ok((self.row << ci_type.tag_bits()) | tag as u32)
    }
}

impl TryFrom<Token> for CodedIndex {
    type Error = crate::Error;

    fn try_from(token: Token) -> Result<Self> {
        match token.table_id() {
            Some(table) => Ok(CodedIndex::new(table, token.row())),
            None => Err(malformed_error!("Token {} has an unknown table", token)),
        }
    }
}
