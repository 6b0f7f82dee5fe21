//! The fixed column schema of every metadata table (ECMA-335 II.22) and the layout pass that
//! turns it into concrete offsets and widths.

use strum::{EnumCount, IntoEnumIterator};

use crate::metadata::tables::types::{
    CodedIndexType as C, ColumnInfo, ColumnSize, ColumnSize::*, TableId, TableInfo,
};

/// Name and logical size of one column
pub type ColumnDef = (&'static str, ColumnSize);

/// Returns the column definitions of `table`, in row order.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn columns(table: TableId) -> &'static [ColumnDef] {
    match table {
        TableId::Module => &[
            ("Generation", UInt16),
            ("Name", Strings),
            ("Mvid", Guid),
            ("EncId", Guid),
            ("EncBaseId", Guid),
        ],
        TableId::TypeRef => &[
            ("ResolutionScope", Coded(C::ResolutionScope)),
            ("TypeName", Strings),
            ("TypeNamespace", Strings),
        ],
        TableId::TypeDef => &[
            ("Flags", UInt32),
            ("TypeName", Strings),
            ("TypeNamespace", Strings),
            ("Extends", Coded(C::TypeDefOrRef)),
            ("FieldList", Table(TableId::Field)),
            ("MethodList", Table(TableId::MethodDef)),
        ],
        TableId::FieldPtr => &[("Field", Table(TableId::Field))],
        TableId::Field => &[("Flags", UInt16), ("Name", Strings), ("Signature", Blob)],
        TableId::MethodPtr => &[("Method", Table(TableId::MethodDef))],
        TableId::MethodDef => &[
            ("RVA", UInt32),
            ("ImplFlags", UInt16),
            ("Flags", UInt16),
            ("Name", Strings),
            ("Signature", Blob),
            ("ParamList", Table(TableId::Param)),
        ],
        TableId::ParamPtr => &[("Param", Table(TableId::Param))],
        TableId::Param => &[("Flags", UInt16), ("Sequence", UInt16), ("Name", Strings)],
        TableId::InterfaceImpl => &[
            ("Class", Table(TableId::TypeDef)),
            ("Interface", Coded(C::TypeDefOrRef)),
        ],
        TableId::MemberRef => &[
            ("Class", Coded(C::MemberRefParent)),
            ("Name", Strings),
            ("Signature", Blob),
        ],
        TableId::Constant => &[
            ("Type", Byte),
            ("Padding", Byte),
            ("Parent", Coded(C::HasConstant)),
            ("Value", Blob),
        ],
        TableId::CustomAttribute => &[
            ("Parent", Coded(C::HasCustomAttribute)),
            ("Type", Coded(C::CustomAttributeType)),
            ("Value", Blob),
        ],
        TableId::FieldMarshal => &[("Parent", Coded(C::HasFieldMarshal)), ("NativeType", Blob)],
        TableId::DeclSecurity => &[
            ("Action", UInt16),
            ("Parent", Coded(C::HasDeclSecurity)),
            ("PermissionSet", Blob),
        ],
        TableId::ClassLayout => &[
            ("PackingSize", UInt16),
            ("ClassSize", UInt32),
            ("Parent", Table(TableId::TypeDef)),
        ],
        TableId::FieldLayout => &[("Offset", UInt32), ("Field", Table(TableId::Field))],
        TableId::StandAloneSig => &[("Signature", Blob)],
        TableId::EventMap => &[
            ("Parent", Table(TableId::TypeDef)),
            ("EventList", Table(TableId::Event)),
        ],
        TableId::EventPtr => &[("Event", Table(TableId::Event))],
        TableId::Event => &[
            ("EventFlags", UInt16),
            ("Name", Strings),
            ("EventType", Coded(C::TypeDefOrRef)),
        ],
        TableId::PropertyMap => &[
            ("Parent", Table(TableId::TypeDef)),
            ("PropertyList", Table(TableId::Property)),
        ],
        TableId::PropertyPtr => &[("Property", Table(TableId::Property))],
        TableId::Property => &[("Flags", UInt16), ("Name", Strings), ("Type", Blob)],
        TableId::MethodSemantics => &[
            ("Semantics", UInt16),
            ("Method", Table(TableId::MethodDef)),
            ("Association", Coded(C::HasSemantics)),
        ],
        TableId::MethodImpl => &[
            ("Class", Table(TableId::TypeDef)),
            ("MethodBody", Coded(C::MethodDefOrRef)),
            ("MethodDeclaration", Coded(C::MethodDefOrRef)),
        ],
        TableId::ModuleRef => &[("Name", Strings)],
        TableId::TypeSpec => &[("Signature", Blob)],
        TableId::ImplMap => &[
            ("MappingFlags", UInt16),
            ("MemberForwarded", Coded(C::MemberForwarded)),
            ("ImportName", Strings),
            ("ImportScope", Table(TableId::ModuleRef)),
        ],
        TableId::FieldRVA => &[("RVA", UInt32), ("Field", Table(TableId::Field))],
        TableId::EncLog => &[("Token", UInt32), ("FuncCode", UInt32)],
        TableId::EncMap => &[("Token", UInt32)],
        TableId::Assembly => &[
            ("HashAlgId", UInt32),
            ("MajorVersion", UInt16),
            ("MinorVersion", UInt16),
            ("BuildNumber", UInt16),
            ("RevisionNumber", UInt16),
            ("Flags", UInt32),
            ("PublicKey", Blob),
            ("Name", Strings),
            ("Culture", Strings),
        ],
        TableId::AssemblyProcessor => &[("Processor", UInt32)],
        TableId::AssemblyOS => &[
            ("OSPlatformId", UInt32),
            ("OSMajorVersion", UInt32),
            ("OSMinorVersion", UInt32),
        ],
        TableId::AssemblyRef => &[
            ("MajorVersion", UInt16),
            ("MinorVersion", UInt16),
            ("BuildNumber", UInt16),
            ("RevisionNumber", UInt16),
            ("Flags", UInt32),
            ("PublicKeyOrToken", Blob),
            ("Name", Strings),
            ("Culture", Strings),
            ("HashValue", Blob),
        ],
        TableId::AssemblyRefProcessor => &[
            ("Processor", UInt32),
            ("AssemblyRef", Table(TableId::AssemblyRef)),
        ],
        TableId::AssemblyRefOS => &[
            ("OSPlatformId", UInt32),
            ("OSMajorVersion", UInt32),
            ("OSMinorVersion", UInt32),
            ("AssemblyRef", Table(TableId::AssemblyRef)),
        ],
        TableId::File => &[("Flags", UInt32), ("Name", Strings), ("HashValue", Blob)],
        TableId::ExportedType => &[
            ("Flags", UInt32),
            ("TypeDefId", UInt32),
            ("TypeName", Strings),
            ("TypeNamespace", Strings),
            ("Implementation", Coded(C::Implementation)),
        ],
        TableId::ManifestResource => &[
            ("Offset", UInt32),
            ("Flags", UInt32),
            ("Name", Strings),
            ("Implementation", Coded(C::Implementation)),
        ],
        TableId::NestedClass => &[
            ("NestedClass", Table(TableId::TypeDef)),
            ("EnclosingClass", Table(TableId::TypeDef)),
        ],
        TableId::GenericParam => &[
            ("Number", UInt16),
            ("Flags", UInt16),
            ("Owner", Coded(C::TypeOrMethodDef)),
            ("Name", Strings),
        ],
        TableId::MethodSpec => &[
            ("Method", Coded(C::MethodDefOrRef)),
            ("Instantiation", Blob),
        ],
        TableId::GenericParamConstraint => &[
            ("Owner", Table(TableId::GenericParam)),
            ("Constraint", Coded(C::TypeDefOrRef)),
        ],
    }
}

/// Returns the primary key column of a table that must be sorted (ECMA-335 II.22), or `None`
/// for tables without an ordering requirement.
///
/// `GenericParam` is additionally ordered by `Number` within one owner.
#[must_use]
pub fn sort_key(table: TableId) -> Option<usize> {
    match table {
        TableId::CustomAttribute
        | TableId::FieldMarshal
        | TableId::InterfaceImpl
        | TableId::MethodImpl
        | TableId::NestedClass
        | TableId::GenericParamConstraint => Some(0),
        TableId::DeclSecurity | TableId::FieldLayout | TableId::ImplMap | TableId::FieldRVA => {
            Some(1)
        }
        TableId::Constant
        | TableId::ClassLayout
        | TableId::MethodSemantics
        | TableId::GenericParam => Some(2),
        _ => None,
    }
}

/// The `Sorted` bit vector of the tables that carry an ordering requirement
#[must_use]
pub fn sorted_mask() -> u64 {
    TableId::iter()
        .filter(|table| sort_key(*table).is_some())
        .fold(0, |mask, table| mask | (1 << table as u64))
}

/// The finalized layout of one table: every column with offset and width, and the row size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableLayout {
    table: TableId,
    columns: Vec<ColumnInfo>,
    row_size: usize,
}

impl TableLayout {
    /// Run the layout pass for `table` under `info`.
    #[must_use]
    pub fn new(table: TableId, info: &TableInfo) -> Self {
        let mut offset = 0;
        let columns = columns(table)
            .iter()
            .enumerate()
            .map(|(index, (name, size))| {
                let width = size.width(info);
                let column = ColumnInfo::new(index, *name, *size, offset, width);
                offset += width as usize;
                column
            })
            .collect();

        TableLayout {
            table,
            columns,
            row_size: offset,
        }
    }

    /// Run the layout pass for all tables, indexed by [`TableId`]
    #[must_use]
    pub fn all(info: &TableInfo) -> Vec<TableLayout> {
        let mut layouts = Vec::with_capacity(TableId::COUNT);
        for table in TableId::iter() {
            layouts.push(TableLayout::new(table, info));
        }
        layouts
    }

    /// The table this layout describes
    #[must_use]
    pub fn table(&self) -> TableId {
        self.table
    }

    /// All columns, in row order
    #[must_use]
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// The column at `index`
    ///
    /// # Panics
    /// Panics if `index` is not a column of this table.
    #[must_use]
    pub fn column(&self, index: usize) -> &ColumnInfo {
        &self.columns[index]
    }

    /// Size of one row in bytes
    #[must_use]
    pub fn row_size(&self) -> usize {
        self.row_size
    }
}
