use strum::{EnumCount, EnumIter, FromRepr};

/// Identifiers for the metadata tables defined in ECMA-335 Partition II, Section 22.
///
/// The numeric values are the table numbers used in tokens, in the `Valid` bit vector of the
/// tables stream header and in coded indexes.
///
/// ## Table Categories
///
/// - **Type system**: `Module`, `TypeRef`, `TypeDef`, `Field`, `MethodDef`, `Param`
/// - **Relationships**: `InterfaceImpl`, `NestedClass`, `ClassLayout`, `FieldLayout`
/// - **References**: `MemberRef`, `TypeSpec`, `MethodSpec`, `ModuleRef`, `AssemblyRef`
/// - **Attributes and constants**: `CustomAttribute`, `Constant`, `FieldMarshal`, `DeclSecurity`
/// - **Generics**: `GenericParam`, `GenericParamConstraint`
/// - **Indirection**: `FieldPtr`, `MethodPtr`, `ParamPtr`, `EventPtr`, `PropertyPtr`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, EnumIter, EnumCount, FromRepr)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum TableId {
    Module = 0x00,
    TypeRef = 0x01,
    TypeDef = 0x02,
    FieldPtr = 0x03,
    Field = 0x04,
    MethodPtr = 0x05,
    MethodDef = 0x06,
    ParamPtr = 0x07,
    Param = 0x08,
    InterfaceImpl = 0x09,
    MemberRef = 0x0A,
    Constant = 0x0B,
    CustomAttribute = 0x0C,
    FieldMarshal = 0x0D,
    DeclSecurity = 0x0E,
    ClassLayout = 0x0F,
    FieldLayout = 0x10,
    StandAloneSig = 0x11,
    EventMap = 0x12,
    EventPtr = 0x13,
    Event = 0x14,
    PropertyMap = 0x15,
    PropertyPtr = 0x16,
    Property = 0x17,
    MethodSemantics = 0x18,
    MethodImpl = 0x19,
    ModuleRef = 0x1A,
    TypeSpec = 0x1B,
    ImplMap = 0x1C,
    FieldRVA = 0x1D,
    EncLog = 0x1E,
    EncMap = 0x1F,
    Assembly = 0x20,
    AssemblyProcessor = 0x21,
    AssemblyOS = 0x22,
    AssemblyRef = 0x23,
    AssemblyRefProcessor = 0x24,
    AssemblyRefOS = 0x25,
    File = 0x26,
    ExportedType = 0x27,
    ManifestResource = 0x28,
    NestedClass = 0x29,
    GenericParam = 0x2A,
    MethodSpec = 0x2B,
    GenericParamConstraint = 0x2C,
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn numbering_is_dense() {
        assert_eq!(TableId::COUNT, 0x2D);
        for (index, table) in TableId::iter().enumerate() {
            assert_eq!(table as usize, index);
            assert_eq!(TableId::from_repr(index as u8), Some(table));
        }
        assert_eq!(TableId::from_repr(0x2D), None);
    }
}
