//! Typed references between rows.
//!
//! Coded index columns are resolved into these enums when a row is materialized, so that a
//! reference to a user created row survives until the writer assigns its rid.

use std::{fmt, sync::Arc};

use crate::metadata::{
    tables::{
        ClassLayoutRc, CodedIndex, CustomAttributeRc, FieldRc, GenericParamRc,
        InterfaceImplRc, MemberRefRc, MetadataEntity, MethodDefRc, TableId, TypeDefRc,
        TypeRefRc, TypeSpecRc,
    },
    token::Token,
};

/// A `TypeDefOrRef` coded index target
#[derive(Clone)]
pub enum TypeDefOrRef {
    /// A type defined in this module
    TypeDef(TypeDefRc),
    /// A reference to a type of another scope
    TypeRef(TypeRefRc),
    /// A constructed type
    TypeSpec(TypeSpecRc),
}

impl TypeDefOrRef {
    /// Token of the referenced row
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            TypeDefOrRef::TypeDef(row) => row.token(),
            TypeDefOrRef::TypeRef(row) => row.token(),
            TypeDefOrRef::TypeSpec(row) => row.token(),
        }
    }

    /// The referenced row as a coded index
    #[must_use]
    pub fn coded_index(&self) -> CodedIndex {
        let token = self.token();
        let table = match self {
            TypeDefOrRef::TypeDef(_) => TableId::TypeDef,
            TypeDefOrRef::TypeRef(_) => TableId::TypeRef,
            TypeDefOrRef::TypeSpec(_) => TableId::TypeSpec,
        };
        CodedIndex::new(table, token.row())
    }

    /// Returns true if the referenced row is a user created row
    #[must_use]
    pub fn is_user(&self) -> bool {
        match self {
            TypeDefOrRef::TypeDef(row) => row.is_user(),
            TypeDefOrRef::TypeRef(row) => row.is_user(),
            TypeDefOrRef::TypeSpec(row) => row.is_user(),
        }
    }

    /// Returns true if both reference the same row object
    #[must_use]
    pub fn ptr_eq(&self, other: &TypeDefOrRef) -> bool {
        match (self, other) {
            (TypeDefOrRef::TypeDef(a), TypeDefOrRef::TypeDef(b)) => Arc::ptr_eq(a, b),
            (TypeDefOrRef::TypeRef(a), TypeDefOrRef::TypeRef(b)) => Arc::ptr_eq(a, b),
            (TypeDefOrRef::TypeSpec(a), TypeDefOrRef::TypeSpec(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for TypeDefOrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDefOrRef::TypeDef(row) => write!(f, "TypeDef({})", row.full_name()),
            TypeDefOrRef::TypeRef(row) => write!(f, "TypeRef({})", row.full_name()),
            TypeDefOrRef::TypeSpec(row) => write!(f, "TypeSpec({})", row.token()),
        }
    }
}

/// A `MemberRefParent` coded index target
#[derive(Clone)]
pub enum MemberRefParent {
    /// Member of a type of this module
    TypeDef(TypeDefRc),
    /// Member of a type of another scope
    TypeRef(TypeRefRc),
    /// Member of a constructed type
    TypeSpec(TypeSpecRc),
    /// Vararg call site signature of a method
    MethodDef(MethodDefRc),
    /// Global member of another module, by `ModuleRef` rid
    ModuleRef(u32),
}

impl MemberRefParent {
    /// Token of the referenced row
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            MemberRefParent::TypeDef(row) => row.token(),
            MemberRefParent::TypeRef(row) => row.token(),
            MemberRefParent::TypeSpec(row) => row.token(),
            MemberRefParent::MethodDef(row) => row.token(),
            MemberRefParent::ModuleRef(rid) => Token::from_parts(TableId::ModuleRef, *rid),
        }
    }

    /// The parent as a type reference, if it is one
    #[must_use]
    pub fn as_type(&self) -> Option<TypeDefOrRef> {
        match self {
            MemberRefParent::TypeDef(row) => Some(TypeDefOrRef::TypeDef(row.clone())),
            MemberRefParent::TypeRef(row) => Some(TypeDefOrRef::TypeRef(row.clone())),
            MemberRefParent::TypeSpec(row) => Some(TypeDefOrRef::TypeSpec(row.clone())),
            MemberRefParent::MethodDef(_) | MemberRefParent::ModuleRef(_) => None,
        }
    }
}

impl From<TypeDefOrRef> for MemberRefParent {
    fn from(value: TypeDefOrRef) -> Self {
        match value {
            TypeDefOrRef::TypeDef(row) => MemberRefParent::TypeDef(row),
            TypeDefOrRef::TypeRef(row) => MemberRefParent::TypeRef(row),
            TypeDefOrRef::TypeSpec(row) => MemberRefParent::TypeSpec(row),
        }
    }
}

impl fmt::Debug for MemberRefParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_type() {
            Some(parent) => parent.fmt(f),
            None => write!(f, "MemberRefParent({})", self.token()),
        }
    }
}

/// A `MethodDefOrRef` / `CustomAttributeType` coded index target
#[derive(Clone)]
pub enum MethodDefOrRef {
    /// A method of this module
    MethodDef(MethodDefRc),
    /// A method reference
    MemberRef(MemberRefRc),
}

impl MethodDefOrRef {
    /// Token of the referenced row
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            MethodDefOrRef::MethodDef(row) => row.token(),
            MethodDefOrRef::MemberRef(row) => row.token(),
        }
    }

    /// Name of the referenced method
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            MethodDefOrRef::MethodDef(row) => row.name.get(),
            MethodDefOrRef::MemberRef(row) => row.name.get(),
        }
    }
}

impl fmt::Debug for MethodDefOrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.token())
    }
}

/// The definition a `MemberRef` resolves to
#[derive(Clone)]
pub enum MemberDef {
    /// A field
    Field(FieldRc),
    /// A method
    Method(MethodDefRc),
}

impl MemberDef {
    /// Token of the definition
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            MemberDef::Field(row) => row.token(),
            MemberDef::Method(row) => row.token(),
        }
    }
}

impl fmt::Debug for MemberDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberDef::Field(row) => write!(f, "Field({})", row.name.get()),
            MemberDef::Method(row) => write!(f, "Method({})", row.name.get()),
        }
    }
}

/// The resolution scope of a `TypeRef`
#[derive(Clone)]
pub enum ResolutionScope {
    /// No scope, the type is looked up in the `ExportedType` table
    None,
    /// The current module, by `Module` rid
    Module(u32),
    /// Another module of the same assembly, by `ModuleRef` rid
    ModuleRef(u32),
    /// Another assembly, by `AssemblyRef` rid
    AssemblyRef(u32),
    /// The enclosing type of a nested type
    TypeRef(TypeRefRc),
}

impl ResolutionScope {
    /// Token of the scope, a null token for [`ResolutionScope::None`]
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            ResolutionScope::None => Token::new(0),
            ResolutionScope::Module(rid) => Token::from_parts(TableId::Module, *rid),
            ResolutionScope::ModuleRef(rid) => Token::from_parts(TableId::ModuleRef, *rid),
            ResolutionScope::AssemblyRef(rid) => Token::from_parts(TableId::AssemblyRef, *rid),
            ResolutionScope::TypeRef(row) => row.token(),
        }
    }
}

impl fmt::Debug for ResolutionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionScope::TypeRef(row) => write!(f, "TypeRef({})", row.full_name()),
            _ => write!(f, "ResolutionScope({})", self.token()),
        }
    }
}

/// Any row reachable by token
#[derive(Clone)]
pub enum MetadataRow {
    /// `TypeDef` row
    TypeDef(TypeDefRc),
    /// `TypeRef` row
    TypeRef(TypeRefRc),
    /// `TypeSpec` row
    TypeSpec(TypeSpecRc),
    /// `Field` row
    Field(FieldRc),
    /// `MethodDef` row
    MethodDef(MethodDefRc),
    /// `MemberRef` row
    MemberRef(MemberRefRc),
    /// `InterfaceImpl` row
    InterfaceImpl(InterfaceImplRc),
    /// `ClassLayout` row
    ClassLayout(ClassLayoutRc),
    /// `CustomAttribute` row
    CustomAttribute(CustomAttributeRc),
    /// `GenericParam` row
    GenericParam(GenericParamRc),
    /// A row of a table without an entity model
    Other(Token),
}

impl MetadataRow {
    /// Token of the row
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            MetadataRow::TypeDef(row) => row.token(),
            MetadataRow::TypeRef(row) => row.token(),
            MetadataRow::TypeSpec(row) => row.token(),
            MetadataRow::Field(row) => row.token(),
            MetadataRow::MethodDef(row) => row.token(),
            MetadataRow::MemberRef(row) => row.token(),
            MetadataRow::InterfaceImpl(row) => row.token(),
            MetadataRow::ClassLayout(row) => row.token(),
            MetadataRow::CustomAttribute(row) => row.token(),
            MetadataRow::GenericParam(row) => row.token(),
            MetadataRow::Other(token) => *token,
        }
    }

    /// Returns true if the row is a user created row
    #[must_use]
    pub fn is_user(&self) -> bool {
        match self {
            MetadataRow::TypeDef(row) => row.is_user(),
            MetadataRow::TypeRef(row) => row.is_user(),
            MetadataRow::TypeSpec(row) => row.is_user(),
            MetadataRow::Field(row) => row.is_user(),
            MetadataRow::MethodDef(row) => row.is_user(),
            MetadataRow::MemberRef(row) => row.is_user(),
            MetadataRow::InterfaceImpl(row) => row.is_user(),
            MetadataRow::ClassLayout(row) => row.is_user(),
            MetadataRow::CustomAttribute(row) => row.is_user(),
            MetadataRow::GenericParam(row) => row.is_user(),
            MetadataRow::Other(_) => false,
        }
    }
}

impl fmt::Debug for MetadataRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataRow({})", self.token())
    }
}

impl From<TypeDefOrRef> for MetadataRow {
    fn from(value: TypeDefOrRef) -> Self {
        match value {
            TypeDefOrRef::TypeDef(row) => MetadataRow::TypeDef(row),
            TypeDefOrRef::TypeRef(row) => MetadataRow::TypeRef(row),
            TypeDefOrRef::TypeSpec(row) => MetadataRow::TypeSpec(row),
        }
    }
}

impl From<MethodDefOrRef> for MetadataRow {
    fn from(value: MethodDefOrRef) -> Self {
        match value {
            MethodDefOrRef::MethodDef(row) => MetadataRow::MethodDef(row),
            MethodDefOrRef::MemberRef(row) => MetadataRow::MemberRef(row),
        }
    }
}

impl From<MemberDef> for MetadataRow {
    fn from(value: MemberDef) -> Self {
        match value {
            MemberDef::Field(row) => MetadataRow::Field(row),
            MemberDef::Method(row) => MetadataRow::MethodDef(row),
        }
    }
}
