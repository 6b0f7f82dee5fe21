//! # dotmodel Prelude
//!
//! The most commonly used types of the object model and the writer, for glob imports.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotmodel operations
pub use crate::Error;

/// The result type used throughout dotmodel
pub use crate::Result;

/// Low-level file access
pub use crate::{File, Parser};

// ================================================================================================
// Module and Model
// ================================================================================================

/// The open module and its options
pub use crate::metadata::module::{ModuleDef, ModuleOptions};

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Table identifiers and coded indexes
pub use crate::metadata::tables::{CodedIndex, CodedIndexType, TableId};

/// Entities of the modeled tables
pub use crate::metadata::tables::{
    ClassLayout, ClassLayoutRc, CustomAttribute, CustomAttributeRc, Field, FieldRc,
    GenericParam, GenericParamRc, InterfaceImpl, InterfaceImplRc, MemberRef, MemberRefRc,
    MetadataEntity, MethodDef, MethodDefRc, TypeDef, TypeDefRc, TypeRef, TypeRefRc, TypeSpec,
    TypeSpecRc,
};

/// Typed references between rows
pub use crate::metadata::tables::{
    MemberDef, MemberRefParent, MetadataRow, MethodDefOrRef, ResolutionScope, TypeDefOrRef,
};

/// Reference resolution
pub use crate::metadata::resolver::{GenericParamContext, Resolver};

/// Type signatures
pub use crate::metadata::signatures::TypeSig;

/// Lazily materialized collections
pub use crate::utils::ItemList;

// ================================================================================================
// Writer
// ================================================================================================

/// Writing modules and raw metadata
pub use crate::cilassembly::{ImageWriter, RawMetadataBuilder, WriterOptions};

/// CLI header configuration
pub use crate::cilassembly::chunks::{ComImageFlags, Cor20HeaderOptions};
