//! `TypeDef` table (0x02): the types defined in this module.
//!
//! ## Table Structure
//!
//! - **Flags** (4 bytes): [`TypeAttributes`]
//! - **TypeName** (string heap index)
//! - **TypeNamespace** (string heap index)
//! - **Extends** (`TypeDefOrRef` coded index): the base type
//! - **FieldList** (Field table index): first field owned by the type
//! - **MethodList** (MethodDef table index): first method owned by the type
//!
//! A type owns the fields from its `FieldList` up to the `FieldList` of the next row, the same
//! holds for methods. When the `FieldPtr` / `MethodPtr` indirection tables are present the
//! range addresses those tables instead.

use crossbeam_skiplist::SkipMap;
use std::sync::Arc;

use crate::metadata::token::Token;

mod owned;
mod raw;

pub use owned::*;
pub use raw::*;

/// A map that holds the mapping of Token to materialized `TypeDef`
pub type TypeDefMap = SkipMap<Token, TypeDefRc>;
/// A reference to a `TypeDef`
pub type TypeDefRc = Arc<TypeDef>;

#[allow(non_snake_case)]
/// Flags of the `TypeDef` table
pub mod TypeAttributes {
    /// Use this mask to retrieve visibility information
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Class has no public scope
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Class has public scope
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Class is nested with public visibility
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Class is nested with private visibility
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Class is nested with family visibility
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    /// Class is nested with assembly visibility
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    /// Class is nested with family and assembly visibility
    pub const NESTED_FAM_AND_ASSEM: u32 = 0x0000_0006;
    /// Class is nested with family or assembly visibility
    pub const NESTED_FAM_OR_ASSEM: u32 = 0x0000_0007;
    /// Use this mask to retrieve class layout information
    pub const LAYOUT_MASK: u32 = 0x0000_0018;
    /// Class fields are auto-laid out
    pub const AUTO_LAYOUT: u32 = 0x0000_0000;
    /// Class fields are laid out sequentially
    pub const SEQUENTIAL_LAYOUT: u32 = 0x0000_0008;
    /// Layout is supplied explicitly
    pub const EXPLICIT_LAYOUT: u32 = 0x0000_0010;
    /// Type is an interface
    pub const INTERFACE: u32 = 0x0000_0020;
    /// Class is abstract
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Class cannot be extended
    pub const SEALED: u32 = 0x0000_0100;
    /// Class name is special
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
}
