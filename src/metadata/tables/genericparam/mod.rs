//! `GenericParam` table (0x2A): generic parameters of types and methods.
//!
//! ## Table Structure
//!
//! - **Number** (2 bytes): position of the parameter, starting at 0
//! - **Flags** (2 bytes): variance and constraint flags
//! - **Owner** (`TypeOrMethodDef` coded index): the sort key, together with the number
//! - **Name** (String heap index)

use crossbeam_skiplist::SkipMap;
use std::sync::Arc;

use crate::metadata::token::Token;

mod owned;
mod raw;

pub use owned::*;
pub use raw::*;

/// A map that holds the mapping of Token to materialized `GenericParam`
pub type GenericParamMap = SkipMap<Token, GenericParamRc>;
/// A reference to a `GenericParam`
pub type GenericParamRc = Arc<GenericParam>;

#[allow(non_snake_case)]
/// All possible flags for `GenericParamAttributes`
pub mod GenericParamAttributes {
    /// Mask for the variance flags
    pub const VARIANCE_MASK: u32 = 0x0003;
    /// The parameter is covariant
    pub const COVARIANT: u32 = 0x0001;
    /// The parameter is contravariant
    pub const CONTRAVARIANT: u32 = 0x0002;
    /// Mask for the special constraint flags
    pub const SPECIAL_CONSTRAINT_MASK: u32 = 0x001C;
    /// The parameter is constrained to reference types
    pub const REFERENCE_TYPE_CONSTRAINT: u32 = 0x0004;
    /// The parameter is constrained to non nullable value types
    pub const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT: u32 = 0x0008;
    /// The parameter requires a public default constructor
    pub const DEFAULT_CONSTRUCTOR_CONSTRAINT: u32 = 0x0010;
}
