//! `TypeRef` table (0x01): references to types defined in other scopes.
//!
//! ## Table Structure
//!
//! - **ResolutionScope** (`ResolutionScope` coded index): `Module`, `ModuleRef`, `AssemblyRef`
//!   or, for nested types, the `TypeRef` of the enclosing type
//! - **TypeName** (string heap index)
//! - **TypeNamespace** (string heap index)
//!
//! New references are created with [`TypeRef::new`] and have to be registered with
//! [`crate::ModuleDef::add_type_ref`] before they can be written.

use crossbeam_skiplist::SkipMap;
use std::sync::Arc;

use crate::metadata::token::Token;

mod owned;
mod raw;

pub use owned::*;
pub use raw::*;

/// A map that holds the mapping of Token to materialized `TypeRef`
pub type TypeRefMap = SkipMap<Token, TypeRefRc>;
/// A vector that holds user created `TypeRef` rows
pub type TypeRefList = Arc<boxcar::Vec<TypeRefRc>>;
/// A reference to a `TypeRef`
pub type TypeRefRc = Arc<TypeRef>;
