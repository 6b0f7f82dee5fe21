//! `TypeSpec` table (0x1B): constructed types.
//!
//! ## Table Structure
//!
//! - **Signature** (blob heap index): a type signature, see [`crate::metadata::signatures`]

use crossbeam_skiplist::SkipMap;
use std::sync::Arc;

use crate::metadata::token::Token;

mod owned;
mod raw;

pub use owned::*;
pub use raw::*;

/// A map that holds the mapping of Token to materialized `TypeSpec`
pub type TypeSpecMap = SkipMap<Token, TypeSpecRc>;
/// A vector that holds user created `TypeSpec` rows
pub type TypeSpecList = Arc<boxcar::Vec<TypeSpecRc>>;
/// A reference to a `TypeSpec`
pub type TypeSpecRc = Arc<TypeSpec>;
