//! `Field` table (0x04): the fields of the types defined in this module.
//!
//! ## Table Structure
//!
//! - **Flags** (2 bytes): `FieldAttributes`
//! - **Name** (string heap index)
//! - **Signature** (blob heap index)

use crossbeam_skiplist::SkipMap;
use std::sync::Arc;

use crate::metadata::token::Token;

mod owned;
mod raw;

pub use owned::*;
pub use raw::*;

/// A map that holds the mapping of Token to materialized `Field`
pub type FieldMap = SkipMap<Token, FieldRc>;
/// A reference to a `Field`
pub type FieldRc = Arc<Field>;
