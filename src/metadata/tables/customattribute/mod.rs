//! `CustomAttribute` table (0x0C): attributes attached to metadata rows.
//!
//! ## Table Structure
//!
//! - **Parent** (`HasCustomAttribute` coded index): the decorated row, the sort key
//! - **Type** (`CustomAttributeType` coded index): the attribute constructor
//! - **Value** (Blob heap index): the encoded constructor arguments
//!
//! The value blob is kept as is, decoding of attribute arguments is left to the caller.

use crossbeam_skiplist::SkipMap;
use std::sync::Arc;

use crate::metadata::token::Token;

mod owned;
mod raw;

pub use owned::*;
pub use raw::*;

/// A map that holds the mapping of Token to materialized `CustomAttribute`
pub type CustomAttributeMap = SkipMap<Token, CustomAttributeRc>;
/// A reference to a `CustomAttribute`
pub type CustomAttributeRc = Arc<CustomAttribute>;
