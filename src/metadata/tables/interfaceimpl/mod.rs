//! `InterfaceImpl` table (0x09): interfaces implemented by the types of this module.
//!
//! ## Table Structure
//!
//! - **Class** (TypeDef table index): the implementing type, the sort key
//! - **Interface** (`TypeDefOrRef` coded index)
//!
//! The rows of one type are exposed through [`crate::metadata::tables::TypeDef::interfaces`].
//! Adding or removing an entry of that collection is reflected in the table when writing.

use crossbeam_skiplist::SkipMap;
use std::sync::Arc;

use crate::metadata::token::Token;

mod owned;
mod raw;

pub use owned::*;
pub use raw::*;

/// A map that holds the mapping of Token to materialized `InterfaceImpl`
pub type InterfaceImplMap = SkipMap<Token, InterfaceImplRc>;
/// A reference to an `InterfaceImpl`
pub type InterfaceImplRc = Arc<InterfaceImpl>;
