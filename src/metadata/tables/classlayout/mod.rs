//! `ClassLayout` table (0x0F): explicit packing and size of types.
//!
//! ## Table Structure
//!
//! - **PackingSize** (2 bytes)
//! - **ClassSize** (4 bytes)
//! - **Parent** (TypeDef table index): the sort key
//!
//! A type has at most one layout, see [`crate::metadata::tables::TypeDef::class_layout`].

use crossbeam_skiplist::SkipMap;
use std::sync::Arc;

use crate::metadata::token::Token;

mod owned;
mod raw;

pub use owned::*;
pub use raw::*;

/// A map that holds the mapping of Token to materialized `ClassLayout`
pub type ClassLayoutMap = SkipMap<Token, ClassLayoutRc>;
/// A reference to a `ClassLayout`
pub type ClassLayoutRc = Arc<ClassLayout>;
