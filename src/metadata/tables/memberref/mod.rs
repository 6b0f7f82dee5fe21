//! `MemberRef` table (0x0A): references to fields and methods of other types.
//!
//! ## Table Structure
//!
//! - **Class** (`MemberRefParent` coded index)
//! - **Name** (string heap index)
//! - **Signature** (blob heap index)

use crossbeam_skiplist::SkipMap;
use std::sync::Arc;

use crate::metadata::token::Token;

mod owned;
mod raw;

pub use owned::*;
pub use raw::*;

/// A map that holds the mapping of Token to materialized `MemberRef`
pub type MemberRefMap = SkipMap<Token, MemberRefRc>;
/// A vector that holds user created `MemberRef` rows
pub type MemberRefList = Arc<boxcar::Vec<MemberRefRc>>;
/// A reference to a `MemberRef`
pub type MemberRefRc = Arc<MemberRef>;

/// The first byte of a field signature
pub const FIELD_SIGNATURE: u8 = 0x06;
