//! `MethodDef` table (0x06): the methods of the types defined in this module.
//!
//! ## Table Structure
//!
//! - **RVA** (4 bytes): location of the method body
//! - **ImplFlags** (2 bytes): `MethodImplAttributes`
//! - **Flags** (2 bytes): `MethodAttributes`
//! - **Name** (string heap index)
//! - **Signature** (blob heap index)
//! - **ParamList** (Param table index)
//!
//! Method bodies and parameters are not modeled, the `RVA` and `ParamList` columns are written
//! back unchanged unless the RVA is replaced.

use crossbeam_skiplist::SkipMap;
use std::sync::Arc;

use crate::metadata::token::Token;

mod owned;
mod raw;

pub use owned::*;
pub use raw::*;

/// A map that holds the mapping of Token to materialized `MethodDef`
pub type MethodDefMap = SkipMap<Token, MethodDefRc>;
/// A reference to a `MethodDef`
pub type MethodDefRc = Arc<MethodDef>;
