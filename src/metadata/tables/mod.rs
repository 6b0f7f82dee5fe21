//! Metadata tables and the entity model built on top of them.
//!
//! [`types`] holds the table infrastructure: identifiers, coded indexes, the column schema and
//! zero-copy row access. The remaining modules model the rows of the tables that take part in
//! editing. Each of them follows the same structure:
//!
//! - `raw`: the row as stored in the image, with `read` decoding one row
//! - `owned`: the entity, with its editable values and lazily materialized collections
//!
//! Rows of the other tables are addressed by token only and written back unchanged.

pub mod types;

mod entity;
mod references;

mod classlayout;
mod customattribute;
mod field;
mod genericparam;
mod interfaceimpl;
mod memberref;
mod methoddef;
mod typedef;
mod typeref;
mod typespec;

pub use classlayout::*;
pub use customattribute::*;
pub use entity::{HeapBlob, HeapString, MetadataEntity, RowId, RowOrigin};
pub use field::*;
pub use genericparam::*;
pub use interfaceimpl::*;
pub use memberref::*;
pub use methoddef::*;
pub use references::{
    MemberDef, MemberRefParent, MetadataRow, MethodDefOrRef, ResolutionScope, TypeDefOrRef,
};
pub use typedef::*;
pub use typeref::*;
pub use typespec::*;
pub use types::*;
