//! Core infrastructure shared by all metadata tables.
//!
//! - [`TableId`] and [`TableInfo`]: which tables exist and how many rows they hold
//! - [`CodedIndex`] and [`CodedIndexType`]: compact cross-table references
//! - [`ColumnSize`], [`ColumnInfo`] and [`TableLayout`]: the column schema and the layout pass
//!   fixing offsets and widths
//! - [`MetadataTable`]: a zero-copy view of one table
//! - [`RidList`]: the rows that belong to a parent row

mod codedindex;
mod column;
mod ridlist;
mod schema;
mod table;
mod tableid;
mod tableinfo;

pub use codedindex::{CodedIndex, CodedIndexType};
pub use column::{ColumnInfo, ColumnSize};
pub use ridlist::{ContiguousRidList, RandomRidList, RidList};
pub use schema::{columns, sort_key, sorted_mask, ColumnDef, TableLayout};
pub use table::MetadataTable;
pub use tableid::TableId;
pub use tableinfo::{
    TableInfo, TableInfoRef, TableRowInfo, HEAP_EXTRA_DATA, HEAP_LARGE_BLOB, HEAP_LARGE_GUID,
    HEAP_LARGE_STRINGS,
};
