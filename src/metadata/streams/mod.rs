//! Metadata streams.
//!
//! - [`Strings`] - `#Strings`, identifier strings
//! - [`Blob`] - `#Blob`, signatures and other binary values
//! - [`Guid`] - `#GUID`, module identifiers
//! - [`TablesHeader`] - `#~`, the metadata tables
//!
//! The `#US` heap is only carried through unchanged.

mod blob;
mod guid;
mod streamheader;
mod strings;
mod tablesheader;

pub use blob::Blob;
pub use guid::Guid;
pub use streamheader::{StreamHeader, STREAM_NAMES};
pub use strings::Strings;
pub use tablesheader::TablesHeader;
