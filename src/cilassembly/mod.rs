//! Writing metadata and CLI images.
//!
//! [`ImageWriter`] turns a [`crate::ModuleDef`], including every edit made through its model,
//! back into metadata. The pieces it is built from are public as well:
//!
//! - [`chunks`]: the chunk model used for layout, with the CLI header, metadata, resources and
//!   strong name signature chunks
//! - [`heaps`]: deduplicating builders for the `#Strings`, `#Blob` and `#GUID` heaps
//! - [`serialize_metadata`]: the metadata root and stream directory
//! - [`RawMetadataBuilder`]: metadata built directly from rows
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotmodel::{cilassembly::ImageWriter, ModuleDef};
//!
//! let module = ModuleDef::from_file("tests/samples/Sample.dll".as_ref())?;
//! let type_ref = module.type_ref(1)?;
//! type_ref.name.set("Renamed");
//! ImageWriter::new(&module).write_to_file("Sample.patched.bin".as_ref())?;
//! # Ok::<(), dotmodel::Error>(())
//! ```

pub mod chunks;
pub mod heaps;

mod metadata;
mod raw;
mod tables;
mod writer;

pub use metadata::{serialize_metadata, RootHeader, DEFAULT_VERSION};
pub use raw::RawMetadataBuilder;
pub use writer::{ImageWriter, WriterOptions, DEFAULT_BASE_RVA};
