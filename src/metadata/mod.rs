//! The .NET metadata object model.
//!
//! # Key Components
//!
//! - [`image`] - the parsed headers of a loaded image: CLI header, metadata root, streams
//! - [`tables`] - table infrastructure and the entity model of the editable tables
//! - [`module`] - [`module::ModuleDef`], the open module with its model cache
//! - [`resolver`] - resolution of references to their defining rows
//! - [`signatures`] - parsing of type signatures
//! - [`token`] - metadata tokens
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotmodel::{metadata::tables::TableId, ModuleDef};
//!
//! let module = ModuleDef::from_file("tests/samples/Sample.dll".as_ref())?;
//! println!("Module: {}", module.name()?);
//! println!("Types: {}", module.row_count(TableId::TypeDef));
//! println!("References: {}", module.row_count(TableId::TypeRef));
//! # Ok::<(), dotmodel::Error>(())
//! ```

/// Implementation of the Header of CIL
pub mod cor20header;
/// The parsed headers and streams of a loaded image
pub mod image;
/// The open module and its model cache
pub mod module;
/// Resolution of references to their definitions
pub mod resolver;
/// Implementation of the root metadata structure
pub mod root;
/// Implementation of type signatures
pub mod signatures;
/// Implementation of the metadata streams
pub mod streams;
/// Implementation of the metadata tables and their entities
pub mod tables;
/// Implementation of metadata tokens
pub mod token;
