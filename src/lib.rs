// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # dotmodel
//!
//! A lazy, editable object model for the metadata of .NET modules (ECMA-335), with write-back
//! that keeps everything the caller did not touch byte for byte.
//!
//! ## Features
//!
//! - **Lazy materialization** - rows become entities on first request and are cached for the
//!   lifetime of the module, collections of an entity are decoded when first accessed
//! - **Thread safe** - every lazily computed value is published exactly once, concurrent
//!   readers always observe the same object
//! - **Editable** - names, flags, signatures and references can be replaced, collections can
//!   be edited, new `TypeRef`, `TypeSpec` and `MemberRef` rows can be added
//! - **Write-back** - the tables are rebuilt from the model, sorted tables stay sorted and rids
//!   that change are followed by every reference
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dotmodel::prelude::*;
//!
//! let module = ModuleDef::from_file("tests/samples/Sample.dll".as_ref())?;
//! for type_def in module.type_defs()? {
//!     println!("{}", type_def.full_name());
//!     for interface in type_def.interfaces()?.to_vec() {
//!         if let Some(resolved) = interface.resolve(&module) {
//!             println!("  implements {}", resolved.full_name());
//!         }
//!     }
//! }
//!
//! let patched = ImageWriter::new(&module).write()?;
//! # Ok::<(), dotmodel::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`file`] - access to the raw bytes of a PE file or a flat CLI payload
//! - [`metadata`] - headers, streams, tables and the entity model built on top of them
//! - [`cilassembly`] - the writer: chunk layout, heap builders and table rebuilding
//! - [`utils`] - the publish-once primitives the model is built from
//! - [`prelude`] - re-exports of the most commonly used types
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result`]. Malformed input is reported as
//! [`Error::Malformed`], [`Error::OutOfBounds`] or [`Error::BadImageFormat`]; references that
//! can not be resolved yield `None` instead of an error.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Access to the raw bytes of an image
///
/// [`File`] wraps a memory mapped or in-memory PE file, or a flat CLI payload as produced by
/// [`cilassembly::ImageWriter`], and translates RVAs to file offsets. [`Parser`] reads little
/// endian values and compressed integers from a byte slice.
pub mod file;

/// Definitions, parsing and the entity model of CIL metadata based on ECMA-335
///
/// # Key Components
///
/// - [`metadata::cor20header`] - the CLI header
/// - [`metadata::root`] - metadata root and stream directory
/// - [`metadata::streams`] - the heaps and the tables stream header
/// - [`metadata::tables`] - table schema, coded indexes and the entities of the modeled tables
/// - [`metadata::module`] - [`ModuleDef`], the entry point of the model
/// - [`metadata::resolver`] - resolution of references to their definitions
/// - [`metadata::signatures`] - type signatures of `TypeSpec` rows
pub mod metadata;

pub mod cilassembly;

/// Publish-once primitives and integer helpers
pub mod utils;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use dotmodel::prelude::*;
///
/// let module = ModuleDef::from_file("tests/samples/Sample.dll".as_ref())?;
/// println!("{} types", module.type_def_count());
/// # Ok::<(), dotmodel::Error>(())
/// ```
pub mod prelude;

/// `dotmodel` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotmodel` Error type
pub use error::Error;

/// Raw access to the bytes of an image
pub use file::{parser::Parser, File};

/// The open module, entry point of the object model
pub use metadata::module::{ModuleDef, ModuleOptions};

/// The metadata writer
pub use cilassembly::{ImageWriter, RawMetadataBuilder, WriterOptions};
