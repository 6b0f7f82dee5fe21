use thiserror::Error;

use crate::metadata::tables::TableId;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Only recoverable conditions are represented here. Internal consistency faults (a column
/// with a width outside of 1, 2 or 4 bytes, a chunk that is emitted before it was laid out)
/// are programming errors and abort with a panic instead.
///
/// # Error Categories
///
/// ## Malformed input
/// - [`Error::Malformed`] - Corrupted or invalid file structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the provided data
/// - [`Error::BadImageFormat`] - A row id outside of its table was used to build a row
/// - [`Error::NotSupported`] - Unsupported file format or feature
/// - [`Error::Empty`] - Empty input provided
///
/// ## I/O and external errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::GoblinErr`] - PE parsing errors from the goblin crate
///
/// ## Model and writer errors
/// - [`Error::ModuleDropped`] - A row outlived the module that backs it
/// - [`Error::RowNotRegistered`] - A user created row is referenced but unknown to the module
/// - [`Error::WriteLayoutFailed`] - The writer could not produce a consistent layout
/// - [`Error::RecursionLimit`] - Maximum recursion depth exceeded
///
/// # Examples
///
/// ```rust,no_run
/// use dotmodel::{Error, File, ModuleDef};
/// use std::path::Path;
///
/// match File::from_file(Path::new("assembly.dll")).and_then(ModuleDef::load) {
///     Ok(module) => println!("{} types", module.type_def_count()),
///     Err(Error::BadImageFormat { table, rid }) => eprintln!("{:?} rid {} is invalid", table, rid),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed file: {} ({}:{})", message, file, line)
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The file is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred! - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A row id does not exist in the table it was supposed to address.
    ///
    /// Raised when an image-backed row is constructed for a rid that is 0 or larger than the
    /// row count of its table.
    #[error("{table:?} rid {rid} does not exist")]
    BadImageFormat {
        /// The table that was addressed
        table: TableId,
        /// The offending row id
        rid: u32,
    },

    /// This file type is not supported.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the goblin crate during PE parsing.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// The module that owns an image-backed row has been dropped.
    ///
    /// Rows only keep a weak reference to their module, lazily materializing a collection
    /// after the module is gone is therefore impossible.
    #[error("The module backing this row has been dropped")]
    ModuleDropped,

    /// A user created row is referenced by the graph, but was never added to the module.
    ///
    /// User rows of reference tables (`TypeRef`, `TypeSpec`, `MemberRef`) have to be registered
    /// with the module, so that the writer can assign their row id.
    #[error("A user created {0:?} row is referenced but was never added to the module")]
    RowNotRegistered(TableId),

    /// The writer failed to compute a consistent layout for the output.
    #[error("Write layout failed - {message}")]
    WriteLayoutFailed {
        /// Description of the failure
        message: String,
    },

    /// Recursion limit reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
