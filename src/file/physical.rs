//! Memory mapped file backend.

use super::Backend;
use crate::{
    Error::{Error, FileError},
    Result,
};

use memmap2::Mmap;
use std::{fs, path::Path};

/// A file backend that maps the image read-only into the address space.
///
/// Pages are only touched when a row or heap entry that lives on them is read, which keeps
/// opening large images cheap.
#[derive(Debug)]
pub struct Physical {
    data: Mmap,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or
    /// [`crate::Error::Error`] if memory mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path).map_err(FileError)?;

        // SAFETY: the mapping is read-only, modifications of the file by other processes while
        // it is mapped are outside of what this crate can guard against.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|error| Error(error.to_string()))?;

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(out_of_bounds_error!());
        };

        if offset_end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn physical() {
        let temp_path = std::env::temp_dir().join("dotmodel_physical_backend.bin");
        std::fs::write(&temp_path, [0x4D, 0x5A, 0x90, 0x00, 0x03, 0x00]).unwrap();

        let physical = Physical::new(&temp_path).unwrap();
        assert_eq!(physical.len(), 6);
        assert_eq!(physical.data_slice(0, 2).unwrap(), b"MZ");
        assert_eq!(physical.data_slice(4, 2).unwrap(), &[0x03, 0x00]);
        assert!(physical.data_slice(5, 2).is_err());
        assert!(physical.data_slice(usize::MAX, 1).is_err());

        drop(physical);
        std::fs::remove_file(&temp_path).unwrap();
    }

    #[test]
    fn invalid_file_path() {
        match Physical::new(PathBuf::from("/nonexistent/path/to/file.dll")) {
            Err(FileError(io_error)) => {
                assert_eq!(io_error.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected FileError"),
        }
    }
}
