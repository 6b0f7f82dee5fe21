//! GUID Heap (`#GUID`) for .NET Metadata
//!
//! Provides access to the ECMA-335 `#GUID` heap, a sequence of 128-bit GUIDs such as the
//! module version id. Indexes are 1-based, 0 means no GUID.
//!
//! # Reference
//! - [ECMA-335 II.24.2.5](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::Result;

/// A view of the `#GUID` heap: 16 byte GUIDs addressed by a 1-based index
pub struct Guid<'a> {
    data: &'a [u8],
}

impl<'a> Guid<'a> {
    /// Create a `Guid` view over the heap data
    ///
    /// # Errors
    /// Returns an error if the heap is not a multiple of 16 bytes
    pub fn from(data: &'a [u8]) -> Result<Guid<'a>> {
        if data.len() % 16 != 0 {
            return Err(malformed_error!("Size of #GUID heap is not a multiple of 16"));
        }

        Ok(Guid { data })
    }

    /// Get the GUID at the 1-based `index`
    ///
    /// # Errors
    /// Returns an error if the index is 0 or out of bounds
    pub fn get(&self, index: usize) -> Result<[u8; 16]> {
        if index < 1 || index * 16 > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        let start = (index - 1) * 16;
        let mut buffer = [0u8; 16];
        buffer.copy_from_slice(&self.data[start..start + 16]);
        Ok(buffer)
    }

    /// Number of GUIDs in the heap
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / 16
    }

    /// Returns true if the heap holds no GUID
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
