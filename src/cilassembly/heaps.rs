//! Builders for the `#Strings`, `#Blob` and `#GUID` heaps.
//!
//! A builder starts from the heap of the original image, byte for byte, so that every index
//! stored in a row that was not touched stays valid. Values of edited rows are interned:
//! a value that is still equal to the heap entry the row was read from keeps its index, other
//! values are deduplicated against the existing entries and appended when new.

use std::collections::HashMap;

use crate::{
    file::{io::write_compressed_uint, parser::Parser},
    utils::{align_to_4, to_u32},
    Result,
};

/// Heaps of this size or larger need 4 byte indexes
pub const LARGE_HEAP_SIZE: usize = 0x1_0000;

fn pad_to_4(mut data: Vec<u8>) -> Vec<u8> {
    data.resize(align_to_4(data.len()), 0);
    data
}

/// Builds the `#Strings` heap
pub struct StringsHeapBuilder {
    data: Vec<u8>,
    entries: HashMap<String, u32>,
}

impl StringsHeapBuilder {
    /// An empty heap, holding only the empty string
    #[must_use]
    pub fn new() -> Self {
        StringsHeapBuilder {
            data: vec![0],
            entries: HashMap::new(),
        }
    }

    /// A heap starting with the bytes of `original`
    #[must_use]
    pub fn from_original(original: &[u8]) -> Self {
        if original.is_empty() {
            return Self::new();
        }

        let mut entries = HashMap::new();
        let mut start = 0;
        while start < original.len() {
            let Some(length) = original[start..].iter().position(|byte| *byte == 0) else {
                break;
            };

            if length != 0 {
                if let Ok(value) = std::str::from_utf8(&original[start..start + length]) {
                    #[allow(clippy::cast_possible_truncation)]
                    entries.entry(value.to_string()).or_insert(start as u32);
                }
            }
            start += length + 1;
        }

        StringsHeapBuilder {
            data: original.to_vec(),
            entries,
        }
    }

    /// The index of `value`, appending it if it is not present yet
    ///
    /// # Errors
    /// Returns an error if the heap grows beyond 4 GiB
    pub fn add(&mut self, value: &str) -> Result<u32> {
        if value.is_empty() {
            return Ok(0);
        }

        if let Some(index) = self.entries.get(value) {
            return Ok(*index);
        }

        let index = to_u32(self.data.len())?;
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
        self.entries.insert(value.to_string(), index);
        Ok(index)
    }

    /// The index of `value`, reusing `original` when it still holds `value`
    ///
    /// # Errors
    /// Returns an error if the heap grows beyond 4 GiB
    pub fn intern_at(&mut self, original: u32, value: &str) -> Result<u32> {
        if original != 0 && self.get(original) == Some(value) {
            return Ok(original);
        }

        self.add(value)
    }

    fn get(&self, index: u32) -> Option<&str> {
        let tail = self.data.get(index as usize..)?;
        let length = tail.iter().position(|byte| *byte == 0)?;
        std::str::from_utf8(&tail[..length]).ok()
    }

    /// Current size of the heap
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the heap holds nothing but the empty string
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() <= 1
    }

    /// The heap data, padded to 4 bytes
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        pad_to_4(self.data)
    }
}

impl Default for StringsHeapBuilder {
    fn default() -> Self {
        StringsHeapBuilder::new()
    }
}

/// Builds the `#Blob` heap
pub struct BlobHeapBuilder {
    data: Vec<u8>,
    entries: HashMap<Vec<u8>, u32>,
}

impl BlobHeapBuilder {
    /// An empty heap, holding only the empty blob
    #[must_use]
    pub fn new() -> Self {
        BlobHeapBuilder {
            data: vec![0],
            entries: HashMap::new(),
        }
    }

    /// A heap starting with the bytes of `original`
    #[must_use]
    pub fn from_original(original: &[u8]) -> Self {
        if original.is_empty() {
            return Self::new();
        }

        let mut entries = HashMap::new();
        let mut parser = Parser::new(original);
        while parser.has_more_data() {
            let start = parser.pos();
            let Ok(length) = parser.read_compressed_uint() else {
                break;
            };
            let Ok(value) = parser.read_bytes(length as usize) else {
                break;
            };

            if !value.is_empty() {
                #[allow(clippy::cast_possible_truncation)]
                entries.entry(value.to_vec()).or_insert(start as u32);
            }
        }

        BlobHeapBuilder {
            data: original.to_vec(),
            entries,
        }
    }

    /// The index of `value`, appending it if it is not present yet
    ///
    /// # Errors
    /// Returns an error if the blob or the heap is too large
    pub fn add(&mut self, value: &[u8]) -> Result<u32> {
        if value.is_empty() {
            return Ok(0);
        }

        if let Some(index) = self.entries.get(value) {
            return Ok(*index);
        }

        let index = to_u32(self.data.len())?;
        write_compressed_uint(to_u32(value.len())?, &mut self.data)?;
        self.data.extend_from_slice(value);
        self.entries.insert(value.to_vec(), index);
        Ok(index)
    }

    /// The index of `value`, reusing `original` when it still holds `value`
    ///
    /// # Errors
    /// Returns an error if the blob or the heap is too large
    pub fn intern_at(&mut self, original: u32, value: &[u8]) -> Result<u32> {
        if original != 0 && self.get(original) == Some(value) {
            return Ok(original);
        }

        self.add(value)
    }

    fn get(&self, index: u32) -> Option<&[u8]> {
        let mut parser = Parser::new(self.data.get(index as usize..)?);
        let length = parser.read_compressed_uint().ok()?;
        parser.read_bytes(length as usize).ok()
    }

    /// Current size of the heap
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the heap holds nothing but the empty blob
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() <= 1
    }

    /// The heap data, padded to 4 bytes
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        pad_to_4(self.data)
    }
}

impl Default for BlobHeapBuilder {
    fn default() -> Self {
        BlobHeapBuilder::new()
    }
}

/// Builds the `#GUID` heap, whose 16 byte entries are addressed by a 1-based index
#[derive(Default)]
pub struct GuidHeapBuilder {
    data: Vec<u8>,
}

impl GuidHeapBuilder {
    /// An empty heap
    #[must_use]
    pub fn new() -> Self {
        GuidHeapBuilder { data: Vec::new() }
    }

    /// A heap starting with the entries of `original`
    #[must_use]
    pub fn from_original(original: &[u8]) -> Self {
        GuidHeapBuilder {
            data: original.to_vec(),
        }
    }

    /// The index of `guid`, appending it if it is not present yet. The null GUID is index 0.
    ///
    /// # Errors
    /// Returns an error if the heap grows beyond 4 GiB
    pub fn add(&mut self, guid: &[u8; 16]) -> Result<u32> {
        if guid.iter().all(|byte| *byte == 0) {
            return Ok(0);
        }

        if let Some(position) = self
            .data
            .chunks_exact(16)
            .position(|entry| entry == guid.as_slice())
        {
            return to_u32(position + 1);
        }

        self.data.extend_from_slice(guid);
        to_u32(self.data.len() / 16)
    }

    /// Current size of the heap
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the heap has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The heap data
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        pad_to_4(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings() {
        let mut heap = StringsHeapBuilder::from_original(b"\0Object\0System\0\0");
        assert_eq!(heap.add("").unwrap(), 0);
        assert_eq!(heap.add("System").unwrap(), 8);
        assert_eq!(heap.intern_at(1, "Object").unwrap(), 1);
        assert_eq!(heap.intern_at(1, "String").unwrap(), 16);
        assert_eq!(heap.add("String").unwrap(), 16);
        assert_eq!(heap.len(), 23);

        let data = heap.finish();
        assert_eq!(data.len(), 24);
        assert_eq!(&data[16..23], b"String\0");
    }

    #[test]
    fn unmodified_strings_are_identical() {
        let original = b"\0<Module>\0Test\0\0";
        let mut heap = StringsHeapBuilder::from_original(original);
        assert_eq!(heap.intern_at(1, "<Module>").unwrap(), 1);
        assert_eq!(heap.intern_at(10, "Test").unwrap(), 10);
        assert_eq!(heap.finish(), original.to_vec());
    }

    #[test]
    fn blobs() {
        let mut heap = BlobHeapBuilder::from_original(&[0, 2, 0x06, 0x08, 0]);
        assert_eq!(heap.add(&[]).unwrap(), 0);
        assert_eq!(heap.add(&[0x06, 0x08]).unwrap(), 1);
        assert_eq!(heap.intern_at(1, &[0x06, 0x08]).unwrap(), 1);
        assert_eq!(heap.intern_at(1, &[0x06, 0x0E]).unwrap(), 5);

        let large = vec![0x11; 0x90];
        assert_eq!(heap.add(&large).unwrap(), 8);
        let data = heap.finish();
        assert_eq!(&data[8..10], &[0x80, 0x90]);
        assert_eq!(data.len() % 4, 0);
    }

    #[test]
    fn guids() {
        let mut heap = GuidHeapBuilder::new();
        assert_eq!(heap.add(&[0; 16]).unwrap(), 0);
        assert_eq!(heap.add(&[1; 16]).unwrap(), 1);
        assert_eq!(heap.add(&[2; 16]).unwrap(), 2);
        assert_eq!(heap.add(&[1; 16]).unwrap(), 1);
        assert_eq!(heap.finish().len(), 32);
    }
}
