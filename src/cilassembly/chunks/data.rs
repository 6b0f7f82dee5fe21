//! Chunks carrying data: metadata, managed resources, the strong name signature placeholder
//! and plain byte arrays.

use std::io::Write;

use crate::{
    cilassembly::chunks::{Chunk, ChunkPlacement},
    utils::{align_to, to_u32},
    Result,
};

/// Alignment of every managed resource entry
pub const RESOURCE_ALIGNMENT: u32 = 8;

/// A chunk holding a fixed byte sequence
pub struct ByteArrayChunk {
    placement: ChunkPlacement,
    data: Vec<u8>,
    alignment: u32,
}

impl ByteArrayChunk {
    /// A chunk of `data` without alignment requirement
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_alignment(data, 1)
    }

    /// A chunk of `data` whose position is aligned to `alignment`
    #[must_use]
    pub fn with_alignment(data: Vec<u8>, alignment: u32) -> Self {
        ByteArrayChunk {
            placement: ChunkPlacement::new(),
            data,
            alignment,
        }
    }

    /// The bytes of this chunk
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Chunk for ByteArrayChunk {
    fn placement(&self) -> &ChunkPlacement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut ChunkPlacement {
        &mut self.placement
    }

    #[allow(clippy::cast_possible_truncation)]
    fn file_length(&self) -> u32 {
        self.data.len() as u32
    }

    fn alignment(&self) -> u32 {
        self.alignment
    }

    fn emit(&self, out: &mut dyn Write) -> Result<()> {
        out.write_all(&self.data)?;
        Ok(())
    }
}

/// The serialized metadata: the `BSJB` root followed by its streams
pub struct MetadataChunk {
    placement: ChunkPlacement,
    data: Vec<u8>,
}

impl MetadataChunk {
    /// Wrap serialized metadata
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        MetadataChunk {
            placement: ChunkPlacement::new(),
            data,
        }
    }

    /// The serialized metadata
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Chunk for MetadataChunk {
    fn placement(&self) -> &ChunkPlacement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut ChunkPlacement {
        &mut self.placement
    }

    #[allow(clippy::cast_possible_truncation)]
    fn file_length(&self) -> u32 {
        self.data.len() as u32
    }

    fn alignment(&self) -> u32 {
        4
    }

    fn emit(&self, out: &mut dyn Write) -> Result<()> {
        out.write_all(&self.data)?;
        Ok(())
    }
}

/// The managed resources.
///
/// Every resource is stored as a 4 byte length followed by its data, and starts at an offset
/// aligned to [`RESOURCE_ALIGNMENT`]. `ManifestResource` rows address resources by that offset.
pub struct NetResources {
    placement: ChunkPlacement,
    data: Vec<u8>,
}

impl NetResources {
    /// An empty resource section
    #[must_use]
    pub fn new() -> Self {
        NetResources {
            placement: ChunkPlacement::new(),
            data: Vec::new(),
        }
    }

    /// A resource section starting with the already encoded resources `data`, so that the
    /// offsets of existing resources are kept
    #[must_use]
    pub fn from_raw(data: &[u8]) -> Self {
        NetResources {
            placement: ChunkPlacement::new(),
            data: data.to_vec(),
        }
    }

    /// Append a resource and return its offset
    ///
    /// # Errors
    /// Returns an error if the section grows beyond 4 GiB
    pub fn add(&mut self, resource: &[u8]) -> Result<u32> {
        let start = align_to(self.data.len(), RESOURCE_ALIGNMENT as usize);
        self.data.resize(start, 0);
        self.data
            .extend_from_slice(&to_u32(resource.len())?.to_le_bytes());
        self.data.extend_from_slice(resource);
        to_u32(start)
    }

    /// Returns true if no resources are present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for NetResources {
    fn default() -> Self {
        NetResources::new()
    }
}

impl Chunk for NetResources {
    fn placement(&self) -> &ChunkPlacement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut ChunkPlacement {
        &mut self.placement
    }

    #[allow(clippy::cast_possible_truncation)]
    fn file_length(&self) -> u32 {
        self.data.len() as u32
    }

    fn alignment(&self) -> u32 {
        RESOURCE_ALIGNMENT
    }

    fn emit(&self, out: &mut dyn Write) -> Result<()> {
        out.write_all(&self.data)?;
        Ok(())
    }
}

/// Space reserved for a strong name signature, filled with zeros until the image is signed
pub struct StrongNameSignature {
    placement: ChunkPlacement,
    size: u32,
}

impl StrongNameSignature {
    /// Reserve `size` bytes
    #[must_use]
    pub fn new(size: u32) -> Self {
        StrongNameSignature {
            placement: ChunkPlacement::new(),
            size,
        }
    }
}

impl Chunk for StrongNameSignature {
    fn placement(&self) -> &ChunkPlacement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut ChunkPlacement {
        &mut self.placement
    }

    fn file_length(&self) -> u32 {
        self.size
    }

    fn alignment(&self) -> u32 {
        4
    }

    fn emit(&self, out: &mut dyn Write) -> Result<()> {
        out.write_all(&vec![0; self.size as usize])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cilassembly::chunks::{FileOffset, Rva};

    fn emit(chunk: &mut dyn Chunk) -> Vec<u8> {
        chunk.set_offset(FileOffset(0), Rva(0));
        let mut out = Vec::new();
        chunk.write_to(&mut out).unwrap();
        assert_eq!(out.len(), chunk.file_length() as usize);
        out
    }

    #[test]
    fn resources_are_length_prefixed() {
        let mut resources = NetResources::new();
        assert!(resources.is_empty());
        assert_eq!(resources.add(&[0xAA, 0xBB, 0xCC]).unwrap(), 0);
        assert_eq!(resources.add(&[0xDD]).unwrap(), 8);
        assert_eq!(resources.file_length(), 13);
        assert_eq!(resources.alignment(), 8);

        assert_eq!(
            emit(&mut resources),
            vec![3, 0, 0, 0, 0xAA, 0xBB, 0xCC, 0, 1, 0, 0, 0, 0xDD]
        );
    }

    #[test]
    fn resources_keep_existing_offsets() {
        let mut resources = NetResources::from_raw(&[2, 0, 0, 0, 1, 2]);
        assert_eq!(resources.add(&[3]).unwrap(), 8);
    }

    #[test]
    fn strong_name_placeholder() {
        let mut signature = StrongNameSignature::new(0x80);
        let data = emit(&mut signature);
        assert_eq!(data.len(), 0x80);
        assert!(data.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn metadata_chunk() {
        let mut metadata = MetadataChunk::new(b"BSJB".to_vec());
        assert_eq!(metadata.alignment(), 4);
        assert_eq!(emit(&mut metadata), b"BSJB".to_vec());
        assert_eq!(metadata.data(), b"BSJB");
    }
}
