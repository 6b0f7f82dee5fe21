//! Output chunks with deferred placement.
//!
//! A chunk is a piece of the output image that knows its own size but not its position. Writing
//! is a two phase protocol over an ordered sequence of chunks:
//!
//! 1. **Layout** - [`ChunkList::lay_out`] walks the sequence once and assigns every chunk its
//!    file offset and RVA. Positions are cumulative, so the order of the sequence matters.
//! 2. **Emit** - [`ChunkList::write_to`] serializes every chunk at its assigned position. A chunk
//!    only formats data that is already known at this point, it never recomputes sizes.
//!
//! Each chunk tracks its progress in a [`ChunkPlacement`] (`Unlaid` → `Laid` → `Emitted`).
//! Emitting a chunk that was never laid out is a programming error and panics.
//!
//! # Examples
//!
//! ```rust
//! use dotmodel::cilassembly::chunks::{ByteArrayChunk, Chunk, ChunkList, FileOffset, Rva};
//!
//! let mut first = ByteArrayChunk::new(vec![1, 2, 3]);
//! let mut second = ByteArrayChunk::with_alignment(vec![4, 5], 4);
//!
//! let mut list = ChunkList::new();
//! list.push(&mut first);
//! list.push(&mut second);
//! list.lay_out(FileOffset(0), Rva(0x2000), 1)?;
//!
//! let mut output = Vec::new();
//! list.write_to(&mut output)?;
//! assert_eq!(output, vec![1, 2, 3, 0, 4, 5]);
//! drop(list);
//! assert_eq!(second.rva(), Some(Rva(0x2004)));
//! # Ok::<(), dotmodel::Error>(())
//! ```

mod cor20;
mod data;

use std::{fmt, io::Write};

pub use cor20::{ComImageFlags, Cor20HeaderOptions, ImageCor20Header};
pub use data::{ByteArrayChunk, MetadataChunk, NetResources, StrongNameSignature};

use crate::{metadata::cor20header::DataDirectory, utils::align_to, Error, Result};

/// A position in the output file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileOffset(pub u32);

/// A relative virtual address in the loaded image
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rva(pub u32);

impl fmt::Display for FileOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl fmt::Display for Rva {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Progress of a chunk through the write protocol
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// No position assigned yet
    Unlaid,
    /// Position assigned, not written yet
    Laid {
        /// Assigned file offset
        offset: FileOffset,
        /// Assigned RVA
        rva: Rva,
    },
    /// Written at its position
    Emitted {
        /// File offset the chunk was written at
        offset: FileOffset,
        /// RVA the chunk was written at
        rva: Rva,
    },
}

/// The placement state machine every chunk embeds
#[derive(Clone, Debug)]
pub struct ChunkPlacement {
    state: ChunkState,
}

impl ChunkPlacement {
    /// A placement without a position
    #[must_use]
    pub const fn new() -> Self {
        ChunkPlacement {
            state: ChunkState::Unlaid,
        }
    }

    /// The current state
    #[must_use]
    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Assign a position. Laying out an already laid chunk again moves it.
    ///
    /// # Panics
    /// Panics if the chunk was already emitted
    pub fn lay(&mut self, offset: FileOffset, rva: Rva) {
        if let ChunkState::Emitted { offset: emitted, .. } = self.state {
            panic!("chunk emitted at {} can not be laid out again", emitted);
        }

        self.state = ChunkState::Laid { offset, rva };
    }

    /// The assigned file offset, `None` before layout
    #[must_use]
    pub fn offset(&self) -> Option<FileOffset> {
        match self.state {
            ChunkState::Unlaid => None,
            ChunkState::Laid { offset, .. } | ChunkState::Emitted { offset, .. } => Some(offset),
        }
    }

    /// The assigned RVA, `None` before layout
    #[must_use]
    pub fn rva(&self) -> Option<Rva> {
        match self.state {
            ChunkState::Unlaid => None,
            ChunkState::Laid { rva, .. } | ChunkState::Emitted { rva, .. } => Some(rva),
        }
    }

    /// Enter the `Emitted` state and return the position to write at
    ///
    /// # Panics
    /// Panics if no position was assigned
    pub fn begin_emit(&mut self) -> (FileOffset, Rva) {
        match self.state {
            ChunkState::Unlaid => panic!("chunk emitted before layout"),
            ChunkState::Laid { offset, rva } | ChunkState::Emitted { offset, rva } => {
                self.state = ChunkState::Emitted { offset, rva };
                (offset, rva)
            }
        }
    }
}

impl Default for ChunkPlacement {
    fn default() -> Self {
        ChunkPlacement::new()
    }
}

/// A unit of the output image
pub trait Chunk {
    /// The placement of this chunk
    fn placement(&self) -> &ChunkPlacement;

    /// The placement of this chunk, mutable
    fn placement_mut(&mut self) -> &mut ChunkPlacement;

    /// Number of bytes this chunk occupies in the file
    fn file_length(&self) -> u32;

    /// Number of bytes this chunk occupies once loaded
    fn virtual_size(&self) -> u32 {
        self.file_length()
    }

    /// Required alignment of the offset and RVA of this chunk
    fn alignment(&self) -> u32 {
        1
    }

    /// Serialize the chunk. Only called once the chunk is laid out.
    ///
    /// # Errors
    /// Returns an error if `out` fails
    fn emit(&self, out: &mut dyn Write) -> Result<()>;

    /// Assign the position of this chunk
    fn set_offset(&mut self, offset: FileOffset, rva: Rva) {
        self.placement_mut().lay(offset, rva);
    }

    /// The assigned file offset, `None` before layout
    fn file_offset(&self) -> Option<FileOffset> {
        self.placement().offset()
    }

    /// The assigned RVA, `None` before layout
    fn rva(&self) -> Option<Rva> {
        self.placement().rva()
    }

    /// A data directory pointing at this chunk, empty if the chunk is not laid out or has no
    /// data
    fn directory(&self) -> DataDirectory {
        match self.rva() {
            Some(rva) if self.file_length() != 0 => DataDirectory {
                rva: rva.0,
                size: self.file_length(),
            },
            _ => DataDirectory::default(),
        }
    }

    /// Serialize the chunk at its assigned position
    ///
    /// # Errors
    /// Returns an error if `out` fails
    ///
    /// # Panics
    /// Panics if the chunk was not laid out
    fn write_to(&mut self, out: &mut dyn Write) -> Result<()> {
        self.placement_mut().begin_emit();
        self.emit(out)
    }
}

/// An ordered sequence of chunks laid out and written together
#[derive(Default)]
pub struct ChunkList<'a> {
    chunks: Vec<&'a mut dyn Chunk>,
    base: Option<FileOffset>,
}

impl<'a> ChunkList<'a> {
    /// An empty list
    #[must_use]
    pub fn new() -> Self {
        ChunkList {
            chunks: Vec::new(),
            base: None,
        }
    }

    /// A list whose output starts at `base`, for chunks that were laid out earlier
    #[must_use]
    pub fn with_base(base: FileOffset) -> Self {
        ChunkList {
            chunks: Vec::new(),
            base: Some(base),
        }
    }

    /// Append `chunk` to the sequence
    pub fn push(&mut self, chunk: &'a mut dyn Chunk) {
        self.chunks.push(chunk);
    }

    /// Number of chunks
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if the list holds no chunks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Assign positions to all chunks in one pass, starting at `offset` / `rva`.
    ///
    /// Every chunk starts at the next position aligned to the larger of its own alignment and
    /// `alignment`. The file cursor advances by the file length and the RVA cursor by the
    /// virtual size. Returns the end of the sequence.
    ///
    /// # Errors
    /// Returns [`Error::WriteLayoutFailed`] if a position exceeds 32 bits
    pub fn lay_out(
        &mut self,
        offset: FileOffset,
        rva: Rva,
        alignment: u32,
    ) -> Result<(FileOffset, Rva)> {
        let mut file_cursor = offset.0 as usize;
        let mut rva_cursor = rva.0 as usize;

        for chunk in &mut self.chunks {
            let align = std::cmp::max(chunk.alignment(), alignment) as usize;
            file_cursor = align_to(file_cursor, align);
            rva_cursor = align_to(rva_cursor, align);

            let chunk_offset = FileOffset(position(file_cursor)?);
            let chunk_rva = Rva(position(rva_cursor)?);
            chunk.set_offset(chunk_offset, chunk_rva);
            log::debug!(
                "Chunk at offset {} rva {}: {} bytes ({} virtual)",
                chunk_offset,
                chunk_rva,
                chunk.file_length(),
                chunk.virtual_size()
            );

            file_cursor += chunk.file_length() as usize;
            rva_cursor += chunk.virtual_size() as usize;
        }

        self.base = Some(offset);
        Ok((
            FileOffset(position(file_cursor)?),
            Rva(position(rva_cursor)?),
        ))
    }

    /// Write all chunks, padding with zeros up to each chunk's file offset.
    ///
    /// The output starts at the offset the list was laid out from.
    ///
    /// # Errors
    /// Returns [`Error::WriteLayoutFailed`] if a chunk writes a different number of bytes than
    /// its file length, or an error of `out`
    ///
    /// # Panics
    /// Panics if the list was not laid out
    pub fn write_to(&mut self, out: &mut dyn Write) -> Result<()> {
        let Some(base) = self.base else {
            panic!("chunk list emitted before layout");
        };

        let mut written = base.0 as usize;
        for chunk in &mut self.chunks {
            let Some(offset) = chunk.file_offset() else {
                panic!("chunk emitted before layout");
            };

            let start = offset.0 as usize;
            if start < written {
                return Err(Error::WriteLayoutFailed {
                    message: format!("chunk at {} overlaps the previous chunk", offset),
                });
            }
            out.write_all(&vec![0; start - written])?;

            let mut counter = CountingWriter { inner: &mut *out, count: 0 };
            chunk.write_to(&mut counter)?;
            if counter.count != chunk.file_length() as usize {
                return Err(Error::WriteLayoutFailed {
                    message: format!(
                        "chunk at {} wrote {} bytes, expected {}",
                        offset,
                        counter.count,
                        chunk.file_length()
                    ),
                });
            }

            written = start + counter.count;
        }

        Ok(())
    }
}

fn position(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::WriteLayoutFailed {
        message: format!("position 0x{:X} exceeds 32 bits", value),
    })
}

struct CountingWriter<'a> {
    inner: &'a mut dyn Write,
    count: usize,
}

impl Write for CountingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lay_out(chunks: &mut [ByteArrayChunk]) -> Vec<(FileOffset, Rva)> {
        let mut list = ChunkList::new();
        for chunk in chunks.iter_mut() {
            list.push(chunk);
        }
        list.lay_out(FileOffset(0x200), Rva(0x2000), 4).unwrap();
        drop(list);

        chunks
            .iter()
            .map(|chunk| (chunk.file_offset().unwrap(), chunk.rva().unwrap()))
            .collect()
    }

    #[test]
    fn placement_states() {
        let mut placement = ChunkPlacement::new();
        assert_eq!(placement.state(), ChunkState::Unlaid);
        assert_eq!(placement.offset(), None);

        placement.lay(FileOffset(0x10), Rva(0x1010));
        assert_eq!(placement.offset(), Some(FileOffset(0x10)));
        assert_eq!(placement.rva(), Some(Rva(0x1010)));

        assert_eq!(placement.begin_emit(), (FileOffset(0x10), Rva(0x1010)));
        assert!(matches!(placement.state(), ChunkState::Emitted { .. }));
    }

    #[test]
    #[should_panic(expected = "before layout")]
    fn emit_before_layout() {
        let mut chunk = ByteArrayChunk::new(vec![1, 2, 3]);
        let mut out = Vec::new();
        let _ = chunk.write_to(&mut out);
    }

    #[test]
    #[should_panic(expected = "can not be laid out again")]
    fn layout_after_emit() {
        let mut placement = ChunkPlacement::new();
        placement.lay(FileOffset(0), Rva(0));
        placement.begin_emit();
        placement.lay(FileOffset(4), Rva(4));
    }

    #[test]
    fn cumulative_layout() {
        let mut chunks = vec![
            ByteArrayChunk::new(vec![0xAA; 5]),
            ByteArrayChunk::new(vec![0xBB; 8]),
            ByteArrayChunk::with_alignment(vec![0xCC; 3], 8),
        ];

        let positions = lay_out(&mut chunks);
        assert_eq!(
            positions,
            vec![
                (FileOffset(0x200), Rva(0x2000)),
                (FileOffset(0x208), Rva(0x2008)),
                (FileOffset(0x210), Rva(0x2010)),
            ]
        );
    }

    #[test]
    fn layout_is_deterministic() {
        let build = || {
            vec![
                ByteArrayChunk::new(vec![1; 7]),
                ByteArrayChunk::with_alignment(vec![2; 13], 8),
                ByteArrayChunk::new(vec![3; 1]),
            ]
        };

        let mut first = build();
        let mut second = build();
        assert_eq!(lay_out(&mut first), lay_out(&mut second));
    }

    #[test]
    fn write_pads_between_chunks() {
        let mut first = ByteArrayChunk::new(vec![1, 2]);
        let mut second = ByteArrayChunk::new(vec![3]);

        let mut list = ChunkList::new();
        list.push(&mut first);
        list.push(&mut second);
        let end = list.lay_out(FileOffset(0x10), Rva(0x10), 4).unwrap();
        assert_eq!(end, (FileOffset(0x15), Rva(0x15)));

        let mut out = Vec::new();
        list.write_to(&mut out).unwrap();
        assert_eq!(out, vec![1, 2, 0, 0, 3]);
        drop(list);

        assert!(matches!(first.placement().state(), ChunkState::Emitted { .. }));
        assert_eq!(
            second.directory(),
            DataDirectory {
                rva: 0x14,
                size: 1
            }
        );
    }

    #[test]
    fn empty_chunk_has_empty_directory() {
        let mut chunk = ByteArrayChunk::new(Vec::new());
        chunk.set_offset(FileOffset(8), Rva(0x2008));
        assert!(chunk.directory().is_empty());
    }
}
