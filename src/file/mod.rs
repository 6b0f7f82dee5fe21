//! Input handling for metadata images.
//!
//! A [`File`] owns the raw bytes of an image (memory mapped or in memory, see [`Backend`]) and knows
//! how relative virtual addresses map to file offsets. Two layouts are supported:
//!
//! - **PE** - a regular .NET PE file, parsed with `goblin`. The CLI header is found through the
//!   COM descriptor data directory, RVAs are mapped through the section table.
//! - **Flat** - a CLI image as produced by [`crate::ImageWriter`]: the CLI header sits at the
//!   start of the data and every RVA maps linearly (`offset = rva - base_rva`).
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotmodel::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("tests/samples/Sample.dll"))?;
//! let (clr_rva, clr_size) = file.clr();
//! let clr_offset = file.rva_to_offset(clr_rva)?;
//! println!("CLI header at 0x{:x} ({} bytes)", clr_offset, clr_size);
//! # Ok::<(), dotmodel::Error>(())
//! ```

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::path::Path;

use goblin::pe::PE;

use crate::{Error::Empty, Error::GoblinErr, Result};
use memory::Memory;
use physical::Physical;

/// Size of the CLI header (`IMAGE_COR20_HEADER`)
pub const COR20_HEADER_SIZE: usize = 0x48;

/// Backend trait for file data sources.
///
/// This trait abstracts over the source of image data, allowing for both in-memory and on-disk
/// representations. All implementations must be thread-safe.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// The raw-to-virtual mapping of one PE section
#[derive(Clone, Debug)]
struct SectionInfo {
    virtual_address: u32,
    virtual_size: u32,
    pointer_to_raw_data: u32,
    size_of_raw_data: u32,
}

impl SectionInfo {
    fn virtual_end(&self) -> u64 {
        u64::from(self.virtual_address)
            + u64::from(std::cmp::max(self.virtual_size, self.size_of_raw_data))
    }
}

#[derive(Clone, Debug)]
enum Layout {
    Pe { sections: Vec<SectionInfo> },
    Flat { base_rva: u32 },
}

/// A loaded image together with its address mapping.
pub struct File {
    data: Box<dyn Backend>,
    layout: Layout,
    clr_rva: u32,
    clr_size: u32,
}

impl File {
    /// Memory map the PE file at `file` and locate its CLI header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is empty, is not a valid PE file, or has no
    /// CLI header directory.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;
        Self::load_pe(input)
    }

    /// Parse an in-memory PE file and locate its CLI header.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is empty, not a valid PE file, or has no CLI header directory.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        Self::load_pe(Memory::new(data))
    }

    /// Wrap a flat CLI image, whose first byte is the CLI header located at `base_rva`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is empty or too small to contain a CLI header.
    pub fn from_flat(data: Vec<u8>, base_rva: u32) -> Result<File> {
        if data.is_empty() {
            return Err(Empty);
        }

        if data.len() < COR20_HEADER_SIZE {
            return Err(out_of_bounds_error!());
        }

        Ok(File {
            data: Box::new(Memory::new(data)),
            layout: Layout::Flat { base_rva },
            clr_rva: base_rva,
            clr_size: COR20_HEADER_SIZE as u32,
        })
    }

    fn load_pe<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let (sections, clr_rva, clr_size) = {
            let pe = PE::parse(data.data()).map_err(GoblinErr)?;
            let Some(optional_header) = pe.header.optional_header else {
                return Err(malformed_error!("File does not have an OptionalHeader"));
            };

            let Some(clr_dir) = optional_header.data_directories.get_clr_runtime_header() else {
                return Err(malformed_error!(
                    "File does not have a CLR runtime header directory"
                ));
            };

            let sections = pe
                .sections
                .iter()
                .map(|section| SectionInfo {
                    virtual_address: section.virtual_address,
                    virtual_size: section.virtual_size,
                    pointer_to_raw_data: section.pointer_to_raw_data,
                    size_of_raw_data: section.size_of_raw_data,
                })
                .collect::<Vec<_>>();

            (sections, clr_dir.virtual_address, clr_dir.size)
        };

        Ok(File {
            data: Box::new(data),
            layout: Layout::Pe { sections },
            clr_rva,
            clr_size,
        })
    }

    /// Returns the total size of the loaded file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the file has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    /// Returns true if this is a flat CLI image (no PE headers).
    #[must_use]
    pub fn is_flat(&self) -> bool {
        matches!(self.layout, Layout::Flat { .. })
    }

    /// Returns the RVA and size of the CLI header.
    #[must_use]
    pub fn clr(&self) -> (usize, usize) {
        (self.clr_rva as usize, self.clr_size as usize)
    }

    /// Returns the raw data of the loaded file.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Returns a bounds-checked slice of the file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the file.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }

    /// Converts a relative virtual address to a file offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the RVA is not backed by file data.
    pub fn rva_to_offset(&self, rva: usize) -> Result<usize> {
        match &self.layout {
            Layout::Flat { base_rva } => {
                let base = *base_rva as usize;
                if rva < base || rva - base >= self.len() {
                    return Err(malformed_error!(
                        "RVA could not be converted to offset - {}",
                        rva
                    ));
                }

                Ok(rva - base)
            }
            Layout::Pe { sections } => {
                let rva_u64 = rva as u64;
                for section in sections {
                    if u64::from(section.virtual_address) <= rva_u64
                        && section.virtual_end() > rva_u64
                    {
                        return Ok(
                            (rva - section.virtual_address as usize)
                                + section.pointer_to_raw_data as usize,
                        );
                    }
                }

                Err(malformed_error!(
                    "RVA could not be converted to offset - {}",
                    rva
                ))
            }
        }
    }

    /// Converts a file offset to a relative virtual address.
    ///
    /// # Errors
    ///
    /// Returns an error if the offset does not belong to a mapped region.
    pub fn offset_to_rva(&self, offset: usize) -> Result<usize> {
        match &self.layout {
            Layout::Flat { base_rva } => {
                if offset >= self.len() {
                    return Err(out_of_bounds_error!());
                }

                Ok(offset + *base_rva as usize)
            }
            Layout::Pe { sections } => {
                for section in sections {
                    let start = section.pointer_to_raw_data as usize;
                    let end = start + section.size_of_raw_data as usize;
                    if offset >= start && offset < end {
                        return Ok(offset - start + section.virtual_address as usize);
                    }
                }

                Err(malformed_error!(
                    "Offset could not be converted to RVA - {}",
                    offset
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_mapping() {
        let file = File::from_flat(vec![0u8; 0x100], 0x2000).unwrap();

        assert!(file.is_flat());
        assert_eq!(file.clr(), (0x2000, COR20_HEADER_SIZE));
        assert_eq!(file.rva_to_offset(0x2010).unwrap(), 0x10);
        assert_eq!(file.offset_to_rva(0x10).unwrap(), 0x2010);
        assert!(file.rva_to_offset(0x1FFF).is_err());
        assert!(file.rva_to_offset(0x2100).is_err());
    }

    #[test]
    fn flat_too_small() {
        assert!(matches!(File::from_flat(Vec::new(), 0), Err(Empty)));
        assert!(File::from_flat(vec![0u8; 8], 0).is_err());
    }

    #[test]
    fn load_invalid() {
        assert!(matches!(File::from_mem(Vec::new()), Err(Empty)));
        assert!(File::from_mem(vec![0xCC; 256]).is_err());
    }
}
