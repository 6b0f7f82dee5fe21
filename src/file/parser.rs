//! Low-level byte stream parser for metadata decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary data parser
//! for reading .NET metadata structures. It offers bounds-checked access to binary data, compressed
//! integer decoding and the compressed `TypeDefOrRef` token encoding used by signatures.
//!
//! # Key Components
//!
//! - [`crate::file::parser::Parser::seek`] / [`crate::file::parser::Parser::advance_by`] - Navigation
//! - [`crate::file::parser::Parser::read_le`] - Read primitive types (little-endian)
//! - [`crate::file::parser::Parser::read_compressed_uint`] - ECMA-335 II.23.2 compressed integers
//! - [`crate::file::parser::Parser::read_compressed_token`] - `TypeDefOrRefOrSpecEncoded` tokens
//!
//! # Examples
//!
//! ```rust
//! use dotmodel::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04, 0x81, 0x02];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_le::<u32>()?, 0x04030201);
//! assert_eq!(parser.read_compressed_uint()?, 0x102);
//! assert!(!parser.has_more_data());
//! # Ok::<(), dotmodel::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, CilIO},
    metadata::token::Token,
    Result,
};

/// A cursor over a byte slice for reading .NET metadata structures.
///
/// `Parser` maintains an internal position and checks every read against the end of the
/// data, so malformed or truncated input results in [`crate::Error::OutOfBounds`] instead of
/// a panic.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the underlying data buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if there is at least one byte left to read.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Number of bytes left between the current position and the end of the data.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move the position to `pos`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` is past the end of the data.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by `step` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        match self.position.checked_add(step) {
            Some(pos) if pos <= self.data.len() => {
                self.position = pos;
                Ok(())
            }
            _ => Err(out_of_bounds_error!()),
        }
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Peek at the byte at the current position without advancing.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if there is no data left.
    pub fn peek_byte(&self) -> Result<u8> {
        match self.data.get(self.position) {
            Some(byte) => Ok(*byte),
            None => Err(out_of_bounds_error!()),
        }
    }

    /// Read a type `T` in little-endian format and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read `length` raw bytes and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes are left.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let start = self.position;
        self.advance_by(length)?;
        Ok(&self.data[start..self.position])
    }

    /// Read a compressed unsigned integer as defined in ECMA-335 II.23.2.
    ///
    /// - Values 0-127: 1 byte (0xxxxxxx)
    /// - Values 128-16383: 2 bytes (10xxxxxx xxxxxxxx)
    /// - Values 16384-536870911: 4 bytes (110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx)
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] for an invalid leading byte.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.read_le::<u8>()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok(u32::from(first_byte));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_le::<u8>()?;
            let value = ((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte);
            return Ok(value);
        }

        // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let b1 = u32::from(self.read_le::<u8>()?);
            let b2 = u32::from(self.read_le::<u8>()?);
            let b3 = u32::from(self.read_le::<u8>()?);
            let value = ((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3;
            return Ok(value);
        }

        Err(malformed_error!("Invalid compressed uint - {}", first_byte))
    }

    /// Read a compressed `TypeDefOrRefOrSpecEncoded` token (ECMA-335 II.23.2.8).
    ///
    /// The two lowest bits select the table (`TypeDef`, `TypeRef`, `TypeSpec`), the remaining
    /// bits hold the row id.
    ///
    /// # Errors
    /// Returns an error if the compressed integer is invalid or uses the reserved tag 3.
    pub fn read_compressed_token(&mut self) -> Result<Token> {
        let value = self.read_compressed_uint()?;
        let rid = value >> 2;
        let table = match value & 0x3 {
            0x0 => 0x0200_0000,
            0x1 => 0x0100_0000,
            0x2 => 0x1B00_0000,
            _ => return Err(malformed_error!("Invalid compressed token tag - {}", value)),
        };

        Ok(Token::new(table | rid))
    }

    /// Read a null-terminated UTF-8 string and advance past the terminator.
    ///
    /// # Errors
    /// Returns an error if no terminator is found or the bytes are not valid UTF-8.
    pub fn read_string_utf8(&mut self) -> Result<&'a str> {
        let start = self.position;
        let Some(len) = self.data[start..].iter().position(|byte| *byte == 0) else {
            return Err(out_of_bounds_error!());
        };

        let value = std::str::from_utf8(&self.data[start..start + len])
            .map_err(|_| malformed_error!("Invalid UTF-8 string at offset - {}", start))?;
        self.position = start + len + 1;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_compressed_uint() {
        let test_cases = vec![
            (vec![0x03], 3),
            (vec![0x7F], 0x7F),
            (vec![0x80, 0x80], 0x80),
            (vec![0xAE, 0x57], 0x2E57),
            (vec![0xBF, 0xFF], 0x3FFF),
            (vec![0xC0, 0x00, 0x40, 0x00], 0x4000),
            (vec![0xDF, 0xFF, 0xFF, 0xFF], 0x1FFF_FFFF),
        ];

        for (input, expected) in test_cases {
            let mut parser = Parser::new(&input);
            let result = parser.read_compressed_uint().unwrap();
            assert_eq!(result, expected);
            assert!(!parser.has_more_data());
        }
    }

    #[test]
    fn test_read_compressed_uint_invalid() {
        let data = [0xE0];
        let mut parser = Parser::new(&data);
        assert!(parser.read_compressed_uint().is_err());

        let data = [0x80];
        let mut parser = Parser::new(&data);
        assert!(parser.read_compressed_uint().is_err());
    }

    #[test]
    fn test_read_compressed_token() {
        let test_cases = vec![
            (vec![0x49], Token::new(0x0100_0012)),
            (vec![0x08], Token::new(0x0200_0002)),
            (vec![0x0E], Token::new(0x1B00_0003)),
        ];

        for (input, expected) in test_cases {
            let mut parser = Parser::new(&input);
            assert_eq!(parser.read_compressed_token().unwrap(), expected);
        }

        let data = [0x03];
        let mut parser = Parser::new(&data);
        assert!(parser.read_compressed_token().is_err());
    }

    #[test]
    fn test_navigation() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut parser = Parser::new(&data);

        parser.seek(2).unwrap();
        assert_eq!(parser.read_le::<u8>().unwrap(), 0x03);
        assert_eq!(parser.remaining(), 1);
        assert!(parser.advance_by(2).is_err());
        assert_eq!(parser.pos(), 3);
        assert!(parser.seek(5).is_err());
        assert_eq!(parser.read_bytes(1).unwrap(), &[0x04]);
        assert!(parser.peek_byte().is_err());
    }

    #[test]
    fn test_read_string() {
        let data = b"abc\0de\0";
        let mut parser = Parser::new(data);
        assert_eq!(parser.read_string_utf8().unwrap(), "abc");
        assert_eq!(parser.read_string_utf8().unwrap(), "de");
        assert!(parser.read_string_utf8().is_err());
    }
}
