//! String Heap (`#Strings`) for .NET Metadata
//!
//! Provides access to the ECMA-335 `#Strings` heap, which stores the identifiers of the
//! metadata tables as null terminated UTF-8 strings.
//!
//! # Reference
//! - [ECMA-335 II.24.2.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::{ffi::CStr, str};

use crate::Result;

/// A view of the `#Strings` heap: null terminated UTF-8 strings addressed by byte offset
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Create a `Strings` view over the heap data
    ///
    /// # Errors
    /// Returns an error if the heap is empty or does not start with the empty string
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Provided #Strings heap is invalid"));
        }

        Ok(Strings { data })
    }

    /// Get the string at `index`
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds or the string is not terminated or not
    /// valid UTF-8
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        match CStr::from_bytes_until_nul(&self.data[index..]) {
            Ok(result) => match result.to_str() {
                Ok(result) => Ok(result),
                Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
            },
            Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
        }
    }

    /// The raw heap bytes
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        let data = b"\0<Module>\0System.Console\0WriteLine\0";

        let str_view = Strings::from(data).unwrap();
        assert_eq!(str_view.get(0).unwrap(), "");
        assert_eq!(str_view.get(1).unwrap(), "<Module>");
        assert_eq!(str_view.get(10).unwrap(), "System.Console");
        assert_eq!(str_view.get(17).unwrap(), "Console");
        assert_eq!(str_view.get(25).unwrap(), "WriteLine");
        assert!(str_view.get(data.len()).is_err());
    }

    #[test]
    fn invalid() {
        assert!(Strings::from(b"").is_err());
        assert!(Strings::from(b"A\0").is_err());

        let unterminated = Strings::from(b"\0abc").unwrap();
        assert!(unterminated.get(1).is_err());
    }
}
