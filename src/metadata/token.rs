//! Metadata tokens.
//!
//! A token is the stable address of a row: the table identifier in the high byte and the 1-based
//! row id (rid) in the low 24 bits. Rid 0 never addresses a row, a token with rid 0 is a null
//! reference into its table.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::metadata::tables::TableId;

/// A metadata token representing a reference to a metadata table entry.
///
/// Tokens in .NET metadata consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table type
/// - The low 24 bits (bits 0-23) indicate the row index within that table
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token addressing `rid` in `table`
    ///
    /// The rid is masked to 24 bits.
    #[must_use]
    pub fn from_parts(table: TableId, rid: u32) -> Self {
        Token(((table as u32) << 24) | (rid & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Returns the table of this token, or `None` for an unknown table byte
    #[must_use]
    pub fn table_id(&self) -> Option<TableId> {
        TableId::from_repr(self.table())
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_token_parts() {
        let token = Token(0x0600_0001);
        assert_eq!(token.table(), 0x06);
        assert_eq!(token.table_id(), Some(TableId::MethodDef));
        assert_eq!(token.row(), 1);

        let token = Token(0x06FF_FFFF);
        assert_eq!(token.row(), 0x00FF_FFFF);

        assert_eq!(Token(0x7000_0001).table_id(), None);
    }

    #[test]
    fn test_token_from_parts() {
        assert_eq!(Token::from_parts(TableId::TypeRef, 5), Token(0x0100_0005));
        assert_eq!(
            Token::from_parts(TableId::GenericParamConstraint, 0x0100_0002),
            Token(0x2C00_0002)
        );
        assert_eq!(Token::from_parts(TableId::Module, 0), Token(0));
    }

    #[test]
    fn test_token_null() {
        assert!(Token(0).is_null());
        assert!(!Token(0x0200_0000).is_null());
        assert_eq!(Token(0x0200_0000).row(), 0);
    }

    #[test]
    fn test_token_format() {
        let token = Token(0x0200_0005);
        assert_eq!(format!("{}", token), "0x02000005");
        assert_eq!(
            format!("{:?}", token),
            "Token(0x02000005, table: 0x02, row: 5)"
        );
    }

    #[test]
    fn test_token_conversions() {
        let token: Token = 0x0A00_0010_u32.into();
        let raw: u32 = token.into();
        assert_eq!(raw, 0x0A00_0010);
    }

    #[test]
    fn test_token_as_key() {
        let mut map = HashMap::new();
        map.insert(Token(0x0100_0001), "first");
        map.insert(Token(0x0100_0002), "second");

        assert_eq!(map.get(&Token(0x0100_0001)), Some(&"first"));
        assert_eq!(map.get(&Token(0x0100_0003)), None);
    }

    #[test]
    fn test_token_ordering() {
        let mut tokens = vec![Token(0x0200_0002), Token(0x0100_0005), Token(0x0200_0001)];
        tokens.sort();
        assert_eq!(
            tokens,
            vec![Token(0x0100_0005), Token(0x0200_0001), Token(0x0200_0002)]
        );
    }
}
