//! The contract shared by every modeled table row.
//!
//! A row is either backed by the image of a [`ModuleDef`] or created by the user. Image-backed
//! rows know their rid from the start and keep a weak reference to their module, through which
//! dependent collections are materialized on first access. User rows start with rid 0, their
//! rid is assigned by the writer.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, RwLock, Weak,
};

use crate::{
    metadata::{module::ModuleDef, tables::TableId, token::Token},
    Error, Result,
};

/// Where a row comes from
#[derive(Clone, Debug)]
pub enum RowOrigin {
    /// Created in memory, the rid is assigned when writing
    User,
    /// Read from the image of a module
    Image(Weak<ModuleDef>),
}

/// Identity of a row: its origin and its rid
#[derive(Debug)]
pub struct RowId {
    rid: AtomicU32,
    origin: RowOrigin,
}

impl RowId {
    /// Identity of a user created row
    #[must_use]
    pub fn user() -> Self {
        RowId {
            rid: AtomicU32::new(0),
            origin: RowOrigin::User,
        }
    }

    /// Identity of row `rid` of `table` in the image of `module`
    ///
    /// # Errors
    /// Returns [`Error::BadImageFormat`] if rid validation is enabled and `rid` is not a row of
    /// `table`
    pub fn image(module: &ModuleDef, table: TableId, rid: u32) -> Result<Self> {
        if module.options().validate_rids && (rid == 0 || rid > module.row_count(table)) {
            return Err(Error::BadImageFormat { table, rid });
        }

        Ok(RowId {
            rid: AtomicU32::new(rid),
            origin: RowOrigin::Image(module.weak()),
        })
    }

    /// The current rid, 0 for user rows that have not been written yet
    #[must_use]
    pub fn rid(&self) -> u32 {
        self.rid.load(Ordering::Acquire)
    }

    /// The rid this row has in its image, `None` for user rows
    #[must_use]
    pub fn image_rid(&self) -> Option<u32> {
        match self.origin {
            RowOrigin::User => None,
            RowOrigin::Image(_) => Some(self.rid()),
        }
    }

    /// The origin of this row
    #[must_use]
    pub fn origin(&self) -> &RowOrigin {
        &self.origin
    }

    /// Returns true for user created rows
    #[must_use]
    pub fn is_user(&self) -> bool {
        matches!(self.origin, RowOrigin::User)
    }

    /// The module whose image backs this row
    ///
    /// # Errors
    /// Returns [`Error::ModuleDropped`] if the module no longer exists, or an error for user
    /// rows, which have no backing image
    pub fn module(&self) -> Result<Arc<ModuleDef>> {
        match &self.origin {
            RowOrigin::Image(module) => module.upgrade().ok_or(Error::ModuleDropped),
            RowOrigin::User => Err(Error::Error(
                "A user created row has no backing image".to_string(),
            )),
        }
    }

    /// Assign the rid of a user row, image rows keep their rid
    pub(crate) fn assign(&self, rid: u32) {
        if self.is_user() {
            self.rid.store(rid, Ordering::Release);
        }
    }
}

/// Implemented by every modeled table row
pub trait MetadataEntity {
    /// The table this row belongs to
    const TABLE: TableId;

    /// Identity of this row
    fn row_id(&self) -> &RowId;

    /// The current rid
    fn rid(&self) -> u32 {
        self.row_id().rid()
    }

    /// The current token, its rid is 0 for user rows that have not been written yet
    fn token(&self) -> Token {
        Token::from_parts(Self::TABLE, self.rid())
    }

    /// Returns true for user created rows
    fn is_user(&self) -> bool {
        self.row_id().is_user()
    }
}

/// An editable `#Strings` value that remembers the heap index it was read from
#[derive(Debug)]
pub struct HeapString {
    index: u32,
    value: RwLock<String>,
}

impl HeapString {
    pub(crate) fn image(index: u32, value: &str) -> Self {
        HeapString {
            index,
            value: RwLock::new(value.to_string()),
        }
    }

    pub(crate) fn user(value: &str) -> Self {
        HeapString::image(0, value)
    }

    /// The current value
    #[must_use]
    pub fn get(&self) -> String {
        read_lock!(self.value).clone()
    }

    /// Replace the value
    pub fn set(&self, value: &str) {
        *write_lock!(self.value) = value.to_string();
    }

    /// The heap index of the original value, 0 for user values
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// An editable `#Blob` value that remembers the heap index it was read from
#[derive(Debug)]
pub struct HeapBlob {
    index: u32,
    value: RwLock<Vec<u8>>,
}

impl HeapBlob {
    pub(crate) fn image(index: u32, value: &[u8]) -> Self {
        HeapBlob {
            index,
            value: RwLock::new(value.to_vec()),
        }
    }

    pub(crate) fn user(value: &[u8]) -> Self {
        HeapBlob::image(0, value)
    }

    /// The current value
    #[must_use]
    pub fn get(&self) -> Vec<u8> {
        read_lock!(self.value).clone()
    }

    /// Replace the value
    pub fn set(&self, value: &[u8]) {
        *write_lock!(self.value) = value.to_vec();
    }

    /// The heap index of the original value, 0 for user values
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_rows() {
        let row = RowId::user();
        assert!(row.is_user());
        assert_eq!(row.rid(), 0);
        assert_eq!(row.image_rid(), None);
        assert!(row.module().is_err());

        row.assign(7);
        assert_eq!(row.rid(), 7);
    }

    #[test]
    fn heap_values() {
        let name = HeapString::image(12, "Object");
        assert_eq!(name.get(), "Object");
        name.set("Renamed");
        assert_eq!(name.get(), "Renamed");
        assert_eq!(name.index(), 12);

        let signature = HeapBlob::user(&[0x06, 0x08]);
        assert_eq!(signature.index(), 0);
        assert_eq!(signature.get(), vec![0x06, 0x08]);
    }
}
