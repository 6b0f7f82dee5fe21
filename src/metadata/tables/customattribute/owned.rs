use std::sync::RwLock;

use crate::metadata::tables::{HeapBlob, MetadataEntity, MethodDefOrRef, RowId, TableId};

/// An attribute attached to a row
///
/// The decorated row is the owner of the collection this attribute is part of.
pub struct CustomAttribute {
    pub(crate) row: RowId,
    pub(crate) constructor: RwLock<Option<MethodDefOrRef>>,
    /// The encoded constructor arguments
    pub value: HeapBlob,
}

impl MetadataEntity for CustomAttribute {
    const TABLE: TableId = TableId::CustomAttribute;

    fn row_id(&self) -> &RowId {
        &self.row
    }
}

impl CustomAttribute {
    /// Create a new attribute calling `constructor` with the encoded arguments `value`
    #[must_use]
    pub fn new(constructor: MethodDefOrRef, value: &[u8]) -> Self {
        CustomAttribute {
            row: RowId::user(),
            constructor: RwLock::new(Some(constructor)),
            value: HeapBlob::user(value),
        }
    }

    /// The attribute constructor
    #[must_use]
    pub fn constructor(&self) -> Option<MethodDefOrRef> {
        read_lock!(self.constructor).clone()
    }

    /// Replace the attribute constructor
    pub fn set_constructor(&self, constructor: MethodDefOrRef) {
        *write_lock!(self.constructor) = Some(constructor);
    }
}
