use std::sync::atomic::{AtomicU32, Ordering};

use crate::{
    metadata::tables::{CustomAttributeRc, HeapBlob, HeapString, MetadataEntity, RowId, TableId},
    utils::{ItemList, LazySlot},
    Result,
};

/// A field of a type defined in this module
pub struct Field {
    pub(crate) row: RowId,
    /// a 2-byte bitmask of type `FieldAttributes`
    pub flags: AtomicU32,
    /// Name of the field
    pub name: HeapString,
    /// Field signature blob
    pub signature: HeapBlob,
    pub(crate) custom_attributes: LazySlot<ItemList<CustomAttributeRc>>,
}

impl MetadataEntity for Field {
    const TABLE: TableId = TableId::Field;

    fn row_id(&self) -> &RowId {
        &self.row
    }
}

impl Field {
    /// The current `FieldAttributes`
    #[must_use]
    pub fn flags(&self) -> u32 {
        self.flags.load(Ordering::Acquire)
    }

    /// The custom attributes applied to this field
    ///
    /// # Errors
    /// Returns an error if a `CustomAttribute` row can not be decoded
    pub fn custom_attributes(&self) -> Result<&ItemList<CustomAttributeRc>> {
        self.custom_attributes.get_or_materialize(|| {
            let module = self.row.module()?;
            module.custom_attributes_of(self.token()).map(ItemList::new)
        })
    }
}
