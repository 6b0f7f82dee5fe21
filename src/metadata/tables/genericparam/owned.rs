use std::sync::atomic::{AtomicU32, Ordering};

use crate::{
    metadata::tables::{CustomAttributeRc, HeapString, MetadataEntity, RowId, TableId},
    utils::{ItemList, LazySlot},
    Result,
};

/// A generic parameter of a type or a method
///
/// The owner is the type or method whose collection this parameter is part of. When written,
/// parameters are ordered by owner and then by [`GenericParam::number`].
pub struct GenericParam {
    pub(crate) row: RowId,
    /// Position of the parameter
    pub number: AtomicU32,
    /// a 2-byte bitmask of type `GenericParamAttributes`
    pub flags: AtomicU32,
    /// Name of the parameter
    pub name: HeapString,
    pub(crate) custom_attributes: LazySlot<ItemList<CustomAttributeRc>>,
}

impl MetadataEntity for GenericParam {
    const TABLE: TableId = TableId::GenericParam;

    fn row_id(&self) -> &RowId {
        &self.row
    }
}

impl GenericParam {
    /// Create a new parameter
    #[must_use]
    pub fn new(number: u16, flags: u16, name: &str) -> Self {
        GenericParam {
            row: RowId::user(),
            number: AtomicU32::new(u32::from(number)),
            flags: AtomicU32::new(u32::from(flags)),
            name: HeapString::user(name),
            custom_attributes: LazySlot::ready(ItemList::default()),
        }
    }

    /// The current position
    #[must_use]
    pub fn number(&self) -> u32 {
        self.number.load(Ordering::Acquire)
    }

    /// The current `GenericParamAttributes`
    #[must_use]
    pub fn flags(&self) -> u32 {
        self.flags.load(Ordering::Acquire)
    }

    /// The custom attributes applied to this parameter
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_row() {
        let param = GenericParam::new(1, 0, "TValue");
        assert!(param.is_user());
        assert_eq!(param.number(), 1);
        assert_eq!(param.name.get(), "TValue");
        assert_eq!(param.token().value(), 0x2A00_0000);
        assert!(param.custom_attributes().unwrap().is_empty());
    }
}
