use std::sync::RwLock;

use crate::{
    metadata::tables::{
        CustomAttributeRc, HeapBlob, HeapString, MemberRefParent, MetadataEntity, RowId, TableId,
    },
    utils::{ItemList, LazySlot},
    Result,
};

use super::FIELD_SIGNATURE;

/// A reference to a field or method of another type
pub struct MemberRef {
    pub(crate) row: RowId,
    pub(crate) class: RwLock<MemberRefParent>,
    /// Name of the member
    pub name: HeapString,
    /// Field or method signature blob
    pub signature: HeapBlob,
    pub(crate) custom_attributes: LazySlot<ItemList<CustomAttributeRc>>,
}

impl MetadataEntity for MemberRef {
    const TABLE: TableId = TableId::MemberRef;

    fn row_id(&self) -> &RowId {
        &self.row
    }
}

impl MemberRef {
    /// Create a new reference to member `name` of `class`
    #[must_use]
    pub fn new(class: MemberRefParent, name: &str, signature: &[u8]) -> Self {
        MemberRef {
            row: RowId::user(),
            class: RwLock::new(class),
            name: HeapString::user(name),
            signature: HeapBlob::user(signature),
            custom_attributes: LazySlot::ready(ItemList::default()),
        }
    }

    /// The type (or method, or module) declaring the member
    #[must_use]
    pub fn class(&self) -> MemberRefParent {
        read_lock!(self.class).clone()
    }

    /// Replace the declaring type
    pub fn set_class(&self, class: MemberRefParent) {
        *write_lock!(self.class) = class;
    }

    /// Returns true if the signature describes a field
    #[must_use]
    pub fn is_field(&self) -> bool {
        self.signature.get().first() == Some(&FIELD_SIGNATURE)
    }

    /// The custom attributes applied to this reference
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
        let reference = MemberRef::new(MemberRefParent::ModuleRef(2), "Field", &[0x06, 0x08]);
        assert!(reference.is_user());
        assert!(reference.is_field());
        assert_eq!(reference.class().token().value(), 0x1A00_0002);

        reference.signature.set(&[0x00, 0x00, 0x01]);
        assert!(!reference.is_field());
    }
}
