use crate::{
    metadata::{
        signatures::{parse_type_spec_signature, TypeSig},
        tables::{CustomAttributeRc, MetadataEntity, RowId, TableId},
    },
    utils::{ItemList, LazySlot},
    Result,
};

/// A constructed type: generic instantiation, array, pointer or generic parameter
///
/// The signature blob is immutable, a different signature is a different `TypeSpec`.
pub struct TypeSpec {
    pub(crate) row: RowId,
    pub(crate) signature_index: u32,
    pub(crate) signature: Vec<u8>,
    pub(crate) parsed: LazySlot<TypeSig>,
    pub(crate) custom_attributes: LazySlot<ItemList<CustomAttributeRc>>,
}

impl MetadataEntity for TypeSpec {
    const TABLE: TableId = TableId::TypeSpec;

    fn row_id(&self) -> &RowId {
        &self.row
    }
}

impl TypeSpec {
    /// Create a new `TypeSpec` from an encoded type signature
    #[must_use]
    pub fn new(signature: &[u8]) -> Self {
        TypeSpec {
            row: RowId::user(),
            signature_index: 0,
            signature: signature.to_vec(),
            parsed: LazySlot::empty(),
            custom_attributes: LazySlot::ready(ItemList::default()),
        }
    }

    /// The raw signature blob
    #[must_use]
    pub fn signature_blob(&self) -> &[u8] {
        &self.signature
    }

    /// The parsed signature
    ///
    /// # Errors
    /// Returns an error if the blob is not a valid type signature
    pub fn signature(&self) -> Result<&TypeSig> {
        self.parsed
            .get_or_materialize(|| parse_type_spec_signature(&self.signature))
    }

    /// The custom attributes applied to this type
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
        let spec = TypeSpec::new(&[0x13, 0x01]);
        assert!(spec.is_user());
        assert_eq!(spec.signature().unwrap(), &TypeSig::Var(1));
        assert!(std::ptr::eq(spec.signature().unwrap(), spec.signature().unwrap()));
        assert_eq!(spec.signature_blob(), &[0x13, 0x01]);

        assert!(TypeSpec::new(&[0xFF]).signature().is_err());
    }
}
