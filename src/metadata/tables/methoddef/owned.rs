use std::sync::atomic::{AtomicU32, Ordering};

use crate::{
    metadata::tables::{
        CustomAttributeRc, GenericParamRc, HeapBlob, HeapString, MetadataEntity, RowId, TableId,
    },
    utils::{ItemList, LazySlot},
    Result,
};

/// A method of a type defined in this module
pub struct MethodDef {
    pub(crate) row: RowId,
    /// RVA of the method body, 0 for abstract and runtime methods
    pub rva: AtomicU32,
    /// a 2-byte bitmask of type `MethodImplAttributes`
    pub impl_flags: AtomicU32,
    /// a 2-byte bitmask of type `MethodAttributes`
    pub flags: AtomicU32,
    /// Name of the method
    pub name: HeapString,
    /// Method signature blob
    pub signature: HeapBlob,
    pub(crate) param_list: u32,
    pub(crate) generic_params: LazySlot<ItemList<GenericParamRc>>,
    pub(crate) custom_attributes: LazySlot<ItemList<CustomAttributeRc>>,
}

impl MetadataEntity for MethodDef {
    const TABLE: TableId = TableId::MethodDef;

    fn row_id(&self) -> &RowId {
        &self.row
    }
}

impl MethodDef {
    /// The current RVA of the method body
    #[must_use]
    pub fn rva(&self) -> u32 {
        self.rva.load(Ordering::Acquire)
    }

    /// The current `MethodAttributes`
    #[must_use]
    pub fn flags(&self) -> u32 {
        self.flags.load(Ordering::Acquire)
    }

    /// The generic parameters of this method
    ///
    /// # Errors
    /// Returns an error if a `GenericParam` row can not be decoded
    pub fn generic_params(&self) -> Result<&ItemList<GenericParamRc>> {
        self.generic_params.get_or_materialize(|| {
            let module = self.row.module()?;
            module.generic_params_of(self.token()).map(ItemList::new)
        })
    }

    /// The custom attributes applied to this method
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
