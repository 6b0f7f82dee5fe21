use std::sync::RwLock;

use crate::{
    metadata::{
        module::ModuleDef,
        resolver::{GenericParamContext, Resolver},
        tables::{
            CustomAttributeRc, MetadataEntity, RowId, TableId, TypeDefOrRef, TypeDefRc,
        },
    },
    utils::{ItemList, LazySlot},
    Result,
};

/// One interface implemented by a type
///
/// The implementing type is the owner of the collection this row is part of.
pub struct InterfaceImpl {
    pub(crate) row: RowId,
    pub(crate) class: u32,
    pub(crate) interface: RwLock<Option<TypeDefOrRef>>,
    pub(crate) custom_attributes: LazySlot<ItemList<CustomAttributeRc>>,
}

impl MetadataEntity for InterfaceImpl {
    const TABLE: TableId = TableId::InterfaceImpl;

    fn row_id(&self) -> &RowId {
        &self.row
    }
}

impl InterfaceImpl {
    /// Create a new implementation of `interface`
    #[must_use]
    pub fn new(interface: TypeDefOrRef) -> Self {
        InterfaceImpl {
            row: RowId::user(),
            class: 0,
            interface: RwLock::new(Some(interface)),
            custom_attributes: LazySlot::ready(ItemList::default()),
        }
    }

    /// The implemented interface, `None` for a null reference
    #[must_use]
    pub fn interface(&self) -> Option<TypeDefOrRef> {
        read_lock!(self.interface).clone()
    }

    /// Replace the implemented interface
    pub fn set_interface(&self, interface: TypeDefOrRef) {
        *write_lock!(self.interface) = Some(interface);
    }

    /// Resolve the implemented interface to its definition in `module`.
    ///
    /// Image rows resolve in the generic context of the type that declares them, so an
    /// interface instantiated over the parameters of that type resolves to the generic
    /// interface definition.
    #[must_use]
    pub fn resolve(&self, module: &ModuleDef) -> Option<TypeDefRc> {
        let interface = self.interface()?;
        let context = match self.row.image_rid() {
            Some(_) if self.class != 0 => module
                .type_def(self.class)
                .map(GenericParamContext::for_type)
                .unwrap_or_default(),
            _ => GenericParamContext::default(),
        };

        Resolver::new(module).resolve_type(&interface, &context)
    }

    /// The custom attributes applied to this implementation
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
