use std::sync::atomic::{AtomicU32, Ordering};

use crate::{
    metadata::tables::{
        ClassLayoutRc, CodedIndex, CustomAttributeRc, FieldRc, GenericParamRc, HeapString,
        InterfaceImplRc, MetadataEntity, MethodDefRc, RowId, TableId, TypeDefOrRef, TypeDefRc,
    },
    utils::{ItemList, LazySlot, LazyValue},
    Result,
};

use super::TypeAttributes;

/// A type defined in this module
///
/// Name, namespace and flags are decoded when the row is created. The base type, the members
/// and every child collection are materialized on first access.
pub struct TypeDef {
    pub(crate) row: RowId,
    /// a 4-byte bitmask of type `TypeAttributes`
    pub flags: AtomicU32,
    /// Name of the type
    pub name: HeapString,
    /// Namespace of the type, empty for nested and global types
    pub namespace: HeapString,
    pub(crate) extends_index: CodedIndex,
    pub(crate) extends: LazyValue<Option<TypeDefOrRef>>,
    pub(crate) fields: LazySlot<Vec<FieldRc>>,
    pub(crate) methods: LazySlot<Vec<MethodDefRc>>,
    pub(crate) interfaces: LazySlot<ItemList<InterfaceImplRc>>,
    pub(crate) generic_params: LazySlot<ItemList<GenericParamRc>>,
    pub(crate) class_layout: LazyValue<Option<ClassLayoutRc>>,
    pub(crate) nested_types: LazySlot<ItemList<TypeDefRc>>,
    pub(crate) custom_attributes: LazySlot<ItemList<CustomAttributeRc>>,
}

impl MetadataEntity for TypeDef {
    const TABLE: TableId = TableId::TypeDef;

    fn row_id(&self) -> &RowId {
        &self.row
    }
}

impl TypeDef {
    /// `Namespace.Name`, or just the name for types without a namespace
    #[must_use]
    pub fn full_name(&self) -> String {
        let namespace = self.namespace.get();
        if namespace.is_empty() {
            self.name.get()
        } else {
            format!("{}.{}", namespace, self.name.get())
        }
    }

    /// The current `TypeAttributes`
    #[must_use]
    pub fn flags(&self) -> u32 {
        self.flags.load(Ordering::Acquire)
    }

    /// Returns true if the visibility flags mark this type as nested
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.flags() & TypeAttributes::VISIBILITY_MASK >= TypeAttributes::NESTED_PUBLIC
    }

    /// The base type, `None` for interfaces and `System.Object`
    ///
    /// # Errors
    /// Returns an error if the `Extends` column references a row that does not exist
    pub fn extends(&self) -> Result<Option<TypeDefOrRef>> {
        self.extends.get_or_materialize(|| {
            let module = self.row.module()?;
            module.type_def_or_ref(self.extends_index)
        })
    }

    /// Replace the base type
    pub fn set_extends(&self, extends: Option<TypeDefOrRef>) {
        self.extends.set(extends);
    }

    /// The fields owned by this type
    ///
    /// # Errors
    /// Returns an error if the field list points outside of the `Field` table
    pub fn fields(&self) -> Result<&[FieldRc]> {
        let fields = self.fields.get_or_materialize(|| {
            let module = self.row.module()?;
            module
                .member_rids(TableId::Field, self.rid())?
                .iter()
                .map(|rid| module.field(rid))
                .collect()
        })?;

        Ok(fields)
    }

    /// The methods owned by this type
    ///
    /// # Errors
    /// Returns an error if the method list points outside of the `MethodDef` table
    pub fn methods(&self) -> Result<&[MethodDefRc]> {
        let methods = self.methods.get_or_materialize(|| {
            let module = self.row.module()?;
            module
                .member_rids(TableId::MethodDef, self.rid())?
                .iter()
                .map(|rid| module.method_def(rid))
                .collect()
        })?;

        Ok(methods)
    }

    /// The interfaces implemented by this type
    ///
    /// # Errors
    /// Returns an error if an `InterfaceImpl` row can not be decoded
    pub fn interfaces(&self) -> Result<&ItemList<InterfaceImplRc>> {
        self.interfaces.get_or_materialize(|| {
            let module = self.row.module()?;
            let rids = module.children(TableId::InterfaceImpl, 0, self.rid())?;
            log::trace!("{} implements {} interfaces", self.token(), rids.length());

            rids.iter()
                .map(|rid| module.interface_impl(rid))
                .collect::<Result<Vec<_>>>()
                .map(ItemList::new)
        })
    }

    /// The generic parameters of this type
    ///
    /// # Errors
    /// Returns an error if a `GenericParam` row can not be decoded
    pub fn generic_params(&self) -> Result<&ItemList<GenericParamRc>> {
        self.generic_params.get_or_materialize(|| {
            let module = self.row.module()?;
            module.generic_params_of(self.token()).map(ItemList::new)
        })
    }

    /// The explicit layout of this type
    ///
    /// # Errors
    /// Returns an error if the `ClassLayout` row can not be decoded
    pub fn class_layout(&self) -> Result<Option<ClassLayoutRc>> {
        self.class_layout.get_or_materialize(|| {
            let module = self.row.module()?;
            let rids = module.children(TableId::ClassLayout, 2, self.rid())?;
            let first = rids.iter().next();
            match first {
                Some(rid) => module.class_layout(rid).map(Some),
                None => Ok(None),
            }
        })
    }

    /// Replace the explicit layout of this type
    pub fn set_class_layout(&self, layout: Option<ClassLayoutRc>) {
        self.class_layout.set(layout);
    }

    /// The types nested in this type
    ///
    /// # Errors
    /// Returns an error if a `NestedClass` row can not be decoded
    pub fn nested_types(&self) -> Result<&ItemList<TypeDefRc>> {
        self.nested_types.get_or_materialize(|| {
            let module = self.row.module()?;
            let nested_class = module.image().table(TableId::NestedClass)?;
            module
                .children(TableId::NestedClass, 1, self.rid())?
                .iter()
                .map(|rid| module.type_def(nested_class.read_column(rid, 0)?))
                .collect::<Result<Vec<_>>>()
                .map(ItemList::new)
        })
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
