use crate::{
    metadata::tables::{
        CodedIndex, CodedIndexType, CustomAttributeRc, HeapString, MetadataEntity, RowId,
        ResolutionScope, TableId,
    },
    utils::{ItemList, LazySlot, LazyValue},
    Result,
};

/// A reference to a type of another scope
pub struct TypeRef {
    pub(crate) row: RowId,
    pub(crate) scope_index: CodedIndex,
    pub(crate) scope: LazyValue<ResolutionScope>,
    /// Name of the type
    pub name: HeapString,
    /// Namespace of the type, empty for nested types
    pub namespace: HeapString,
    pub(crate) custom_attributes: LazySlot<ItemList<CustomAttributeRc>>,
}

impl MetadataEntity for TypeRef {
    const TABLE: TableId = TableId::TypeRef;

    fn row_id(&self) -> &RowId {
        &self.row
    }
}

impl TypeRef {
    /// Create a new reference to `namespace.name` in `scope`
    #[must_use]
    pub fn new(scope: ResolutionScope, namespace: &str, name: &str) -> Self {
        TypeRef {
            row: RowId::user(),
            scope_index: CodedIndex::null(CodedIndexType::ResolutionScope),
            scope: LazyValue::ready(scope),
            name: HeapString::user(name),
            namespace: HeapString::user(namespace),
            custom_attributes: LazySlot::ready(ItemList::default()),
        }
    }

    /// `Namespace.Name`, or just the name for references without a namespace
    #[must_use]
    pub fn full_name(&self) -> String {
        let namespace = self.namespace.get();
        if namespace.is_empty() {
            self.name.get()
        } else {
            format!("{}.{}", namespace, self.name.get())
        }
    }

    /// The resolution scope of this reference
    ///
    /// # Errors
    /// Returns an error if the scope is a `TypeRef` row that can not be decoded
    pub fn scope(&self) -> Result<ResolutionScope> {
        self.scope.get_or_materialize(|| {
            let index = self.scope_index;
            if index.is_null() {
                return Ok(ResolutionScope::None);
            }

            Ok(match index.tag {
                TableId::Module => ResolutionScope::Module(index.row),
                TableId::ModuleRef => ResolutionScope::ModuleRef(index.row),
                TableId::AssemblyRef => ResolutionScope::AssemblyRef(index.row),
                TableId::TypeRef => {
                    ResolutionScope::TypeRef(self.row.module()?.type_ref(index.row)?)
                }
                _ => {
                    return Err(malformed_error!(
                        "Invalid resolution scope {:?} for {}",
                        index.tag,
                        self.token()
                    ))
                }
            })
        })
    }

    /// Replace the resolution scope
    pub fn set_scope(&self, scope: ResolutionScope) {
        self.scope.set(scope);
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
