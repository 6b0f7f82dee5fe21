//! The open module: a parsed image plus the model cache of its rows.
//!
//! [`ModuleDef`] is the entry point of the object model. It hands out one entity per
//! (table, rid) pair, materialized on first request and cached for the lifetime of the module,
//! keeps the rows created by the user until they are written, and records reference
//! redirections that the writer applies.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotmodel::{metadata::tables::MetadataEntity, ModuleDef};
//!
//! let module = ModuleDef::from_file("tests/samples/Sample.dll".as_ref())?;
//! for type_def in module.type_defs()? {
//!     println!("{} {}", type_def.token(), type_def.full_name());
//!     for interface in type_def.interfaces()?.to_vec() {
//!         println!("  implements {:?}", interface.interface());
//!     }
//! }
//! # Ok::<(), dotmodel::Error>(())
//! ```

use std::{
    path::Path,
    sync::{Arc, Weak},
};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;
use rayon::prelude::*;

use crate::{
    file::File,
    metadata::{
        image::MetadataImage,
        resolver::GenericParamContext,
        signatures::TypeSig,
        tables::{
            ClassLayoutMap, ClassLayoutRaw, ClassLayoutRc, CodedIndex, CodedIndexType,
            CustomAttributeMap, CustomAttributeRaw, CustomAttributeRc, FieldMap, FieldRaw,
            FieldRc, GenericParamMap, GenericParamRaw, GenericParamRc, InterfaceImplMap,
            InterfaceImplRaw, InterfaceImplRc, MemberRef, MemberRefList, MemberRefMap,
            MemberRefRaw, MemberRefRc, MetadataEntity, MetadataRow, MetadataTable, MethodDefMap,
            MethodDefRaw, MethodDefRc, RandomRidList, RidList, RowId, TableId, TypeDefMap,
            TypeDefOrRef, TypeDefRaw, TypeDefRc, TypeRef, TypeRefList, TypeRefMap, TypeRefRaw,
            TypeRefRc, TypeSpec, TypeSpecList, TypeSpecMap, TypeSpecRaw, TypeSpecRc, sort_key,
        },
        token::Token,
    },
    Error, Result,
};

/// Options applied when opening a module
#[derive(Clone, Debug)]
pub struct ModuleOptions {
    /// Reject image-backed rows whose rid is outside of their table with
    /// [`crate::Error::BadImageFormat`]
    pub validate_rids: bool,
}

impl Default for ModuleOptions {
    fn default() -> Self {
        ModuleOptions {
            validate_rids: true,
        }
    }
}

/// Entities materialized so far, one map per modeled table
#[derive(Default)]
pub(crate) struct ModelCache {
    pub(crate) type_defs: TypeDefMap,
    pub(crate) type_refs: TypeRefMap,
    pub(crate) type_specs: TypeSpecMap,
    pub(crate) fields: FieldMap,
    pub(crate) method_defs: MethodDefMap,
    pub(crate) member_refs: MemberRefMap,
    pub(crate) interface_impls: InterfaceImplMap,
    pub(crate) class_layouts: ClassLayoutMap,
    pub(crate) custom_attributes: CustomAttributeMap,
    pub(crate) generic_params: GenericParamMap,
}

/// Rows created by the user and registered with the module
#[derive(Default)]
pub(crate) struct UserRows {
    pub(crate) type_refs: TypeRefList,
    pub(crate) type_specs: TypeSpecList,
    pub(crate) member_refs: MemberRefList,
}

/// An open module
pub struct ModuleDef {
    image: MetadataImage,
    options: ModuleOptions,
    me: Weak<ModuleDef>,
    pub(crate) cache: ModelCache,
    pub(crate) user: UserRows,
    redirects: DashMap<Token, MetadataRow>,
}

impl ModuleDef {
    /// Open the PE file at `path`
    ///
    /// # Errors
    /// Returns an error if the file can not be read or its metadata is malformed
    pub fn from_file(path: &Path) -> Result<Arc<ModuleDef>> {
        Self::load(File::from_file(path)?)
    }

    /// Open an in-memory PE file
    ///
    /// # Errors
    /// Returns an error if the data is not a PE file or its metadata is malformed
    pub fn from_mem(data: Vec<u8>) -> Result<Arc<ModuleDef>> {
        Self::load(File::from_mem(data)?)
    }

    /// Open `file` with the default options
    ///
    /// # Errors
    /// Returns an error if the metadata of `file` is malformed
    pub fn load(file: File) -> Result<Arc<ModuleDef>> {
        Self::load_with(file, ModuleOptions::default())
    }

    /// Open `file`
    ///
    /// Only the headers are parsed, rows are decoded when they are first requested.
    ///
    /// # Errors
    /// Returns an error if the metadata of `file` is malformed
    pub fn load_with(file: File, options: ModuleOptions) -> Result<Arc<ModuleDef>> {
        let image = MetadataImage::load(file)?;
        Ok(Arc::new_cyclic(|me| ModuleDef {
            image,
            options,
            me: me.clone(),
            cache: ModelCache::default(),
            user: UserRows::default(),
            redirects: DashMap::new(),
        }))
    }

    /// The parsed image
    #[must_use]
    pub fn image(&self) -> &MetadataImage {
        &self.image
    }

    /// The options this module was opened with
    #[must_use]
    pub fn options(&self) -> &ModuleOptions {
        &self.options
    }

    pub(crate) fn weak(&self) -> Weak<ModuleDef> {
        self.me.clone()
    }

    /// Number of rows of `table` in the image
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.image.row_count(table)
    }

    /// The name of the module, from the first `Module` row
    ///
    /// # Errors
    /// Returns an error if the image has no `Module` row
    pub fn name(&self) -> Result<String> {
        let index = self.image.table(TableId::Module)?.read_column(1, 1)?;
        Ok(self.string(index)?.to_string())
    }

    /// The string at `index` of the `#Strings` heap
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds
    pub fn string(&self, index: u32) -> Result<&str> {
        self.image.string(index)
    }

    /// The blob at `index` of the `#Blob` heap
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds
    pub fn blob(&self, index: u32) -> Result<&[u8]> {
        self.image.blob(index)
    }

    // Cached entity of (table, rid), decoding and publishing it on first request
    fn materialize<T, F>(
        &self,
        cache: &SkipMap<Token, Arc<T>>,
        table: TableId,
        rid: u32,
        build: F,
    ) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce(&MetadataTable<'_>, RowId) -> Result<Arc<T>>,
    {
        let token = Token::from_parts(table, rid);
        if let Some(entry) = cache.get(&token) {
            return Ok(entry.value().clone());
        }

        let row = RowId::image(self, table, rid)?;
        let candidate = build(&self.image.table(table)?, row)?;
        log::trace!("Materialized {}", token);

        Ok(cache.get_or_insert(token, candidate).value().clone())
    }

    /// The `TypeDef` row `rid`
    ///
    /// # Errors
    /// Returns an error if the row does not exist or can not be decoded
    pub fn type_def(&self, rid: u32) -> Result<TypeDefRc> {
        self.materialize(&self.cache.type_defs, TableId::TypeDef, rid, |table, row| {
            TypeDefRaw::read(table, rid)?.to_owned(self, row)
        })
    }

    /// The `TypeRef` row `rid`
    ///
    /// # Errors
    /// Returns an error if the row does not exist or can not be decoded
    pub fn type_ref(&self, rid: u32) -> Result<TypeRefRc> {
        self.materialize(&self.cache.type_refs, TableId::TypeRef, rid, |table, row| {
            TypeRefRaw::read(table, rid)?.to_owned(self, row)
        })
    }

    /// The `TypeSpec` row `rid`
    ///
    /// # Errors
    /// Returns an error if the row does not exist or can not be decoded
    pub fn type_spec(&self, rid: u32) -> Result<TypeSpecRc> {
        self.materialize(&self.cache.type_specs, TableId::TypeSpec, rid, |table, row| {
            TypeSpecRaw::read(table, rid)?.to_owned(self, row)
        })
    }

    /// The `Field` row `rid`
    ///
    /// # Errors
    /// Returns an error if the row does not exist or can not be decoded
    pub fn field(&self, rid: u32) -> Result<FieldRc> {
        self.materialize(&self.cache.fields, TableId::Field, rid, |table, row| {
            FieldRaw::read(table, rid)?.to_owned(self, row)
        })
    }

    /// The `MethodDef` row `rid`
    ///
    /// # Errors
    /// Returns an error if the row does not exist or can not be decoded
    pub fn method_def(&self, rid: u32) -> Result<MethodDefRc> {
        self.materialize(&self.cache.method_defs, TableId::MethodDef, rid, |table, row| {
            MethodDefRaw::read(table, rid)?.to_owned(self, row)
        })
    }

    /// The `MemberRef` row `rid`
    ///
    /// # Errors
    /// Returns an error if the row does not exist or can not be decoded
    pub fn member_ref(&self, rid: u32) -> Result<MemberRefRc> {
        self.materialize(&self.cache.member_refs, TableId::MemberRef, rid, |table, row| {
            MemberRefRaw::read(table, rid)?.to_owned(self, row)
        })
    }

    /// The `InterfaceImpl` row `rid`
    ///
    /// # Errors
    /// Returns an error if the row does not exist or can not be decoded
    pub fn interface_impl(&self, rid: u32) -> Result<InterfaceImplRc> {
        self.materialize(
            &self.cache.interface_impls,
            TableId::InterfaceImpl,
            rid,
            |table, row| InterfaceImplRaw::read(table, rid)?.to_owned(self, row),
        )
    }

    /// The `ClassLayout` row `rid`
    ///
    /// # Errors
    /// Returns an error if the row does not exist or can not be decoded
    pub fn class_layout(&self, rid: u32) -> Result<ClassLayoutRc> {
        self.materialize(
            &self.cache.class_layouts,
            TableId::ClassLayout,
            rid,
            |table, row| Ok(ClassLayoutRaw::read(table, rid)?.to_owned(row)),
        )
    }

    /// The `CustomAttribute` row `rid`
    ///
    /// # Errors
    /// Returns an error if the row does not exist or can not be decoded
    pub fn custom_attribute(&self, rid: u32) -> Result<CustomAttributeRc> {
        self.materialize(
            &self.cache.custom_attributes,
            TableId::CustomAttribute,
            rid,
            |table, row| CustomAttributeRaw::read(table, rid)?.to_owned(self, row),
        )
    }

    /// The `GenericParam` row `rid`
    ///
    /// # Errors
    /// Returns an error if the row does not exist or can not be decoded
    pub fn generic_param(&self, rid: u32) -> Result<GenericParamRc> {
        self.materialize(
            &self.cache.generic_params,
            TableId::GenericParam,
            rid,
            |table, row| GenericParamRaw::read(table, rid)?.to_owned(self, row),
        )
    }

    /// Number of types defined in the image
    #[must_use]
    pub fn type_def_count(&self) -> u32 {
        self.row_count(TableId::TypeDef)
    }

    /// All types defined in the image, in rid order
    ///
    /// # Errors
    /// Returns an error if a `TypeDef` row can not be decoded
    pub fn type_defs(&self) -> Result<Vec<TypeDefRc>> {
        (1..=self.type_def_count())
            .map(|rid| self.type_def(rid))
            .collect()
    }

    /// The entity of row `rid` of `table`, tables without an entity model yield
    /// [`MetadataRow::Other`]
    ///
    /// # Errors
    /// Returns an error if the row does not exist or can not be decoded
    pub fn row(&self, table: TableId, rid: u32) -> Result<MetadataRow> {
        Ok(match table {
            TableId::TypeDef => MetadataRow::TypeDef(self.type_def(rid)?),
            TableId::TypeRef => MetadataRow::TypeRef(self.type_ref(rid)?),
            TableId::TypeSpec => MetadataRow::TypeSpec(self.type_spec(rid)?),
            TableId::Field => MetadataRow::Field(self.field(rid)?),
            TableId::MethodDef => MetadataRow::MethodDef(self.method_def(rid)?),
            TableId::MemberRef => MetadataRow::MemberRef(self.member_ref(rid)?),
            TableId::InterfaceImpl => MetadataRow::InterfaceImpl(self.interface_impl(rid)?),
            TableId::ClassLayout => MetadataRow::ClassLayout(self.class_layout(rid)?),
            TableId::CustomAttribute => {
                MetadataRow::CustomAttribute(self.custom_attribute(rid)?)
            }
            TableId::GenericParam => MetadataRow::GenericParam(self.generic_param(rid)?),
            _ => {
                if self.options.validate_rids && (rid == 0 || rid > self.row_count(table)) {
                    return Err(Error::BadImageFormat { table, rid });
                }
                MetadataRow::Other(Token::from_parts(table, rid))
            }
        })
    }

    /// Every row of `table` in the image, in rid order
    ///
    /// # Errors
    /// Returns an error if a row can not be decoded
    pub fn rows(&self, table: TableId) -> Result<Vec<MetadataRow>> {
        (1..=self.row_count(table))
            .map(|rid| self.row(table, rid))
            .collect()
    }

    /// The row addressed by `token`, `None` if there is no such row.
    ///
    /// Rids past the end of the image tables address user rows that were assigned a rid by a
    /// previous write.
    #[must_use]
    pub fn resolve_token(&self, token: Token) -> Option<MetadataRow> {
        let table = token.table_id()?;
        let rid = token.row();
        if rid == 0 {
            return None;
        }

        if rid <= self.row_count(table) {
            return match self.row(table, rid) {
                Ok(row) => Some(row),
                Err(error) => {
                    log::debug!("Failed to resolve {}: {}", token, error);
                    None
                }
            };
        }

        let found = match table {
            TableId::TypeRef => self
                .user
                .type_refs
                .iter()
                .find(|(_, row)| row.rid() == rid)
                .map(|(_, row)| MetadataRow::TypeRef(row.clone())),
            TableId::TypeSpec => self
                .user
                .type_specs
                .iter()
                .find(|(_, row)| row.rid() == rid)
                .map(|(_, row)| MetadataRow::TypeSpec(row.clone())),
            TableId::MemberRef => self
                .user
                .member_refs
                .iter()
                .find(|(_, row)| row.rid() == rid)
                .map(|(_, row)| MetadataRow::MemberRef(row.clone())),
            _ => None,
        };

        if found.is_none() {
            log::debug!("Token {} does not address a row", token);
        }
        found
    }

    /// The target of a `TypeDefOrRef` coded index, `None` for a null index
    ///
    /// # Errors
    /// Returns an error if the index references a row that does not exist
    pub fn type_def_or_ref(&self, index: CodedIndex) -> Result<Option<TypeDefOrRef>> {
        if index.is_null() {
            return Ok(None);
        }

        Ok(Some(match index.tag {
            TableId::TypeDef => TypeDefOrRef::TypeDef(self.type_def(index.row)?),
            TableId::TypeRef => TypeDefOrRef::TypeRef(self.type_ref(index.row)?),
            TableId::TypeSpec => TypeDefOrRef::TypeSpec(self.type_spec(index.row)?),
            _ => {
                return Err(malformed_error!(
                    "Invalid TypeDefOrRef target {:?}",
                    index.tag
                ))
            }
        }))
    }

    /// Resolve a `TypeDefOrRef` coded index in `context`.
    ///
    /// A `TypeSpec` that is a bare generic parameter (`!n` or `!!n`) is replaced by the
    /// matching instantiation argument of the context, when the context carries one.
    /// Unresolvable references yield `None`.
    #[must_use]
    pub fn resolve_type_def_or_ref(
        &self,
        index: CodedIndex,
        context: &GenericParamContext,
    ) -> Option<TypeDefOrRef> {
        let resolved = match self.type_def_or_ref(index) {
            Ok(resolved) => resolved?,
            Err(error) => {
                log::debug!("Failed to resolve {:?}: {}", index, error);
                return None;
            }
        };

        Some(self.instantiate(resolved, context))
    }

    /// Replace a `TypeSpec` that is a bare generic parameter with the matching instantiation
    /// argument of `context`, other references are returned unchanged
    pub(crate) fn instantiate(
        &self,
        reference: TypeDefOrRef,
        context: &GenericParamContext,
    ) -> TypeDefOrRef {
        if let TypeDefOrRef::TypeSpec(spec) = &reference {
            let argument = match spec.signature() {
                Ok(TypeSig::Var(number)) => context.type_args.get(*number as usize),
                Ok(TypeSig::MVar(number)) => context.method_args.get(*number as usize),
                _ => None,
            };

            if let Some(argument) = argument {
                return argument.clone();
            }
        }

        reference
    }

    /// The rids of the fields (`TableId::Field`) or methods (`TableId::MethodDef`) owned by
    /// the type `type_rid`, following the `FieldPtr` / `MethodPtr` indirection when present
    ///
    /// # Errors
    /// Returns an error if `table` is neither `Field` nor `MethodDef`, or a row can not be read
    pub fn member_rids(&self, table: TableId, type_rid: u32) -> Result<RidList> {
        let (column, pointer) = match table {
            TableId::Field => (4, TableId::FieldPtr),
            TableId::MethodDef => (5, TableId::MethodPtr),
            _ => return Err(malformed_error!("{:?} is not a member table", table)),
        };

        let type_defs = self.image.table(TableId::TypeDef)?;
        let pointer_rows = self.row_count(pointer);
        if pointer_rows == 0 {
            return type_defs.list_range(type_rid, column, self.row_count(table));
        }

        let pointers = self.image.table(pointer)?;
        let range = type_defs.list_range(type_rid, column, pointer_rows)?;
        let mut list = RandomRidList::with_capacity(range.length() as usize);
        for pointer_rid in range.iter() {
            list.append(pointers.read_column(pointer_rid, 0)?);
        }

        Ok(RidList::from(list))
    }

    /// The rids of `table` whose `column` equals `key`.
    ///
    /// Uses a binary search when the table is marked sorted by `column`, a linear scan otherwise.
    ///
    /// # Errors
    /// Returns an error if a row can not be read
    pub fn children(&self, table: TableId, column: usize, key: u32) -> Result<RidList> {
        if self.row_count(table) == 0 {
            return Ok(RidList::EMPTY);
        }

        let sorted = self.image.is_sorted(table) && sort_key(table) == Some(column);
        self.image.table(table)?.children(column, key, sorted)
    }

    /// The generic parameters owned by the `TypeDef` or `MethodDef` `owner`
    ///
    /// # Errors
    /// Returns an error if `owner` can not own generic parameters or a row can not be decoded
    pub fn generic_params_of(&self, owner: Token) -> Result<Vec<GenericParamRc>> {
        let key = CodedIndex::try_from(owner)?.encode(CodedIndexType::TypeOrMethodDef)?;
        self.children(TableId::GenericParam, 2, key)?
            .iter()
            .map(|rid| self.generic_param(rid))
            .collect()
    }

    /// The custom attributes applied to `parent`
    ///
    /// # Errors
    /// Returns an error if `parent` can not carry attributes or a row can not be decoded
    pub fn custom_attributes_of(&self, parent: Token) -> Result<Vec<CustomAttributeRc>> {
        let key = CodedIndex::try_from(parent)?.encode(CodedIndexType::HasCustomAttribute)?;
        self.children(TableId::CustomAttribute, 0, key)?
            .iter()
            .map(|rid| self.custom_attribute(rid))
            .collect()
    }

    /// Register a new `TypeRef`, it is written as a new row
    pub fn add_type_ref(&self, row: TypeRef) -> TypeRefRc {
        let row = Arc::new(row);
        self.user.type_refs.push(row.clone());
        row
    }

    /// Register a new `TypeSpec`, it is written as a new row
    pub fn add_type_spec(&self, row: TypeSpec) -> TypeSpecRc {
        let row = Arc::new(row);
        self.user.type_specs.push(row.clone());
        row
    }

    /// Register a new `MemberRef`, it is written as a new row
    pub fn add_member_ref(&self, row: MemberRef) -> MemberRefRc {
        let row = Arc::new(row);
        self.user.member_refs.push(row.clone());
        row
    }

    /// The registered user `TypeRef` rows, in registration order
    #[must_use]
    pub fn user_type_refs(&self) -> Vec<TypeRefRc> {
        self.user.type_refs.iter().map(|(_, row)| row.clone()).collect()
    }

    /// The registered user `TypeSpec` rows, in registration order
    #[must_use]
    pub fn user_type_specs(&self) -> Vec<TypeSpecRc> {
        self.user.type_specs.iter().map(|(_, row)| row.clone()).collect()
    }

    /// The registered user `MemberRef` rows, in registration order
    #[must_use]
    pub fn user_member_refs(&self) -> Vec<MemberRefRc> {
        self.user.member_refs.iter().map(|(_, row)| row.clone()).collect()
    }

    /// Mark every reference to `from` for redirection to `to`.
    ///
    /// The table columns that reference `from` are rewritten to the token `to` has when the
    /// module is written. A later redirect of the same token replaces the earlier one.
    pub fn redirect(&self, from: Token, to: impl Into<MetadataRow>) {
        let to = to.into();
        log::debug!("Redirecting {} to {}", from, to.token());
        self.redirects.insert(from, to);
    }

    /// The redirection target of `token`, if any
    #[must_use]
    pub fn redirect_target(&self, token: Token) -> Option<MetadataRow> {
        self.redirects.get(&token).map(|entry| entry.value().clone())
    }

    /// Remove the redirection of `token`, returning its target
    pub fn clear_redirect(&self, token: Token) -> Option<MetadataRow> {
        self.redirects.remove(&token).map(|(_, target)| target)
    }

    pub(crate) fn redirects(&self) -> Vec<(Token, MetadataRow)> {
        self.redirects
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Materialize every type together with its interfaces, generic parameters and custom
    /// attributes, in parallel
    ///
    /// # Errors
    /// Returns the first error encountered while decoding
    pub fn preload(&self) -> Result<()> {
        (1..=self.type_def_count())
            .into_par_iter()
            .try_for_each(|rid| -> Result<()> {
                let type_def = self.type_def(rid)?;
                type_def.interfaces()?;
                type_def.generic_params()?;
                type_def.custom_attributes()?;
                Ok(())
            })?;

        log::debug!(
            "Preloaded {} types, {} attributes",
            self.type_def_count(),
            self.cache.custom_attributes.len()
        );
        Ok(())
    }
}
