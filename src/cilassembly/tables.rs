//! Rebuilding the rows of all tables from a module and its model.
//!
//! The builder starts from a snapshot of every table of the image and only rewrites what the
//! model can have changed:
//!
//! 1. rows of cached entities are re-encoded from their current values
//! 2. user rows of the registries get their rids and are appended
//! 3. the tables keyed by an owner whose collection was materialized are rebuilt, sorted and
//!    renumbered, and the custom attributes that point at renumbered rows follow them
//! 4. redirected references are rewritten
//!
//! Rows of tables without an entity model, and rows of entities that were never materialized,
//! are written back with their original column values.

use std::collections::{HashMap, HashSet};
use std::sync::{atomic::Ordering, Arc};

use rayon::prelude::*;
use strum::IntoEnumIterator;

use crate::{
    cilassembly::{
        heaps::{BlobHeapBuilder, GuidHeapBuilder, StringsHeapBuilder},
        metadata::TablesStream,
    },
    metadata::{
        module::ModuleDef,
        tables::{
            columns, sort_key, CodedIndex, CodedIndexType, ColumnSize, CustomAttributeRc,
            GenericParamRc, MemberRefParent, MetadataEntity, MetadataRow, MethodDefOrRef,
            ResolutionScope, RowId, TableId, TypeDefOrRef,
        },
        token::Token,
    },
    Error, Result,
};

/// The rid of a referenced row, which must be registered when it is a user row
fn rid_of<T: MetadataEntity>(row: &Arc<T>) -> Result<u32> {
    match row.rid() {
        0 => Err(Error::RowNotRegistered(T::TABLE)),
        rid => Ok(rid),
    }
}

fn coded(table: TableId, rid: u32, kind: CodedIndexType) -> Result<u32> {
    CodedIndex::new(table, rid).encode(kind)
}

fn encode_type(value: Option<&TypeDefOrRef>) -> Result<u32> {
    let (table, rid) = match value {
        None => return Ok(0),
        Some(TypeDefOrRef::TypeDef(row)) => (TableId::TypeDef, rid_of(row)?),
        Some(TypeDefOrRef::TypeRef(row)) => (TableId::TypeRef, rid_of(row)?),
        Some(TypeDefOrRef::TypeSpec(row)) => (TableId::TypeSpec, rid_of(row)?),
    };
    coded(table, rid, CodedIndexType::TypeDefOrRef)
}

fn encode_parent(value: &MemberRefParent) -> Result<u32> {
    let (table, rid) = match value {
        MemberRefParent::TypeDef(row) => (TableId::TypeDef, rid_of(row)?),
        MemberRefParent::TypeRef(row) => (TableId::TypeRef, rid_of(row)?),
        MemberRefParent::TypeSpec(row) => (TableId::TypeSpec, rid_of(row)?),
        MemberRefParent::MethodDef(row) => (TableId::MethodDef, rid_of(row)?),
        MemberRefParent::ModuleRef(rid) => (TableId::ModuleRef, *rid),
    };
    coded(table, rid, CodedIndexType::MemberRefParent)
}

fn encode_constructor(value: Option<&MethodDefOrRef>) -> Result<u32> {
    let (table, rid) = match value {
        None => return Ok(0),
        Some(MethodDefOrRef::MethodDef(row)) => (TableId::MethodDef, rid_of(row)?),
        Some(MethodDefOrRef::MemberRef(row)) => (TableId::MemberRef, rid_of(row)?),
    };
    coded(table, rid, CodedIndexType::CustomAttributeType)
}

fn encode_scope(value: &ResolutionScope) -> Result<u32> {
    let (table, rid) = match value {
        ResolutionScope::None => return Ok(0),
        ResolutionScope::Module(rid) => (TableId::Module, *rid),
        ResolutionScope::ModuleRef(rid) => (TableId::ModuleRef, *rid),
        ResolutionScope::AssemblyRef(rid) => (TableId::AssemblyRef, *rid),
        ResolutionScope::TypeRef(row) => (TableId::TypeRef, rid_of(row)?),
    };
    coded(table, rid, CodedIndexType::ResolutionScope)
}

/// The token a redirect target is written with
fn target_token(row: &MetadataRow) -> Result<Token> {
    let token = row.token();
    if token.row() == 0 {
        let table = token
            .table_id()
            .ok_or_else(|| malformed_error!("Redirect target {} has an unknown table", token))?;
        return Err(Error::RowNotRegistered(table));
    }
    Ok(token)
}

// Columns that define ranges of child rows, redirecting them would move members between owners
fn is_list_column(table: TableId, column: usize) -> bool {
    matches!(
        (table, column),
        (TableId::TypeDef, 4 | 5)
            | (TableId::MethodDef, 5)
            | (TableId::EventMap, 1)
            | (TableId::PropertyMap, 1)
    )
}

fn is_indirection_table(table: TableId) -> bool {
    matches!(
        table,
        TableId::FieldPtr
            | TableId::MethodPtr
            | TableId::ParamPtr
            | TableId::EventPtr
            | TableId::PropertyPtr
            | TableId::EncLog
            | TableId::EncMap
    )
}

/// Where a row of a rebuilt table comes from
enum RowSource<'r> {
    /// A row of the image, by its original rid
    Image(u32),
    /// A user row, which receives its rid from the rebuilt table
    User(&'r RowId),
}

impl<'r> RowSource<'r> {
    fn of(row: &'r RowId) -> Self {
        match row.image_rid() {
            Some(rid) => RowSource::Image(rid),
            None => RowSource::User(row),
        }
    }
}

/// The rows of all tables together with the heaps they index
pub(crate) struct TablesBuilder<'m> {
    module: &'m ModuleDef,
    pub(crate) stream: TablesStream,
    pub(crate) strings: StringsHeapBuilder,
    pub(crate) blobs: BlobHeapBuilder,
    pub(crate) guids: GuidHeapBuilder,
    /// Old rid to new rid of every renumbered table
    remaps: HashMap<TableId, HashMap<u32, u32>>,
    /// Tables rebuilt in key order
    rebuilt: u64,
}

impl<'m> TablesBuilder<'m> {
    /// Snapshot the tables and heaps of the image of `module`
    ///
    /// # Errors
    /// Returns an error if a row of the image can not be read
    pub(crate) fn new(module: &'m ModuleDef) -> Result<Self> {
        let image = module.image();
        let tables = TableId::iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|table| -> Result<Vec<Vec<u32>>> {
                let count = image.row_count(table);
                if count == 0 {
                    return Ok(Vec::new());
                }

                let view = image.table(table)?;
                (1..=count)
                    .map(|rid| view.read_row(rid))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let mut stream = TablesStream::from_header(image.tables_header());
        stream.tables = tables;

        Ok(TablesBuilder {
            module,
            stream,
            strings: StringsHeapBuilder::from_original(
                image.stream_data("#Strings").unwrap_or_default(),
            ),
            blobs: BlobHeapBuilder::from_original(image.stream_data("#Blob").unwrap_or_default()),
            guids: GuidHeapBuilder::from_original(image.stream_data("#GUID").unwrap_or_default()),
            remaps: HashMap::new(),
            rebuilt: 0,
        })
    }

    /// Snapshot `module` and apply the model to the snapshot
    ///
    /// # Errors
    /// Returns [`Error::RowNotRegistered`] if a row references a user row that was never added
    /// to the module, or an error if a row of the image can not be read
    pub(crate) fn build(module: &'m ModuleDef) -> Result<Self> {
        let mut builder = Self::new(module)?;
        builder.assign_user_rids();
        builder.encode_cached()?;
        builder.append_user_rows()?;
        builder.rebuild_interface_impls()?;
        builder.rebuild_class_layouts();
        builder.rebuild_generic_params()?;
        builder.rebuild_nested_classes();
        builder.rebuild_custom_attributes()?;
        builder.apply_redirects()?;

        builder.stream.sorted |= builder.rebuilt;
        Ok(builder)
    }

    fn row_mut(&mut self, table: TableId, rid: u32) -> Result<&mut Vec<u32>> {
        let index = rid.checked_sub(1).ok_or(Error::BadImageFormat { table, rid })?;
        self.stream
            .rows_mut(table)
            .get_mut(index as usize)
            .ok_or(Error::BadImageFormat { table, rid })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn assign_user_rids(&self) {
        let module = self.module;
        let base = module.row_count(TableId::TypeRef);
        for (index, row) in module.user_type_refs().iter().enumerate() {
            row.row.assign(base + index as u32 + 1);
        }

        let base = module.row_count(TableId::TypeSpec);
        for (index, row) in module.user_type_specs().iter().enumerate() {
            row.row.assign(base + index as u32 + 1);
        }

        let base = module.row_count(TableId::MemberRef);
        for (index, row) in module.user_member_refs().iter().enumerate() {
            row.row.assign(base + index as u32 + 1);
        }
    }

    #[allow(clippy::too_many_lines)]
    fn encode_cached(&mut self) -> Result<()> {
        let module = self.module;
        let cache = &module.cache;

        for entry in cache.type_defs.iter() {
            let type_def = entry.value();
            let name = self
                .strings
                .intern_at(type_def.name.index(), &type_def.name.get())?;
            let namespace = self
                .strings
                .intern_at(type_def.namespace.index(), &type_def.namespace.get())?;
            let extends = match type_def.extends.get() {
                Some(extends) => Some(encode_type(extends.as_ref())?),
                None => None,
            };

            let row = self.row_mut(TableId::TypeDef, type_def.rid())?;
            row[0] = type_def.flags();
            row[1] = name;
            row[2] = namespace;
            if let Some(extends) = extends {
                row[3] = extends;
            }
        }

        for entry in cache.type_refs.iter() {
            let type_ref = entry.value();
            let scope = match type_ref.scope.get() {
                Some(scope) => Some(encode_scope(&scope)?),
                None => None,
            };
            let name = self
                .strings
                .intern_at(type_ref.name.index(), &type_ref.name.get())?;
            let namespace = self
                .strings
                .intern_at(type_ref.namespace.index(), &type_ref.namespace.get())?;

            let row = self.row_mut(TableId::TypeRef, type_ref.rid())?;
            if let Some(scope) = scope {
                row[0] = scope;
            }
            row[1] = name;
            row[2] = namespace;
        }

        for entry in cache.fields.iter() {
            let field = entry.value();
            let name = self.strings.intern_at(field.name.index(), &field.name.get())?;
            let signature = self
                .blobs
                .intern_at(field.signature.index(), &field.signature.get())?;

            let row = self.row_mut(TableId::Field, field.rid())?;
            row[0] = field.flags();
            row[1] = name;
            row[2] = signature;
        }

        for entry in cache.method_defs.iter() {
            let method = entry.value();
            let name = self
                .strings
                .intern_at(method.name.index(), &method.name.get())?;
            let signature = self
                .blobs
                .intern_at(method.signature.index(), &method.signature.get())?;

            let row = self.row_mut(TableId::MethodDef, method.rid())?;
            row[0] = method.rva();
            row[1] = method.impl_flags.load(Ordering::Acquire);
            row[2] = method.flags();
            row[3] = name;
            row[4] = signature;
        }

        for entry in cache.member_refs.iter() {
            let member = entry.value();
            let class = encode_parent(&member.class())?;
            let name = self
                .strings
                .intern_at(member.name.index(), &member.name.get())?;
            let signature = self
                .blobs
                .intern_at(member.signature.index(), &member.signature.get())?;

            let row = self.row_mut(TableId::MemberRef, member.rid())?;
            row[0] = class;
            row[1] = name;
            row[2] = signature;
        }

        for entry in cache.interface_impls.iter() {
            let interface_impl = entry.value();
            let interface = encode_type(interface_impl.interface().as_ref())?;
            let row = self.row_mut(TableId::InterfaceImpl, interface_impl.rid())?;
            row[1] = interface;
        }

        for entry in cache.class_layouts.iter() {
            let layout = entry.value();
            let row = self.row_mut(TableId::ClassLayout, layout.rid())?;
            row[0] = layout.packing_size();
            row[1] = layout.class_size();
        }

        for entry in cache.custom_attributes.iter() {
            let attribute = entry.value();
            let constructor = encode_constructor(attribute.constructor().as_ref())?;
            let value = self
                .blobs
                .intern_at(attribute.value.index(), &attribute.value.get())?;

            let row = self.row_mut(TableId::CustomAttribute, attribute.rid())?;
            row[1] = constructor;
            row[2] = value;
        }

        for entry in cache.generic_params.iter() {
            let param = entry.value();
            let name = self.strings.intern_at(param.name.index(), &param.name.get())?;

            let row = self.row_mut(TableId::GenericParam, param.rid())?;
            row[0] = param.number();
            row[1] = param.flags();
            row[3] = name;
        }

        Ok(())
    }

    fn append_user_rows(&mut self) -> Result<()> {
        let module = self.module;

        let type_refs = module.user_type_refs();
        for type_ref in &type_refs {
            let row = vec![
                encode_scope(&type_ref.scope()?)?,
                self.strings.add(&type_ref.name.get())?,
                self.strings.add(&type_ref.namespace.get())?,
            ];
            self.stream.rows_mut(TableId::TypeRef).push(row);
        }

        let type_specs = module.user_type_specs();
        for type_spec in &type_specs {
            let row = vec![self.blobs.add(type_spec.signature_blob())?];
            self.stream.rows_mut(TableId::TypeSpec).push(row);
        }

        let member_refs = module.user_member_refs();
        for member in &member_refs {
            let row = vec![
                encode_parent(&member.class())?,
                self.strings.add(&member.name.get())?,
                self.blobs.add(&member.signature.get())?,
            ];
            self.stream.rows_mut(TableId::MemberRef).push(row);
        }

        log::debug!(
            "Appended {} TypeRef, {} TypeSpec and {} MemberRef rows",
            type_refs.len(),
            type_specs.len(),
            member_refs.len()
        );
        Ok(())
    }

    /// Sort `rows` by `key`, keeping the order of equal keys, and install them as `table`.
    ///
    /// User rows receive their rid, image rows are recorded in the remap of `table`.
    fn finish_table<K: Ord>(
        &mut self,
        table: TableId,
        mut rows: Vec<(RowSource<'_>, Vec<u32>)>,
        key: impl Fn(&[u32]) -> K,
    ) {
        rows.sort_by_key(|(_, row)| key(row.as_slice()));

        let mut remap = HashMap::with_capacity(rows.len());
        for (index, (source, _)) in rows.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let rid = index as u32 + 1;
            match source {
                RowSource::Image(old) => {
                    remap.insert(*old, rid);
                }
                RowSource::User(row) => row.assign(rid),
            }
        }

        log::debug!("Rebuilt {:?} with {} rows", table, rows.len());
        *self.stream.rows_mut(table) = rows.into_iter().map(|(_, row)| row).collect();
        self.remaps.insert(table, remap);
        self.rebuilt |= 1 << table as u64;
    }

    // Raw rows of `table` whose owner column is not one of `owners`
    fn kept_rows<'r>(
        &mut self,
        table: TableId,
        column: usize,
        owners: &HashSet<u32>,
    ) -> Vec<(RowSource<'r>, Vec<u32>)> {
        std::mem::take(self.stream.rows_mut(table))
            .into_iter()
            .enumerate()
            .filter(|(_, row)| !owners.contains(&row[column]))
            .map(|(index, row)| {
                #[allow(clippy::cast_possible_truncation)]
                let rid = index as u32 + 1;
                (RowSource::Image(rid), row)
            })
            .collect()
    }

    fn rebuild_interface_impls(&mut self) -> Result<()> {
        let owners: Vec<_> = self
            .module
            .cache
            .type_defs
            .iter()
            .filter_map(|entry| {
                let type_def = entry.value();
                let list = type_def.interfaces.get()?;
                Some((type_def.rid(), list.to_vec()))
            })
            .collect();
        if owners.is_empty() {
            return Ok(());
        }

        let keys: HashSet<u32> = owners.iter().map(|(owner, _)| *owner).collect();
        let mut rows = self.kept_rows(TableId::InterfaceImpl, 0, &keys);
        for (owner, items) in &owners {
            for item in items {
                let interface = encode_type(item.interface().as_ref())?;
                rows.push((RowSource::of(item.row_id()), vec![*owner, interface]));
            }
        }

        self.finish_table(TableId::InterfaceImpl, rows, |row| row[0]);
        Ok(())
    }

    fn rebuild_class_layouts(&mut self) {
        let owners: Vec<_> = self
            .module
            .cache
            .type_defs
            .iter()
            .filter_map(|entry| {
                let type_def = entry.value();
                let layout = type_def.class_layout.get()?;
                Some((type_def.rid(), layout))
            })
            .collect();
        if owners.is_empty() {
            return;
        }

        let keys: HashSet<u32> = owners.iter().map(|(owner, _)| *owner).collect();
        let mut rows = self.kept_rows(TableId::ClassLayout, 2, &keys);
        for (owner, layout) in &owners {
            if let Some(layout) = layout {
                rows.push((
                    RowSource::of(layout.row_id()),
                    vec![layout.packing_size(), layout.class_size(), *owner],
                ));
            }
        }

        self.finish_table(TableId::ClassLayout, rows, |row| row[2]);
    }

    fn rebuild_generic_params(&mut self) -> Result<()> {
        let module = self.module;
        let cache = &module.cache;
        let mut owners: Vec<(u32, Vec<GenericParamRc>)> = Vec::new();
        for entry in cache.type_defs.iter() {
            if let Some(list) = entry.value().generic_params.get() {
                let key = coded(
                    TableId::TypeDef,
                    entry.value().rid(),
                    CodedIndexType::TypeOrMethodDef,
                )?;
                owners.push((key, list.to_vec()));
            }
        }
        for entry in cache.method_defs.iter() {
            if let Some(list) = entry.value().generic_params.get() {
                let key = coded(
                    TableId::MethodDef,
                    entry.value().rid(),
                    CodedIndexType::TypeOrMethodDef,
                )?;
                owners.push((key, list.to_vec()));
            }
        }
        if owners.is_empty() {
            return Ok(());
        }

        let keys: HashSet<u32> = owners.iter().map(|(owner, _)| *owner).collect();
        let mut rows = self.kept_rows(TableId::GenericParam, 2, &keys);
        for (owner, items) in &owners {
            for item in items {
                let name = self.strings.intern_at(item.name.index(), &item.name.get())?;
                rows.push((
                    RowSource::of(item.row_id()),
                    vec![item.number(), item.flags(), *owner, name],
                ));
            }
        }
        self.finish_table(TableId::GenericParam, rows, |row| (row[2], row[0]));

        let remap = self
            .remaps
            .get(&TableId::GenericParam)
            .cloned()
            .unwrap_or_default();
        let constraints = std::mem::take(self.stream.rows_mut(TableId::GenericParamConstraint));
        let mut rows = Vec::with_capacity(constraints.len());
        for (index, mut row) in constraints.into_iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let rid = index as u32 + 1;
            match remap.get(&row[0]) {
                Some(owner) => {
                    row[0] = *owner;
                    rows.push((RowSource::Image(rid), row));
                }
                None => log::warn!(
                    "Dropping GenericParamConstraint {} of removed GenericParam {}",
                    rid,
                    row[0]
                ),
            }
        }
        self.finish_table(TableId::GenericParamConstraint, rows, |row| row[0]);
        Ok(())
    }

    fn rebuild_nested_classes(&mut self) {
        let owners: Vec<_> = self
            .module
            .cache
            .type_defs
            .iter()
            .filter_map(|entry| {
                let type_def = entry.value();
                let list = type_def.nested_types.get()?;
                Some((type_def.rid(), list.to_vec()))
            })
            .collect();
        if owners.is_empty() {
            return;
        }

        let keys: HashSet<u32> = owners.iter().map(|(owner, _)| *owner).collect();
        let mut rows = self.kept_rows(TableId::NestedClass, 1, &keys);
        for (owner, nested) in &owners {
            for nested in nested {
                rows.push((RowSource::Image(0), vec![nested.rid(), *owner]));
            }
        }

        self.finish_table(TableId::NestedClass, rows, |row| row[0]);
    }

    // Parent key of an image row after renumbering, `None` if the row was dropped
    fn parent_key(&self, table: TableId, rid: u32) -> Result<Option<u32>> {
        let rid = match self.remaps.get(&table) {
            Some(remap) => match remap.get(&rid) {
                Some(rid) => *rid,
                None => return Ok(None),
            },
            None => rid,
        };
        coded(table, rid, CodedIndexType::HasCustomAttribute).map(Some)
    }

    #[allow(clippy::too_many_lines)]
    fn rebuild_custom_attributes(&mut self) -> Result<()> {
        let module = self.module;
        let cache = &module.cache;
        let mut owners: Vec<(u32, Vec<CustomAttributeRc>)> = Vec::new();
        let mut seen = HashSet::new();

        macro_rules! collect_owners {
            ($table:expr, $rows:expr) => {
                for row in $rows {
                    let Some(list) = row.custom_attributes.get() else {
                        continue;
                    };
                    let rid = rid_of(&row)?;
                    let key = if row.is_user() {
                        Some(coded($table, rid, CodedIndexType::HasCustomAttribute)?)
                    } else {
                        self.parent_key($table, rid)?
                    };
                    let Some(key) = key else {
                        continue;
                    };
                    if seen.insert(key) {
                        owners.push((key, list.to_vec()));
                    }
                }
            };
        }

        collect_owners!(
            TableId::TypeDef,
            cache.type_defs.iter().map(|entry| entry.value().clone())
        );
        collect_owners!(
            TableId::TypeRef,
            cache
                .type_refs
                .iter()
                .map(|entry| entry.value().clone())
                .chain(module.user_type_refs())
        );
        collect_owners!(
            TableId::TypeSpec,
            cache
                .type_specs
                .iter()
                .map(|entry| entry.value().clone())
                .chain(module.user_type_specs())
        );
        collect_owners!(
            TableId::Field,
            cache.fields.iter().map(|entry| entry.value().clone())
        );
        collect_owners!(
            TableId::MethodDef,
            cache.method_defs.iter().map(|entry| entry.value().clone())
        );
        collect_owners!(
            TableId::MemberRef,
            cache
                .member_refs
                .iter()
                .map(|entry| entry.value().clone())
                .chain(module.user_member_refs())
        );

        // user interface implementations and generic parameters are only reachable from their owner
        let interface_impls: Vec<_> = cache
            .interface_impls
            .iter()
            .map(|entry| entry.value().clone())
            .chain(
                cache
                    .type_defs
                    .iter()
                    .filter_map(|entry| entry.value().interfaces.get().map(|list| list.to_vec()))
                    .flatten()
                    .filter(|item| item.is_user()),
            )
            .collect();
        collect_owners!(TableId::InterfaceImpl, interface_impls);

        let generic_params: Vec<_> = cache
            .generic_params
            .iter()
            .map(|entry| entry.value().clone())
            .chain(
                cache
                    .type_defs
                    .iter()
                    .filter_map(|entry| entry.value().generic_params.get().map(|list| list.to_vec()))
                    .chain(cache.method_defs.iter().filter_map(|entry| {
                        entry.value().generic_params.get().map(|list| list.to_vec())
                    }))
                    .flatten()
                    .filter(|item| item.is_user()),
            )
            .collect();
        collect_owners!(TableId::GenericParam, generic_params);

        let renumbered = [
            TableId::InterfaceImpl,
            TableId::GenericParam,
            TableId::GenericParamConstraint,
        ]
        .iter()
        .any(|table| self.remaps.contains_key(table));
        if owners.is_empty() && !renumbered {
            return Ok(());
        }

        let original = std::mem::take(self.stream.rows_mut(TableId::CustomAttribute));
        let mut rows = Vec::with_capacity(original.len());
        for (index, mut row) in original.into_iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let rid = index as u32 + 1;
            let parent = CodedIndex::decode(row[0], CodedIndexType::HasCustomAttribute)?;
            let key = if parent.is_null() {
                Some(row[0])
            } else {
                self.parent_key(parent.tag, parent.row)?
            };

            let Some(key) = key else {
                log::warn!(
                    "Dropping CustomAttribute {} of removed {:?} {}",
                    rid,
                    parent.tag,
                    parent.row
                );
                continue;
            };
            if seen.contains(&key) {
                continue;
            }

            row[0] = key;
            rows.push((RowSource::Image(rid), row));
        }

        for (key, items) in &owners {
            for item in items {
                let constructor = encode_constructor(item.constructor().as_ref())?;
                let value = self.blobs.intern_at(item.value.index(), &item.value.get())?;
                rows.push((RowSource::of(item.row_id()), vec![*key, constructor, value]));
            }
        }

        self.finish_table(TableId::CustomAttribute, rows, |row| row[0]);
        Ok(())
    }

    fn apply_redirects(&mut self) -> Result<()> {
        for (from, to) in self.module.redirects() {
            let Some(from_table) = from.table_id() else {
                continue;
            };
            let to = target_token(&to)?;
            let Some(to_table) = to.table_id() else {
                continue;
            };

            let mut replaced = 0usize;
            for table in TableId::iter() {
                if is_indirection_table(table) {
                    continue;
                }

                let key = sort_key(table);
                for (column, (_, size)) in columns(table).iter().enumerate() {
                    if key == Some(column) || is_list_column(table, column) {
                        continue;
                    }

                    match size {
                        ColumnSize::Table(target)
                            if *target == from_table && from_table == to_table =>
                        {
                            for row in self.stream.rows_mut(table) {
                                if row[column] == from.row() {
                                    row[column] = to.row();
                                    replaced += 1;
                                }
                            }
                        }
                        ColumnSize::Coded(kind)
                            if kind.contains(from_table) && kind.contains(to_table) =>
                        {
                            let old = coded(from_table, from.row(), *kind)?;
                            let new = coded(to_table, to.row(), *kind)?;
                            for row in self.stream.rows_mut(table) {
                                if row[column] == old {
                                    row[column] = new;
                                    replaced += 1;
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }

            log::debug!("Redirected {} references from {} to {}", replaced, from, to);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_columns() {
        assert!(is_list_column(TableId::TypeDef, 4));
        assert!(is_list_column(TableId::TypeDef, 5));
        assert!(is_list_column(TableId::MethodDef, 5));
        assert!(!is_list_column(TableId::TypeDef, 3));
        assert!(!is_list_column(TableId::MemberRef, 0));
    }

    #[test]
    fn null_references_encode_to_zero() {
        assert_eq!(encode_type(None).unwrap(), 0);
        assert_eq!(encode_constructor(None).unwrap(), 0);
        assert_eq!(encode_scope(&ResolutionScope::None).unwrap(), 0);
        assert_eq!(
            encode_scope(&ResolutionScope::AssemblyRef(1)).unwrap(),
            (1 << 2) | 2
        );
        assert_eq!(
            encode_parent(&MemberRefParent::ModuleRef(3)).unwrap(),
            (3 << 3) | 2
        );
    }

    #[test]
    fn unregistered_rows_are_rejected() {
        let type_ref = Arc::new(crate::metadata::tables::TypeRef::new(
            ResolutionScope::AssemblyRef(1),
            "System",
            "Object",
        ));
        assert!(matches!(
            encode_type(Some(&TypeDefOrRef::TypeRef(type_ref))),
            Err(Error::RowNotRegistered(TableId::TypeRef))
        ));
    }
}
