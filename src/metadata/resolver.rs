//! Resolution of references to the rows that define them.
//!
//! A reference is resolved inside a [`GenericParamContext`] that names the type and method
//! whose generic parameters are in scope, and optionally the arguments they are instantiated
//! with. The context is always passed explicitly.
//!
//! Every resolution returns `None` when the defining row is not part of the module: references
//! into other assemblies, dangling tokens and malformed signatures are all expected outcomes.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotmodel::{
//!     metadata::resolver::{GenericParamContext, Resolver},
//!     ModuleDef,
//! };
//!
//! let module = ModuleDef::from_file("tests/samples/Sample.dll".as_ref())?;
//! let resolver = Resolver::new(&module);
//! for type_def in module.type_defs()? {
//!     let context = GenericParamContext::for_type(type_def.clone());
//!     if let Some(base) = type_def.extends()? {
//!         match resolver.resolve_type(&base, &context) {
//!             Some(definition) => println!("{} : {}", type_def.full_name(), definition.full_name()),
//!             None => println!("{} : {:?} (external)", type_def.full_name(), base),
//!         }
//!     }
//! }
//! # Ok::<(), dotmodel::Error>(())
//! ```

use crate::metadata::{
    module::ModuleDef,
    signatures::TypeSig,
    tables::{
        GenericParamRc, MemberDef, MemberRef, MemberRefParent, MetadataEntity, MethodDefRc,
        ResolutionScope, TableId, TypeDefOrRef, TypeDefRc, TypeRef, TypeSpec,
    },
    token::Token,
};

/// Nesting depth after which a chain of `TypeSpec` and nested `TypeRef` rows is considered
/// cyclic
const MAX_RESOLUTION_DEPTH: usize = 32;

/// The generic parameters in scope while resolving a reference
#[derive(Clone, Default)]
pub struct GenericParamContext {
    /// The type whose parameters `!n` refer to
    pub type_def: Option<TypeDefRc>,
    /// The method whose parameters `!!n` refer to
    pub method: Option<MethodDefRc>,
    /// Instantiation arguments substituted for `!n`
    pub type_args: Vec<TypeDefOrRef>,
    /// Instantiation arguments substituted for `!!n`
    pub method_args: Vec<TypeDefOrRef>,
}

impl GenericParamContext {
    /// The context of the members of `type_def`
    #[must_use]
    pub fn for_type(type_def: TypeDefRc) -> Self {
        GenericParamContext {
            type_def: Some(type_def),
            ..GenericParamContext::default()
        }
    }

    /// The context of the body of `method`, declared by `type_def`
    #[must_use]
    pub fn for_method(type_def: Option<TypeDefRc>, method: MethodDefRc) -> Self {
        GenericParamContext {
            type_def,
            method: Some(method),
            ..GenericParamContext::default()
        }
    }

    /// Attach the instantiation arguments of the type parameters
    #[must_use]
    pub fn with_type_args(mut self, args: Vec<TypeDefOrRef>) -> Self {
        self.type_args = args;
        self
    }

    /// Attach the instantiation arguments of the method parameters
    #[must_use]
    pub fn with_method_args(mut self, args: Vec<TypeDefOrRef>) -> Self {
        self.method_args = args;
        self
    }

    /// Returns true if no generic scope is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.type_def.is_none() && self.method.is_none()
    }
}

/// Resolves references of one module to the rows defining them
pub struct Resolver<'a> {
    module: &'a ModuleDef,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over `module`
    #[must_use]
    pub fn new(module: &'a ModuleDef) -> Self {
        Resolver { module }
    }

    /// Resolve a type reference to the type defined in this module, by namespace and name.
    ///
    /// Nested references are resolved through their enclosing reference. References scoped to
    /// another module or assembly resolve only if this module defines a matching type.
    #[must_use]
    pub fn resolve_type_ref(&self, type_ref: &TypeRef) -> Option<TypeDefRc> {
        self.resolve_type_ref_at(type_ref, 0)
    }

    fn resolve_type_ref_at(&self, type_ref: &TypeRef, depth: usize) -> Option<TypeDefRc> {
        if depth > MAX_RESOLUTION_DEPTH {
            log::debug!("Nesting of {} is too deep", type_ref.token());
            return None;
        }

        let scope = match type_ref.scope() {
            Ok(scope) => scope,
            Err(error) => {
                log::debug!("Scope of {} is invalid: {}", type_ref.token(), error);
                return None;
            }
        };

        let name = type_ref.name.get();
        let found = if let ResolutionScope::TypeRef(enclosing) = scope {
            let enclosing = self.resolve_type_ref_at(&enclosing, depth + 1)?;
            enclosing
                .nested_types()
                .ok()?
                .to_vec()
                .into_iter()
                .find(|nested| nested.name.get() == name)
        } else {
            let namespace = type_ref.namespace.get();
            self.module.type_defs().ok()?.into_iter().find(|candidate| {
                !candidate.is_nested()
                    && candidate.name.get() == name
                    && candidate.namespace.get() == namespace
            })
        };

        if found.is_none() {
            log::debug!(
                "{} ({}) is not defined in this module",
                type_ref.full_name(),
                type_ref.token()
            );
        }
        found
    }

    /// Resolve a `TypeDefOrRef` target to its definition.
    ///
    /// `TypeSpec` rows are followed through their signature: a class or value type resolves to
    /// the referenced type, a generic instantiation to its generic type, and a generic
    /// parameter to the instantiation argument of `context`.
    #[must_use]
    pub fn resolve_type(
        &self,
        reference: &TypeDefOrRef,
        context: &GenericParamContext,
    ) -> Option<TypeDefRc> {
        self.resolve_type_at(reference, context, 0)
    }

    fn resolve_type_at(
        &self,
        reference: &TypeDefOrRef,
        context: &GenericParamContext,
        depth: usize,
    ) -> Option<TypeDefRc> {
        if depth > MAX_RESOLUTION_DEPTH {
            log::debug!("Resolution of {} is too deep", reference.token());
            return None;
        }

        match reference {
            TypeDefOrRef::TypeDef(type_def) => Some(type_def.clone()),
            TypeDefOrRef::TypeRef(type_ref) => self.resolve_type_ref(type_ref),
            TypeDefOrRef::TypeSpec(type_spec) => {
                self.resolve_type_spec(type_spec, context, depth)
            }
        }
    }

    fn resolve_type_spec(
        &self,
        type_spec: &TypeSpec,
        context: &GenericParamContext,
        depth: usize,
    ) -> Option<TypeDefRc> {
        let signature = match type_spec.signature() {
            Ok(signature) => signature,
            Err(error) => {
                log::debug!("Signature of {} is invalid: {}", type_spec.token(), error);
                return None;
            }
        };

        let argument = match signature {
            TypeSig::Var(number) => context.type_args.get(*number as usize),
            TypeSig::MVar(number) => context.method_args.get(*number as usize),
            _ => {
                return signature
                    .type_token()
                    .and_then(|token| self.resolve_type_token(token, context, depth));
            }
        };

        match argument {
            Some(argument) => self.resolve_type_at(argument, context, depth + 1),
            None => {
                log::debug!(
                    "{} is a generic parameter without an instantiation argument",
                    type_spec.token()
                );
                None
            }
        }
    }

    fn resolve_type_token(
        &self,
        token: Token,
        context: &GenericParamContext,
        depth: usize,
    ) -> Option<TypeDefRc> {
        let reference = match token.table_id()? {
            TableId::TypeDef => TypeDefOrRef::TypeDef(self.module.type_def(token.row()).ok()?),
            TableId::TypeRef => TypeDefOrRef::TypeRef(self.module.type_ref(token.row()).ok()?),
            TableId::TypeSpec => {
                TypeDefOrRef::TypeSpec(self.module.type_spec(token.row()).ok()?)
            }
            _ => return None,
        };

        self.resolve_type_at(&reference, context, depth + 1)
    }

    /// Resolve a generic parameter signature (`!n` or `!!n`) to the parameter declared by the
    /// type or method of `context`
    #[must_use]
    pub fn resolve_generic_param(
        &self,
        signature: &TypeSig,
        context: &GenericParamContext,
    ) -> Option<GenericParamRc> {
        let (params, number) = match signature {
            TypeSig::Var(number) => (context.type_def.as_ref()?.generic_params().ok()?, number),
            TypeSig::MVar(number) => (context.method.as_ref()?.generic_params().ok()?, number),
            _ => return None,
        };

        params
            .to_vec()
            .into_iter()
            .find(|param| param.number() == *number)
    }

    /// Resolve a member reference to the field or method it names.
    ///
    /// The declaring type is resolved first, then a member with the same name and the same
    /// signature blob is searched. Field references (signature prefix `0x06`) only match
    /// fields, all others only match methods.
    #[must_use]
    pub fn resolve_member_ref(
        &self,
        member_ref: &MemberRef,
        context: &GenericParamContext,
    ) -> Option<MemberDef> {
        let declaring = match member_ref.class() {
            MemberRefParent::MethodDef(method) => return Some(MemberDef::Method(method)),
            MemberRefParent::ModuleRef(_) => {
                log::debug!("{} is a global member of another module", member_ref.token());
                return None;
            }
            parent => self.resolve_type(&parent.as_type()?, context)?,
        };

        let name = member_ref.name.get();
        let signature = member_ref.signature.get();
        let found = if member_ref.is_field() {
            declaring
                .fields()
                .ok()?
                .iter()
                .find(|field| field.name.get() == name && field.signature.get() == signature)
                .map(|field| MemberDef::Field(field.clone()))
        } else {
            declaring
                .methods()
                .ok()?
                .iter()
                .find(|method| {
                    method.name.get() == name && method.signature.get() == signature
                })
                .map(|method| MemberDef::Method(method.clone()))
        };

        if found.is_none() {
            log::debug!(
                "{}::{} ({}) is not defined in this module",
                declaring.full_name(),
                name,
                member_ref.token()
            );
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_builders() {
        let context = GenericParamContext::default();
        assert!(context.is_empty());
        assert!(context.type_args.is_empty());

        let context = context.with_type_args(Vec::new()).with_method_args(Vec::new());
        assert!(context.is_empty());
    }
}
