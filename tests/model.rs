//! Integration tests for loading and navigating the object model of a module

mod common;

use std::sync::{Arc, Barrier};

use dotmodel::{
    metadata::tables::{ColumnInfo, ColumnSize, TypeAttributes},
    prelude::*,
};

use common::{GADGET, METHOD_VAR_SPEC, MISSING_TYPE_REF, OBSOLETE_CTOR, TYPE_VAR_SPEC, WIDGET};

#[test]
fn module_and_types() -> Result<()> {
    let module = common::sample();
    assert_eq!(module.name()?, "Sample.dll");
    assert_eq!(module.type_def_count(), 4);

    let names: Vec<_> = module
        .type_defs()?
        .iter()
        .map(|type_def| type_def.full_name())
        .collect();
    assert_eq!(
        names,
        ["<Module>", "Sample.IFoo`1", "Sample.Widget", "Sample.Gadget`1"]
    );

    let widget = module.type_def(WIDGET)?;
    let extends = widget.extends()?.expect("Widget has a base type");
    assert_eq!(extends.token(), Token::from_parts(TableId::TypeRef, 1));
    assert_eq!(format!("{:?}", extends), "TypeRef(System.Object)");

    assert_eq!(widget.fields()?.len(), 1);
    assert_eq!(widget.fields()?[0].name.get(), "count");
    assert_eq!(widget.methods()?.len(), 1);
    assert_eq!(widget.methods()?[0].name.get(), ".ctor");

    let gadget = module.type_def(GADGET)?;
    assert!(gadget.fields()?.is_empty());
    assert_eq!(gadget.methods()?[0].name.get(), "Run");
    Ok(())
}

#[test]
fn member_ranges_follow_list_columns() -> Result<()> {
    let mut builder = RawMetadataBuilder::new();
    let name = builder.string("Ranges.dll")?;
    builder.add_row(TableId::Module, vec![0, name, 0, 0, 0])?;
    for (index, field_list) in [1, 1, 10, 15].into_iter().enumerate() {
        let name = builder.string(&format!("T{}", index))?;
        builder.add_row(TableId::TypeDef, vec![0, name, 0, 0, field_list, 1])?;
    }
    let signature = builder.blob(&[0x06, 0x08])?;
    for index in 0..16 {
        let name = builder.string(&format!("f{}", index))?;
        builder.add_row(TableId::Field, vec![0x0001, name, signature])?;
    }

    let module = common::load(builder.build_image()?);
    let fields = module.member_rids(TableId::Field, 3)?;
    assert_eq!(fields.length(), 5);
    assert_eq!((0..5).map(|index| fields.at(index)).collect::<Vec<_>>(), [10, 11, 12, 13, 14]);
    assert_eq!(fields.at(5), 0);

    assert_eq!(module.member_rids(TableId::Field, 4)?.length(), 2);
    assert!(module.member_rids(TableId::Field, 1)?.is_empty());
    assert!(module.member_rids(TableId::TypeRef, 1).is_err());
    Ok(())
}

#[test]
fn narrow_columns_truncate() -> Result<()> {
    let column = ColumnInfo::new(0, "Value", ColumnSize::UInt16, 0, 2);
    let mut data = [0u8; 4];
    let mut offset = 0;
    column.write(&mut data, &mut offset, 0x1FFFF)?;

    assert_eq!(offset, 2);
    assert_eq!(data, [0xFF, 0xFF, 0, 0]);
    assert_eq!(column.read_row(&data)?, 0xFFFF);
    Ok(())
}

#[test]
fn unresolved_references_are_not_found() -> Result<()> {
    let module = common::sample();

    assert!(module
        .resolve_token(Token::from_parts(TableId::TypeRef, 99))
        .is_none());
    assert!(module
        .resolve_token(Token::from_parts(TableId::TypeDef, 0))
        .is_none());
    assert!(matches!(
        module.type_ref(99),
        Err(Error::BadImageFormat { .. })
    ));

    let resolver = Resolver::new(&module);
    let missing = module.type_ref(MISSING_TYPE_REF)?;
    assert_eq!(missing.full_name(), "Nowhere.Missing");
    assert!(resolver.resolve_type_ref(&missing).is_none());

    let object = module.type_ref(1)?;
    assert!(resolver.resolve_type_ref(&object).is_none());
    Ok(())
}

#[test]
fn tokens_address_rows() -> Result<()> {
    let module = common::sample();

    let row = module
        .resolve_token(Token::from_parts(TableId::TypeDef, WIDGET))
        .expect("Widget is addressable");
    match row {
        MetadataRow::TypeDef(type_def) => assert_eq!(type_def.name.get(), "Widget"),
        other => panic!("unexpected row {:?}", other),
    }

    let row = module
        .resolve_token(Token::from_parts(TableId::AssemblyRef, 1))
        .expect("AssemblyRef rows are addressable");
    assert!(matches!(row, MetadataRow::Other(_)));
    Ok(())
}

#[test]
fn interfaces_resolve_in_the_declaring_context() -> Result<()> {
    let module = common::sample();

    let widget = module.type_def(WIDGET)?;
    let interfaces = widget.interfaces()?.to_vec();
    assert_eq!(interfaces.len(), 1);
    let disposable = interfaces[0].interface().expect("interface is set");
    assert_eq!(format!("{:?}", disposable), "TypeRef(System.IDisposable)");
    assert!(interfaces[0].resolve(&module).is_none());

    let gadget = module.type_def(GADGET)?;
    let interfaces = gadget.interfaces()?.to_vec();
    assert_eq!(interfaces.len(), 1);
    let resolved = interfaces[0].resolve(&module).expect("IFoo`1 is defined here");
    assert_eq!(resolved.full_name(), "Sample.IFoo`1");
    assert_eq!(resolved.flags() & TypeAttributes::INTERFACE, TypeAttributes::INTERFACE);

    assert_eq!(
        interfaces[0].interface().map(|interface| interface.token()),
        Some(Token::from_parts(TableId::TypeSpec, 1))
    );
    let Some(TypeDefOrRef::TypeSpec(spec)) = interfaces[0].interface() else {
        panic!("Gadget implements a constructed interface");
    };
    assert_eq!(
        spec.signature()?,
        &TypeSig::GenericInst {
            generic: Box::new(TypeSig::Class(Token::from_parts(TableId::TypeDef, 2))),
            args: vec![TypeSig::Var(0)],
        }
    );

    let context = GenericParamContext::for_type(gadget.clone());
    let param = Resolver::new(&module)
        .resolve_generic_param(&TypeSig::Var(0), &context)
        .expect("Gadget`1 declares T");
    assert_eq!(param.name.get(), "T");
    assert_eq!(param.rid(), 2);
    Ok(())
}

#[test]
fn coded_indexes_substitute_instantiation_arguments() -> Result<()> {
    let module = common::sample();
    let widget = TypeDefOrRef::TypeDef(module.type_def(WIDGET)?);
    let object = TypeDefOrRef::TypeRef(module.type_ref(1)?);

    let type_var = CodedIndex::new(TableId::TypeSpec, TYPE_VAR_SPEC);
    let method_var = CodedIndex::new(TableId::TypeSpec, METHOD_VAR_SPEC);
    let context = GenericParamContext::default()
        .with_type_args(vec![widget])
        .with_method_args(vec![object]);

    let resolved = module
        .resolve_type_def_or_ref(type_var, &context)
        .expect("!0 has an argument");
    assert_eq!(resolved.token(), Token::from_parts(TableId::TypeDef, WIDGET));
    let resolved = module
        .resolve_type_def_or_ref(method_var, &context)
        .expect("!!0 has an argument");
    assert_eq!(resolved.token(), Token::from_parts(TableId::TypeRef, 1));

    let empty = GenericParamContext::default();
    let unsubstituted = module
        .resolve_type_def_or_ref(type_var, &empty)
        .expect("TypeSpec 2 exists");
    assert_eq!(
        unsubstituted.token(),
        Token::from_parts(TableId::TypeSpec, TYPE_VAR_SPEC)
    );

    let plain = CodedIndex::new(TableId::TypeRef, 2);
    let resolved = module
        .resolve_type_def_or_ref(plain, &context)
        .expect("TypeRef 2 exists");
    assert_eq!(format!("{:?}", resolved), "TypeRef(System.IDisposable)");

    assert!(module
        .resolve_type_def_or_ref(CodedIndex::new(TableId::TypeRef, 99), &context)
        .is_none());
    Ok(())
}

#[test]
fn generic_parameters_resolve_through_the_context() -> Result<()> {
    let module = common::sample();
    let resolver = Resolver::new(&module);
    let var = TypeDefOrRef::TypeSpec(module.type_spec(TYPE_VAR_SPEC)?);

    let widget = TypeDefOrRef::TypeDef(module.type_def(WIDGET)?);
    let context = GenericParamContext::default().with_type_args(vec![widget]);
    let resolved = resolver
        .resolve_type(&var, &context)
        .expect("!0 is instantiated with Widget");
    assert_eq!(resolved.full_name(), "Sample.Widget");

    assert!(resolver
        .resolve_type(&var, &GenericParamContext::default())
        .is_none());

    let constructed = TypeDefOrRef::TypeSpec(module.type_spec(1)?);
    let resolved = resolver
        .resolve_type(&constructed, &GenericParamContext::default())
        .expect("IFoo`1 is defined here");
    assert_eq!(resolved.full_name(), "Sample.IFoo`1");
    Ok(())
}

#[test]
fn member_references_resolve_by_name_and_signature() -> Result<()> {
    let module = common::sample();
    let resolver = Resolver::new(&module);
    let context = GenericParamContext::default();
    let widget = module.type_def(WIDGET)?;

    let ctor = MemberRef::new(
        MemberRefParent::TypeDef(widget.clone()),
        ".ctor",
        &[0x20, 0x00, 0x01],
    );
    let resolved = resolver
        .resolve_member_ref(&ctor, &context)
        .expect("Widget declares .ctor");
    assert_eq!(resolved.token(), Token::from_parts(TableId::MethodDef, 1));
    assert!(matches!(resolved, MemberDef::Method(_)));

    let field = MemberRef::new(
        MemberRefParent::TypeDef(widget.clone()),
        "count",
        &[0x06, 0x08],
    );
    let resolved = resolver
        .resolve_member_ref(&field, &context)
        .expect("Widget declares count");
    assert_eq!(resolved.token(), Token::from_parts(TableId::Field, 1));

    let wrong_signature = MemberRef::new(
        MemberRefParent::TypeDef(widget),
        ".ctor",
        &[0x20, 0x01, 0x01, 0x08],
    );
    assert!(resolver.resolve_member_ref(&wrong_signature, &context).is_none());

    let missing = MemberRef::new(
        MemberRefParent::TypeRef(module.type_ref(MISSING_TYPE_REF)?),
        ".ctor",
        &[0x20, 0x00, 0x01],
    );
    assert!(resolver.resolve_member_ref(&missing, &context).is_none());

    let external = module.member_ref(OBSOLETE_CTOR)?;
    assert!(resolver.resolve_member_ref(&external, &context).is_none());
    Ok(())
}

#[test]
fn rid_validation_can_be_disabled() -> Result<()> {
    let image = common::sample_image();

    let strict = ModuleDef::load(File::from_flat(image.clone(), common::BASE_RVA)?)?;
    assert!(matches!(
        strict.row(TableId::AssemblyRef, 7),
        Err(Error::BadImageFormat {
            table: TableId::AssemblyRef,
            rid: 7
        })
    ));
    assert!(matches!(
        strict.type_ref(0),
        Err(Error::BadImageFormat { .. })
    ));

    let options = ModuleOptions {
        validate_rids: false,
    };
    let lenient = ModuleDef::load_with(File::from_flat(image, common::BASE_RVA)?, options)?;
    assert!(!lenient.options().validate_rids);
    assert!(matches!(
        lenient.row(TableId::AssemblyRef, 7)?,
        MetadataRow::Other(token) if token == Token::from_parts(TableId::AssemblyRef, 7)
    ));
    assert!(matches!(
        lenient.type_ref(99),
        Err(Error::OutOfBounds { .. })
    ));
    assert_eq!(lenient.type_ref(2)?.full_name(), "System.IDisposable");
    Ok(())
}

#[test]
fn layouts_and_attributes() -> Result<()> {
    let module = common::sample();

    let widget = module.type_def(WIDGET)?;
    let layout = widget.class_layout()?.expect("Widget has a layout");
    assert_eq!(layout.packing_size(), 8);
    assert_eq!(layout.class_size(), 16);
    assert!(module.type_def(GADGET)?.class_layout()?.is_none());

    let attributes = widget.custom_attributes()?.to_vec();
    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes[0].rid(), 2);
    assert_eq!(attributes[0].value.get(), [1, 0, 0, 0]);
    let constructor = attributes[0].constructor().expect("constructor is set");
    assert_eq!(constructor.token(), Token::from_parts(TableId::MemberRef, OBSOLETE_CTOR));
    assert_eq!(constructor.name(), ".ctor");

    let params = module.type_def(GADGET)?.generic_params()?.to_vec();
    assert_eq!(params.len(), 1);
    let attributes = params[0].custom_attributes()?.to_vec();
    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes[0].rid(), 1);

    let member = module.member_ref(OBSOLETE_CTOR)?;
    let MemberRefParent::TypeRef(parent) = member.class() else {
        panic!("the constructor is declared by a TypeRef");
    };
    assert_eq!(parent.full_name(), "System.ObsoleteAttribute");
    assert!(!member.is_field());
    Ok(())
}

#[test]
fn entities_are_materialized_once() -> Result<()> {
    let module = common::sample();

    let first = module.type_def(GADGET)?;
    let second = module.type_def(GADGET)?;
    assert!(Arc::ptr_eq(&first, &second));
    assert!(std::ptr::eq(first.interfaces()?, second.interfaces()?));

    let from_list = module.interface_impl(2)?;
    assert!(Arc::ptr_eq(&from_list, &first.interfaces()?.to_vec()[0]));
    Ok(())
}

#[test]
fn concurrent_readers_observe_one_value() -> Result<()> {
    let module = common::sample();

    let barrier = Barrier::new(8);
    let seen: Vec<(usize, usize)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let module = &module;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    let gadget = module.type_def(GADGET).unwrap();
                    let interfaces = gadget.interfaces().unwrap();
                    let params = gadget.generic_params().unwrap();
                    (
                        interfaces as *const _ as usize,
                        params as *const _ as usize,
                    )
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert!(seen.windows(2).all(|pair| pair[0] == pair[1]));
    Ok(())
}

#[test]
fn preload_materializes_collections() -> Result<()> {
    let module = common::sample();
    module.preload()?;

    let mut counts = Vec::new();
    for type_def in module.type_defs()? {
        counts.push((
            type_def.interfaces()?.len(),
            type_def.generic_params()?.len(),
            type_def.custom_attributes()?.len(),
        ));
    }
    assert_eq!(counts, [(0, 0, 0), (0, 1, 0), (1, 0, 1), (1, 1, 0)]);
    Ok(())
}

#[test]
fn user_rows_are_registered_in_order() -> Result<()> {
    let module = common::sample();

    let first = module.add_type_ref(TypeRef::new(
        ResolutionScope::AssemblyRef(1),
        "System",
        "ICloneable",
    ));
    let second = module.add_type_ref(TypeRef::new(
        ResolutionScope::TypeRef(first.clone()),
        "",
        "Nested",
    ));
    assert!(first.is_user());
    assert_eq!(first.rid(), 0);
    assert_eq!(second.full_name(), "Nested");

    let registered = module.user_type_refs();
    assert_eq!(registered.len(), 2);
    assert!(Arc::ptr_eq(&registered[0], &first));
    assert!(Arc::ptr_eq(&registered[1], &second));
    Ok(())
}

#[test]
fn redirects_can_be_replaced_and_cleared() -> Result<()> {
    let module = common::sample();
    let from = Token::from_parts(TableId::TypeRef, 1);

    let object = module.type_ref(1)?;
    let disposable = module.type_ref(2)?;
    module.redirect(from, TypeDefOrRef::TypeRef(object));
    module.redirect(from, TypeDefOrRef::TypeRef(disposable));

    let target = module.redirect_target(from).expect("token is redirected");
    assert_eq!(target.token(), Token::from_parts(TableId::TypeRef, 2));

    assert!(module.clear_redirect(from).is_some());
    assert!(module.redirect_target(from).is_none());
    Ok(())
}
