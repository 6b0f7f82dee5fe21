//! A small synthetic module shared by the integration tests.
//!
//! ```text
//! [Sample.dll]
//!   TypeDef 1  <Module>
//!   TypeDef 2  Sample.IFoo`1<T>             interface
//!   TypeDef 3  Sample.Widget : System.Object, System.IDisposable   [Obsolete], pack 8 size 16
//!   TypeDef 4  Sample.Gadget`1<[Obsolete] T> : System.Object, IFoo`1<!0>
//!   TypeRef 1..4  System.Object, System.IDisposable, System.ObsoleteAttribute, Nowhere.Missing
//!   TypeSpec 1..3 IFoo`1<!0>, !0, !!0
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use dotmodel::prelude::*;

pub const BASE_RVA: u32 = 0x2000;

pub const WIDGET: u32 = 3;
pub const GADGET: u32 = 4;
pub const MISSING_TYPE_REF: u32 = 4;
pub const OBSOLETE_CTOR: u32 = 1;
pub const TYPE_VAR_SPEC: u32 = 2;
pub const METHOD_VAR_SPEC: u32 = 3;

pub fn coded(table: TableId, rid: u32, kind: CodedIndexType) -> u32 {
    CodedIndex::new(table, rid).encode(kind).unwrap()
}

pub fn sample_image() -> Vec<u8> {
    let mut b = RawMetadataBuilder::new();

    let name = b.string("Sample.dll").unwrap();
    let mvid = b.guid(&[0x11; 16]).unwrap();
    b.add_row(TableId::Module, vec![0, name, mvid, 0, 0]).unwrap();

    let mscorlib = b.string("mscorlib").unwrap();
    let token = b.blob(&[0xB7, 0x7A, 0x5C, 0x56, 0x19, 0x34, 0xE0, 0x89]).unwrap();
    b.add_row(
        TableId::AssemblyRef,
        vec![4, 0, 0, 0, 0, token, mscorlib, 0, 0],
    )
    .unwrap();

    let scope = coded(TableId::AssemblyRef, 1, CodedIndexType::ResolutionScope);
    let system = b.string("System").unwrap();
    for name in ["Object", "IDisposable", "ObsoleteAttribute"] {
        let name = b.string(name).unwrap();
        b.add_row(TableId::TypeRef, vec![scope, name, system]).unwrap();
    }
    let missing = b.string("Missing").unwrap();
    let nowhere = b.string("Nowhere").unwrap();
    b.add_row(TableId::TypeRef, vec![scope, missing, nowhere]).unwrap();

    let object = coded(TableId::TypeRef, 1, CodedIndexType::TypeDefOrRef);
    let sample = b.string("Sample").unwrap();
    let module_type = b.string("<Module>").unwrap();
    let ifoo = b.string("IFoo`1").unwrap();
    let widget = b.string("Widget").unwrap();
    let gadget = b.string("Gadget`1").unwrap();
    b.add_row(TableId::TypeDef, vec![0, module_type, 0, 0, 1, 1])
        .unwrap();
    b.add_row(TableId::TypeDef, vec![0xA1, ifoo, sample, 0, 1, 1])
        .unwrap();
    b.add_row(TableId::TypeDef, vec![0x0010_0001, widget, sample, object, 1, 1])
        .unwrap();
    b.add_row(TableId::TypeDef, vec![0x0010_0001, gadget, sample, object, 2, 2])
        .unwrap();

    let count = b.string("count").unwrap();
    let int32 = b.blob(&[0x06, 0x08]).unwrap();
    b.add_row(TableId::Field, vec![0x0001, count, int32]).unwrap();

    let ctor = b.string(".ctor").unwrap();
    let run = b.string("Run").unwrap();
    let ctor_sig = b.blob(&[0x20, 0x00, 0x01]).unwrap();
    let run_sig = b.blob(&[0x00, 0x00, 0x01]).unwrap();
    b.add_row(TableId::MethodDef, vec![0, 0, 0x1886, ctor, ctor_sig, 1])
        .unwrap();
    b.add_row(TableId::MethodDef, vec![0, 0, 0x0086, run, run_sig, 1])
        .unwrap();

    let obsolete = coded(TableId::TypeRef, 3, CodedIndexType::MemberRefParent);
    b.add_row(TableId::MemberRef, vec![obsolete, ctor, ctor_sig])
        .unwrap();

    // IFoo`1<!0>
    let ifoo_of_t = b.blob(&[0x15, 0x12, 0x08, 0x01, 0x13, 0x00]).unwrap();
    b.add_row(TableId::TypeSpec, vec![ifoo_of_t]).unwrap();
    let var = b.blob(&[0x13, 0x00]).unwrap();
    b.add_row(TableId::TypeSpec, vec![var]).unwrap();
    let mvar = b.blob(&[0x1E, 0x00]).unwrap();
    b.add_row(TableId::TypeSpec, vec![mvar]).unwrap();

    let disposable = coded(TableId::TypeRef, 2, CodedIndexType::TypeDefOrRef);
    let ifoo_spec = coded(TableId::TypeSpec, 1, CodedIndexType::TypeDefOrRef);
    b.add_row(TableId::InterfaceImpl, vec![WIDGET, disposable])
        .unwrap();
    b.add_row(TableId::InterfaceImpl, vec![GADGET, ifoo_spec])
        .unwrap();

    b.add_row(TableId::ClassLayout, vec![8, 16, WIDGET]).unwrap();

    let t = b.string("T").unwrap();
    let ifoo_owner = coded(TableId::TypeDef, 2, CodedIndexType::TypeOrMethodDef);
    let gadget_owner = coded(TableId::TypeDef, GADGET, CodedIndexType::TypeOrMethodDef);
    b.add_row(TableId::GenericParam, vec![0, 0, ifoo_owner, t])
        .unwrap();
    b.add_row(TableId::GenericParam, vec![0, 0, gadget_owner, t])
        .unwrap();

    let attribute = coded(
        TableId::MemberRef,
        OBSOLETE_CTOR,
        CodedIndexType::CustomAttributeType,
    );
    let value = b.blob(&[0x01, 0x00, 0x00, 0x00]).unwrap();
    let on_param = coded(TableId::GenericParam, 2, CodedIndexType::HasCustomAttribute);
    let on_widget = coded(TableId::TypeDef, WIDGET, CodedIndexType::HasCustomAttribute);
    b.add_row(TableId::CustomAttribute, vec![on_param, attribute, value])
        .unwrap();
    b.add_row(TableId::CustomAttribute, vec![on_widget, attribute, value])
        .unwrap();

    b.build_image().unwrap()
}

pub fn load(image: Vec<u8>) -> Arc<ModuleDef> {
    ModuleDef::load(File::from_flat(image, BASE_RVA).unwrap()).unwrap()
}

pub fn sample() -> Arc<ModuleDef> {
    load(sample_image())
}

/// The raw metadata streams of `module`, by name
pub fn stream(module: &ModuleDef, name: &str) -> Vec<u8> {
    module.image().stream_data(name).unwrap_or_default().to_vec()
}
