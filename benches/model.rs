extern crate dotmodel;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use dotmodel::prelude::*;
use std::{hint::black_box, sync::Arc};

const TYPES: u32 = 2_000;

/// A module with `TYPES` classes, each implementing `System.IDisposable` and carrying one
/// custom attribute
fn synthetic_image() -> Vec<u8> {
    let mut builder = RawMetadataBuilder::new();
    let name = builder.string("Bench.dll").unwrap();
    builder
        .add_row(TableId::Module, vec![0, name, 0, 0, 0])
        .unwrap();

    let mscorlib = builder.string("mscorlib").unwrap();
    builder
        .add_row(TableId::AssemblyRef, vec![4, 0, 0, 0, 0, 0, mscorlib, 0, 0])
        .unwrap();
    let scope = CodedIndex::new(TableId::AssemblyRef, 1)
        .encode(CodedIndexType::ResolutionScope)
        .unwrap();
    let system = builder.string("System").unwrap();
    for name in ["Object", "IDisposable", "ObsoleteAttribute"] {
        let name = builder.string(name).unwrap();
        builder
            .add_row(TableId::TypeRef, vec![scope, name, system])
            .unwrap();
    }

    let object = CodedIndex::new(TableId::TypeRef, 1)
        .encode(CodedIndexType::TypeDefOrRef)
        .unwrap();
    let namespace = builder.string("Bench").unwrap();
    for index in 0..TYPES {
        let name = builder.string(&format!("Type{}", index)).unwrap();
        builder
            .add_row(
                TableId::TypeDef,
                vec![0x0010_0001, name, namespace, object, 1, 1],
            )
            .unwrap();
    }

    let ctor = builder.string(".ctor").unwrap();
    let signature = builder.blob(&[0x20, 0x00, 0x01]).unwrap();
    let parent = CodedIndex::new(TableId::TypeRef, 3)
        .encode(CodedIndexType::MemberRefParent)
        .unwrap();
    builder
        .add_row(TableId::MemberRef, vec![parent, ctor, signature])
        .unwrap();

    let disposable = CodedIndex::new(TableId::TypeRef, 2)
        .encode(CodedIndexType::TypeDefOrRef)
        .unwrap();
    for rid in 1..=TYPES {
        builder
            .add_row(TableId::InterfaceImpl, vec![rid, disposable])
            .unwrap();
    }

    let constructor = CodedIndex::new(TableId::MemberRef, 1)
        .encode(CodedIndexType::CustomAttributeType)
        .unwrap();
    let value = builder.blob(&[0x01, 0x00, 0x00, 0x00]).unwrap();
    for rid in 1..=TYPES {
        let owner = CodedIndex::new(TableId::TypeDef, rid)
            .encode(CodedIndexType::HasCustomAttribute)
            .unwrap();
        builder
            .add_row(TableId::CustomAttribute, vec![owner, constructor, value])
            .unwrap();
    }

    builder.build_image().unwrap()
}

fn load(image: &[u8]) -> Arc<ModuleDef> {
    ModuleDef::load(File::from_flat(image.to_vec(), 0x2000).unwrap()).unwrap()
}

fn bench_materialization(c: &mut Criterion) {
    let image = synthetic_image();

    let mut group = c.benchmark_group("model");
    group.throughput(Throughput::Elements(u64::from(TYPES)));
    group.bench_function("load", |b| {
        b.iter(|| black_box(load(black_box(&image))));
    });
    group.bench_function("lazy_interfaces", |b| {
        b.iter_batched(
            || load(&image),
            |module| {
                for rid in 1..=TYPES {
                    let type_def = module.type_def(rid).unwrap();
                    black_box(type_def.interfaces().unwrap().len());
                }
            },
            BatchSize::SmallInput,
        );
    });
    group.bench_function("preload", |b| {
        b.iter_batched(
            || load(&image),
            |module| module.preload().unwrap(),
            BatchSize::SmallInput,
        );
    });
    group.bench_function("cached_lookup", |b| {
        let module = load(&image);
        module.preload().unwrap();
        b.iter(|| {
            for rid in 1..=TYPES {
                black_box(module.type_def(black_box(rid)).unwrap());
            }
        });
    });
    group.finish();
}

fn bench_writer(c: &mut Criterion) {
    let image = synthetic_image();

    let mut group = c.benchmark_group("writer");
    group.throughput(Throughput::Bytes(image.len() as u64));
    group.bench_function("unmodified", |b| {
        let module = load(&image);
        b.iter(|| black_box(ImageWriter::new(&module).write().unwrap()));
    });
    group.bench_function("materialized", |b| {
        let module = load(&image);
        module.preload().unwrap();
        b.iter(|| black_box(ImageWriter::new(&module).write().unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_materialization, bench_writer);
criterion_main!(benches);
