//! Benchmarks for mapping and comparing.
//!
//! Builds two synthetic versions of a wide library (many public types, each with
//! constructors, generic methods and a nested type) and measures:
//! - Building the mapper tree and running the rules on preloaded assemblies
//! - A full runner pass over several jobs, including loading and suppression filtering

extern crate dotcompat;

use criterion::{criterion_group, criterion_main, Criterion};
use dotcompat::prelude::*;
use std::{hint::black_box, sync::Arc};

const TYPE_COUNT: usize = 500;

fn library(version: u16) -> AssemblyDefinition {
    let mut assembly = AssemblyBuilder::new("Wide").version(version, 0, 0, 0);
    let thing = TypeSignature::named(assembly.type_ref("Wide", "IThing"));
    assembly = assembly.type_def(TypeBuilder::interface("Wide", "IThing"));

    for index in 0..TYPE_COUNT {
        let mut ty = TypeBuilder::class("Wide.Types", format!("Type{index}`1"))
            .default_constructor()
            .generic_param("T", |p| if version > 1 && index % 7 == 0 { p } else { p.class_constraint() })
            .method("Make", |m| {
                m.attributes(MethodAttributes::VIRTUAL)
                    .generic_param("U", |p| p.constraint(thing.clone()))
            })
            .method("Run", |m| m)
            .nested_type(TypeBuilder::class("", "Inner").nested_public().default_constructor());

        if version > 1 && index % 5 == 0 {
            ty = ty.sealed();
        }
        assembly = assembly.type_def(ty);
    }
    assembly.build()
}

fn bench_map_and_compare(c: &mut Criterion) {
    let left = Arc::new(library(1));
    let right = Arc::new(library(2));

    c.bench_function("map_and_compare_500_types", |b| {
        b.iter(|| {
            let mapper = AssemblyMapper::create(
                left.clone(),
                right.clone(),
                MapperSettings::default(),
                Arc::new(Diagnostics::new()),
            );
            let mut comparer = ApiComparer::new();
            comparer.compare(&mapper);
            black_box(comparer.into_differences())
        });
    });
}

fn bench_runner(c: &mut Criterion) {
    let provider = MemorySymbolProvider::new();
    provider.insert("v1/Wide.dll", library(1));
    provider.insert("v2/Wide.dll", library(2));
    let provider: Arc<dyn SymbolProvider> = Arc::new(provider);

    let jobs: Vec<_> = (0..8)
        .map(|i| ComparisonJob::new(format!("v1-{i}"), "v1/Wide.dll", format!("v2-{i}"), "v2/Wide.dll"))
        .collect();

    let accepted = ComparisonRunner::new(provider.clone())
        .jobs(jobs.clone())
        .execute()
        .unwrap()
        .suppression_file();

    c.bench_function("runner_8_jobs_suppressed", |b| {
        b.iter(|| {
            let result = ComparisonRunner::new(provider.clone())
                .jobs(jobs.clone())
                .suppressions(accepted.clone())
                .execute()
                .unwrap();
            black_box(result.unsuppressed_count())
        });
    });
}

criterion_group!(benches, bench_map_and_compare, bench_runner);
criterion_main!(benches);
