//! Emission pool throughput at several worker counts.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use protogen::{DryRunSink, EmissionPool, WorkQueue};
use protogen_codegen::{Backend, BackendKind, GeneratorOptions, Profile};
use protogen_schema::{Field, FieldType, ProtoFile, Scalar, Schema, TypeDef};

/// `count` messages in one package, each referring to the one before it.
fn chain_schema(count: usize) -> Schema {
    let mut file = ProtoFile::new("bench/chain.proto").with_package("bench");
    for i in 0..count {
        let mut fields = vec![
            Field::required("id", 1, FieldType::Scalar(Scalar::Int64)),
            Field::optional("label", 2, FieldType::Scalar(Scalar::String)),
            Field::repeated("tags", 3, FieldType::Scalar(Scalar::String)),
        ];
        if i > 0 {
            fields.push(Field::optional(
                "previous",
                4,
                FieldType::named(format!("bench.M{}", i - 1)),
            ));
        }
        file = file.with_type(TypeDef::message(format!("bench.M{i}"), fields));
    }
    let mut schema = Schema::new();
    schema.add(file);
    schema
}

fn emission_benchmark(c: &mut Criterion) {
    let schema = chain_schema(500);
    let mut group = c.benchmark_group("emission");

    for kind in [BackendKind::Java, BackendKind::Kotlin] {
        let options = GeneratorOptions::default();
        let Ok(backend) = Backend::new(kind, &schema, &Profile::default(), options) else {
            continue;
        };
        let sink = DryRunSink::new("out");

        for workers in [1_usize, 2, 8] {
            group.bench_function(format!("{kind}_{workers}_workers"), |b| {
                b.iter(|| {
                    let queue = WorkQueue::populate(&schema, &[], false, &[]);
                    let paths = EmissionPool::new(workers).run(&queue, &backend, &sink);
                    black_box(paths.map(|p| p.len()).unwrap_or(0));
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, emission_benchmark);
criterion_main!(benches);
