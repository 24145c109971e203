//! Dependency pruning over a wide, shallow schema.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use protogen_schema::{Field, FieldType, IdentifierSet, ProtoFile, Schema, TypeDef};

/// `packages` packages of `per_package` messages; every message depends on
/// the first message of the next package.
fn wide_schema(packages: usize, per_package: usize) -> Schema {
    let mut schema = Schema::new();
    for p in 0..packages {
        let mut file = ProtoFile::new(format!("p{p}.proto")).with_package(format!("p{p}"));
        for m in 0..per_package {
            let fields = if p + 1 < packages {
                vec![Field::optional("next", 1, FieldType::named(format!("p{}.M0", p + 1)))]
            } else {
                Vec::new()
            };
            file = file.with_type(TypeDef::message(format!("p{p}.M{m}"), fields));
        }
        schema.add(file);
    }
    schema
}

fn prune_benchmark(c: &mut Criterion) {
    let schema = wide_schema(50, 40);
    let mut group = c.benchmark_group("prune");

    for (name, includes, excludes) in [
        ("single_root", vec!["p0.M0"], vec![]),
        ("namespace", vec!["p10.*"], vec![]),
        ("namespace_with_exclude", vec!["p10.*"], vec!["p20.*"]),
    ] {
        let mut builder = IdentifierSet::builder();
        for rule in includes {
            builder.include(rule);
        }
        for rule in excludes {
            builder.exclude(rule);
        }
        let Ok(identifiers) = builder.build() else {
            continue;
        };

        group.bench_function(name, |b| {
            b.iter(|| black_box(schema.clone().prune(&identifiers).schema.type_count()));
        });
    }

    group.finish();
}

criterion_group!(benches, prune_benchmark);
criterion_main!(benches);
