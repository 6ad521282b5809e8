//! Shape graph benchmarks.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use quartz_core::Value;
use quartz_core::intern::{InternedString, intern};
use quartz_runtime::{PropertyAttributes, ShapeRegistry, ShapedObject};

fn keys(n: usize) -> Vec<InternedString> {
    (0..n).map(|i| intern(&format!("prop_{i}"))).collect()
}

fn object_with_properties(
    registry: &mut ShapeRegistry,
    keys: &[InternedString],
) -> ShapedObject {
    let mut obj = ShapedObject::new(registry);
    for (i, key) in keys.iter().enumerate() {
        obj.set_property(registry, key, Value::int_unchecked(i as i64));
    }
    obj
}

fn bench_transitions(c: &mut Criterion) {
    let mut group = c.benchmark_group("transitions");

    group.bench_function("add_member_cold", |b| {
        b.iter(|| {
            let mut registry = ShapeRegistry::new();
            let mut shape = registry.empty_shape();
            for key in &keys(16) {
                shape = registry.add_member(shape, key, PropertyAttributes::data()).0;
            }
            black_box(shape)
        })
    });

    group.bench_function("add_member_memoized", |b| {
        let mut registry = ShapeRegistry::new();
        let ks = keys(16);
        // Warm the transition chain once.
        let mut shape = registry.empty_shape();
        for key in &ks {
            shape = registry.add_member(shape, key, PropertyAttributes::data()).0;
        }
        b.iter(|| {
            let mut shape = registry.empty_shape();
            for key in &ks {
                shape = registry.add_member(shape, key, PropertyAttributes::data()).0;
            }
            black_box(shape)
        })
    });

    group.bench_function("sealed_memoized", |b| {
        let mut registry = ShapeRegistry::new();
        let ks = keys(8);
        let mut shape = registry.empty_shape();
        for key in &ks {
            shape = registry.add_member(shape, key, PropertyAttributes::data()).0;
        }
        let _ = registry.sealed(shape);
        b.iter(|| black_box(registry.sealed(shape)))
    });

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for n in [4usize, 16, 64] {
        let mut registry = ShapeRegistry::new();
        let ks = keys(n);
        let mut shape = registry.empty_shape();
        for key in &ks {
            shape = registry.add_member(shape, key, PropertyAttributes::data()).0;
        }
        let hit = ks[n / 2].clone();
        let miss = intern("absent");

        group.bench_function(format!("find_hit_{n}"), |b| {
            b.iter(|| black_box(registry.find(shape, &hit)))
        });
        group.bench_function(format!("find_miss_{n}"), |b| {
            b.iter(|| black_box(registry.find(shape, &miss)))
        });
    }

    group.finish();
}

fn bench_object_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("object_access");

    let mut registry = ShapeRegistry::new();
    let ks = keys(16);
    let obj = object_with_properties(&mut registry, &ks);
    let key = ks[10].clone();
    let slot = registry.find(obj.shape_id(), &key).unwrap();

    group.bench_function("get_property", |b| {
        b.iter(|| black_box(obj.get_property(&registry, &key)))
    });

    group.bench_function("get_property_cached", |b| {
        b.iter(|| black_box(obj.get_property_cached(slot)))
    });

    group.bench_function("set_existing", |b| {
        let mut registry = ShapeRegistry::new();
        let mut obj = object_with_properties(&mut registry, &ks);
        b.iter(|| black_box(obj.set_property(&mut registry, &key, Value::int_unchecked(1))))
    });

    group.finish();
}

criterion_group!(benches, bench_transitions, bench_lookup, bench_object_access);
criterion_main!(benches);
