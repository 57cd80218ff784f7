//! Benchmarks for change classification

use covershift_algorithms::change::{
    build_transition_table, collapse_classification, six_class_classification, CollapseParams,
    SixClassParams,
};
use covershift_algorithms::engine::MemoryEngine;
use covershift_core::{
    CategoryEntry, CategoryRegistry, CodeEncoder, CoverSchema, GeoTransform, Raster, RasterEngine,
    TimeSlice,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn nlcd_legend() -> Vec<CategoryEntry> {
    CoverSchema::Nlcd
        .legend()
        .iter()
        .map(|&(value, name)| CategoryEntry {
            value,
            name: name.to_string(),
        })
        .collect()
}

fn create_landcover(size: usize, shift: usize) -> Raster<i32> {
    let legend = CoverSchema::Nlcd.legend();
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(0.0, size as f64 * 30.0, 30.0, -30.0));
    for row in 0..size {
        for col in 0..size {
            let v = legend[(row / 8 + col / 8 + shift) % legend.len()].0;
            r.set(row, col, v as i32).unwrap();
        }
    }
    r
}

fn bench_classification(c: &mut Criterion) {
    let registry = CategoryRegistry::from_schema(CoverSchema::Nlcd);
    let start = registry.categories(TimeSlice::Start);
    let end = registry.categories(TimeSlice::End);
    let encoder = CodeEncoder::default();
    let table = build_transition_table(&start, &end, &encoder).unwrap();

    let mut group = c.benchmark_group("change/classification");
    group.bench_function("transition_table", |b| {
        b.iter(|| build_transition_table(black_box(&start), black_box(&end), &encoder).unwrap())
    });

    let six = SixClassParams::new([41, 42, 43], "Forest", [21, 22, 23, 24], "Developed", true);
    group.bench_function("six_class", |b| {
        b.iter(|| six_class_classification(table.codes(), &encoder, black_box(&six)).unwrap())
    });

    let collapse = CollapseParams::new([41, 42, 43], "Forest");
    group.bench_function("collapse", |b| {
        b.iter(|| collapse_classification(black_box(&table), black_box(&collapse)).unwrap())
    });
    group.finish();
}

fn bench_combine(c: &mut Criterion) {
    let mut group = c.benchmark_group("change/combine");
    for size in [256, 512, 1024] {
        let mut engine = MemoryEngine::new();
        engine
            .add_classification("t1", create_landcover(size, 0), &nlcd_legend())
            .unwrap();
        engine
            .add_classification("t2", create_landcover(size, 3), &nlcd_legend())
            .unwrap();
        let (t1, t2, out) = ("t1".to_string(), "t2".to_string(), "chg".to_string());

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                engine
                    .combine(&t1, &t2, &CodeEncoder::default(), black_box(&out))
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classification, bench_combine);
criterion_main!(benches);
