use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use saas_kg::algo::{find_feature_gap_opportunities, find_popular_features, find_similar_products};
use saas_kg::{GraphStore, Ingestor, NodeId, ProductRecord};

const FEATURE_POOL: usize = 50;

/// Products with overlapping feature sets spread over a few categories
fn records(count: usize) -> Vec<ProductRecord> {
    (0..count)
        .map(|i| {
            ProductRecord::named(format!("Product {}", i))
                .with_features((0..8).map(|j| format!("Feature {}", (i * 3 + j * 7) % FEATURE_POOL)))
                .with_categories([format!("Category {}", i % 5)])
        })
        .collect()
}

fn build(count: usize) -> GraphStore {
    let mut store = GraphStore::new();
    Ingestor::new(&mut store)
        .add_products(&records(count))
        .expect("ingestion failed");
    store
}

/// Benchmark product ingestion throughput
fn bench_ingestion(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingestion");

    for size in [100, 1000].iter() {
        let input = records(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut store = GraphStore::new();
                let ids = Ingestor::new(&mut store).add_products(&input);
                criterion::black_box(ids.map(|ids| ids.len()).unwrap_or_default());
            });
        });
    }
    group.finish();
}

/// Benchmark similarity search against every other product
fn bench_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity");

    for size in [100, 1000].iter() {
        let store = build(*size);
        let target = NodeId::from("product:product_0");
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let similar = find_similar_products(&store, &target, 0.3);
                criterion::black_box(similar.len());
            });
        });
    }
    group.finish();
}

/// Benchmark gap opportunity scan
fn bench_gap_opportunities(c: &mut Criterion) {
    let mut group = c.benchmark_group("gap_opportunities");

    for size in [100, 1000].iter() {
        let store = build(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let gaps = find_feature_gap_opportunities(&store, 2);
                criterion::black_box(gaps.len());
            });
        });
    }
    group.finish();
}

/// Benchmark popularity ranking within a category
fn bench_popularity(c: &mut Criterion) {
    let store = build(1000);
    c.bench_function("popular_features_in_category", |b| {
        b.iter(|| {
            let popular = find_popular_features(&store, Some("Category 1"), 10);
            criterion::black_box(popular.len());
        });
    });
}

/// Benchmark export and re-import of the whole graph
fn bench_export_import(c: &mut Criterion) {
    let store = build(1000);
    c.bench_function("export_to_json", |b| {
        b.iter(|| criterion::black_box(store.export_to_json()));
    });

    let document = store.export_to_json();
    c.bench_function("import_from_json", |b| {
        b.iter(|| {
            let mut restored = GraphStore::new();
            criterion::black_box(restored.import_from_json(&document).is_ok());
        });
    });
}

criterion_group!(
    benches,
    bench_ingestion,
    bench_similarity,
    bench_gap_opportunities,
    bench_popularity,
    bench_export_import
);
criterion_main!(benches);
