//! Criterion benchmarks for bayesnet-adtree: construction and count queries.

use bayesnet_adtree::{AdTreeConfig, CountSource, ScanCounter};
use bayesnet_data::{Attribute, Dataset, DatasetBuilder};
use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn make_dataset(n_rows: usize, n_attributes: usize, cardinality: usize, seed: u64) -> Dataset {
    let attrs = (0..n_attributes)
        .map(|i| Attribute::with_cardinality(format!("x{i}"), cardinality).unwrap())
        .collect();
    let mut builder = DatasetBuilder::new(attrs).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for _ in 0..n_rows {
        let row: Vec<usize> = (0..n_attributes)
            .map(|_| rng.gen_range(0..cardinality))
            .collect();
        builder.push_row(&row).unwrap();
    }
    builder.build()
}

fn bench_build(c: &mut Criterion) {
    let data = make_dataset(2000, 8, 3, 42);
    let config = AdTreeConfig::new();

    c.bench_function("adtree_build_2000x8_card3", |b| {
        b.iter(|| config.build(&data));
    });
}

fn bench_query(c: &mut Criterion) {
    let data = make_dataset(2000, 8, 3, 42);
    let tree = AdTreeConfig::new().build(&data);
    let scan = ScanCounter::new(&data);

    c.bench_function("adtree_counts_3way", |b| {
        b.iter(|| tree.counts(&[1, 4, 6]).unwrap());
    });
    c.bench_function("scan_counts_3way", |b| {
        b.iter(|| scan.counts(&[1, 4, 6]).unwrap());
    });
}

criterion_group!(benches, bench_build, bench_query);
criterion_main!(benches);
