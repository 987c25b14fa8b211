use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::Path;

use csv::Reader;

use rinchi_graph::{
    connectivity::parse_connectivity,
    molecule::Molecule,
    search::{search, ParallelMode, ReactionQuery},
    vf2::Matcher,
};

fn load_column(file: &str, column: usize) -> Vec<String> {
    let mut reader = Reader::from_path(Path::new("data").join(file))
        .unwrap_or_else(|_| panic!("data/{file} does not exist."));
    reader
        .records()
        .map(|r| r.expect("malformed record")[column].to_string())
        .collect()
}

pub fn molecules(c: &mut Criterion) {
    let mut group = c.benchmark_group("molecules");
    let inchis = load_column("molecules.csv", 1);

    group.bench_function("parse_connectivity", |b| {
        b.iter(|| parse_connectivity("1-2-6-10-8-4-3-7-9(10)5-1"));
    });

    group.bench_function("from_inchi", |b| {
        b.iter(|| {
            for inchi in &inchis {
                Molecule::from_inchi(inchi).expect("bad InChI");
            }
        });
    });

    // Rebuild each molecule so that the ring cache starts empty.
    group.bench_function("rings", |b| {
        b.iter(|| {
            for inchi in &inchis {
                let mol = Molecule::from_inchi(inchi).expect("bad InChI");
                mol.ring_histogram();
            }
        });
    });

    group.finish();
}

pub fn matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");
    let patterns = load_column("matches.csv", 0);
    let masters = load_column("matches.csv", 1);

    for (i, (pattern, master)) in patterns.iter().zip(&masters).enumerate() {
        let pattern = Molecule::from_inchi(pattern).expect("bad pattern");
        let master = Molecule::from_inchi(master).expect("bad master");
        group.bench_with_input(BenchmarkId::new("sub_count", i), &i, |b, _| {
            b.iter(|| Matcher::new(&pattern, &master).sub_count());
        });
    }

    group.finish();
}

pub fn reactions(c: &mut Criterion) {
    let mut group = c.benchmark_group("reactions");
    let rinchis = load_column("reactions.csv", 1);
    let mut query = ReactionQuery::default();
    query.rings.add(6);

    for (name, mode) in [("serial", ParallelMode::None), ("parallel", ParallelMode::Always)] {
        group.bench_function(name, |b| b.iter(|| search(&rinchis, &query, mode)));
    }

    group.finish();
}

criterion_group! {
    name = benchmark;
    config = Criterion::default().sample_size(20);
    targets = molecules, matching, reactions
}
criterion_main!(benchmark);
