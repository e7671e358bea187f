//! Benchmarks for segmentation, orthotope search, and full ingestion.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::seq::SliceRandom;
use rand::SeedableRng;

use orthograph::engine::{Engine, EngineConfig};
use orthograph::segment;

const GRID: [&str; 3] = [
    "a b c. d e f. a d. b e. c f",
    "d e f. g h i. d g. e h. f i",
    "a d g. b e h. c f i",
];

fn random_corpus(documents: usize, sentences: usize) -> Vec<String> {
    let words: Vec<String> = (0..24).map(|i| format!("w{i}")).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    (0..documents)
        .map(|_| {
            (0..sentences)
                .map(|_| {
                    let mut picked: Vec<&str> = words.iter().map(String::as_str).collect();
                    picked.shuffle(&mut rng);
                    picked[..4].join(" ")
                })
                .collect::<Vec<_>>()
                .join(". ")
        })
        .collect()
}

fn ingest(engine: &Engine, docs: &[String]) {
    for (i, body) in docs.iter().enumerate() {
        engine.add(&format!("doc{i}"), body).unwrap();
    }
    assert!(engine.wait_idle(Duration::from_secs(120)));
}

fn bench_segment(c: &mut Criterion) {
    let body = random_corpus(1, 200).remove(0);
    c.bench_function("segment_200_sentences", |bench| {
        bench.iter(|| black_box(segment::sentences(&body)))
    });
}

fn bench_grid(c: &mut Criterion) {
    let docs: Vec<String> = GRID.iter().map(|d| d.to_string()).collect();
    let engine = Engine::new(EngineConfig::default()).unwrap();
    c.bench_function("ingest_3x3_grid", |bench| {
        bench.iter(|| {
            engine.reset();
            ingest(&engine, &docs);
            black_box(engine.ortho_count())
        })
    });
}

fn bench_random_corpus(c: &mut Criterion) {
    let docs = random_corpus(8, 6);
    for workers in [1, 4] {
        let engine = Engine::new(EngineConfig {
            workers,
            ..Default::default()
        })
        .unwrap();
        c.bench_function(&format!("ingest_random_8x6_{workers}w"), |bench| {
            bench.iter(|| {
                engine.reset();
                ingest(&engine, &docs);
                black_box(engine.ortho_count())
            })
        });
    }
}

criterion_group!(benches, bench_segment, bench_grid, bench_random_corpus);
criterion_main!(benches);
