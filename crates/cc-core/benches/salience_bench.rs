//! Salience Scorer Benchmarks
//!
//! Run with: cargo bench -p cc-core

use cc_core::config::SalienceWeights;
use cc_core::domain::{Stimulus, StimulusType};
use cc_core::salience::SalienceScorer;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn recent_stimuli(n: usize) -> Vec<Stimulus> {
    (0..n)
        .map(|i| Stimulus::new(StimulusType::Temporal, format!("checked in at hour {i}"), "temporal", serde_json::json!({})))
        .collect()
}

fn bench_score_against_empty_history(c: &mut Criterion) {
    let scorer = SalienceScorer::new(SalienceWeights::default());
    c.bench_function("score_empty_history", |b| {
        b.iter(|| {
            let mut s = Stimulus::new(StimulusType::Goal, "ship the quarterly report", "goal", serde_json::json!({}));
            scorer.score(&mut s, black_box(&[]));
        })
    });
}

fn bench_score_against_100_recent(c: &mut Criterion) {
    let scorer = SalienceScorer::new(SalienceWeights::default());
    let recent = recent_stimuli(100);
    c.bench_function("score_100_recent", |b| {
        b.iter(|| {
            let mut s = Stimulus::new(StimulusType::Temporal, "checked in at hour 42", "temporal", serde_json::json!({}));
            scorer.score(&mut s, black_box(&recent));
        })
    });
}

criterion_group!(benches, bench_score_against_empty_history, bench_score_against_100_recent);
criterion_main!(benches);
