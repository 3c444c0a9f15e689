//! Criterion benchmarks for state aggregation.
//!
//! These measure the per-message ingest path that runs for every STATE
//! message a sync emits, and the rollover merge done on each flush.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use airbridge_state::prelude::*;

fn stream_messages(stream_count: usize, rounds: usize) -> Vec<AirbyteStateMessage> {
    (0..rounds)
        .flat_map(|round| {
            (0..stream_count).map(move |i| {
                AirbyteStateMessage::stream(
                    StreamDescriptor::new(format!("stream_{i}"), Some("public")),
                    json!({"cursor": round, "lsn": format!("0/{round:X}")}),
                )
            })
        })
        .collect()
}

fn bench_ingest_legacy(c: &mut Criterion) {
    let mut group = c.benchmark_group("state/ingest_legacy");

    group.bench_function("overwrite", |b| {
        let messages: Vec<_> = (0..1000)
            .map(|i| AirbyteStateMessage::legacy(json!({"cursor": i})))
            .collect();
        b.iter(|| {
            let mut agg = DefaultStateAggregator::new();
            for message in &messages {
                agg.ingest(message.clone()).unwrap();
            }
            agg.get_aggregated().unwrap()
        });
    });

    group.finish();
}

fn bench_ingest_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("state/ingest_stream");

    for stream_count in [1, 10, 100] {
        group.bench_with_input(
            BenchmarkId::new("streams", stream_count),
            &stream_count,
            |b, &stream_count| {
                let messages = stream_messages(stream_count, 20);
                b.iter(|| {
                    let mut agg = DefaultStateAggregator::new();
                    for message in &messages {
                        agg.ingest(message.clone()).unwrap();
                    }
                    agg.get_aggregated().unwrap()
                });
            },
        );
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("state/merge");

    for stream_count in [10, 100] {
        group.bench_with_input(
            BenchmarkId::new("streams", stream_count),
            &stream_count,
            |b, &stream_count| {
                let mut worker = DefaultStateAggregator::new();
                for message in stream_messages(stream_count, 1) {
                    worker.ingest(message).unwrap();
                }
                b.iter(|| {
                    let mut session = DefaultStateAggregator::new();
                    session.ingest_aggregator(&worker).unwrap();
                    session
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_ingest_legacy, bench_ingest_stream, bench_merge);
criterion_main!(benches);
