//! Benchmarks for the per-tick cost of change detection.
//!
//! Every poll fingerprints the whole file; only a changed fingerprint pays for
//! decoding and diffing. These measure both halves.

use confmon::changes::diff_maps;
use confmon::formats::{FormatTag, Snapshot};
use confmon::monitor::fingerprint_bytes;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};

fn snapshot(fields: usize, salt: usize) -> Snapshot {
    (0..fields)
        .map(|i| {
            let value = if i % 10 == salt % 10 {
                json!({ "value": i + salt, "tags": ["a", "b"] })
            } else {
                json!({ "value": i, "tags": ["a", "b"] })
            };
            (format!("field_{:04}", i), value)
        })
        .collect()
}

fn document(fields: usize) -> Vec<u8> {
    serde_json::to_vec_pretty(&Value::Object(snapshot(fields, 0))).unwrap_or_default()
}

/// Fingerprint cost, paid on every tick
fn benchmark_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");
    for fields in [10, 100, 1_000] {
        let bytes = document(fields);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fields), &bytes, |b, bytes| {
            b.iter(|| black_box(fingerprint_bytes(bytes)));
        });
    }
    group.finish();
}

/// Diff cost for unchanged and partially changed snapshots
fn benchmark_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");
    for fields in [10, 100, 1_000] {
        let old = snapshot(fields, 0);
        let same = old.clone();
        let changed = snapshot(fields, 1);

        group.bench_with_input(BenchmarkId::new("unchanged", fields), &fields, |b, _| {
            b.iter(|| black_box(diff_maps("bench", &old, &same)));
        });
        group.bench_with_input(BenchmarkId::new("ten_percent", fields), &fields, |b, _| {
            b.iter(|| black_box(diff_maps("bench", &old, &changed)));
        });
    }
    group.finish();
}

/// Decode into a snapshot, paid once per detected change
fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_map");
    for fields in [10, 100, 1_000] {
        let bytes = document(fields);
        group.bench_with_input(BenchmarkId::from_parameter(fields), &bytes, |b, bytes| {
            b.iter(|| black_box(FormatTag::Json.decode_map(bytes)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_fingerprint,
    benchmark_diff,
    benchmark_decode
);
criterion_main!(benches);
