//! Benchmarks for the reshaping pipeline
//!
//! Run with: cargo bench
//!
//! Reshaping is a full recompute on every buffer change, so its cost per
//! session-sized buffer is the number that matters.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use groundtrack::merge::merge;
use groundtrack::reshape::reshape;
use groundtrack::telemetry::{ParamValue, RawRecord};

fn create_test_records(count: usize) -> Vec<RawRecord> {
    let parameters = [
        "bus_voltage",
        "bus_current",
        "cell_voltage",
        "obc_mode",
        "panel_1",
    ];

    (0..count)
        .map(|i| {
            let parameter = parameters[i % parameters.len()];
            let value = if parameter == "obc_mode" {
                ParamValue::Text(if i % 2 == 0 { "SAFE" } else { "NOMINAL" }.to_string())
            } else {
                ParamValue::Number(i as f64 * 0.1)
            };
            RawRecord::new((i / parameters.len()) as f64, 1, parameter, value)
        })
        .collect()
}

fn bench_reshape(c: &mut Criterion) {
    let mut group = c.benchmark_group("reshape");

    for size in [100, 1000, 5000] {
        let records = create_test_records(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("reshape_{}", size), |b| {
            b.iter(|| reshape(black_box(&records)))
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [100, 1000, 5000] {
        let records = create_test_records(size);
        let incoming = RawRecord::new(f64::MAX, 99, "bus_voltage", ParamValue::Number(1.0));

        group.bench_function(format!("merge_into_{}", size), |b| {
            b.iter_batched(
                || records.clone(),
                |mut buffer| merge(&mut buffer, black_box(incoming.clone())),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reshape, bench_merge);
criterion_main!(benches);
