//! Benchmark suite for the preprocessing stages.
//!
//! Run with: `cargo bench`
//!
//! This benchmark measures:
//! - Resampling of irregular series
//! - Feature engineering (calendar, lags, rolling means)
//! - Sequence building
//! - The in-memory pipeline end to end

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use metrics_preprocessor::{
    ColumnDef, FeatureConfig, FeatureEngineer, InterpolationMethod, PipelineBuilder, Resampler,
    SequenceBuilder, TimeFrame,
};

const METRICS: [&str; 3] = ["cpu", "mem", "rps"];

/// Irregular frame: rows every 40-80 seconds with a null every 17th cell.
fn create_irregular_frame(rows: usize) -> TimeFrame {
    let mut t = 1_704_067_200i64;
    let index = (0..rows)
        .map(|i| {
            t += 40 + (i as i64 * 7) % 41;
            Utc.timestamp_opt(t, 0).unwrap()
        })
        .collect();

    let mut frame = TimeFrame::new(index).unwrap();
    for (m, name) in METRICS.iter().enumerate() {
        let values = (0..rows)
            .map(|i| {
                if (i + m) % 17 == 0 {
                    None
                } else {
                    Some(50.0 + 10.0 * ((i as f64 + m as f64) * 0.1).sin())
                }
            })
            .collect();
        frame.push_column(ColumnDef::metric(*name), values).unwrap();
    }
    frame
}

fn metric_names() -> Vec<String> {
    METRICS.iter().map(|m| m.to_string()).collect()
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");

    for rows in [1_000, 10_000, 100_000].iter() {
        let frame = create_irregular_frame(*rows);
        let resampler = Resampler::new(chrono::Duration::minutes(1), InterpolationMethod::Time);

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("time", rows), &frame, |b, frame| {
            b.iter(|| resampler.apply(black_box(frame)).unwrap())
        });
    }

    group.finish();
}

fn bench_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("features");
    let engineer = FeatureEngineer::new(FeatureConfig::default());
    let metrics = metric_names();

    for rows in [1_000, 10_000, 100_000].iter() {
        let frame = create_irregular_frame(*rows);

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("default", rows), &frame, |b, frame| {
            b.iter(|| engineer.apply(black_box(frame), &metrics).unwrap())
        });
    }

    group.finish();
}

fn bench_sequences(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequences");
    let features: Vec<ColumnDef> = METRICS.iter().map(|m| ColumnDef::metric(*m)).collect();
    let target = ColumnDef::metric("cpu");

    for length in [10, 30, 100].iter() {
        let frame = create_irregular_frame(10_000).drop_nulls();
        let builder = SequenceBuilder::new(*length, 1);

        group.throughput(Throughput::Elements(builder.expected_count(frame.len()) as u64));
        group.bench_with_input(BenchmarkId::new("length", length), &frame, |b, frame| {
            b.iter(|| builder.build(black_box(frame), &features, &target).unwrap())
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let pipeline = PipelineBuilder::new()
        .metrics(METRICS)
        .target("cpu", vec![5, 15])
        .window(30, 1)
        .build()
        .unwrap();

    for rows in [1_000, 10_000].iter() {
        let frame = create_irregular_frame(*rows);

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("process", rows), &frame, |b, frame| {
            b.iter(|| pipeline.process(black_box(frame.clone())).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_resample,
    bench_features,
    bench_sequences,
    bench_pipeline,
);

criterion_main!(benches);
