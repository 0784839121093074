//! Benchmarks for bucketing and series post-processing

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use garden::{
    bucket, process_series, Channel, Granularity, ProcessingConfig, Reading, SeriesPoint,
};

fn generate_readings(count: usize) -> Vec<Reading> {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| Reading {
            temperature: Some(20.0 + (i as f64 % 10.0) * 0.1),
            humidity: Some(60.0),
            light: if i % 7 == 0 { None } else { Some(i as f64) },
            soil_moisture: Some(45.0),
            rainfall: None,
            created_at: start + Duration::seconds(i as i64 * 30),
        })
        .collect()
}

fn generate_series(count: usize) -> Vec<SeriesPoint> {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            SeriesPoint::new(
                start + Duration::minutes(i as i64),
                20.0 + (i as f64 * 0.05).sin() * 5.0,
            )
        })
        .collect()
}

fn bench_bucketing(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucketing");
    let readings = generate_readings(10_000);
    group.throughput(Throughput::Elements(readings.len() as u64));

    for granularity in [
        Granularity::Raw,
        Granularity::FiveMinutes,
        Granularity::Hourly,
        Granularity::Daily,
    ] {
        group.bench_with_input(
            BenchmarkId::from_parameter(granularity),
            &granularity,
            |b, &g| b.iter(|| black_box(bucket::bucket_means(&readings, Channel::Light, g))),
        );
    }

    group.finish();
}

fn bench_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("processing");

    for size in [100usize, 1_000, 10_000] {
        let series = generate_series(size);
        let config = ProcessingConfig::new().with_alpha(30).with_trend(true);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(
            BenchmarkId::new("smooth_and_trend", size),
            &series,
            |b, s| b.iter(|| black_box(process_series(s, &config))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_bucketing, bench_processing);
criterion_main!(benches);
