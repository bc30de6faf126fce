//! Store benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use seglog_bench::{random_data, random_records};
use seglog_storage::{Config, Segment, Store};
use tempfile::TempDir;

/// Benchmark buffered appends.
fn bench_store_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_append");

    for size in [64, 256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let temp_dir = TempDir::new().unwrap();
            let store = Store::open(&temp_dir.path().join("bench.store")).unwrap();
            let data = random_data(size);

            b.iter(|| {
                let result = store.append(black_box(&data)).unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

/// Benchmark reads of already flushed records.
fn bench_store_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_read");

    // Use larger sample size for file operations
    group.sample_size(50);

    for size in [256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let temp_dir = TempDir::new().unwrap();
            let store = Store::open(&temp_dir.path().join("bench.store")).unwrap();
            let (_, pos) = store.append(&random_data(size)).unwrap();
            store.flush().unwrap();

            b.iter(|| {
                let result = store.read(black_box(pos)).unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

/// Benchmark append followed by read, which forces a flush each time.
fn bench_read_your_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_your_writes");
    group.sample_size(20);

    let temp_dir = TempDir::new().unwrap();
    let store = Store::open(&temp_dir.path().join("bench.store")).unwrap();
    let data = random_data(256);

    group.bench_function("append_then_read_256", |b| {
        b.iter(|| {
            let (_, pos) = store.append(&data).unwrap();
            black_box(store.read(pos).unwrap());
        });
    });

    group.finish();
}

/// Benchmark offset lookups through a full segment.
fn bench_segment_random_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_random_read");

    let record_count = 1000;
    let temp_dir = TempDir::new().unwrap();
    let segment = Segment::open(temp_dir.path(), 0, &Config::default()).unwrap();
    for record in random_records(record_count, 256) {
        segment.append(&record).unwrap();
    }

    group.bench_function("1000_records", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            // Read records in pseudo-random order
            let offset = ((idx * 7) % record_count) as u64;
            let result = segment.read(black_box(offset)).unwrap();
            idx = (idx + 1) % record_count;
            black_box(result);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_store_append,
    bench_store_read,
    bench_read_your_writes,
    bench_segment_random_read,
);

criterion_main!(benches);
