//! Criterion micro-benchmarks for core buffer access, growth, and copy.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lowpy_bench::{patterned_buffer, payload, SIZES};
use lowpy_core::Buffer;
use std::hint::black_box;

/// Benchmark: typed i32 / f64 writes followed by reads across a 4 KiB buffer.
fn bench_typed_access(c: &mut Criterion) {
    let mut buffer = Buffer::with_size(4096).unwrap();
    c.bench_function("typed_i32_write_read_4k", |b| {
        b.iter(|| {
            for offset in (0..4096).step_by(4) {
                buffer.write(offset as i32, offset).unwrap();
            }
            let mut sum = 0i64;
            for offset in (0..4096).step_by(4) {
                sum += i64::from(buffer.read::<i32>(offset).unwrap());
            }
            black_box(sum);
        });
    });

    c.bench_function("typed_f64_unaligned_4k", |b| {
        b.iter(|| {
            for offset in (1..4088).step_by(8) {
                buffer.write(offset as f64, offset).unwrap();
            }
            black_box(buffer.read::<f64>(1).unwrap());
        });
    });
}

/// Benchmark: raw write + read of the whole buffer at several sizes.
fn bench_raw_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("raw_transfer");
    for &size in &SIZES {
        let data = payload(size);
        let mut buffer = Buffer::with_size(size).unwrap();
        let mut out = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                buffer.write_raw(&data, 0).unwrap();
                buffer.read_raw(&mut out, 0).unwrap();
                black_box(out[0]);
            });
        });
    }
    group.finish();
}

/// Benchmark: grow an empty buffer to 1 MiB in 4 KiB reallocation steps.
fn bench_reallocate_growth(c: &mut Criterion) {
    c.bench_function("reallocate_to_1m_by_4k", |b| {
        b.iter(|| {
            let mut buffer = Buffer::new();
            for _ in 0..256 {
                buffer.reallocate(4096).unwrap();
            }
            black_box(buffer.len());
        });
    });
}

/// Benchmark: copy_into a pre-populated target at several sizes.
fn bench_copy_into(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_into");
    for &size in &SIZES {
        let source = patterned_buffer(size);
        let mut target = Buffer::with_size(size).unwrap();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                source.copy_into(&mut target).unwrap();
                black_box(target.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_typed_access,
    bench_raw_transfer,
    bench_reallocate_growth,
    bench_copy_into
);
criterion_main!(benches);
