//! Benchmark for LXRHash single and batched hashing

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lxrhash_core::{HashConfig, LxrHash, Variant};

/// 16 MiB table: big enough to fall out of cache, quick to build
const BENCH_MAP_BITS: u32 = 24;

fn hasher(variant: Variant) -> LxrHash {
    let config = HashConfig::default()
        .with_map_size_bits(BENCH_MAP_BITS)
        .with_variant(variant);
    LxrHash::new(config).expect("valid bench config")
}

fn nonce_inputs(count: u64) -> Vec<Vec<u8>> {
    (0..count)
        .map(|nonce| {
            let mut input = nonce.to_le_bytes().to_vec();
            input.extend_from_slice(b"benchmark source");
            input
        })
        .collect()
}

fn bench_hash(c: &mut Criterion) {
    for variant in [Variant::V1, Variant::V2] {
        let lxr = hasher(variant);
        let input = b"benchmark input data for testing LXRHash performance";

        c.bench_function(&format!("lxrhash_v{}_single", variant), |b| {
            b.iter(|| lxr.hash(black_box(input)))
        });
    }
}

fn bench_batch(c: &mut Criterion) {
    let lxr = hasher(Variant::V2);
    let mut group = c.benchmark_group("lxrhash_v2_batch");

    for size in [1u64, 16, 256] {
        let inputs = nonce_inputs(size);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &inputs, |b, inputs| {
            b.iter(|| lxr.batch(black_box(inputs)))
        });
    }

    let inputs = nonce_inputs(1024);
    group.throughput(Throughput::Elements(1024));
    group.bench_function("parallel_1024", |b| {
        b.iter(|| lxr.batch_parallel(black_box(&inputs)))
    });

    group.finish();
}

criterion_group!(benches, bench_hash, bench_batch);
criterion_main!(benches);
