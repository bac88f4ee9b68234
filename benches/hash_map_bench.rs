use assoc_collections::{HashMap, HashMultiMap};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(n: usize, seed: u64) -> HashMap<String, u64> {
    lcg(seed)
        .take(n)
        .enumerate()
        .map(|(i, x)| (key(x), i as u64))
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_map::insert");
    group.throughput(Throughput::Elements(100_000));
    group.bench_function("fresh_100k", |b| {
        b.iter_batched(
            HashMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("reserved_100k", |b| {
        b.iter_batched(
            || {
                let mut m = HashMap::<String, u64>::new();
                m.reserve(100_000).unwrap();
                m
            },
            |mut m| {
                for (i, x) in lcg(2).take(100_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_multimap_insert(c: &mut Criterion) {
    c.bench_function("hash_multimap::insert_dup_heavy_50k", |b| {
        b.iter_batched(
            HashMultiMap::<u64, u64>::new,
            |mut m| {
                for (i, x) in lcg(3).take(50_000).enumerate() {
                    m.insert(x % 512, i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find(c: &mut Criterion) {
    let m = filled(100_000, 4);
    let hits: Vec<String> = lcg(4).take(10_000).map(key).collect();
    let misses: Vec<String> = lcg(40).take(10_000).map(key).collect();
    c.bench_function("hash_map::find_hit_10k", |b| {
        b.iter(|| {
            for k in &hits {
                black_box(m.find(k.as_str()));
            }
        })
    });
    c.bench_function("hash_map::find_miss_10k", |b| {
        b.iter(|| {
            for k in &misses {
                black_box(m.find(k.as_str()));
            }
        })
    });
}

fn bench_erase(c: &mut Criterion) {
    c.bench_function("hash_map::erase_random_10k", |b| {
        b.iter_batched(
            || filled(100_000, 5),
            |mut m| {
                for x in lcg(5).take(10_000) {
                    m.erase_key(key(x).as_str());
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_rehash(c: &mut Criterion) {
    c.bench_function("hash_map::rehash_100k_to_400k_buckets", |b| {
        b.iter_batched(
            || filled(100_000, 6),
            |mut m| {
                m.rehash(400_000).unwrap();
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert, bench_multimap_insert
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_find, bench_erase, bench_rehash
}
criterion_main!(benches_insert, benches_ops);
