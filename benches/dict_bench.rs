use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use kvdict::{Dict, Sds};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> Sds {
    let mut s = Sds::with_capacity(17);
    s.append(format!("k{:016x}", n));
    s
}

fn filled(seed: u64, n: usize) -> (Dict<Sds, u64>, Vec<Sds>) {
    let mut d = Dict::new();
    let keys: Vec<Sds> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        d.insert(k.clone(), i as u64);
    }
    (d, keys)
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("dict::insert_fresh_100k", |b| {
        b.iter_batched(
            Dict::<Sds, u64>::new,
            |mut d| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    d.insert(key(x), i as u64);
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_after_clear_100k(c: &mut Criterion) {
    c.bench_function("dict::insert_after_clear_100k", |b| {
        b.iter_batched(
            || {
                let (mut d, _) = filled(2, 110_000);
                d.clear();
                d
            },
            |mut d| {
                for (i, x) in lcg(3).take(100_000).enumerate() {
                    d.insert(key(x), i as u64);
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_remove_random_10k(c: &mut Criterion) {
    c.bench_function("dict::remove_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let (d, keys) = filled(5, 110_000);
                let n = keys.len();
                let mut s = 0x9e3779b97f4a7c15u64;
                let to_remove: Vec<Sds> = (0..10_000)
                    .map(|_| {
                        s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                        keys[(s as usize) % n].clone()
                    })
                    .collect();
                (d, to_remove)
            },
            |(mut d, to_remove)| {
                for k in &to_remove {
                    black_box(d.remove(k));
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_10k(c: &mut Criterion) {
    c.bench_function("dict::find_hit_10k_on_100k", |b| {
        let (d, keys) = filled(7, 100_000);
        let n = keys.len();
        let mut s = 0x9e3779b97f4a7c15u64;
        let queries: Vec<Sds> = (0..10_000)
            .map(|_| {
                s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                keys[(s as usize) % n].clone()
            })
            .collect();
        b.iter(|| {
            for k in &queries {
                black_box(d.find(k));
            }
        })
    });
}

fn bench_find_miss_10k(c: &mut Criterion) {
    c.bench_function("dict::find_miss_10k_on_100k", |b| {
        let (d, _) = filled(11, 100_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for _ in 0..10_000 {
                if let Some(x) = miss.next() {
                    black_box(d.find(&key(x)));
                }
            }
        })
    });
}

fn bench_iter_and_safe_iter(c: &mut Criterion) {
    c.bench_function("dict::iter_all_100k", |b| {
        let (d, _) = filled(999, 100_000);
        b.iter(|| {
            let mut sum = 0u64;
            for (_k, v) in d.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });

    c.bench_function("dict::safe_iter_increment_all_100k", |b| {
        b.iter_batched(
            || filled(1001, 100_000).0,
            |mut d| {
                let mut it = d.safe_iter();
                while let Some((_k, v)) = it.next_entry() {
                    *v = v.wrapping_add(1);
                }
                drop(it);
                black_box(d)
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
    targets = bench_insert_fresh_100k, bench_insert_after_clear_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_remove_random_10k,
              bench_find_hit_10k,
              bench_find_miss_10k,
              bench_iter_and_safe_iter
}
criterion_main!(benches_insert, benches_ops);
