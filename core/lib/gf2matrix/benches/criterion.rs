use criterion::{criterion_group, criterion_main, Criterion};
use gf2matrix::GF2Matrix;
use rand::SeedableRng;

fn bench_mul(c: &mut Criterion) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    let a = GF2Matrix::random(656, 208, &mut rng);
    let b = GF2Matrix::random(208, 48, &mut rng);
    c.bench_function("gf2 mul 656x208 * 208x48", |bencher| {
        bencher.iter(|| a.mul(&b).unwrap())
    });
}

fn bench_echelonize(c: &mut Criterion) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(2);
    c.bench_function("gf2 echelonize 672x656", |bencher| {
        bencher.iter_batched(
            || GF2Matrix::random(672, 656, &mut rng),
            |mut m| m.echelonize(),
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_mul, bench_echelonize);
criterion_main!(benches);
