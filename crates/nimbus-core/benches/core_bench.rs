//! Criterion benchmarks for nimbus-core DSP primitives
//!
//! Run with: cargo bench -p nimbus-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nimbus_core::{AllpassDiffuser, DelayLine, LfoBank, OnePole, SmoothNoise};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("DelayLine");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("push_read_modulated", block_size),
            &block_size,
            |b, _| {
                let mut line = DelayLine::new(12000);
                let mut bank = LfoBank::new(1, SAMPLE_RATE);
                b.iter(|| {
                    for &sample in &input {
                        let d = 2400.0 + 288.0 * bank.process(0, 0.25);
                        black_box(line.read(d));
                        line.push(black_box(sample));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_allpass(c: &mut Criterion) {
    let mut group = c.benchmark_group("AllpassDiffuser");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(BenchmarkId::new("process", block_size), &block_size, |b, _| {
            let mut ap = AllpassDiffuser::new(1440);
            ap.set_delay(577);
            ap.set_gain(0.72);
            b.iter(|| {
                for &sample in &input {
                    black_box(ap.process(black_box(sample)));
                }
            });
        });
    }

    group.finish();
}

fn bench_one_pole(c: &mut Criterion) {
    let input = generate_test_signal(1024);
    c.bench_function("OnePole/process_1024", |b| {
        let mut lp = OnePole::new(SAMPLE_RATE, 9000.0);
        b.iter(|| {
            for &sample in &input {
                black_box(lp.process(black_box(sample)));
            }
        });
    });
}

fn bench_noise(c: &mut Criterion) {
    c.bench_function("SmoothNoise/process_1024", |b| {
        let mut n = SmoothNoise::new(SAMPLE_RATE, 17);
        n.set_rate_hz(0.35);
        n.set_smooth_ms(80.0);
        b.iter(|| {
            for _ in 0..1024 {
                black_box(n.process());
            }
        });
    });
}

criterion_group!(benches, bench_delay, bench_allpass, bench_one_pole, bench_noise);
criterion_main!(benches);
