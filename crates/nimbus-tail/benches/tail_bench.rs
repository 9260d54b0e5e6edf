//! Criterion benchmarks for the nimbus-tail engine
//!
//! Run with: cargo bench -p nimbus-tail
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nimbus_core::LfoBank;
use nimbus_tail::{
    Diffusion, MAX_LINES, MatrixType, ModulationMode, StereoInjector, Tank, TankConfig, mix,
    render_tap_pattern,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn ready_tank(lines: usize, modulation: ModulationMode) -> Tank {
    let mut tank = Tank::new();
    tank.init(SAMPLE_RATE, (SAMPLE_RATE * 2.5) as usize, 1234);
    let mut cfg = TankConfig::for_sample_rate(SAMPLE_RATE);
    cfg.lines = lines;
    cfg.modulation = modulation;
    tank.set_config(cfg);
    tank
}

fn bench_tank(c: &mut Criterion) {
    let mut group = c.benchmark_group("Tank");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        for (name, lines, mode) in [
            ("8_lines", 8, ModulationMode::PerLine),
            ("16_lines", 16, ModulationMode::PerLine),
            ("16_lines_field", 16, ModulationMode::FieldRotation),
        ] {
            group.bench_with_input(BenchmarkId::new(name, block_size), &block_size, |b, _| {
                let mut tank = ready_tank(lines, mode);
                let mut lfo = LfoBank::new(MAX_LINES, SAMPLE_RATE);
                let mut out = [0.0; MAX_LINES];
                b.iter(|| {
                    for &sample in &input {
                        tank.process_sample(black_box(sample), 0.8, &mut lfo, &mut out);
                    }
                    black_box(&out);
                });
            });
        }
    }

    group.finish();
}

fn bench_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("Matrix");
    for matrix in [MatrixType::Hadamard, MatrixType::Householder] {
        group.bench_function(format!("{matrix:?}_16"), |b| {
            let mut v: [f32; MAX_LINES] = core::array::from_fn(|i| i as f32 * 0.01);
            b.iter(|| {
                mix(black_box(&mut v), MAX_LINES, matrix);
            });
        });
    }
    group.finish();
}

fn bench_full_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("FullChain");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("stereo", block_size),
            &block_size,
            |b, _| {
                let mut tank = ready_tank(MAX_LINES, ModulationMode::PerLine);
                let mut lfo = LfoBank::new(MAX_LINES, SAMPLE_RATE);
                let mut diffusion = Diffusion::new();
                diffusion.init(SAMPLE_RATE, 1234);
                let mut injector = StereoInjector::new(1234);
                let mut y = [0.0; MAX_LINES];
                b.iter(|| {
                    for &sample in &input {
                        let (mut l, mut r) = (sample, -sample);
                        diffusion.process_input(&mut l, &mut r);
                        let v = injector.build(l, r, MAX_LINES);
                        tank.process_sample_vec(&v, 0.8, &mut lfo, &mut y);
                        let (mut ol, mut or) = render_tap_pattern(&y, MAX_LINES, 0);
                        diffusion.process_late(&mut ol, &mut or, 0.5);
                        black_box((ol, or));
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_tank, bench_matrix, bench_full_chain);
criterion_main!(benches);
