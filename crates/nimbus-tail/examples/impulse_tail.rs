//! Renders an impulse through the full stereo chain and reports how long the
//! tail takes to fall 60 dB below its loudest 10 ms window.
//!
//! Run with: RUST_LOG=debug cargo run -p nimbus-tail --example impulse_tail --features tracing

use nimbus_core::{LfoBank, linear_to_db};
use nimbus_tail::{
    Diffusion, MAX_LINES, StereoInjector, Tank, TankConfig, decay_to_rt60, render_tap_pattern,
};
use tracing_subscriber::EnvFilter;

const SAMPLE_RATE: f32 = 48000.0;
const WINDOW: usize = 480;

fn measure(decay: f32) -> Option<f32> {
    let mut tank = Tank::new();
    tank.init(SAMPLE_RATE, (SAMPLE_RATE * 2.5) as usize, 1234);
    tank.set_config(TankConfig::for_sample_rate(SAMPLE_RATE));
    let mut diffusion = Diffusion::new();
    diffusion.init(SAMPLE_RATE, 1234);
    let mut injector = StereoInjector::new(1234);
    let mut lfo = LfoBank::new(MAX_LINES, SAMPLE_RATE);

    let total = ((decay_to_rt60(decay) * 1.5 + 0.5) * SAMPLE_RATE) as usize;
    let mut y = [0.0; MAX_LINES];
    let mut windows = Vec::with_capacity(total / WINDOW + 1);
    let mut acc = 0.0f32;
    for n in 0..total {
        let (mut l, mut r) = if n == 0 { (1.0, 1.0) } else { (0.0, 0.0) };
        diffusion.process_input(&mut l, &mut r);
        let v = injector.build(l, r, MAX_LINES);
        tank.process_sample_vec(&v, decay, &mut lfo, &mut y);
        let (mut ol, mut or) = render_tap_pattern(&y, MAX_LINES, 0);
        diffusion.process_late(&mut ol, &mut or, 0.5);
        acc += ol * ol + or * or;
        if (n + 1) % WINDOW == 0 {
            windows.push(acc / WINDOW as f32);
            acc = 0.0;
        }
    }

    let (peak_idx, peak) = windows
        .iter()
        .copied()
        .enumerate()
        .fold((0, 0.0f32), |best, (i, e)| if e > best.1 { (i, e) } else { best });
    tracing::debug!("decay={decay}: peak window {peak_idx} energy {peak:.3e}");

    windows[peak_idx..]
        .iter()
        .position(|&e| e < peak * 1e-6)
        .map(|i| i as f32 * WINDOW as f32 / SAMPLE_RATE)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    for decay in [0.2, 0.5, 0.8, 0.92] {
        let target = decay_to_rt60(decay);
        match measure(decay) {
            Some(measured) => tracing::info!(
                "decay {decay:.2}: rt60 target {target:.2} s, measured {measured:.2} s ({:+.1} dB/s)",
                linear_to_db(1e-3) / measured
            ),
            None => tracing::warn!("decay {decay:.2}: tail did not fall 60 dB within the render"),
        }
    }
}
