//! Integration tests for nimbus-core DSP primitives.
//!
//! Verifies DSP accuracy with signal-level measurements: allpass magnitude
//! across a sine sweep, sample-accurate delay reads under modulation, and
//! one-pole corner frequencies.

use nimbus_core::{AllpassDiffuser, DelayLine, LfoBank, OnePole, OnePoleHighpass};

const SAMPLE_RATE: f32 = 48000.0;
const TAU: f32 = core::f32::consts::TAU;

/// Generate a sine wave buffer at the given frequency and sample rate.
fn generate_sine(freq_hz: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| libm::sinf(TAU * freq_hz * n as f32 / sample_rate))
        .collect()
}

/// Measure RMS amplitude of a signal buffer.
fn rms(signal: &[f32]) -> f32 {
    let sum_sq: f32 = signal.iter().map(|&s| s * s).sum();
    libm::sqrtf(sum_sq / signal.len() as f32)
}

/// Convert linear amplitude to dB.
fn to_db(linear: f32) -> f32 {
    20.0 * libm::log10f(linear.max(1e-10))
}

// ============================================================================
// 1. Allpass magnitude preservation
// ============================================================================

#[test]
fn allpass_preserves_rms_across_sweep() {
    let freqs = [50.0, 120.0, 440.0, 1000.0, 2500.0, 6000.0, 12000.0, 18000.0];
    for &(delay, gain) in &[(57usize, 0.5f32), (211, 0.72), (997, 0.85)] {
        for &freq in &freqs {
            let mut ap = AllpassDiffuser::new(1024);
            ap.set_delay(delay);
            ap.set_gain(gain);

            let input = generate_sine(freq, SAMPLE_RATE, 96000);
            let output: Vec<f32> = input.iter().map(|&x| ap.process(x)).collect();

            // skip the transient while the recursion fills up
            let settle = 48000;
            let diff_db = to_db(rms(&output[settle..]) / rms(&input[settle..]));
            assert!(
                diff_db.abs() < 0.1,
                "allpass d={delay} g={gain} at {freq} Hz changed level by {diff_db:.3} dB"
            );
        }
    }
}

// ============================================================================
// 2. Delay line
// ============================================================================

#[test]
fn delay_reads_every_integer_offset() {
    let mut line = DelayLine::new(512);
    for n in 0..512 {
        line.push(n as f32);
    }
    for k in 1..=508 {
        assert_eq!(line.read(k as f32), (512 - k) as f32, "offset {k}");
    }
}

#[test]
fn delay_modulated_read_tracks_sine() {
    // a slowly modulated read of a low-frequency sine is still a clean sine
    let mut line = DelayLine::new(4800);
    let mut bank = LfoBank::new(1, SAMPLE_RATE);
    let input = generate_sine(100.0, SAMPLE_RATE, 48000);
    let mut output = Vec::with_capacity(input.len());
    for &x in &input {
        line.push(x);
        let mod_depth = 24.0 * bank.process(0, 0.5);
        output.push(line.read(1200.0 + mod_depth));
    }
    let level = to_db(rms(&output[4800..]) / rms(&input[4800..]));
    assert!(level.abs() < 0.05, "modulated read changed level by {level:.3} dB");
}

// ============================================================================
// 3. One-pole corners
// ============================================================================

#[test]
fn one_pole_lowpass_corner() {
    let mut lp = OnePole::new(SAMPLE_RATE, 1000.0);
    let input = generate_sine(1000.0, SAMPLE_RATE, 48000);
    let output: Vec<f32> = input.iter().map(|&x| lp.process(x)).collect();
    let gain = to_db(rms(&output[24000..]) / rms(&input[24000..]));
    assert!(
        (-4.0..=-2.0).contains(&gain),
        "one-pole at its cutoff should be near -3 dB, got {gain:.2}"
    );
}

#[test]
fn one_pole_highpass_passes_treble() {
    let mut hp = OnePoleHighpass::new(SAMPLE_RATE, 30.0);
    let input = generate_sine(2000.0, SAMPLE_RATE, 9600);
    let output: Vec<f32> = input.iter().map(|&x| hp.process(x)).collect();
    let gain = to_db(rms(&output[4800..]) / rms(&input[4800..]));
    assert!(gain.abs() < 0.1, "30 Hz highpass should pass 2 kHz, got {gain:.2} dB");
}
