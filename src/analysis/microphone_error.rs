use super::loudness::LoudnessProfile;
use crate::media::AudioBuffer;

pub const DEFAULT_CHUNK_MS: u64 = 5;
pub const DEFAULT_SAMPLE_WINDOW_MS: u64 = 5000;

/// Locates a click or pop that precedes speech and returns how many
/// milliseconds to trim beyond the fade-in.
///
/// The loudness curve of the first `sample_window_ms` is differentiated,
/// smoothed over three chunks and squared. The first value above half the
/// mean marks the transient. Transients inside twice the fade-in are taken
/// to be the fade ramp itself and ignored.
pub fn detect_leading_microphone_error(
    buffer: &AudioBuffer,
    fade_in_ms: u64,
    chunk_ms: u64,
    sample_window_ms: u64,
) -> u64 {
    let profile = LoudnessProfile::measure(buffer, chunk_ms, Some(sample_window_ms));
    if profile.len() < 2 {
        return 0;
    }

    let energy: Vec<f64> = smooth3(&gradient(&profile.levels))
        .into_iter()
        .map(|v| v * v)
        .collect();
    let mean = energy.iter().sum::<f64>() / energy.len() as f64;

    let candidate = energy
        .iter()
        .position(|&v| v > 0.5 * mean)
        .map_or(0, |i| profile.offset_of(i));

    log::debug!(
        "Microphone error candidate at {} ms (fade in {} ms)",
        candidate,
        fade_in_ms
    );

    if candidate > fade_in_ms.saturating_mul(2) {
        candidate - fade_in_ms
    } else {
        0
    }
}

/// Discrete derivative: one-sided at the edges, central inside
fn gradient(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let mut out = Vec::with_capacity(n);
    out.push(data[1] - data[0]);
    for i in 1..n - 1 {
        out.push((data[i + 1] - data[i - 1]) / 2.0);
    }
    out.push(data[n - 1] - data[n - 2]);
    out
}

/// Full convolution with a length-3 box kernel; output has `n + 2` values
fn smooth3(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }
    (0..n + 2)
        .map(|k| {
            let lo = k.saturating_sub(2);
            let hi = k.min(n - 1);
            data[lo..=hi].iter().sum::<f64>() / 3.0
        })
        .collect()
}
