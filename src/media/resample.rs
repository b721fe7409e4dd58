use rubato::{FftFixedIn, Resampler};

use crate::error::{PodcastError, Result};

/// Frames fed to the resampler per call
const CHUNK_FRAMES: usize = 1024;

/// Resamples interleaved audio from `from_rate` to `to_rate`.
///
/// The resampler's output delay is trimmed so the result lines up with the
/// input, and the length is fixed to `frames * to_rate / from_rate`.
pub fn resample_interleaved(
    samples: &[f32],
    channels: usize,
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(PodcastError::Resample(format!(
            "Invalid sample rates {} -> {}",
            from_rate, to_rate
        )));
    }

    let channels = channels.max(1);
    let frames = samples.len() / channels;
    log::debug!(
        "Resampling {} frames x {} channels: {} Hz -> {} Hz",
        frames,
        channels,
        from_rate,
        to_rate
    );

    let mut planar: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (c, &s) in frame.iter().enumerate() {
            planar[c].push(s);
        }
    }

    let mut resampler = FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_FRAMES,
        2,
        channels,
    )
    .map_err(|e| PodcastError::Resample(format!("Failed to create resampler: {}", e)))?;

    let delay = resampler.output_delay();
    let expected = (frames as u64 * to_rate as u64 / from_rate as u64) as usize;
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); channels];

    let mut pos = 0;
    while pos < frames {
        let needed = resampler.input_frames_next();
        let end = (pos + needed).min(frames);
        let chunk: Vec<&[f32]> = planar.iter().map(|ch| &ch[pos..end]).collect();
        let processed = if end - pos == needed {
            resampler.process(&chunk, None)
        } else {
            resampler.process_partial(Some(chunk.as_slice()), None)
        }
        .map_err(|e| PodcastError::Resample(e.to_string()))?;
        for (c, data) in processed.into_iter().enumerate() {
            output[c].extend_from_slice(&data);
        }
        pos = end;
    }

    // Flush what is still buffered inside the resampler
    let mut guard = 0;
    while output[0].len() < expected + delay && guard < 16 {
        let processed = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| PodcastError::Resample(e.to_string()))?;
        if processed[0].is_empty() {
            break;
        }
        for (c, data) in processed.into_iter().enumerate() {
            output[c].extend_from_slice(&data);
        }
        guard += 1;
    }

    let mut interleaved = Vec::with_capacity(expected * channels);
    for i in 0..expected {
        for channel in &output {
            interleaved.push(channel.get(delay + i).copied().unwrap_or(0.0));
        }
    }
    Ok(interleaved)
}
