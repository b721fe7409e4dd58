use serde::{Deserialize, Serialize};
use std::panic::Location;

use crate::error::Result;
use crate::media::resample::resample_interleaved;

/// Sample rate and channel layout shared by every buffer of one podcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        AudioFormat {
            sample_rate: 44100,
            channels: 2,
        }
    }
}

impl AudioFormat {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        AudioFormat {
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Number of frames covering `ms` milliseconds (rounded down)
    pub fn frames_for_ms(&self, ms: u64) -> usize {
        (ms.saturating_mul(self.sample_rate as u64) / 1000) as usize
    }
}

/// In-memory PCM audio, interleaved `f32` samples in [-1.0, 1.0].
///
/// All positions are expressed in milliseconds. Slices clamp to the buffer,
/// so an empty buffer is a valid input for every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    format: AudioFormat,
}

impl AudioBuffer {
    /// Wraps interleaved samples, dropping a trailing partial frame
    pub fn new(mut samples: Vec<f32>, format: AudioFormat) -> Self {
        let channels = format.channels.max(1) as usize;
        let whole = samples.len() - samples.len() % channels;
        samples.truncate(whole);
        AudioBuffer { samples, format }
    }

    pub fn empty(format: AudioFormat) -> Self {
        AudioBuffer {
            samples: Vec::new(),
            format,
        }
    }

    /// Digital silence of the given duration
    pub fn silent(duration_ms: u64, format: AudioFormat) -> Self {
        let frames = format.frames_for_ms(duration_ms);
        AudioBuffer {
            samples: vec![0.0; frames * format.channels as usize],
            format,
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> usize {
        self.format.channels.max(1) as usize
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in milliseconds, rounded to the nearest millisecond
    pub fn duration_ms(&self) -> u64 {
        let rate = self.format.sample_rate as u64;
        if rate == 0 {
            return 0;
        }
        (self.frame_count() as u64 * 1000 + rate / 2) / rate
    }

    fn frame_at(&self, ms: u64) -> usize {
        self.format.frames_for_ms(ms).min(self.frame_count())
    }

    /// Copies `[start_ms, end_ms)` into a new buffer
    pub fn slice(&self, start_ms: u64, end_ms: u64) -> AudioBuffer {
        let start = self.frame_at(start_ms);
        let end = self.frame_at(end_ms).max(start);
        let ch = self.channels();
        AudioBuffer {
            samples: self.samples[start * ch..end * ch].to_vec(),
            format: self.format,
        }
    }

    /// Copies everything from `start_ms` to the end
    pub fn slice_from(&self, start_ms: u64) -> AudioBuffer {
        let start = self.frame_at(start_ms);
        let ch = self.channels();
        AudioBuffer {
            samples: self.samples[start * ch..].to_vec(),
            format: self.format,
        }
    }

    /// Copies the last `ms` milliseconds
    pub fn tail(&self, ms: u64) -> AudioBuffer {
        let frames = self.format.frames_for_ms(ms).min(self.frame_count());
        let ch = self.channels();
        let start = (self.frame_count() - frames) * ch;
        AudioBuffer {
            samples: self.samples[start..].to_vec(),
            format: self.format,
        }
    }

    /// Appends `other`, converting it to this buffer's format when needed.
    /// An empty receiver adopts the format of `other`.
    pub fn append(&mut self, other: &AudioBuffer) -> Result<()> {
        if self.is_empty() && self.format != other.format {
            self.format = other.format;
        }
        if other.format == self.format {
            self.samples.extend_from_slice(&other.samples);
        } else {
            let converted = other.clone().conform(self.format)?;
            self.samples.extend_from_slice(&converted.samples);
        }
        Ok(())
    }

    /// Concatenates the buffer with itself `times` times
    pub fn repeat(&self, times: usize) -> AudioBuffer {
        AudioBuffer {
            samples: self.samples.repeat(times),
            format: self.format,
        }
    }

    /// Frame order reversed, channel order within a frame preserved
    pub fn reversed(&self) -> AudioBuffer {
        let ch = self.channels();
        let mut samples = Vec::with_capacity(self.samples.len());
        for frame in self.samples.chunks_exact(ch).rev() {
            samples.extend_from_slice(frame);
        }
        AudioBuffer {
            samples,
            format: self.format,
        }
    }

    /// Applies a gain in decibels
    pub fn with_gain(mut self, gain_db: f64) -> AudioBuffer {
        if gain_db == 0.0 {
            return self;
        }
        let factor = 10f64.powf(gain_db / 20.0) as f32;
        for s in &mut self.samples {
            *s *= factor;
        }
        self
    }

    /// Linear amplitude ramp from silence over the first `ms` milliseconds
    pub fn fade_in(mut self, ms: u64) -> AudioBuffer {
        let frames = self.format.frames_for_ms(ms).min(self.frame_count());
        if frames == 0 {
            return self;
        }
        let ch = self.channels();
        for (i, frame) in self.samples.chunks_exact_mut(ch).take(frames).enumerate() {
            let gain = i as f32 / frames as f32;
            frame.iter_mut().for_each(|s| *s *= gain);
        }
        self
    }

    /// Linear amplitude ramp to silence over the last `ms` milliseconds
    pub fn fade_out(mut self, ms: u64) -> AudioBuffer {
        let frames = self.format.frames_for_ms(ms).min(self.frame_count());
        if frames == 0 {
            return self;
        }
        let ch = self.channels();
        let skip = self.frame_count() - frames;
        for (i, frame) in self.samples.chunks_exact_mut(ch).skip(skip).enumerate() {
            let gain = (frames - 1 - i) as f32 / frames as f32;
            frame.iter_mut().for_each(|s| *s *= gain);
        }
        self
    }

    /// Mixes `other` on top of this buffer starting at offset 0.
    /// The result keeps this buffer's length.
    pub fn overlay(mut self, other: &AudioBuffer) -> Result<AudioBuffer> {
        let other = if other.format == self.format {
            other.clone()
        } else {
            other.clone().conform(self.format)?
        };
        for (s, o) in self.samples.iter_mut().zip(other.samples.iter()) {
            *s = (*s + *o).clamp(-1.0, 1.0);
        }
        Ok(self)
    }

    /// Root mean square of every sample
    pub fn rms(&self) -> f64 {
        rms(&self.samples)
    }

    /// Loudness relative to full scale; `-inf` for empty or digital silence
    pub fn dbfs(&self) -> f64 {
        to_dbfs(self.rms())
    }

    /// Loudness of `[start_ms, end_ms)` without copying
    pub fn dbfs_range(&self, start_ms: u64, end_ms: u64) -> f64 {
        let start = self.frame_at(start_ms);
        let end = self.frame_at(end_ms).max(start);
        let ch = self.channels();
        to_dbfs(rms(&self.samples[start * ch..end * ch]))
    }

    /// Converts channel layout and sample rate
    pub fn conform(self, target: AudioFormat) -> Result<AudioBuffer> {
        if self.format == target {
            return Ok(self);
        }
        let from_ch = self.channels();
        let to_ch = target.channels.max(1) as usize;
        let remixed = if from_ch == to_ch {
            self.samples
        } else {
            remix_channels(&self.samples, from_ch, to_ch)
        };
        let samples = resample_interleaved(
            &remixed,
            to_ch,
            self.format.sample_rate,
            target.sample_rate,
        )?;
        Ok(AudioBuffer::new(samples, target))
    }
}

fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_of_squares: f64 = samples
        .iter()
        .map(|&s| {
            let s = s as f64;
            s * s
        })
        .sum();
    (sum_of_squares / samples.len() as f64).sqrt()
}

fn to_dbfs(rms: f64) -> f64 {
    if rms <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * rms.log10()
    }
}

/// Mixes down to mono, then spreads the mono signal over `to` channels
fn remix_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in samples.chunks_exact(from) {
        let mono = frame.iter().sum::<f32>() / from as f32;
        out.extend(std::iter::repeat(mono).take(to));
    }
    out
}

/// Logs an empty buffer together with the source location that produced it.
///
/// Empty buffers keep flowing through the pipeline; this only reports them.
#[track_caller]
pub fn validate_buffer(buffer: &AudioBuffer, description: &str) {
    if buffer.is_empty() {
        let caller = Location::caller();
        log::error!(
            "Buffer \"{}\" is empty! Detected at: {}:{}",
            description,
            caller.file(),
            caller.line()
        );
    }
}
