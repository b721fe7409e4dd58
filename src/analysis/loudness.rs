use serde::{Deserialize, Serialize};

use crate::media::AudioBuffer;

/// Floor used in place of `-inf` for digitally silent chunks
pub const SILENCE_FLOOR_DB: f64 = -120.0;

/// Per-chunk loudness curve of a buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoudnessProfile {
    /// dBFS per chunk, floored at -120 dB
    pub levels: Vec<f64>,
    /// Total duration of the analysed buffer in milliseconds
    pub duration_ms: u64,
    /// Milliseconds per chunk
    pub chunk_ms: u64,
}

impl LoudnessProfile {
    /// Measures chunks starting at `0, chunk_ms, 2 * chunk_ms, ...` below
    /// `window_ms` (or the whole buffer when `None`)
    pub fn measure(buffer: &AudioBuffer, chunk_ms: u64, window_ms: Option<u64>) -> Self {
        let chunk_ms = chunk_ms.max(1);
        let duration_ms = buffer.duration_ms();
        let limit = window_ms.map_or(duration_ms, |w| w.min(duration_ms));

        let levels = (0..limit)
            .step_by(chunk_ms as usize)
            .map(|offset| {
                buffer
                    .dbfs_range(offset, offset + chunk_ms)
                    .max(SILENCE_FLOOR_DB)
            })
            .collect();

        LoudnessProfile {
            levels,
            duration_ms,
            chunk_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Millisecond offset of the chunk at `index`
    pub fn offset_of(&self, index: usize) -> u64 {
        index as u64 * self.chunk_ms
    }
}
