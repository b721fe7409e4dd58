use serde::{Deserialize, Serialize};

use crate::media::AudioBuffer;

/// Default scan resolution in milliseconds
pub const DEFAULT_CHUNK_MS: u64 = 10;
/// Leading window whose loudness becomes the auto threshold
pub const AUTO_THRESHOLD_WINDOW_MS: u64 = 3000;
/// Pulled back from a detected onset to keep the attack of the first word
pub const ONSET_MARGIN_MS: u64 = 300;
/// Fixed threshold used when scanning for trailing silence
pub const TRAILING_SILENCE_THRESHOLD_DB: f64 = -55.0;

/// Loudness level separating silence from sound
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Threshold {
    /// Derived from the buffer's own first 3000 ms
    Auto,
    /// Fixed level in dBFS
    Fixed(f64),
}

impl Threshold {
    /// Resolves the threshold against a concrete buffer
    pub fn resolve(&self, buffer: &AudioBuffer) -> f64 {
        match *self {
            Threshold::Auto => buffer.dbfs_range(0, AUTO_THRESHOLD_WINDOW_MS),
            Threshold::Fixed(db) => db,
        }
    }
}

/// End of a slice relative to the buffer's tail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceEnd {
    /// Keep everything through the end
    ToEnd,
    /// Drop this many milliseconds from the end
    FromEnd(u64),
}

impl SliceEnd {
    /// Absolute end offset for a buffer of `len_ms`
    pub fn resolve(&self, len_ms: u64) -> u64 {
        match *self {
            SliceEnd::ToEnd => len_ms,
            SliceEnd::FromEnd(ms) => len_ms.saturating_sub(ms),
        }
    }
}

/// Finds where sustained sound begins, in milliseconds.
///
/// Walks the buffer in `chunk_ms` steps and stops at the first chunk whose
/// loudness reaches the threshold. A buffer that never gets loud enough
/// returns its own length. Onsets past 300 ms are pulled back by 300 ms.
pub fn detect_leading_silence(buffer: &AudioBuffer, threshold: Threshold, chunk_ms: u64) -> u64 {
    let chunk_ms = if chunk_ms == 0 { DEFAULT_CHUNK_MS } else { chunk_ms };
    let threshold_db = threshold.resolve(buffer);
    let len = buffer.duration_ms();

    log::debug!(
        "Scanning {} ms for leading silence, threshold {:.2} dB, chunk {} ms",
        len,
        threshold_db,
        chunk_ms
    );

    // Digital silence stays silent even against a -inf auto threshold
    let is_silent = |db: f64| db < threshold_db || db == f64::NEG_INFINITY;

    let mut trim_ms = 0;
    while trim_ms < len && is_silent(buffer.dbfs_range(trim_ms, trim_ms + chunk_ms)) {
        trim_ms += chunk_ms;
    }

    if trim_ms >= len {
        return len;
    }

    if trim_ms > ONSET_MARGIN_MS {
        trim_ms - ONSET_MARGIN_MS
    } else {
        trim_ms
    }
}

/// Finds how much silence to cut from the tail.
///
/// Runs the leading scan on a reversed copy with a fixed -55 dBFS threshold.
/// A zero result means nothing is cut.
pub fn detect_trailing_silence(buffer: &AudioBuffer, chunk_ms: u64) -> SliceEnd {
    let trailing = detect_leading_silence(
        &buffer.reversed(),
        Threshold::Fixed(TRAILING_SILENCE_THRESHOLD_DB),
        chunk_ms,
    );
    trailing_cut(trailing)
}

/// Maps a detected trailing offset to a slice end
pub fn trailing_cut(trailing_ms: u64) -> SliceEnd {
    if trailing_ms == 0 {
        SliceEnd::ToEnd
    } else {
        SliceEnd::FromEnd(trailing_ms)
    }
}
