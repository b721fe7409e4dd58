use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::{PodcastError, Result};
use crate::media::{read_audio, validate_buffer, AudioBuffer, AudioFormat};

fn default_fade_ms() -> u64 {
    1
}

fn default_before_cleaning_fade_ms() -> u64 {
    500
}

/// Recognized settings of one scheduled clip.
/// Unknown keys are rejected when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClipSettings {
    pub filename: PathBuf,
    /// Region start in ms; negative counts back from the end
    #[serde(default)]
    pub start: i64,
    /// Region end in ms; negative counts back from the end, absent means the end
    #[serde(default)]
    pub stop: Option<i64>,
    #[serde(default)]
    pub volume_adjustment_db: f64,
    #[serde(default = "default_fade_ms")]
    pub fade_in_ms: u64,
    #[serde(default = "default_fade_ms")]
    pub fade_out_ms: u64,
    /// Fade applied only while detecting silence
    #[serde(default = "default_before_cleaning_fade_ms")]
    pub before_cleaning_fade_ms: u64,
    #[serde(default)]
    pub is_voice: bool,
    #[serde(default)]
    pub should_clean: bool,
}

impl ClipSettings {
    /// Settings with every default and the given file
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        ClipSettings {
            filename: filename.into(),
            start: 0,
            stop: None,
            volume_adjustment_db: 0.0,
            fade_in_ms: default_fade_ms(),
            fade_out_ms: default_fade_ms(),
            before_cleaning_fade_ms: default_before_cleaning_fade_ms(),
            is_voice: false,
            should_clean: false,
        }
    }

    /// Builds settings from a config map; `token` names the map in errors
    pub fn from_map(token: &str, map: Map<String, Value>) -> Result<Self> {
        if !map.contains_key("filename") {
            log::error!("There was no \"filename\" key in {:?}", map);
        }
        serde_json::from_value(Value::Object(map)).map_err(|e| PodcastError::InvalidClip {
            token: token.to_string(),
            reason: e.to_string(),
        })
    }

    /// Resolves `start`/`stop` against a file of `len_ms`
    pub fn region(&self, len_ms: u64) -> (u64, u64) {
        let resolve = |pos: i64| -> u64 {
            if pos < 0 {
                len_ms.saturating_sub(pos.unsigned_abs())
            } else {
                (pos as u64).min(len_ms)
            }
        };
        let start = resolve(self.start);
        let stop = self.stop.map_or(len_ms, resolve);
        (start, stop.max(start))
    }
}

/// One scheduled sound unit of a podcast
#[derive(Debug, Clone)]
pub struct Clip {
    pub settings: ClipSettings,
    raw_buffer: AudioBuffer,
    cleaned_buffer: Option<AudioBuffer>,
    cleaning_performed: bool,
}

impl Clip {
    /// Creates an unread clip
    pub fn new(settings: ClipSettings) -> Self {
        Clip {
            settings,
            raw_buffer: AudioBuffer::empty(AudioFormat::default()),
            cleaned_buffer: None,
            cleaning_performed: false,
        }
    }

    /// Creates a clip around an already decoded buffer
    pub fn with_buffer(settings: ClipSettings, buffer: AudioBuffer) -> Self {
        let mut clip = Clip::new(settings);
        clip.set_raw_buffer(buffer);
        clip
    }

    pub fn filename(&self) -> &Path {
        &self.settings.filename
    }

    pub fn is_voice(&self) -> bool {
        self.settings.is_voice
    }

    pub fn should_clean(&self) -> bool {
        self.settings.should_clean
    }

    pub fn cleaning_performed(&self) -> bool {
        self.cleaning_performed
    }

    pub fn mark_cleaning_performed(&mut self) {
        self.cleaning_performed = true;
    }

    /// Decodes the file, cuts the configured region and applies the volume
    /// adjustment. A failed decode leaves an empty raw buffer.
    pub fn read_file(&mut self, format: AudioFormat) -> &mut Self {
        log::debug!("Reading file {:?}", self.settings.filename);
        let decoded = read_audio(&self.settings.filename, format);
        let (start, stop) = self.settings.region(decoded.duration_ms());
        log::debug!(
            "Slicing: {}..{} and volume adjustment: {} dB",
            start,
            stop,
            self.settings.volume_adjustment_db
        );
        let buffer = decoded
            .slice(start, stop)
            .with_gain(self.settings.volume_adjustment_db);
        self.set_raw_buffer(buffer);
        self
    }

    pub fn raw_buffer(&self) -> &AudioBuffer {
        &self.raw_buffer
    }

    #[track_caller]
    pub fn set_raw_buffer(&mut self, buffer: AudioBuffer) {
        validate_buffer(
            &buffer,
            &format!("{} (raw buffer)", self.settings.filename.display()),
        );
        self.raw_buffer = buffer;
    }

    pub fn cleaned_buffer(&self) -> Option<&AudioBuffer> {
        self.cleaned_buffer.as_ref()
    }

    #[track_caller]
    pub fn set_cleaned_buffer(&mut self, buffer: AudioBuffer) {
        validate_buffer(
            &buffer,
            &format!("{} (cleaned buffer)", self.settings.filename.display()),
        );
        self.cleaned_buffer = Some(buffer);
    }

    /// The cleaned buffer when present, the raw buffer otherwise
    pub fn current_buffer(&self) -> &AudioBuffer {
        match &self.cleaned_buffer {
            Some(cleaned) => cleaned,
            None => {
                if self.settings.should_clean && self.cleaning_performed {
                    log::warn!(
                        "For {:?} there was no cleaned buffer, while there should be!",
                        self.settings.filename
                    );
                }
                &self.raw_buffer
            }
        }
    }

    /// Duration of the current buffer in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.current_buffer().duration_ms()
    }
}
