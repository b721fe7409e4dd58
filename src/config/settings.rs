use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::media::AudioFormat;

/// Padding placed around every cleaned clip when the config sets none
pub const DEFAULT_SILENCE_AROUND_VOICE_MS: u64 = 500;

/// One podcast directory and its schedule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirConfig {
    /// Podcast name used in the output filename
    #[serde(default)]
    pub name: String,
    /// Search tokens, in playback order
    #[serde(default)]
    pub schedule: Vec<String>,
    /// Clip settings overlay for every file resolved in this directory
    #[serde(default)]
    pub default: Map<String, Value>,
}

/// Where a clip comes from: a named special entry or an inline clip map
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClipSource {
    Named(String),
    Inline(Map<String, Value>),
}

/// Process-wide configuration, read-only once loaded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory name -> podcast definition
    #[serde(default)]
    pub dirs: BTreeMap<String, DirConfig>,
    /// Background bed looped under voice runs
    #[serde(default)]
    pub background: Option<ClipSource>,
    /// Clip settings overlay for every file resolved through a glob
    #[serde(default)]
    pub default_sound_config: Map<String, Value>,
    /// Silence padded around cleaned clips, in milliseconds
    #[serde(default)]
    pub default_silence_around_voice: Option<u64>,
    /// Format every buffer is converted to
    #[serde(default)]
    pub output_format: AudioFormat,
    /// Named special clip entries (any other top-level key)
    #[serde(flatten)]
    pub sounds: BTreeMap<String, Value>,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Config {
    /// Special entry for `token`, if the config defines one
    pub fn special_entry(&self, token: &str) -> Option<&Map<String, Value>> {
        self.sounds.get(token).and_then(Value::as_object)
    }

    pub fn silence_around_voice_ms(&self) -> u64 {
        self.default_silence_around_voice
            .unwrap_or(DEFAULT_SILENCE_AROUND_VOICE_MS)
    }

    /// Resolves a path from the config against `base_dir`
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let candidate = PathBuf::from(path);
        if candidate.is_absolute() {
            candidate
        } else {
            self.base_dir.join(candidate)
        }
    }
}
