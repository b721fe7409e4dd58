//! Configuration loading.
//!
//! The config file is JSON. A file that cannot be parsed is reported and
//! replaced by an empty configuration, so callers must treat every key as
//! optional.

pub mod settings;

pub use settings::{ClipSource, Config, DirConfig, DEFAULT_SILENCE_AROUND_VOICE_MS};

use std::fs;
use std::path::Path;

use crate::error::{PodcastError, Result};

impl Config {
    /// Reads the config file. Relative paths inside it resolve against the
    /// file's own directory.
    ///
    /// Returns an error only when the file cannot be read.
    pub fn load(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        match Config::parse(&content, base_dir.clone()) {
            Ok(config) => {
                log::debug!("Config file {:?} has been read", path);
                Ok(config)
            }
            Err(e) => {
                log::error!("{}", e);
                Ok(Config {
                    base_dir,
                    ..Config::default()
                })
            }
        }
    }

    /// Parses config JSON
    pub fn parse(content: &str, base_dir: impl Into<std::path::PathBuf>) -> Result<Config> {
        let mut config: Config = serde_json::from_str(content)
            .map_err(|e| PodcastError::Config(format!("Malformed config: {}", e)))?;
        config.base_dir = base_dir.into();
        Ok(config)
    }
}
