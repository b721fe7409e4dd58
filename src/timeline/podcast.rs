use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::background::{build_background, ScheduleEntry};
use super::clip::{Clip, ClipSettings};
use crate::config::{ClipSource, Config, DirConfig};
use crate::error::{PodcastError, Result};
use crate::media::{AudioBuffer, AudioFormat};

/// Fade applied to the end of the mixed program
pub const PROGRAM_FADE_OUT_MS: u64 = 250;

/// The clips of one podcast directory and the buffers built from them
#[derive(Debug, Clone)]
pub struct Podcast {
    pub dirname: String,
    pub dir_config: DirConfig,
    dir_path: PathBuf,
    format: AudioFormat,
    clips: Vec<Clip>,
    background: Option<AudioBuffer>,
    output: AudioBuffer,
}

impl Podcast {
    /// Creates an empty podcast for a configured directory
    pub fn new(dirname: &str, dir_config: DirConfig, config: &Config) -> Self {
        log::info!(
            "Proceeding podcast \"{}\" in dir \"{}\"",
            dir_config.name,
            dirname
        );
        Podcast {
            dirname: dirname.to_string(),
            dir_config,
            dir_path: config.resolve_path(dirname),
            format: config.output_format,
            clips: Vec::new(),
            background: None,
            output: AudioBuffer::empty(config.output_format),
        }
    }

    pub fn name(&self) -> &str {
        &self.dir_config.name
    }

    pub fn dir_path(&self) -> &Path {
        &self.dir_path
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn clips_mut(&mut self) -> &mut [Clip] {
        &mut self.clips
    }

    pub fn push_clip(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    pub fn background(&self) -> Option<&AudioBuffer> {
        self.background.as_ref()
    }

    pub fn output(&self) -> &AudioBuffer {
        &self.output
    }

    /// Turns every schedule token into an unread clip
    pub fn resolve_filenames(&mut self, config: &Config) -> Result<&mut Self> {
        let tokens = self.dir_config.schedule.clone();
        for token in &tokens {
            let map = match config.special_entry(token) {
                Some(entry) => special_clip_map(entry, config),
                None => self.glob_clip_map(token, config)?,
            };
            let settings = ClipSettings::from_map(token, map)?;
            self.clips.push(Clip::new(settings));
        }
        log::debug!(
            "Resolved {} clips for \"{}\"",
            self.clips.len(),
            self.dirname
        );
        Ok(self)
    }

    fn glob_clip_map(&self, token: &str, config: &Config) -> Result<Map<String, Value>> {
        let pattern = self.dir_path.join(token);
        let mut names: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect();
        names.sort();

        let Some(first) = names.first() else {
            log::error!(
                "Could not resolve sound search name: {} for {}",
                token,
                self.dirname
            );
            return Err(PodcastError::Unresolved {
                token: token.to_string(),
                dir: self.dirname.clone(),
            });
        };
        if names.len() > 1 {
            log::error!(
                "Found {} files for sound search name {}\n {:?}",
                names.len(),
                token,
                names
            );
        }

        let mut map = Map::new();
        map.insert(
            "filename".to_string(),
            Value::String(first.to_string_lossy().into_owned()),
        );
        map.insert("is_voice".to_string(), Value::Bool(true));
        // The global sound config overrides the directory default
        for (key, value) in &self.dir_config.default {
            map.insert(key.clone(), value.clone());
        }
        for (key, value) in &config.default_sound_config {
            map.insert(key.clone(), value.clone());
        }
        Ok(map)
    }

    /// Decodes every clip. Clips that will not be cleaned get their fades now.
    pub fn read_files(&mut self) -> &mut Self {
        let format = self.format;
        for clip in &mut self.clips {
            clip.read_file(format);
            if !clip.should_clean() {
                log::debug!(
                    "Fading in: {}, out: {}",
                    clip.settings.fade_in_ms,
                    clip.settings.fade_out_ms
                );
                let faded = clip
                    .raw_buffer()
                    .clone()
                    .fade_in(clip.settings.fade_in_ms)
                    .fade_out(clip.settings.fade_out_ms);
                clip.set_raw_buffer(faded);
            }
        }
        self
    }

    /// `(duration, is_voice)` of every clip's current buffer, in order
    pub fn schedule(&self) -> Vec<ScheduleEntry> {
        self.clips
            .iter()
            .map(|clip| ScheduleEntry::new(clip.duration_ms(), clip.is_voice()))
            .collect()
    }

    /// Loads the configured background source and builds the background
    pub fn build_background(&mut self, config: &Config) -> Result<&AudioBuffer> {
        let source = match &config.background {
            Some(source) => {
                let settings = background_settings(source, config)?;
                let mut clip = Clip::new(settings);
                clip.read_file(self.format);
                clip.raw_buffer().clone()
            }
            None => {
                log::warn!("No background configured for \"{}\"", self.dirname);
                AudioBuffer::empty(self.format)
            }
        };
        self.build_background_from(&source)
    }

    /// Builds the background from an already decoded source
    pub fn build_background_from(&mut self, source: &AudioBuffer) -> Result<&AudioBuffer> {
        let background = build_background(source, &self.schedule(), self.format)?;
        log::debug!(
            "Background for \"{}\" is {} ms",
            self.dirname,
            background.duration_ms()
        );
        Ok(&*self.background.insert(background))
    }

    /// Concatenates every clip's current buffer. With `with_background` the
    /// background is mixed underneath and the program fades out.
    pub fn join(&mut self, with_background: bool) -> Result<&AudioBuffer> {
        let mut output = AudioBuffer::empty(self.format);
        for clip in &self.clips {
            output.append(clip.current_buffer())?;
        }

        if with_background {
            match &self.background {
                Some(background) => {
                    output = output
                        .overlay(background)?
                        .fade_out(PROGRAM_FADE_OUT_MS);
                }
                None => log::warn!(
                    "Background was not built for \"{}\", joining without it",
                    self.dirname
                ),
            }
        }

        log::info!(
            "Joined {} clips for \"{}\": {} ms",
            self.clips.len(),
            self.dirname,
            output.duration_ms()
        );
        self.output = output;
        Ok(&self.output)
    }
}

/// Special entries are used verbatim, with their filename resolved
/// against the config directory
fn special_clip_map(entry: &Map<String, Value>, config: &Config) -> Map<String, Value> {
    let mut map = entry.clone();
    if let Some(Value::String(filename)) = map.get("filename") {
        let resolved = config.resolve_path(filename);
        map.insert(
            "filename".to_string(),
            Value::String(resolved.to_string_lossy().into_owned()),
        );
    }
    map
}

fn background_settings(source: &ClipSource, config: &Config) -> Result<ClipSettings> {
    match source {
        ClipSource::Named(token) => {
            let entry = config
                .special_entry(token)
                .ok_or_else(|| {
                    PodcastError::Config(format!("Background entry '{}' is not defined", token))
                })?;
            ClipSettings::from_map(token, special_clip_map(entry, config))
        }
        ClipSource::Inline(entry) => {
            ClipSettings::from_map("background", special_clip_map(entry, config))
        }
    }
}
