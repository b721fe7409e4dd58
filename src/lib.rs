//! Assembles podcast episodes from recorded clips.
//!
//! Every configured directory holds the clips of one podcast. Voice clips are
//! trimmed of leading and trailing silence and of a leading microphone error,
//! padded with silence, then joined in schedule order over a looped background
//! that plays only under voice.

pub mod analysis;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod logging;
pub mod media;
pub mod timeline;

pub use config::Config;
pub use editor::{PipelineOptions, PodcastBuilder};
pub use error::{PodcastError, Result};
pub use media::{AudioBuffer, AudioFormat};
pub use timeline::{Clip, ClipSettings, Podcast};
