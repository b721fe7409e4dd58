use thiserror::Error;

/// Errors raised while building podcasts
#[derive(Debug, Error)]
pub enum PodcastError {
    /// Malformed configuration source
    #[error("Configuration error: {0}")]
    Config(String),

    /// A clip map could not be turned into clip settings
    #[error("Invalid clip definition for '{token}': {reason}")]
    InvalidClip { token: String, reason: String },

    /// No file matched a schedule search token
    #[error("Could not resolve sound search name '{token}' in '{dir}'")]
    Unresolved { token: String, dir: String },

    /// Audio decoding failed
    #[error("Decode error: {0}")]
    Decode(String),

    /// Audio encoding failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Sample rate conversion failed
    #[error("Resample error: {0}")]
    Resample(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),
}

impl From<hound::Error> for PodcastError {
    fn from(e: hound::Error) -> Self {
        PodcastError::Encode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PodcastError>;
