pub mod loudness;
pub mod microphone_error;
pub mod silence_detection;

pub use loudness::LoudnessProfile;
pub use microphone_error::detect_leading_microphone_error;
pub use silence_detection::{
    detect_leading_silence, detect_trailing_silence, trailing_cut, SliceEnd, Threshold,
};
