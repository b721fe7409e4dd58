pub mod buffer;
pub mod decode;
pub mod resample;

pub use buffer::{validate_buffer, AudioBuffer, AudioFormat};
pub use decode::{decode_file, read_audio};
