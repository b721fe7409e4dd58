pub mod wav_export;

pub use wav_export::{export_wav, output_path, OUTPUT_FORMAT};
