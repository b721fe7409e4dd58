use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PodcastError, Result};
use crate::media::AudioBuffer;
use crate::timeline::Podcast;

/// Extension of every exported program
pub const OUTPUT_FORMAT: &str = "wav";

/// `"{directory}/output - {podcast name}.wav"`
pub fn output_path(dir_path: &Path, podcast_name: &str) -> PathBuf {
    dir_path.join(format!("output - {}.{}", podcast_name, OUTPUT_FORMAT))
}

/// Writes a buffer as 16-bit PCM WAV
pub fn export_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    log::info!("Exporting {} ms to: {:?}", buffer.duration_ms(), path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let format = buffer.format();
    let spec = WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in buffer.samples() {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer.write_sample(value)?;
    }
    writer.finalize()?;

    log::info!("Export completed successfully");
    Ok(())
}

impl Podcast {
    /// Destination of this podcast's mixed program
    pub fn output_path(&self) -> PathBuf {
        output_path(self.dir_path(), self.name())
    }

    /// Writes the joined output next to the podcast's clips
    pub fn save(&self) -> Result<PathBuf> {
        if self.output().is_empty() {
            return Err(PodcastError::Encode(format!(
                "Nothing to export for \"{}\", output is empty",
                self.dirname
            )));
        }
        let path = self.output_path();
        export_wav(self.output(), &path)?;
        Ok(path)
    }
}
