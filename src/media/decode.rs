use hound::{SampleFormat, WavReader};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::buffer::{validate_buffer, AudioBuffer, AudioFormat};
use crate::error::{PodcastError, Result};

/// Decodes an audio file into a buffer in its native format.
///
/// WAV files go through `hound`, every other container through `symphonia`.
pub fn decode_file(path: &Path) -> Result<AudioBuffer> {
    log::debug!("Decoding audio file: {:?}", path);

    if !path.exists() {
        return Err(PodcastError::Decode(format!("Audio file not found: {:?}", path)));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let buffer = if extension == "wav" {
        decode_wav(path)?
    } else {
        decode_with_symphonia(path, &extension)?
    };

    log::debug!(
        "Decoded {:?}: {} ms, {} Hz, {} channels",
        path,
        buffer.duration_ms(),
        buffer.format().sample_rate,
        buffer.format().channels
    );
    Ok(buffer)
}

/// Decodes and conforms a file, never failing.
///
/// Any error is logged with the caller's location and an empty buffer is
/// returned so the rest of the pipeline keeps running.
#[track_caller]
pub fn read_audio(path: &Path, format: AudioFormat) -> AudioBuffer {
    let buffer = match decode_file(path).and_then(|b| b.conform(format)) {
        Ok(buffer) => buffer,
        Err(e) => {
            log::error!("Failed to read {:?}: {}", path, e);
            AudioBuffer::empty(format)
        }
    };
    validate_buffer(&buffer, &path.to_string_lossy());
    buffer
}

fn decode_wav(path: &Path) -> Result<AudioBuffer> {
    let mut reader = WavReader::open(path)
        .map_err(|e| PodcastError::Decode(format!("Failed to open WAV file: {}", e)))?;

    let spec = reader.spec();
    log::debug!("WAV spec: {:?}", spec);

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PodcastError::Decode(format!("Failed to read samples: {}", e)))?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| PodcastError::Decode(format!("Failed to read samples: {}", e)))?
        }
    };

    Ok(AudioBuffer::new(
        samples,
        AudioFormat::new(spec.sample_rate, spec.channels),
    ))
}

fn decode_with_symphonia(path: &Path, extension: &str) -> Result<AudioBuffer> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if !extension.is_empty() {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PodcastError::Decode(format!("Unsupported format: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PodcastError::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PodcastError::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(PodcastError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;
                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(sample_buf.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping undecodable packet in {:?}: {}", path, e);
            }
            Err(e) => return Err(PodcastError::Decode(e.to_string())),
        }
    }

    Ok(AudioBuffer::new(samples, AudioFormat::new(sample_rate, channels)))
}
