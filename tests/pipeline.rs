use hound::{SampleFormat, WavSpec, WavWriter};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use podcast_builder_lib::editor::{PipelineOptions, PodcastBuilder};
use podcast_builder_lib::media::decode_file;
use podcast_builder_lib::timeline::collapse_schedule;
use podcast_builder_lib::{Config, Podcast, PodcastError};

const SAMPLE_RATE: u32 = 8000;

/// Writes `(duration_ms, level)` segments as a mono 16-bit WAV
fn write_wav(path: &Path, segments: &[(u32, f32)]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for &(ms, level) in segments {
        for _ in 0..(ms * SAMPLE_RATE / 1000) {
            writer.write_sample((level * i16::MAX as f32) as i16).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn write_config(base: &Path, config: serde_json::Value) -> PathBuf {
    let path = base.join("config.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

/// Two podcasts: `ep1` with an intro and a recorded voice, `ep2` with two
/// files matching one search name
fn fixture(base: &Path) -> PathBuf {
    write_wav(&base.join("sounds/intro.wav"), &[(600, 0.3)]);
    write_wav(&base.join("sounds/bed.wav"), &[(1500, 0.1)]);
    write_wav(
        &base.join("ep1/voice1.wav"),
        &[(1000, 0.0), (2000, 0.5), (500, 0.0)],
    );
    write_wav(&base.join("ep2/take_b.wav"), &[(900, 0.4)]);
    write_wav(&base.join("ep2/take_a.wav"), &[(700, 0.4)]);

    write_config(
        base,
        json!({
            "dirs": {
                "ep1": {
                    "name": "Ep1",
                    "schedule": ["intro", "voice1.*", "intro"],
                    "default": {"should_clean": true}
                },
                "ep2": {
                    "name": "Ep2",
                    "schedule": ["take_*"]
                }
            },
            "background": {"filename": "sounds/bed.wav"},
            "default_sound_config": {"fade_in_ms": 10, "fade_out_ms": 10},
            "default_silence_around_voice": 200,
            "output_format": {"sample_rate": SAMPLE_RATE, "channels": 1},
            "intro": {"filename": "sounds/intro.wav"}
        }),
    )
}

fn podcast<'a>(builder: &'a PodcastBuilder, dirname: &str) -> &'a Podcast {
    builder
        .podcasts()
        .iter()
        .find(|p| p.dirname == dirname)
        .unwrap()
}

#[test]
fn test_build_end_to_end() {
    let base = tempfile::tempdir().unwrap();
    let config = Config::load(&fixture(base.path())).unwrap();

    let mut builder = PodcastBuilder::new(config);
    builder.perform(&PipelineOptions {
        build: true,
        just_one: false,
    });
    assert!(builder.failures().is_empty());

    let ep1 = podcast(&builder, "ep1");
    let clips = ep1.clips();
    assert_eq!(clips.len(), 3);
    assert!(!clips[0].is_voice());
    assert!(clips[1].is_voice());
    assert!(clips[1].cleaned_buffer().is_some());
    assert!(clips[0].cleaned_buffer().is_none());
    assert_eq!(clips[0].duration_ms(), 600);

    // Cleaning removed most of the surrounding silence and added 2 x 200 ms
    let voice_ms = clips[1].duration_ms();
    assert!(voice_ms < 3500);
    assert!(voice_ms > 2000);

    // Output is every current buffer back to back
    let total: u64 = clips.iter().map(|c| c.duration_ms()).sum();
    assert!(ep1.output().duration_ms().abs_diff(total) <= 1);

    // The background stops where the final non-voice run starts
    let runs = collapse_schedule(&ep1.schedule());
    assert_eq!(runs.len(), 3);
    let background = ep1.background().unwrap();
    assert_eq!(background.duration_ms(), 600 + voice_ms);

    let path = base.path().join("ep1").join("output - Ep1.wav");
    assert!(path.exists());
    assert_eq!(builder.outputs().len(), 2);
    let written = decode_file(&path).unwrap();
    assert!(written.duration_ms().abs_diff(ep1.output().duration_ms()) <= 1);
    assert!(base.path().join("ep2").join("output - Ep2.wav").exists());
}

#[test]
fn test_first_of_many_matches_is_used() {
    let base = tempfile::tempdir().unwrap();
    let config = Config::load(&fixture(base.path())).unwrap();

    let mut builder = PodcastBuilder::new(config);
    builder.perform(&PipelineOptions::default());

    // Only the choice is checked here; the error log listing both matches is not captured
    let ep2 = podcast(&builder, "ep2");
    assert_eq!(ep2.clips().len(), 1);
    assert!(ep2.clips()[0].filename().ends_with("take_a.wav"));
    assert_eq!(ep2.clips()[0].duration_ms(), 700);
}

#[test]
fn test_dry_run_writes_nothing() {
    let base = tempfile::tempdir().unwrap();
    let config = Config::load(&fixture(base.path())).unwrap();

    let mut builder = PodcastBuilder::new(config);
    builder.perform(&PipelineOptions::default());

    assert_eq!(builder.podcasts().len(), 2);
    assert!(builder.outputs().is_empty());
    assert!(podcast(&builder, "ep1").background().is_some());
    assert!(!base.path().join("ep1").join("output - Ep1.wav").exists());
}

#[test]
fn test_unresolved_name_fails_only_its_podcast() {
    let base = tempfile::tempdir().unwrap();
    fixture(base.path());
    fs::create_dir_all(base.path().join("ep0")).unwrap();
    let config_path = write_config(
        base.path(),
        json!({
            "dirs": {
                "ep0": {"name": "Ep0", "schedule": ["nothing.*"]},
                "ep2": {"name": "Ep2", "schedule": ["take_*"]}
            },
            "output_format": {"sample_rate": SAMPLE_RATE, "channels": 1}
        }),
    );

    let mut builder = PodcastBuilder::new(Config::load(&config_path).unwrap());
    builder.perform(&PipelineOptions {
        build: true,
        just_one: false,
    });

    assert_eq!(builder.failures().len(), 1);
    assert_eq!(builder.failures()[0].dirname, "ep0");
    assert!(matches!(
        builder.failures()[0].error,
        PodcastError::Unresolved { .. }
    ));
    // No background configured: joined without one
    let ep2 = podcast(&builder, "ep2");
    assert_eq!(ep2.output().duration_ms(), 700);
    assert!(base.path().join("ep2").join("output - Ep2.wav").exists());
}

#[test]
fn test_invalid_clip_key_fails_podcast() {
    let base = tempfile::tempdir().unwrap();
    fixture(base.path());
    let config_path = write_config(
        base.path(),
        json!({
            "dirs": {"ep2": {"name": "Ep2", "schedule": ["take_*"],
                             "default": {"fade": 20}}}
        }),
    );

    let mut builder = PodcastBuilder::new(Config::load(&config_path).unwrap());
    builder.perform(&PipelineOptions::default());
    assert!(matches!(
        builder.failures()[0].error,
        PodcastError::InvalidClip { .. }
    ));
}
