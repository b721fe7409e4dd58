//! Podcast builder command line

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use podcast_builder_lib::analysis::LoudnessProfile;
use podcast_builder_lib::editor::{CleaningCuts, PipelineOptions, PodcastBuilder};
use podcast_builder_lib::media::decode_file;
use podcast_builder_lib::{logging, Config};

#[derive(Parser)]
#[command(name = "podcast-builder")]
#[command(about = "Assembles podcast episodes from recorded clips and a background bed")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the JSON config
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Join and export every podcast instead of a dry run
    #[arg(short, long)]
    build: bool,

    /// Stop after the first podcast directory
    #[arg(long)]
    just_one: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the loudness profile of a file and where cleaning would cut it
    Inspect {
        file: PathBuf,

        /// Loudness chunk size
        #[arg(long, default_value_t = 10)]
        chunk_ms: u64,

        /// Fade-in the clip would get after cleaning
        #[arg(long, default_value_t = 1)]
        fade_in_ms: u64,

        /// Fade applied before looking for silence
        #[arg(long, default_value_t = 500)]
        before_cleaning_fade_ms: u64,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct Inspection {
    file: PathBuf,
    sample_rate: u32,
    channels: u16,
    cuts: CleaningCuts,
    profile: LoudnessProfile,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.debug);

    match cli.command {
        Some(Commands::Inspect {
            file,
            chunk_ms,
            fade_in_ms,
            before_cleaning_fade_ms,
            json,
        }) => inspect(file, chunk_ms, fade_in_ms, before_cleaning_fade_ms, json),
        None => run(&cli.config, cli.build, cli.just_one),
    }
}

fn run(config_path: &Path, build: bool, just_one: bool) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to read config {:?}", config_path))?;

    let mut builder = PodcastBuilder::new(config);
    builder.perform(&PipelineOptions { build, just_one });

    for path in builder.outputs() {
        println!("{}", path.display());
    }
    if !builder.failures().is_empty() {
        for failure in builder.failures() {
            eprintln!("{}: {}", failure.dirname, failure.error);
        }
        bail!("{} podcast(s) failed", builder.failures().len());
    }
    Ok(())
}

fn inspect(
    file: PathBuf,
    chunk_ms: u64,
    fade_in_ms: u64,
    before_cleaning_fade_ms: u64,
    json: bool,
) -> Result<()> {
    let buffer = decode_file(&file).with_context(|| format!("Failed to decode {:?}", file))?;
    let faded = buffer
        .clone()
        .fade_in(before_cleaning_fade_ms)
        .fade_out(before_cleaning_fade_ms);

    let format = buffer.format();
    let inspection = Inspection {
        file,
        sample_rate: format.sample_rate,
        channels: format.channels,
        cuts: CleaningCuts::detect(&faded, fade_in_ms),
        profile: LoudnessProfile::measure(&buffer, chunk_ms, None),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
        return Ok(());
    }

    println!(
        "{}: {} ms, {} Hz, {} channel(s)",
        inspection.file.display(),
        inspection.profile.duration_ms,
        inspection.sample_rate,
        inspection.channels
    );
    println!(
        "keep {}..{} ms, microphone error {} ms",
        inspection.cuts.head_ms, inspection.cuts.tail_ms, inspection.cuts.microphone_error_ms
    );
    for (index, level) in inspection.profile.levels.iter().enumerate() {
        println!("{:>8} ms {:>8.1} dBFS", inspection.profile.offset_of(index), level);
    }
    Ok(())
}
