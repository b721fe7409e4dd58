use std::path::PathBuf;

use crate::config::{Config, DirConfig};
use crate::error::{PodcastError, Result};
use crate::timeline::Podcast;

/// What a run should do with each podcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Join and export the program. Without it the run stops after the
    /// background is built.
    pub build: bool,
    /// Stop after the first directory
    pub just_one: bool,
}

/// A podcast that could not be completed
#[derive(Debug)]
pub struct PodcastFailure {
    pub dirname: String,
    pub error: PodcastError,
}

/// Runs every step for one configured directory
pub fn build_podcast(
    dirname: &str,
    dir_config: DirConfig,
    config: &Config,
    options: &PipelineOptions,
) -> Result<Podcast> {
    let mut podcast = Podcast::new(dirname, dir_config, config);
    podcast
        .resolve_filenames(config)?
        .read_files()
        .clean(config.silence_around_voice_ms())?;
    podcast.build_background(config)?;

    if options.build {
        podcast.join(true)?;
        let path = podcast.save()?;
        log::info!("Podcast \"{}\" saved to {:?}", podcast.name(), path);
    } else {
        log::warn!(
            "Dry run for \"{}\": pass --build to join and export it",
            podcast.name()
        );
    }
    Ok(podcast)
}

/// Processes every configured directory and keeps what came out of the run
#[derive(Debug)]
pub struct PodcastBuilder {
    config: Config,
    podcasts: Vec<Podcast>,
    failures: Vec<PodcastFailure>,
}

impl PodcastBuilder {
    pub fn new(config: Config) -> Self {
        PodcastBuilder {
            config,
            podcasts: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Podcasts completed by the last run
    pub fn podcasts(&self) -> &[Podcast] {
        &self.podcasts
    }

    pub fn failures(&self) -> &[PodcastFailure] {
        &self.failures
    }

    /// Builds podcasts in directory order. A failing podcast is logged and
    /// recorded; the run carries on with the next one.
    pub fn perform(&mut self, options: &PipelineOptions) -> &mut Self {
        self.podcasts.clear();
        self.failures.clear();

        if self.config.dirs.is_empty() {
            log::warn!("No podcast directories configured");
        }

        for (dirname, dir_config) in &self.config.dirs {
            match build_podcast(dirname, dir_config.clone(), &self.config, options) {
                Ok(podcast) => self.podcasts.push(podcast),
                Err(error) => {
                    log::error!("Podcast in \"{}\" failed: {}", dirname, error);
                    self.failures.push(PodcastFailure {
                        dirname: dirname.clone(),
                        error,
                    });
                }
            }
            if options.just_one {
                log::info!("Stopping after the first podcast");
                break;
            }
        }

        log::info!(
            "Run finished: {} completed, {} failed",
            self.podcasts.len(),
            self.failures.len()
        );
        self
    }

    /// Output files written by the last run
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.podcasts
            .iter()
            .filter(|podcast| !podcast.output().is_empty())
            .map(Podcast::output_path)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(name: &str, schedule: &[&str]) -> DirConfig {
        DirConfig {
            name: name.to_string(),
            schedule: schedule.iter().map(|s| s.to_string()).collect(),
            ..DirConfig::default()
        }
    }

    #[test]
    fn test_unresolved_token_fails_only_that_podcast() {
        let base = tempfile::tempdir().unwrap();
        std::fs::create_dir(base.path().join("a")).unwrap();
        std::fs::create_dir(base.path().join("b")).unwrap();

        let mut config = Config::parse("{}", base.path()).unwrap();
        config.dirs.insert("a".to_string(), dir("A", &["missing.*"]));
        config.dirs.insert("b".to_string(), dir("B", &[]));

        let mut builder = PodcastBuilder::new(config);
        builder.perform(&PipelineOptions::default());

        assert_eq!(builder.failures().len(), 1);
        assert_eq!(builder.failures()[0].dirname, "a");
        assert!(matches!(
            builder.failures()[0].error,
            PodcastError::Unresolved { .. }
        ));
        assert_eq!(builder.podcasts().len(), 1);
        assert_eq!(builder.podcasts()[0].name(), "B");
        assert!(builder.outputs().is_empty());
    }

    #[test]
    fn test_just_one_stops_after_first_directory() {
        let base = tempfile::tempdir().unwrap();
        let mut config = Config::parse("{}", base.path()).unwrap();
        config.dirs.insert("a".to_string(), dir("A", &[]));
        config.dirs.insert("b".to_string(), dir("B", &[]));

        let mut builder = PodcastBuilder::new(config);
        builder.perform(&PipelineOptions {
            build: false,
            just_one: true,
        });
        assert_eq!(builder.podcasts().len(), 1);
        assert_eq!(builder.podcasts()[0].dirname, "a");
    }
}
