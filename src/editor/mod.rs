pub mod actions;
pub mod cleaning;

pub use actions::{build_podcast, PipelineOptions, PodcastBuilder, PodcastFailure};
pub use cleaning::{clean_clip, CleaningCuts, NEGLIGIBLE_CUT_MS};
