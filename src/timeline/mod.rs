pub mod background;
pub mod clip;
pub mod podcast;

pub use background::{build_background, collapse_schedule, ScheduleEntry};
pub use clip::{Clip, ClipSettings};
pub use podcast::Podcast;
