//! Type-safe wrappers for college basketball identifiers and seasons.

pub mod ids;
pub mod time;

pub use ids::{AthleteId, ConferenceId, SourceId, TeamId};
pub use time::{Season, SeasonRange};
