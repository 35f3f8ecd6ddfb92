//! Data ingestion
//!
//! Cell parsing, CSV tables, and the immutable context holding loaded logs.

pub mod context;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod parse;
pub mod tables;

pub use context::{DataContext, GameLogs, SourcePaths};
pub use parse::{normalize_name, parse_innings, EntityKey};
pub use tables::{PitchingAppearance, ScheduledGame, TeamBattingLine, TeamPitchingLine};
