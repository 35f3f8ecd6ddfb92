//! Feature extraction
//!
//! Converts raw game logs into leakage-free rolling features and design
//! matrices.

pub mod matrix;
pub mod pitching;
pub mod rolling;
pub mod starters;
pub mod team;

pub use matrix::{
    BuildReport, FeatureMatrixBuilder, PitcherStartRow, TeamGameRow, STRIKEOUT_FEATURES,
    TEAM_FEATURES,
};
pub use pitching::{PitcherForm, PitcherRolling, StrikeoutForm};
pub use rolling::{Aggregation, Observation, RollingAggregator, RollingWindow};
pub use starters::StarterFilter;
pub use team::{BattingForm, StaffForm, TeamRolling};
