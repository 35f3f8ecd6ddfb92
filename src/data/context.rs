//! Loaded game logs shared by feature builders and predictors
//!
//! A context is loaded once and never mutated; a refresh produces a whole
//! new context from the same sources.

use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::sync::Arc;

use super::tables::{
    load_pitching_log, load_team_batting, load_team_pitching, PitchingAppearance,
    TeamBattingLine, TeamPitchingLine,
};
use crate::{DataConfig, Result};

/// The three historical logs every feature depends on
#[derive(Debug, Clone, Default)]
pub struct GameLogs {
    pub pitching: Vec<PitchingAppearance>,
    pub batting: Vec<TeamBattingLine>,
    pub team_pitching: Vec<TeamPitchingLine>,
}

/// Where the logs of a context were read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub pitching: PathBuf,
    pub batting: PathBuf,
    pub team_pitching: PathBuf,
}

impl From<&DataConfig> for SourcePaths {
    fn from(config: &DataConfig) -> Self {
        SourcePaths {
            pitching: PathBuf::from(&config.pitching_log),
            batting: PathBuf::from(&config.team_batting_log),
            team_pitching: PathBuf::from(&config.team_pitching_log),
        }
    }
}

/// Immutable snapshot of the game logs
#[derive(Debug, Clone)]
pub struct DataContext {
    sources: Option<SourcePaths>,
    logs: Arc<GameLogs>,
    loaded_at: DateTime<Local>,
}

impl DataContext {
    /// Load every log; any missing or unreadable source fails the whole load
    pub fn load(sources: SourcePaths) -> Result<Self> {
        let logs = GameLogs {
            pitching: load_pitching_log(&sources.pitching)?,
            batting: load_team_batting(&sources.batting)?,
            team_pitching: load_team_pitching(&sources.team_pitching)?,
        };
        log::info!(
            "Loaded {} pitching appearances, {} batting lines, {} team pitching lines",
            logs.pitching.len(),
            logs.batting.len(),
            logs.team_pitching.len()
        );
        Ok(DataContext {
            sources: Some(sources),
            logs: Arc::new(logs),
            loaded_at: Local::now(),
        })
    }

    /// Wrap logs that are already in memory (for testing)
    pub fn from_logs(logs: GameLogs) -> Self {
        DataContext {
            sources: None,
            logs: Arc::new(logs),
            loaded_at: Local::now(),
        }
    }

    /// Reload from the original sources, leaving this context untouched
    pub fn refresh(&self) -> Result<Self> {
        match &self.sources {
            Some(sources) => Self::load(sources.clone()),
            None => Ok(self.clone()),
        }
    }

    pub fn logs(&self) -> &GameLogs {
        &self.logs
    }

    pub fn pitching(&self) -> &[PitchingAppearance] {
        &self.logs.pitching
    }

    pub fn batting(&self) -> &[TeamBattingLine] {
        &self.logs.batting
    }

    pub fn team_pitching(&self) -> &[TeamPitchingLine] {
        &self.logs.team_pitching
    }

    pub fn sources(&self) -> Option<&SourcePaths> {
        self.sources.as_ref()
    }

    pub fn loaded_at(&self) -> DateTime<Local> {
        self.loaded_at
    }
}
