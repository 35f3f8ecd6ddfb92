//! Baseball run-total and strikeout prediction
//!
//! Leakage-free rolling features per team and pitcher, joined into design
//! matrices for run and strikeout models, plus confidence tiering and
//! backtested hit rates for the predictions those models produce.

pub mod data;
pub mod features;
pub mod predict;
pub mod scoring;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Predicted runs for one team in one scheduled or historical game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRunPrediction {
    pub date: NaiveDate,
    pub team: String,
    pub opponent: String,
    pub starting_pitcher: String,
    pub opponent_pitcher: String,
    pub home: bool,
    pub predicted_runs: f64,
    /// Runs actually scored, unknown until the game is played
    pub actual_runs: Option<f64>,
    #[serde(default)]
    pub game_id: Option<String>,
}

/// Predicted strikeouts for one starting pitcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitcherKPrediction {
    pub date: NaiveDate,
    pub team: String,
    pub opponent: String,
    pub pitcher: String,
    pub predicted_ks: f64,
    pub actual_ks: Option<f64>,
}

/// Market-agnostic prediction row consumed by the scorer and reconciler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub date: NaiveDate,
    /// Team, pitcher or matchup the prediction is about
    pub subject: String,
    pub opponent: Option<String>,
    pub predicted: f64,
    pub actual: Option<f64>,
}

impl From<&TeamRunPrediction> for PredictionRecord {
    fn from(p: &TeamRunPrediction) -> Self {
        PredictionRecord {
            date: p.date,
            subject: p.team.clone(),
            opponent: Some(p.opponent.clone()),
            predicted: p.predicted_runs,
            actual: p.actual_runs,
        }
    }
}

impl From<&PitcherKPrediction> for PredictionRecord {
    fn from(p: &PitcherKPrediction) -> Self {
        PredictionRecord {
            date: p.date,
            subject: p.pitcher.clone(),
            opponent: Some(p.opponent.clone()),
            predicted: p.predicted_ks,
            actual: p.actual_ks,
        }
    }
}

/// Kind of line a prediction is scored against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Market {
    /// Combined runs of both teams
    GameTotal,
    /// Runs of a single team
    TeamTotal,
    /// Strikeouts of a starting pitcher
    Strikeouts,
    /// Run margin, alphabetical-first team minus second
    Spread,
}

impl Market {
    /// Labels for the above/below-line directions
    pub fn direction_labels(&self) -> (&'static str, &'static str) {
        match self {
            Market::Spread => ("Cover", "Miss"),
            _ => ("Over", "Under"),
        }
    }

    pub fn default_line(&self, scoring: &ScoringConfig) -> f64 {
        match self {
            Market::GameTotal => scoring.game_total_line,
            Market::TeamTotal => scoring.team_total_line,
            Market::Strikeouts => scoring.strikeout_line,
            Market::Spread => scoring.spread_line,
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::GameTotal => write!(f, "Game Total"),
            Market::TeamTotal => write!(f, "Team Total"),
            Market::Strikeouts => write!(f, "Strikeouts"),
            Market::Spread => write!(f, "Spread"),
        }
    }
}

impl std::str::FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "totals" | "game-total" | "total" => Ok(Market::GameTotal),
            "team-totals" | "team-total" | "team" => Ok(Market::TeamTotal),
            "strikeouts" | "ks" | "k" => Ok(Market::Strikeouts),
            "spreads" | "spread" => Ok(Market::Spread),
            _ => Err(format!(
                "Unknown market: {}. Use totals, team-totals, strikeouts, or spreads.",
                s
            )),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum MlbError {
    #[error("Source unavailable: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("No model at {0} - export a trained model first")]
    NoModel(String),
}

pub type Result<T> = std::result::Result<T, MlbError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub features: FeatureConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub pitching_log: String,
    pub team_batting_log: String,
    pub team_pitching_log: String,
    pub schedule: String,
    pub team_model_path: String,
    pub strikeout_model_path: String,
    pub team_dataset_path: String,
    pub strikeout_dataset_path: String,
    pub team_predictions_path: String,
    pub strikeout_predictions_path: String,
    pub backfilled_team_runs_path: String,
    pub backfilled_strikeouts_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Number of prior appearances in every rolling window
    pub window: usize,
    /// Minimum innings for an appearance to count as a start
    pub starter_min_innings: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Width of one confidence tier, in units of the scored value
    pub bucket_width: f64,
    pub max_tier: u8,
    pub game_total_line: f64,
    pub team_total_line: f64,
    pub strikeout_line: f64,
    pub spread_line: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                pitching_log: "data/Stathead_2025_Pitcher_Master.csv".to_string(),
                team_batting_log: "data/Stathead_2025_TeamBatting_Master.csv".to_string(),
                team_pitching_log: "data/Stathead_2025_TeamPitching_Master.csv".to_string(),
                schedule: "data/scheduled_games_and_starters_with_id.csv".to_string(),
                team_model_path: "models/team_runs_model.json".to_string(),
                strikeout_model_path: "models/pitcher_k_model.json".to_string(),
                team_dataset_path: "data/team_run_prediction_dataset.csv".to_string(),
                strikeout_dataset_path: "data/pitcher_k_dataset.csv".to_string(),
                team_predictions_path: "outputs/team_predictions.csv".to_string(),
                strikeout_predictions_path: "outputs/pitcher_k_predictions.csv".to_string(),
                backfilled_team_runs_path: "data/backfilled_predictions.csv".to_string(),
                backfilled_strikeouts_path: "data/backfilled_pitcher_ks.csv".to_string(),
            },
            features: FeatureConfig {
                window: 3,
                starter_min_innings: 3.5,
            },
            scoring: ScoringConfig {
                bucket_width: 0.5,
                max_tier: 5,
                game_total_line: 8.5,
                team_total_line: 4.5,
                strikeout_line: 6.0,
                spread_line: 1.5,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MlbError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| MlbError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MlbError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the feature and scoring code cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.features.window == 0 {
            return Err(MlbError::Config("features.window must be at least 1".into()));
        }
        if !(self.scoring.bucket_width > 0.0) {
            return Err(MlbError::Config(
                "scoring.bucket_width must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.features.window, 3);
        assert_eq!(parsed.scoring.max_tier, 5);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_window() {
        let mut config = Config::default();
        config.features.window = 0;
        assert!(matches!(config.validate(), Err(MlbError::Config(_))));
    }

    #[test]
    fn test_market_parsing_and_labels() {
        assert_eq!("totals".parse::<Market>().unwrap(), Market::GameTotal);
        assert_eq!("team_totals".parse::<Market>().unwrap(), Market::TeamTotal);
        assert_eq!("KS".parse::<Market>().unwrap(), Market::Strikeouts);
        assert!("moneyline".parse::<Market>().is_err());
        assert_eq!(Market::Spread.direction_labels(), ("Cover", "Miss"));
        assert_eq!(Market::Strikeouts.direction_labels(), ("Over", "Under"));
    }

    #[test]
    fn test_prediction_record_from_team_prediction() {
        let p = TeamRunPrediction {
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            team: "NYY".into(),
            opponent: "BOS".into(),
            starting_pitcher: "gerrit cole".into(),
            opponent_pitcher: "chris sale".into(),
            home: true,
            predicted_runs: 4.75,
            actual_runs: None,
            game_id: None,
        };
        let record = PredictionRecord::from(&p);
        assert_eq!(record.subject, "NYY");
        assert_eq!(record.opponent.as_deref(), Some("BOS"));
        assert_eq!(record.actual, None);
    }
}
