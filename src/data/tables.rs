//! CSV tables consumed and produced by the pipeline
//!
//! Loading is all-or-nothing: a file that cannot be opened or read to the end
//! is reported as [`MlbError::SourceUnavailable`], never as a partial table.
//! Individual rows without a usable date are skipped and counted.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use super::parse::{extract_date, is_away_marker, parse_innings_cell, EntityKey};
use crate::{MlbError, Result};

/// One pitcher's line in one game
#[derive(Debug, Clone, PartialEq)]
pub struct PitchingAppearance {
    pub player: String,
    pub team_name: String,
    pub opponent_name: String,
    pub pitcher: EntityKey,
    pub team: EntityKey,
    pub opponent: EntityKey,
    pub date: NaiveDate,
    pub home: bool,
    /// Innings as a true fraction; `None` when missing or malformed
    pub innings: Option<f64>,
    pub earned_runs: Option<f64>,
    pub hits: Option<f64>,
    pub walks: Option<f64>,
    pub batters_faced: Option<f64>,
    pub strikeouts: Option<f64>,
}

/// A team's batting line in one game
#[derive(Debug, Clone, PartialEq)]
pub struct TeamBattingLine {
    pub team_name: String,
    pub opponent_name: String,
    pub team: EntityKey,
    pub opponent: EntityKey,
    pub date: NaiveDate,
    pub runs: Option<f64>,
    pub obp: Option<f64>,
}

/// A team's pitching staff line in one game
#[derive(Debug, Clone, PartialEq)]
pub struct TeamPitchingLine {
    pub team: EntityKey,
    pub date: NaiveDate,
    pub earned_runs: Option<f64>,
    pub hits: Option<f64>,
    pub walks: Option<f64>,
    pub innings: Option<f64>,
}

/// A game on the upcoming schedule with its probable starters
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledGame {
    pub game_id: Option<String>,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_pitcher: String,
    pub away_pitcher: String,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawPitchingRow {
    Player: String,
    #[serde(default)]
    Team: String,
    #[serde(default)]
    Opp: String,
    Date: String,
    #[serde(rename = "Unnamed: 5", alias = "HomeAway", default)]
    venue: Option<String>,
    #[serde(default)]
    IP: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    ER: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    H: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    BB: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    BF: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    SO: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawTeamBattingRow {
    Team: String,
    #[serde(default)]
    Opp: String,
    Date: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    R: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    OBP: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawTeamPitchingRow {
    Team: String,
    Date: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    ER: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    H: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    BB: Option<f64>,
    #[serde(default)]
    IP: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawScheduleRow {
    #[serde(default)]
    game_id: Option<String>,
    date: String,
    home_team: String,
    away_team: String,
    #[serde(default)]
    home_pitcher: String,
    #[serde(default)]
    away_pitcher: String,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Deserialize every row, converting with `convert`; rows it rejects are counted
fn read_rows<R, Raw, T>(reader: R, table: &str, convert: impl Fn(Raw) -> Option<T>) -> Result<Vec<T>>
where
    R: Read,
    Raw: DeserializeOwned,
{
    let mut rdr = csv_reader(reader);
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for raw in rdr.deserialize::<Raw>() {
        match convert(raw?) {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        log::warn!("{}: skipped {} rows without a usable date", table, skipped);
    }
    log::debug!("{}: read {} rows", table, rows.len());
    Ok(rows)
}

/// Run a loader against a file, mapping any failure to `SourceUnavailable`
fn load_from<T>(path: &Path, load: impl FnOnce(File) -> Result<T>) -> Result<T> {
    let unavailable = |reason: String| MlbError::SourceUnavailable {
        path: path.display().to_string(),
        reason,
    };
    let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
    load(file).map_err(|e| match e {
        MlbError::SourceUnavailable { .. } => e,
        other => unavailable(other.to_string()),
    })
}

pub fn read_pitching_log<R: Read>(reader: R) -> Result<Vec<PitchingAppearance>> {
    read_rows(reader, "pitching log", |raw: RawPitchingRow| {
        Some(PitchingAppearance {
            pitcher: EntityKey::new(&raw.Player),
            team: EntityKey::new(&raw.Team),
            opponent: EntityKey::new(&raw.Opp),
            date: extract_date(&raw.Date)?,
            home: !is_away_marker(raw.venue.as_deref()),
            innings: parse_innings_cell(raw.IP.as_deref()),
            earned_runs: raw.ER,
            hits: raw.H,
            walks: raw.BB,
            batters_faced: raw.BF,
            strikeouts: raw.SO,
            player: raw.Player,
            team_name: raw.Team,
            opponent_name: raw.Opp,
        })
    })
}

pub fn load_pitching_log(path: impl AsRef<Path>) -> Result<Vec<PitchingAppearance>> {
    load_from(path.as_ref(), read_pitching_log)
}

pub fn read_team_batting<R: Read>(reader: R) -> Result<Vec<TeamBattingLine>> {
    read_rows(reader, "team batting log", |raw: RawTeamBattingRow| {
        Some(TeamBattingLine {
            team: EntityKey::new(&raw.Team),
            opponent: EntityKey::new(&raw.Opp),
            date: extract_date(&raw.Date)?,
            runs: raw.R,
            obp: raw.OBP,
            team_name: raw.Team,
            opponent_name: raw.Opp,
        })
    })
}

pub fn load_team_batting(path: impl AsRef<Path>) -> Result<Vec<TeamBattingLine>> {
    load_from(path.as_ref(), read_team_batting)
}

pub fn read_team_pitching<R: Read>(reader: R) -> Result<Vec<TeamPitchingLine>> {
    read_rows(reader, "team pitching log", |raw: RawTeamPitchingRow| {
        Some(TeamPitchingLine {
            team: EntityKey::new(&raw.Team),
            date: extract_date(&raw.Date)?,
            earned_runs: raw.ER,
            hits: raw.H,
            walks: raw.BB,
            innings: parse_innings_cell(raw.IP.as_deref()),
        })
    })
}

pub fn load_team_pitching(path: impl AsRef<Path>) -> Result<Vec<TeamPitchingLine>> {
    load_from(path.as_ref(), read_team_pitching)
}

pub fn read_schedule<R: Read>(reader: R) -> Result<Vec<ScheduledGame>> {
    read_rows(reader, "schedule", |raw: RawScheduleRow| {
        Some(ScheduledGame {
            game_id: raw.game_id.filter(|id| !id.is_empty()),
            date: extract_date(&raw.date)?,
            home_team: raw.home_team,
            away_team: raw.away_team,
            home_pitcher: raw.home_pitcher,
            away_pitcher: raw.away_pitcher,
        })
    })
}

pub fn load_schedule(path: impl AsRef<Path>) -> Result<Vec<ScheduledGame>> {
    load_from(path.as_ref(), read_schedule)
}

/// Read rows written by [`write_records`]
pub fn read_records<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut rdr = csv_reader(reader);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn load_records<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    load_from(path.as_ref(), read_records)
}

pub fn write_records<T: Serialize, W: Write>(writer: W, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write rows to a CSV file, creating its directory if needed
pub fn save_records<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_records(File::create(path)?, rows)
}
