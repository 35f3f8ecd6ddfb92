//! Design matrices for the run and strikeout models
//!
//! A team-game row joins, in order: the team's own batting form, the
//! opponent staff's form, the team's starter and their form, and the
//! opposing starter and their form. Every join is keyed by [`EntityKey`].
//! A row with any feature undefined is dropped, never imputed; the
//! [`BuildReport`] counts why.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use super::pitching::{PitcherForm, PitcherRolling, StrikeoutForm};
use super::starters::StarterFilter;
use super::team::{BattingForm, StaffForm, TeamRolling};
use crate::data::{EntityKey, GameLogs, PitchingAppearance, ScheduledGame};
use crate::{FeatureConfig, Result};

/// Column names of the run model's feature vector, in order
pub const TEAM_FEATURES: [&str; 11] = [
    "Runs_avg3",
    "OBP_avg3",
    "Team_ER_avg3",
    "Team_WHIP_avg3",
    "SP_ERA_3g",
    "SP_WHIP_3g",
    "SP_IP_3g",
    "Opp_SP_ERA_3g",
    "Opp_SP_WHIP_3g",
    "Opp_SP_IP_3g",
    "Home",
];

/// Column names of the strikeout model's feature vector, in order
pub const STRIKEOUT_FEATURES: [&str; 6] =
    ["K_last3", "IP_last3", "ER_last3", "BB_last3", "BF_last3", "Home"];

/// One team's side of one game, with every feature defined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGameRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// Schedule identifier; separates the games of a doubleheader
    #[serde(rename = "Game_ID", default)]
    pub game_id: Option<String>,
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "Opp")]
    pub opponent: String,
    #[serde(rename = "Starting_Pitcher")]
    pub starting_pitcher: String,
    #[serde(rename = "Opp_SP_Name")]
    pub opponent_pitcher: String,
    #[serde(rename = "Runs_avg3")]
    pub runs_avg: f64,
    #[serde(rename = "OBP_avg3")]
    pub obp_avg: f64,
    #[serde(rename = "Team_ER_avg3")]
    pub opp_staff_er_avg: f64,
    #[serde(rename = "Team_WHIP_avg3")]
    pub opp_staff_whip_avg: f64,
    #[serde(rename = "SP_ERA_3g")]
    pub sp_era: f64,
    #[serde(rename = "SP_WHIP_3g")]
    pub sp_whip: f64,
    #[serde(rename = "SP_IP_3g")]
    pub sp_innings: f64,
    #[serde(rename = "Opp_SP_ERA_3g")]
    pub opp_sp_era: f64,
    #[serde(rename = "Opp_SP_WHIP_3g")]
    pub opp_sp_whip: f64,
    #[serde(rename = "Opp_SP_IP_3g")]
    pub opp_sp_innings: f64,
    #[serde(rename = "Home")]
    pub home: u8,
    /// Runs scored; `None` for games not yet played
    #[serde(rename = "Target_Runs")]
    pub target_runs: Option<f64>,
}

impl TeamGameRow {
    /// Feature vector in [`TEAM_FEATURES`] order
    pub fn features(&self) -> Vec<f64> {
        vec![
            self.runs_avg,
            self.obp_avg,
            self.opp_staff_er_avg,
            self.opp_staff_whip_avg,
            self.sp_era,
            self.sp_whip,
            self.sp_innings,
            self.opp_sp_era,
            self.opp_sp_whip,
            self.opp_sp_innings,
            f64::from(self.home),
        ]
    }
}

/// One start by one pitcher, with every strikeout feature defined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitcherStartRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "Opponent")]
    pub opponent: String,
    #[serde(rename = "Pitcher")]
    pub pitcher: String,
    #[serde(rename = "K_last3")]
    pub k_avg: f64,
    #[serde(rename = "IP_last3")]
    pub ip_avg: f64,
    #[serde(rename = "ER_last3")]
    pub er_avg: f64,
    #[serde(rename = "BB_last3")]
    pub bb_avg: f64,
    #[serde(rename = "BF_last3")]
    pub bf_avg: f64,
    #[serde(rename = "Home")]
    pub home: u8,
    #[serde(rename = "Target_Ks")]
    pub target_ks: Option<f64>,
}

impl PitcherStartRow {
    /// Feature vector in [`STRIKEOUT_FEATURES`] order
    pub fn features(&self) -> Vec<f64> {
        vec![
            self.k_avg,
            self.ip_avg,
            self.er_avg,
            self.bb_avg,
            self.bf_avg,
            f64::from(self.home),
        ]
    }
}

/// Why candidate rows were dropped while building a matrix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub candidates: usize,
    pub kept: usize,
    pub duplicates: usize,
    pub missing_batting: usize,
    pub missing_opponent_staff: usize,
    pub missing_starter: usize,
    pub missing_starter_history: usize,
    pub missing_opposing_starter: usize,
    pub missing_opposing_starter_history: usize,
    pub missing_target: usize,
}

impl BuildReport {
    pub fn dropped(&self) -> usize {
        self.candidates - self.kept
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "kept {}/{} (duplicates: {}, batting: {}, opp staff: {}, starter: {}, starter history: {}, \
             opp starter: {}, opp starter history: {}, target: {})",
            self.kept,
            self.candidates,
            self.duplicates,
            self.missing_batting,
            self.missing_opponent_staff,
            self.missing_starter,
            self.missing_starter_history,
            self.missing_opposing_starter,
            self.missing_opposing_starter_history,
            self.missing_target
        )
    }
}

/// Joined inputs for one team's side of one game
struct Side<'a> {
    date: NaiveDate,
    game_id: Option<&'a str>,
    team: &'a str,
    opponent: &'a str,
    home: bool,
    batting: Option<BattingForm>,
    staff: Option<StaffForm>,
    /// Starter name and their form entering the game
    starter: Option<(&'a str, Option<PitcherForm>)>,
    opposing_starter: Option<(&'a str, Option<PitcherForm>)>,
}

impl Side<'_> {
    /// The finished row, or `None` with the first missing join counted in
    /// `report`
    fn into_row(self, target_runs: Option<f64>, report: &mut BuildReport) -> Option<TeamGameRow> {
        let Some(batting) = self.batting else {
            report.missing_batting += 1;
            return None;
        };
        let Some(staff) = self.staff else {
            report.missing_opponent_staff += 1;
            return None;
        };
        let Some((pitcher, form)) = self.starter else {
            report.missing_starter += 1;
            return None;
        };
        let Some(own) = form else {
            report.missing_starter_history += 1;
            return None;
        };
        let Some((opposing, form)) = self.opposing_starter else {
            report.missing_opposing_starter += 1;
            return None;
        };
        let Some(opp) = form else {
            report.missing_opposing_starter_history += 1;
            return None;
        };

        Some(TeamGameRow {
            date: self.date,
            game_id: self.game_id.map(str::to_string),
            team: self.team.to_string(),
            opponent: self.opponent.to_string(),
            starting_pitcher: pitcher.to_string(),
            opponent_pitcher: opposing.to_string(),
            runs_avg: batting.runs,
            obp_avg: batting.obp,
            opp_staff_er_avg: staff.earned_runs,
            opp_staff_whip_avg: staff.whip,
            sp_era: own.era,
            sp_whip: own.whip,
            sp_innings: own.innings,
            opp_sp_era: opp.era,
            opp_sp_whip: opp.whip,
            opp_sp_innings: opp.innings,
            home: u8::from(self.home),
            target_runs,
        })
    }
}

/// Rolling form of every entity as of one date, for scheduled games
struct Snapshot {
    batting: BTreeMap<EntityKey, BattingForm>,
    staff: BTreeMap<EntityKey, StaffForm>,
    pitchers: BTreeMap<EntityKey, PitcherForm>,
    strikeouts: BTreeMap<EntityKey, StrikeoutForm>,
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureMatrixBuilder {
    starters: StarterFilter,
    team: TeamRolling,
    pitchers: PitcherRolling,
}

impl FeatureMatrixBuilder {
    pub fn new(config: &FeatureConfig) -> Result<Self> {
        Ok(FeatureMatrixBuilder {
            starters: StarterFilter::new(config.starter_min_innings),
            team: TeamRolling::new(config.window)?,
            pitchers: PitcherRolling::new(config.window)?,
        })
    }

    pub fn window(&self) -> usize {
        self.pitchers.window()
    }

    pub fn starter_filter(&self) -> &StarterFilter {
        &self.starters
    }

    /// Historical team-game rows with realized runs as the target
    pub fn build_team_rows<'a>(&self, logs: &'a GameLogs) -> (Vec<TeamGameRow>, BuildReport) {
        let batting = self.team.batting_index(&logs.batting);
        let staff = self.team.staff_index(&logs.team_pitching);
        let starters = self.starters.by_team_date(&logs.pitching);
        let forms = self.pitchers.form_index(&logs.pitching);

        let mut report = BuildReport::default();
        let mut seen = HashSet::new();
        let mut rows = Vec::new();

        for line in &logs.batting {
            report.candidates += 1;
            if !seen.insert((&line.team, line.date)) {
                report.duplicates += 1;
                continue;
            }

            let own = starters.get(&(line.team.clone(), line.date)).copied();
            let opp = starters.get(&(line.opponent.clone(), line.date)).copied();
            let with_form = |p: &'a PitchingAppearance| {
                (p.player.as_str(), forms.get(&(p.pitcher.clone(), line.date)).copied())
            };
            let side = Side {
                date: line.date,
                game_id: None,
                team: &line.team_name,
                opponent: &line.opponent_name,
                home: own.map_or(false, |p| p.home),
                batting: batting.get(&(line.team.clone(), line.date)).copied(),
                staff: staff.get(&(line.opponent.clone(), line.date)).copied(),
                starter: own.map(with_form),
                opposing_starter: opp.map(with_form),
            };
            // A complete row still needs its target
            let target = line.runs;
            let Some(row) = side.into_row(target, &mut report) else {
                continue;
            };
            if target.is_none() {
                report.missing_target += 1;
                continue;
            }
            rows.push(row);
            report.kept += 1;
        }

        log::info!("Team run matrix: {}", report);
        (rows, report)
    }

    fn snapshot(&self, logs: &GameLogs, date: NaiveDate) -> Snapshot {
        Snapshot {
            batting: self.team.batting_before(&logs.batting, date),
            staff: self.team.staff_before(&logs.team_pitching, date),
            pitchers: self.pitchers.form_before(&logs.pitching, date),
            strikeouts: self.pitchers.strikeout_form_before(&logs.pitching, date),
        }
    }

    fn snapshots(&self, logs: &GameLogs, games: &[ScheduledGame]) -> HashMap<NaiveDate, Snapshot> {
        let mut snapshots = HashMap::new();
        for game in games {
            snapshots
                .entry(game.date)
                .or_insert_with(|| self.snapshot(logs, game.date));
        }
        snapshots
    }

    /// Inference rows for both sides of each scheduled game, using only
    /// history dated before the game.
    pub fn team_rows_for_schedule<'a>(
        &self,
        logs: &GameLogs,
        games: &'a [ScheduledGame],
    ) -> (Vec<TeamGameRow>, BuildReport) {
        let snapshots = self.snapshots(logs, games);
        let mut report = BuildReport::default();
        let mut rows = Vec::new();

        for game in games {
            let Some(snap) = snapshots.get(&game.date) else {
                continue;
            };
            let sides = [
                (&game.home_team, &game.away_team, &game.home_pitcher, &game.away_pitcher, true),
                (&game.away_team, &game.home_team, &game.away_pitcher, &game.home_pitcher, false),
            ];
            for (team, opponent, pitcher, opposing, home) in sides {
                report.candidates += 1;
                let with_form = |name: &'a String| {
                    Some(name.as_str())
                        .filter(|n| !n.trim().is_empty())
                        .map(|n| (n, snap.pitchers.get(&EntityKey::new(n)).copied()))
                };
                let side = Side {
                    date: game.date,
                    game_id: game.game_id.as_deref(),
                    team,
                    opponent,
                    home,
                    batting: snap.batting.get(&EntityKey::new(team)).copied(),
                    staff: snap.staff.get(&EntityKey::new(opponent)).copied(),
                    starter: with_form(pitcher),
                    opposing_starter: with_form(opposing),
                };
                match side.into_row(None, &mut report) {
                    Some(row) => {
                        rows.push(row);
                        report.kept += 1;
                    }
                    None => log::info!(
                        "Skipping {} vs {} on {}: incomplete history",
                        team,
                        opponent,
                        game.date
                    ),
                }
            }
        }

        log::info!("Scheduled team rows: {}", report);
        (rows, report)
    }

    /// Historical starts with strikeout form entering each start.
    /// A start is any appearance long enough to qualify; rows repeat for a
    /// (date, pitcher) only once.
    pub fn build_strikeout_rows(&self, logs: &GameLogs) -> (Vec<PitcherStartRow>, BuildReport) {
        let forms = self.pitchers.strikeout_form(&logs.pitching);
        let mut report = BuildReport::default();
        let mut seen = HashSet::new();
        let mut rows = Vec::new();

        for (row, form) in logs.pitching.iter().zip(forms) {
            if !self.starters.is_start_length(row) {
                continue;
            }
            report.candidates += 1;
            if !seen.insert((row.date, &row.pitcher)) {
                report.duplicates += 1;
                continue;
            }
            let Some(form) = form else {
                report.missing_starter_history += 1;
                continue;
            };
            let Some(strikeouts) = row.strikeouts else {
                report.missing_target += 1;
                continue;
            };
            rows.push(start_row(
                row.date,
                &row.team_name,
                &row.opponent_name,
                &row.player,
                row.home,
                form,
                Some(strikeouts),
            ));
            report.kept += 1;
        }

        log::info!("Strikeout matrix: {}", report);
        (rows, report)
    }

    /// Inference rows for both probable starters of each scheduled game
    pub fn strikeout_rows_for_schedule(
        &self,
        logs: &GameLogs,
        games: &[ScheduledGame],
    ) -> (Vec<PitcherStartRow>, BuildReport) {
        let snapshots = self.snapshots(logs, games);
        let mut report = BuildReport::default();
        let mut rows = Vec::new();

        for game in games {
            let Some(snap) = snapshots.get(&game.date) else {
                continue;
            };
            let sides = [
                (&game.away_pitcher, &game.away_team, &game.home_team, false),
                (&game.home_pitcher, &game.home_team, &game.away_team, true),
            ];
            for (pitcher, team, opponent, home) in sides {
                report.candidates += 1;
                if pitcher.trim().is_empty() {
                    report.missing_starter += 1;
                    continue;
                }
                let Some(form) = snap.strikeouts.get(&EntityKey::new(pitcher)).copied() else {
                    log::info!(
                        "Skipping {}: fewer than {} appearances before {}",
                        pitcher,
                        self.window(),
                        game.date
                    );
                    report.missing_starter_history += 1;
                    continue;
                };
                rows.push(start_row(game.date, team, opponent, pitcher, home, form, None));
                report.kept += 1;
            }
        }

        log::info!("Scheduled strikeout rows: {}", report);
        (rows, report)
    }
}

fn start_row(
    date: NaiveDate,
    team: &str,
    opponent: &str,
    pitcher: &str,
    home: bool,
    form: StrikeoutForm,
    target_ks: Option<f64>,
) -> PitcherStartRow {
    PitcherStartRow {
        date,
        team: team.to_string(),
        opponent: opponent.to_string(),
        pitcher: pitcher.to_string(),
        k_avg: form.strikeouts,
        ip_avg: form.innings,
        er_avg: form.earned_runs,
        bb_avg: form.walks,
        bf_avg: form.batters_faced,
        home: u8::from(home),
        target_ks,
    }
}
