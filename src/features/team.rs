//! Rolling team batting and pitching-staff form

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use super::rolling::{rate, Aggregation, Observation, RollingAggregator};
use crate::data::{EntityKey, TeamBattingLine, TeamPitchingLine};
use crate::Result;

/// Mean offense over a team's last games
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattingForm {
    pub runs: f64,
    pub obp: f64,
}

/// Mean run prevention of a team's staff over its last games
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaffForm {
    pub earned_runs: f64,
    pub whip: f64,
}

impl BattingForm {
    fn from_means(means: &[f64]) -> Option<Self> {
        let [runs, obp] = <[f64; 2]>::try_from(means).ok()?;
        Some(BattingForm { runs, obp })
    }
}

impl StaffForm {
    fn from_means(means: &[f64]) -> Option<Self> {
        let [earned_runs, whip] = <[f64; 2]>::try_from(means).ok()?;
        Some(StaffForm { earned_runs, whip })
    }
}

fn batting_observations(rows: &[TeamBattingLine]) -> Vec<Observation<EntityKey>> {
    rows.iter()
        .map(|r| Observation::new(r.team.clone(), r.date, vec![r.runs, r.obp]))
        .collect()
}

/// Per-game WHIP is averaged, so a game with no recorded innings leaves its
/// windows undefined.
fn staff_observations(rows: &[TeamPitchingLine]) -> Vec<Observation<EntityKey>> {
    rows.iter()
        .map(|r| {
            let whip = match (r.hits, r.walks, r.innings) {
                (Some(h), Some(bb), Some(ip)) => rate(h + bb, ip),
                _ => None,
            };
            Observation::new(r.team.clone(), r.date, vec![r.earned_runs, whip])
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct TeamRolling {
    means: RollingAggregator,
}

impl TeamRolling {
    pub fn new(window: usize) -> Result<Self> {
        Ok(TeamRolling {
            means: RollingAggregator::new(window, Aggregation::Mean)?,
        })
    }

    pub fn batting_index(&self, rows: &[TeamBattingLine]) -> HashMap<(EntityKey, NaiveDate), BattingForm> {
        self.means
            .index(&batting_observations(rows))
            .into_iter()
            .filter_map(|(key, means)| Some((key, BattingForm::from_means(&means)?)))
            .collect()
    }

    pub fn batting_before(&self, rows: &[TeamBattingLine], date: NaiveDate) -> BTreeMap<EntityKey, BattingForm> {
        self.means
            .latest_before(&batting_observations(rows), date)
            .into_iter()
            .filter_map(|(key, means)| Some((key, BattingForm::from_means(&means)?)))
            .collect()
    }

    pub fn staff_index(&self, rows: &[TeamPitchingLine]) -> HashMap<(EntityKey, NaiveDate), StaffForm> {
        self.means
            .index(&staff_observations(rows))
            .into_iter()
            .filter_map(|(key, means)| Some((key, StaffForm::from_means(&means)?)))
            .collect()
    }

    pub fn staff_before(&self, rows: &[TeamPitchingLine], date: NaiveDate) -> BTreeMap<EntityKey, StaffForm> {
        self.means
            .latest_before(&staff_observations(rows), date)
            .into_iter()
            .filter_map(|(key, means)| Some((key, StaffForm::from_means(&means)?)))
            .collect()
    }
}
