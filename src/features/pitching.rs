//! Rolling pitcher form
//!
//! Rate stats are derived from window sums (ERA = 9·ER/IP, WHIP = (H+BB)/IP)
//! so a window with zero innings has no rate at all.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use super::rolling::{rate, Aggregation, Observation, RollingAggregator};
use crate::data::{EntityKey, PitchingAppearance};
use crate::Result;

/// A pitcher's run prevention over their last few appearances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitcherForm {
    pub era: f64,
    pub whip: f64,
    /// Mean innings per appearance
    pub innings: f64,
}

impl PitcherForm {
    /// Build from window sums in `[ER, IP, H, BB]` order
    fn from_sums(sums: &[f64], window: usize) -> Option<Self> {
        let [er, ip, h, bb] = <[f64; 4]>::try_from(sums).ok()?;
        Some(PitcherForm {
            era: rate(9.0 * er, ip)?,
            whip: rate(h + bb, ip)?,
            innings: ip / window as f64,
        })
    }
}

/// A pitcher's strikeout profile: per-appearance means
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeoutForm {
    pub strikeouts: f64,
    pub innings: f64,
    pub earned_runs: f64,
    pub walks: f64,
    pub batters_faced: f64,
}

impl StrikeoutForm {
    /// Build from window means in `[SO, IP, ER, BB, BF]` order
    fn from_means(means: &[f64]) -> Option<Self> {
        let [so, ip, er, bb, bf] = <[f64; 5]>::try_from(means).ok()?;
        Some(StrikeoutForm {
            strikeouts: so,
            innings: ip,
            earned_runs: er,
            walks: bb,
            batters_faced: bf,
        })
    }
}

fn run_observations(rows: &[PitchingAppearance]) -> Vec<Observation<EntityKey>> {
    rows.iter()
        .map(|r| {
            Observation::new(
                r.pitcher.clone(),
                r.date,
                vec![r.earned_runs, r.innings, r.hits, r.walks],
            )
        })
        .collect()
}

fn strikeout_observations(rows: &[PitchingAppearance]) -> Vec<Observation<EntityKey>> {
    rows.iter()
        .map(|r| {
            Observation::new(
                r.pitcher.clone(),
                r.date,
                vec![r.strikeouts, r.innings, r.earned_runs, r.walks, r.batters_faced],
            )
        })
        .collect()
}

/// Rolling pitcher features over every appearance in a pitching log
#[derive(Debug, Clone, Copy)]
pub struct PitcherRolling {
    sums: RollingAggregator,
    means: RollingAggregator,
}

impl PitcherRolling {
    pub fn new(window: usize) -> Result<Self> {
        Ok(PitcherRolling {
            sums: RollingAggregator::new(window, Aggregation::Sum)?,
            means: RollingAggregator::new(window, Aggregation::Mean)?,
        })
    }

    pub fn window(&self) -> usize {
        self.sums.window()
    }

    /// Form entering each (pitcher, date)
    pub fn form_index(&self, rows: &[PitchingAppearance]) -> HashMap<(EntityKey, NaiveDate), PitcherForm> {
        let window = self.window();
        self.sums
            .index(&run_observations(rows))
            .into_iter()
            .filter_map(|(key, sums)| Some((key, PitcherForm::from_sums(&sums, window)?)))
            .collect()
    }

    /// Form of every pitcher entering `date`
    pub fn form_before(&self, rows: &[PitchingAppearance], date: NaiveDate) -> BTreeMap<EntityKey, PitcherForm> {
        let window = self.window();
        self.sums
            .latest_before(&run_observations(rows), date)
            .into_iter()
            .filter_map(|(key, sums)| Some((key, PitcherForm::from_sums(&sums, window)?)))
            .collect()
    }

    /// Strikeout form entering each appearance, aligned with `rows`
    pub fn strikeout_form(&self, rows: &[PitchingAppearance]) -> Vec<Option<StrikeoutForm>> {
        self.means
            .compute(&strikeout_observations(rows))
            .into_iter()
            .map(|means| means.and_then(|m| StrikeoutForm::from_means(&m)))
            .collect()
    }

    pub fn strikeout_form_before(
        &self,
        rows: &[PitchingAppearance],
        date: NaiveDate,
    ) -> BTreeMap<EntityKey, StrikeoutForm> {
        self.means
            .latest_before(&strikeout_observations(rows), date)
            .into_iter()
            .filter_map(|(key, means)| Some((key, StrikeoutForm::from_means(&means)?)))
            .collect()
    }
}
