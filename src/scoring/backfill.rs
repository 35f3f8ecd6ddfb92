//! Reconciling predictions with outcomes and measuring hit rates
//!
//! Directions, hits, and tiers are recomputed from the stored predicted and
//! actual values on every query, so changing the line never requires
//! rewriting history.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use super::{ConfidenceTier, Direction, ScoreMode, Scorer};
use crate::data::{EntityKey, PitchingAppearance, TeamBattingLine};
use crate::predict::GamePair;
use crate::{Market, PredictionRecord};

/// Realized values keyed by date and entity
pub type Outcomes = HashMap<(NaiveDate, EntityKey), f64>;

/// Runs scored per team and date; for doubleheaders the first game counts
pub fn team_run_outcomes(batting: &[TeamBattingLine]) -> Outcomes {
    let mut outcomes = Outcomes::new();
    for line in batting {
        if let Some(runs) = line.runs {
            outcomes.entry((line.date, line.team.clone())).or_insert(runs);
        }
    }
    outcomes
}

/// Strikeouts per pitcher and date
pub fn strikeout_outcomes(pitching: &[PitchingAppearance]) -> Outcomes {
    let mut outcomes = Outcomes::new();
    for row in pitching {
        if let Some(so) = row.strikeouts {
            outcomes.entry((row.date, row.pitcher.clone())).or_insert(so);
        }
    }
    outcomes
}

/// Fill unknown actuals from `outcomes`, returning how many were filled.
/// Actuals already present are left alone.
pub fn backfill_actuals(records: &mut [PredictionRecord], outcomes: &Outcomes) -> usize {
    let mut filled = 0;
    for record in records.iter_mut().filter(|r| r.actual.is_none()) {
        let key = (record.date, EntityKey::new(&record.subject));
        if let Some(&actual) = outcomes.get(&key) {
            record.actual = Some(actual);
            filled += 1;
        }
    }
    log::info!("Backfilled {} of {} predictions", filled, records.len());
    filled
}

/// One record per game for the game-level markets. The subject is the
/// alphabetically first team, the opponent the second.
pub fn pair_records(pairs: &[GamePair], market: Market) -> Vec<PredictionRecord> {
    pairs
        .iter()
        .map(|pair| {
            let (predicted, actual) = match market {
                Market::Spread => (pair.spread(), pair.actual_spread()),
                _ => (pair.total(), pair.actual_total()),
            };
            PredictionRecord {
                date: pair.date,
                subject: pair.first.team.clone(),
                opponent: Some(pair.second.team.clone()),
                predicted,
                actual,
            }
        })
        .collect()
}

/// A historical prediction judged against a line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPrediction {
    pub record: PredictionRecord,
    pub direction: Direction,
    pub actual_direction: Option<Direction>,
    pub hit: Option<bool>,
    pub tier: ConfidenceTier,
}

pub fn score_history(records: &[PredictionRecord], threshold: f64, scorer: &Scorer) -> Vec<ScoredPrediction> {
    records
        .iter()
        .map(|record| {
            let (direction, tier) = scorer.score(record.predicted, threshold);
            ScoredPrediction {
                record: record.clone(),
                direction,
                actual_direction: record.actual.map(|a| Direction::of(a, threshold)),
                hit: scorer.hit(record.predicted, record.actual, threshold),
                tier,
            }
        })
        .collect()
}

/// Share of decided predictions that hit
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HitRate {
    pub hits: usize,
    pub total: usize,
    /// Percentage to one decimal place, halves to even; 0 when nothing is
    /// decided
    pub pct: f64,
}

impl HitRate {
    pub fn new(hits: usize, total: usize) -> Self {
        let pct = if total == 0 {
            0.0
        } else {
            (1000.0 * hits as f64 / total as f64).round_ties_even() / 10.0
        };
        HitRate { hits, total, pct }
    }

    /// Rows without an actual are not counted
    pub fn from_scored<'a>(rows: impl IntoIterator<Item = &'a ScoredPrediction>) -> Self {
        let (mut hits, mut total) = (0, 0);
        for hit in rows.into_iter().filter_map(|r| r.hit) {
            total += 1;
            if hit {
                hits += 1;
            }
        }
        Self::new(hits, total)
    }
}

impl fmt::Display for HitRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} correct ({}%)", self.hits, self.total, self.pct)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyQuery {
    pub threshold: f64,
    /// Day of the daily slice and inclusive end of the rolling one
    pub date: Option<NaiveDate>,
    /// Keep records whose subject or opponent is this entity
    pub subject: Option<EntityKey>,
    /// Keep only records at exactly this two-sided tier
    pub tier: Option<u8>,
}

impl AccuracyQuery {
    pub fn new(threshold: f64) -> Self {
        AccuracyQuery {
            threshold,
            date: None,
            subject: None,
            tier: None,
        }
    }

    fn matches(&self, row: &ScoredPrediction) -> bool {
        let subject_ok = self.subject.as_ref().map_or(true, |s| {
            EntityKey::new(&row.record.subject) == *s
                || row.record.opponent.as_deref().map_or(false, |o| EntityKey::new(o) == *s)
        });
        let tier_ok = self.tier.map_or(true, |t| row.tier.value() == t);
        subject_ok && tier_ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    /// Scored rows of the daily slice
    pub rows: Vec<ScoredPrediction>,
    pub daily: HitRate,
    pub rolling: HitRate,
}

/// Daily and rolling hit rates of the records matching `query`
pub fn summarize(records: &[PredictionRecord], query: &AccuracyQuery, scorer: &Scorer) -> AccuracyReport {
    let scored: Vec<ScoredPrediction> = score_history(records, query.threshold, scorer)
        .into_iter()
        .filter(|row| query.matches(row))
        .collect();

    let rolling = HitRate::from_scored(
        scored
            .iter()
            .filter(|row| query.date.map_or(true, |d| row.record.date <= d)),
    );
    let rows: Vec<ScoredPrediction> = scored
        .into_iter()
        .filter(|row| query.date.map_or(true, |d| row.record.date == d))
        .collect();
    let daily = HitRate::from_scored(&rows);

    AccuracyReport {
        rows,
        daily,
        rolling,
    }
}

/// Label a scored row's tier the way the two-sided views show it
pub fn tier_label(row: &ScoredPrediction) -> String {
    row.tier.label(ScoreMode::TwoSided)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn record(subject: &str, d: u32, predicted: f64, actual: Option<f64>) -> PredictionRecord {
        PredictionRecord {
            date: day(d),
            subject: subject.into(),
            opponent: Some("OPP".into()),
            predicted,
            actual,
        }
    }

    fn history() -> Vec<PredictionRecord> {
        vec![
            record("NYY", 1, 9.5, Some(11.0)), // over, hit, tier 2
            record("BOS", 1, 7.0, Some(10.0)), // under, miss, tier 3
            record("SEA", 2, 9.1, Some(6.0)),  // over, miss, tier 1
            record("HOU", 2, 6.5, Some(4.0)),  // under, hit, tier 4
            record("LAD", 2, 10.0, None),      // not decided
            record("SD", 3, 8.0, Some(12.0)),  // under, miss, tier 1
        ]
    }

    #[test]
    fn test_hit_rate_pct() {
        assert_eq!(HitRate::new(2, 3).pct, 66.7);
        assert_eq!(HitRate::new(1, 8).pct, 12.5);
        // 6.25% and 18.75% sit on a half
        assert_eq!(HitRate::new(1, 16).pct, 6.2);
        assert_eq!(HitRate::new(3, 16).pct, 18.8);
        assert_eq!(HitRate::new(0, 0).pct, 0.0);
        assert_eq!(HitRate::new(0, 0).to_string(), "0/0 correct (0%)");
    }

    #[test]
    fn test_daily_and_rolling() {
        let scorer = Scorer::default();
        let mut query = AccuracyQuery::new(8.5);
        query.date = Some(day(2));
        let report = summarize(&history(), &query, &scorer);

        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.daily, HitRate::new(1, 2));
        // Inclusive of the cutoff, nothing after it
        assert_eq!(report.rolling, HitRate::new(2, 4));
    }

    #[test]
    fn test_no_date_uses_everything() {
        let report = summarize(&history(), &AccuracyQuery::new(8.5), &Scorer::default());
        assert_eq!(report.rows.len(), 6);
        assert_eq!(report.daily, report.rolling);
        assert_eq!(report.rolling.total, 5);
        assert_eq!(report.rolling.hits, 2);
    }

    #[test]
    fn test_tier_and_subject_filters() {
        let scorer = Scorer::default();
        let mut query = AccuracyQuery::new(8.5);
        query.tier = Some(1);
        let report = summarize(&history(), &query, &scorer);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rolling, HitRate::new(0, 2));

        let mut query = AccuracyQuery::new(8.5);
        query.subject = Some(EntityKey::new("hou"));
        let report = summarize(&history(), &query, &scorer);
        assert_eq!(report.rolling, HitRate::new(1, 1));
        assert_eq!(tier_label(&report.rows[0]), "4");
    }

    #[test]
    fn test_empty_day_is_zero_percent() {
        let mut query = AccuracyQuery::new(8.5);
        query.date = Some(day(20));
        let report = summarize(&history(), &query, &Scorer::default());
        assert!(report.rows.is_empty());
        assert_eq!(report.daily.pct, 0.0);
        assert_eq!(report.rolling.total, 5);
    }

    #[test]
    fn test_scoring_does_not_mutate_values() {
        let records = history();
        let before = records.clone();
        let _ = score_history(&records, 3.0, &Scorer::default());
        let _ = summarize(&records, &AccuracyQuery::new(12.0), &Scorer::default());
        assert_eq!(records, before);
    }

    #[test]
    fn test_line_change_recomputes_direction() {
        let records = vec![record("NYY", 1, 9.0, Some(9.0))];
        let scorer = Scorer::default();
        let at_8 = score_history(&records, 8.5, &scorer);
        let at_9 = score_history(&records, 9.0, &scorer);
        assert_eq!(at_8[0].direction, Direction::Over);
        assert_eq!(at_9[0].direction, Direction::Under);
        assert_eq!(at_9[0].hit, Some(true));
    }

    #[test]
    fn test_backfill_actuals() {
        let mut records = vec![
            record("Gerrit Cole", 1, 6.5, None),
            record("Chris Sale", 1, 7.0, Some(9.0)),
            record("Chris Sale", 2, 7.0, None),
        ];
        let mut outcomes = Outcomes::new();
        outcomes.insert((day(1), EntityKey::new("gerrit cole")), 8.0);
        outcomes.insert((day(1), EntityKey::new("chris sale")), 3.0);

        assert_eq!(backfill_actuals(&mut records, &outcomes), 1);
        assert_eq!(records[0].actual, Some(8.0));
        // Known actuals are not overwritten
        assert_eq!(records[1].actual, Some(9.0));
        assert_eq!(records[2].actual, None);
    }

    #[test]
    fn test_outcomes_from_logs() {
        let logs = crate::data::fixtures::sample_logs();
        let runs = team_run_outcomes(&logs.batting);
        assert_eq!(runs[&(crate::data::fixtures::april(4), EntityKey::new("NYY"))], 7.0);
        let ks = strikeout_outcomes(&logs.pitching);
        assert_eq!(ks[&(crate::data::fixtures::april(1), EntityKey::new("Brayan Bello"))], 4.0);
    }
}
