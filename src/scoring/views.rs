//! Upcoming-game tables for each market

use serde::Serialize;

use super::{ConfidenceTier, Direction, ScoreMode, Scorer, Side};
use crate::data::EntityKey;
use crate::predict::GamePair;
use crate::{PitcherKPrediction, TeamRunPrediction};

/// A game-level pick: combined runs for totals, first-minus-second for spreads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GamePick {
    pub date: chrono::NaiveDate,
    pub first_team: String,
    pub second_team: String,
    pub first_pitcher: String,
    pub second_pitcher: String,
    pub first_runs: f64,
    pub second_runs: f64,
    pub predicted: f64,
    pub direction: Direction,
    pub tier: ConfidenceTier,
}

impl GamePick {
    fn new(pair: &GamePair, predicted: f64, line: f64, scorer: &Scorer) -> Self {
        let (direction, tier) = scorer.score(predicted, line);
        GamePick {
            date: pair.date,
            first_team: pair.first.team.clone(),
            second_team: pair.second.team.clone(),
            first_pitcher: pair.first.starting_pitcher.clone(),
            second_pitcher: pair.second.starting_pitcher.clone(),
            first_runs: pair.first.predicted_runs,
            second_runs: pair.second.predicted_runs,
            predicted,
            direction,
            tier,
        }
    }
}

pub fn game_totals(pairs: &[GamePair], line: f64, scorer: &Scorer) -> Vec<GamePick> {
    pairs
        .iter()
        .map(|pair| GamePick::new(pair, pair.total(), line, scorer))
        .collect()
}

pub fn spreads(pairs: &[GamePair], line: f64, scorer: &Scorer) -> Vec<GamePick> {
    pairs
        .iter()
        .map(|pair| GamePick::new(pair, pair.spread(), line, scorer))
        .collect()
}

/// One team's total with its confidence on each side of the line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamTotalPick {
    pub prediction: TeamRunPrediction,
    pub over: ConfidenceTier,
    pub under: ConfidenceTier,
}

impl TeamTotalPick {
    pub fn tier(&self, side: Side) -> ConfidenceTier {
        match side {
            Side::Over => self.over,
            Side::Under => self.under,
        }
    }
}

/// Team totals sorted by the chosen side's tier, strongest first.
/// Equal tiers keep their input order.
pub fn team_totals(
    predictions: &[TeamRunPrediction],
    line: f64,
    scorer: &Scorer,
    sort_by: Side,
) -> Vec<TeamTotalPick> {
    let mut picks: Vec<TeamTotalPick> = predictions
        .iter()
        .map(|p| TeamTotalPick {
            prediction: p.clone(),
            over: scorer.tier(p.predicted_runs, line, ScoreMode::OneSided(Side::Over)),
            under: scorer.tier(p.predicted_runs, line, ScoreMode::OneSided(Side::Under)),
        })
        .collect();
    picks.sort_by(|a, b| b.tier(sort_by).cmp(&a.tier(sort_by)));
    picks
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrikeoutPick {
    pub prediction: PitcherKPrediction,
    pub direction: Direction,
    pub tier: ConfidenceTier,
}

pub fn strikeouts(predictions: &[PitcherKPrediction], line: f64, scorer: &Scorer) -> Vec<StrikeoutPick> {
    predictions
        .iter()
        .map(|p| {
            let (direction, tier) = scorer.score(p.predicted_ks, line);
            StrikeoutPick {
                prediction: p.clone(),
                direction,
                tier,
            }
        })
        .collect()
}

/// Keep games where `team` plays on either side
pub fn pairs_involving(pairs: Vec<GamePair>, team: Option<&EntityKey>) -> Vec<GamePair> {
    match team {
        Some(team) => pairs.into_iter().filter(|p| p.involves(team)).collect(),
        None => pairs,
    }
}

/// Keep team predictions for `team`, as either the team or the opponent
pub fn team_rows_involving(rows: Vec<TeamRunPrediction>, team: Option<&EntityKey>) -> Vec<TeamRunPrediction> {
    match team {
        Some(team) => rows
            .into_iter()
            .filter(|p| EntityKey::new(&p.team) == *team || EntityKey::new(&p.opponent) == *team)
            .collect(),
        None => rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::pair_matchups;
    use chrono::NaiveDate;

    fn pred(team: &str, opp: &str, runs: f64) -> TeamRunPrediction {
        TeamRunPrediction {
            date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            team: team.into(),
            opponent: opp.into(),
            starting_pitcher: format!("{} starter", team),
            opponent_pitcher: format!("{} starter", opp),
            home: false,
            predicted_runs: runs,
            actual_runs: None,
            game_id: None,
        }
    }

    fn slate() -> Vec<TeamRunPrediction> {
        vec![
            pred("NYY", "BOS", 3.9),
            pred("BOS", "NYY", 5.1),
            pred("SEA", "HOU", 4.5),
            pred("HOU", "SEA", 2.0),
        ]
    }

    #[test]
    fn test_game_totals_and_spreads() {
        let pairs = pair_matchups(&slate());
        let scorer = Scorer::default();

        let totals = game_totals(&pairs, 8.5, &scorer);
        assert_eq!(totals.len(), 2);
        let bos = &totals[0];
        assert_eq!(bos.first_team, "BOS");
        assert!((bos.predicted - 9.0).abs() < 1e-9);
        assert_eq!((bos.direction, bos.tier), (Direction::Over, ConfidenceTier(1)));

        let spreads = spreads(&pairs, 1.5, &scorer);
        // 5.1 - 3.9 = 1.2, below the 1.5 line
        assert!((spreads[0].predicted - 1.2).abs() < 1e-9);
        assert_eq!(spreads[0].direction, Direction::Under);
        // HOU - SEA = -2.5
        assert!((spreads[1].predicted + 2.5).abs() < 1e-9);
        assert_eq!(spreads[1].tier, ConfidenceTier(5));
    }

    #[test]
    fn test_team_totals_sort_by_side() {
        let scorer = Scorer::default();
        let picks = team_totals(&slate(), 4.5, &scorer, Side::Under);
        assert_eq!(picks[0].prediction.team, "HOU");
        assert_eq!(picks[0].under, ConfidenceTier(5));
        assert_eq!(picks[0].over, ConfidenceTier(0));
        // NYY (under 1) next, then BOS and SEA tied at 0 in input order
        assert_eq!(picks[1].prediction.team, "NYY");
        assert_eq!(picks[2].prediction.team, "BOS");
        assert_eq!(picks[3].prediction.team, "SEA");

        let picks = team_totals(&slate(), 4.5, &scorer, Side::Over);
        assert_eq!(picks[0].prediction.team, "BOS");
        assert_eq!(picks[0].over, ConfidenceTier(1));
    }

    #[test]
    fn test_strikeout_picks() {
        let preds = vec![PitcherKPrediction {
            date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            team: "NYY".into(),
            opponent: "BOS".into(),
            pitcher: "Gerrit Cole".into(),
            predicted_ks: 7.6,
            actual_ks: None,
        }];
        let picks = strikeouts(&preds, 6.0, &Scorer::default());
        assert_eq!(picks[0].direction, Direction::Over);
        assert_eq!(picks[0].tier, ConfidenceTier(3));
    }

    #[test]
    fn test_entity_filters() {
        let hou = EntityKey::new("hou");
        let pairs = pairs_involving(pair_matchups(&slate()), Some(&hou));
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].first.team, "HOU");
        assert_eq!(team_rows_involving(slate(), Some(&hou)).len(), 2);
        assert_eq!(team_rows_involving(slate(), None).len(), 4);
    }
}
