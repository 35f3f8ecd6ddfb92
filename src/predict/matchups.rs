//! Pairing team predictions into games
//!
//! Two team rows form a game when they share a date and the same unordered
//! pair of teams. The team whose normalized name sorts first is always
//! `first`, so spreads read "first minus second" regardless of home and away.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::data::EntityKey;
use crate::TeamRunPrediction;

/// Both sides of one predicted game
#[derive(Debug, Clone, PartialEq)]
pub struct GamePair {
    pub date: NaiveDate,
    pub first: TeamRunPrediction,
    pub second: TeamRunPrediction,
}

impl GamePair {
    /// `"first|second"` by normalized team name
    pub fn key(&self) -> String {
        format!(
            "{}|{}",
            EntityKey::new(&self.first.team),
            EntityKey::new(&self.second.team)
        )
    }

    pub fn total(&self) -> f64 {
        self.first.predicted_runs + self.second.predicted_runs
    }

    /// Predicted margin of `first` over `second`
    pub fn spread(&self) -> f64 {
        self.first.predicted_runs - self.second.predicted_runs
    }

    pub fn actual_total(&self) -> Option<f64> {
        Some(self.first.actual_runs? + self.second.actual_runs?)
    }

    pub fn actual_spread(&self) -> Option<f64> {
        Some(self.first.actual_runs? - self.second.actual_runs?)
    }

    pub fn involves(&self, team: &EntityKey) -> bool {
        EntityKey::new(&self.first.team) == *team || EntityKey::new(&self.second.team) == *team
    }

    pub fn home_team(&self) -> Option<&str> {
        [&self.first, &self.second]
            .into_iter()
            .find(|p| p.home)
            .map(|p| p.team.as_str())
    }
}

/// Group team predictions into games, ordered by date then matchup key.
/// Rows carrying a schedule game id only pair within that game, which keeps
/// doubleheaders apart. A group that is not exactly one row for each team
/// cannot be paired and is dropped.
pub fn pair_matchups(predictions: &[TeamRunPrediction]) -> Vec<GamePair> {
    type GroupKey<'p> = (NaiveDate, EntityKey, EntityKey, Option<&'p str>);
    let mut groups: BTreeMap<GroupKey, Vec<&TeamRunPrediction>> = BTreeMap::new();
    for p in predictions {
        let team = EntityKey::new(&p.team);
        let opponent = EntityKey::new(&p.opponent);
        let (a, b) = if team <= opponent {
            (team, opponent)
        } else {
            (opponent, team)
        };
        groups
            .entry((p.date, a, b, p.game_id.as_deref()))
            .or_default()
            .push(p);
    }

    let mut pairs = Vec::with_capacity(groups.len());
    let mut unpaired = 0usize;
    for ((date, a, b, _), rows) in groups {
        let sides = match rows.as_slice() {
            [x, y] if EntityKey::new(&x.team) == a && EntityKey::new(&y.team) == b => Some((*x, *y)),
            [x, y] if EntityKey::new(&y.team) == a && EntityKey::new(&x.team) == b => Some((*y, *x)),
            _ => None,
        };
        let Some((first, second)) = sides.filter(|_| a != b) else {
            log::info!("Unpaired matchup {}|{} on {}: {} rows", a, b, date, rows.len());
            unpaired += 1;
            continue;
        };
        pairs.push(GamePair {
            date,
            first: first.clone(),
            second: second.clone(),
        });
    }
    if unpaired > 0 {
        log::info!("Dropped {} unpaired matchups", unpaired);
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(team: &str, opp: &str, d: u32, runs: f64, actual: Option<f64>) -> TeamRunPrediction {
        TeamRunPrediction {
            date: NaiveDate::from_ymd_opt(2025, 7, d).unwrap(),
            team: team.into(),
            opponent: opp.into(),
            starting_pitcher: String::new(),
            opponent_pitcher: String::new(),
            home: team == "NYY",
            predicted_runs: runs,
            actual_runs: actual,
            game_id: None,
        }
    }

    #[test]
    fn test_pair_orders_alphabetically() {
        let pairs = pair_matchups(&[
            pred("NYY", "BOS", 1, 3.9, Some(2.0)),
            pred("BOS", "NYY", 1, 5.1, Some(6.0)),
        ]);
        assert_eq!(pairs.len(), 1);
        let pair = &pairs[0];
        assert_eq!(pair.first.team, "BOS");
        assert_eq!(pair.key(), "bos|nyy");
        assert!((pair.total() - 9.0).abs() < 1e-9);
        assert!((pair.spread() - 1.2).abs() < 1e-9);
        assert_eq!(pair.actual_total(), Some(8.0));
        assert_eq!(pair.actual_spread(), Some(4.0));
        assert_eq!(pair.home_team(), Some("NYY"));
    }

    #[test]
    fn test_unpaired_and_crowded_keys_dropped() {
        let pairs = pair_matchups(&[
            pred("NYY", "BOS", 1, 4.0, None),
            pred("SEA", "HOU", 1, 4.0, None),
            pred("HOU", "SEA", 1, 4.0, None),
            pred("SEA", "HOU", 1, 4.5, None),
            pred("LAD", "SD", 2, 4.0, None),
            pred("SD", "LAD", 2, 3.0, None),
        ]);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].key(), "lad|sd");
        assert!((pairs[0].spread() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_rows_for_one_team_are_not_a_game() {
        let pairs = pair_matchups(&[
            pred("NYY", "BOS", 1, 4.0, None),
            pred("NYY", "BOS", 1, 5.0, None),
        ]);
        assert!(pairs.is_empty());

        // A team listed against itself never pairs either
        let pairs = pair_matchups(&[
            pred("NYY", "NYY", 1, 4.0, None),
            pred("NYY", "NYY", 1, 5.0, None),
        ]);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_doubleheader_pairs_by_game_id() {
        let mut rows = vec![
            pred("NYY", "BOS", 1, 4.0, None),
            pred("BOS", "NYY", 1, 5.0, None),
            pred("NYY", "BOS", 1, 3.0, None),
            pred("BOS", "NYY", 1, 2.0, None),
        ];
        // Without ids the four rows are ambiguous
        assert!(pair_matchups(&rows).is_empty());

        for (row, id) in rows.iter_mut().zip(["g1", "g1", "g2", "g2"]) {
            row.game_id = Some(id.to_string());
        }
        let pairs = pair_matchups(&rows);
        assert_eq!(pairs.len(), 2);
        assert!((pairs[0].total() - 9.0).abs() < 1e-9);
        assert!((pairs[1].total() - 5.0).abs() < 1e-9);
        assert!((pairs[1].spread() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_teams_on_different_dates_are_separate_games() {
        let pairs = pair_matchups(&[
            pred("NYY", "BOS", 1, 4.0, None),
            pred("NYY", "BOS", 2, 4.0, None),
            pred("BOS", "NYY", 2, 5.0, None),
        ]);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].date, NaiveDate::from_ymd_opt(2025, 7, 2).unwrap());
        assert_eq!(pairs[0].actual_total(), None);
    }
}
