//! Starting pitcher identification
//!
//! Raw pitching logs carry no starter flag. A start is an appearance of at
//! least `min_innings`; when a team has more than one such appearance on a
//! date, the one with the most batters faced wins, and an exact tie goes to
//! the row that appears first in the log.

use chrono::NaiveDate;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::data::{EntityKey, PitchingAppearance};

#[derive(Debug, Clone, Copy)]
pub struct StarterFilter {
    min_innings: f64,
}

impl Default for StarterFilter {
    fn default() -> Self {
        StarterFilter { min_innings: 3.5 }
    }
}

impl StarterFilter {
    pub fn new(min_innings: f64) -> Self {
        StarterFilter { min_innings }
    }

    pub fn min_innings(&self) -> f64 {
        self.min_innings
    }

    /// Whether an appearance went long enough to count as a start
    pub fn is_start_length(&self, row: &PitchingAppearance) -> bool {
        row.innings.map_or(false, |ip| ip >= self.min_innings)
    }

    /// Whether an appearance is eligible to be a team's start
    pub fn qualifies(&self, row: &PitchingAppearance) -> bool {
        self.is_start_length(row) && row.batters_faced.is_some()
    }

    /// Indices into `rows` of the chosen starters, one per (team, date),
    /// ordered by team then date.
    pub fn select(&self, rows: &[PitchingAppearance]) -> Vec<usize> {
        let mut chosen: BTreeMap<(&EntityKey, NaiveDate), usize> = BTreeMap::new();
        let mut contested = 0usize;

        for (i, row) in rows.iter().enumerate() {
            if !self.qualifies(row) {
                continue;
            }
            match chosen.entry((&row.team, row.date)) {
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
                Entry::Occupied(mut slot) => {
                    contested += 1;
                    let current = rows[*slot.get()].batters_faced;
                    // Strictly greater: ties keep the earlier row
                    if row.batters_faced > current {
                        slot.insert(i);
                    }
                }
            }
        }

        if contested > 0 {
            log::debug!(
                "Resolved {} extra qualifying appearances by batters faced",
                contested
            );
        }
        chosen.into_values().collect()
    }

    pub fn starters<'a>(&self, rows: &'a [PitchingAppearance]) -> Vec<&'a PitchingAppearance> {
        self.select(rows).into_iter().map(|i| &rows[i]).collect()
    }

    /// Chosen starter per (team, date)
    pub fn by_team_date<'a>(
        &self,
        rows: &'a [PitchingAppearance],
    ) -> HashMap<(EntityKey, NaiveDate), &'a PitchingAppearance> {
        self.starters(rows)
            .into_iter()
            .map(|row| ((row.team.clone(), row.date), row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse::parse_innings_cell;

    fn appearance(player: &str, team: &str, d: u32, ip: &str, bf: Option<f64>) -> PitchingAppearance {
        PitchingAppearance {
            player: player.to_string(),
            team_name: team.to_string(),
            opponent_name: "OPP".into(),
            pitcher: EntityKey::new(player),
            team: EntityKey::new(team),
            opponent: EntityKey::new("OPP"),
            date: NaiveDate::from_ymd_opt(2025, 6, d).unwrap(),
            home: true,
            innings: parse_innings_cell(Some(ip)),
            earned_runs: Some(2.0),
            hits: Some(5.0),
            walks: Some(1.0),
            batters_faced: bf,
            strikeouts: Some(6.0),
        }
    }

    #[test]
    fn test_highest_batters_faced_wins() {
        let rows = vec![
            appearance("Opener", "NYY", 1, "5.0", Some(28.0)),
            appearance("Bulk", "NYY", 1, "4.0", Some(31.0)),
        ];
        let filter = StarterFilter::default();
        let starters = filter.starters(&rows);
        assert_eq!(starters.len(), 1);
        assert_eq!(starters[0].player, "Bulk");
    }

    #[test]
    fn test_exact_tie_keeps_first_row() {
        let rows = vec![
            appearance("First", "NYY", 1, "5.0", Some(25.0)),
            appearance("Second", "NYY", 1, "6.0", Some(25.0)),
        ];
        let starters = StarterFilter::default().starters(&rows);
        assert_eq!(starters.len(), 1);
        assert_eq!(starters[0].player, "First");
    }

    #[test]
    fn test_relief_and_unknown_rows_excluded() {
        let rows = vec![
            appearance("Reliever", "NYY", 1, "1.2", Some(8.0)),
            appearance("Long Man", "NYY", 1, "3.1", Some(15.0)),
            appearance("No BF", "NYY", 1, "6.0", None),
            appearance("Bad IP", "NYY", 1, "6.3", Some(27.0)),
        ];
        assert!(StarterFilter::default().select(&rows).is_empty());

        // 3.2 innings is 3.667, above the threshold
        let rows = vec![appearance("Short Start", "NYY", 1, "3.2", Some(17.0))];
        assert_eq!(StarterFilter::default().select(&rows), vec![0]);
    }

    #[test]
    fn test_one_starter_per_team_and_date() {
        let rows = vec![
            appearance("A", "NYY", 2, "6.0", Some(24.0)),
            appearance("B", "BOS", 1, "5.0", Some(22.0)),
            appearance("C", "NYY", 1, "7.0", Some(27.0)),
            appearance("D", "NYY", 1, "0.1", Some(2.0)),
        ];
        let filter = StarterFilter::default();
        // Ordered by team, then date
        assert_eq!(filter.select(&rows), vec![1, 2, 0]);

        let index = filter.by_team_date(&rows);
        let key = (EntityKey::new("nyy"), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(index[&key].player, "C");
    }

    #[test]
    fn test_selection_is_deterministic() {
        let rows = vec![
            appearance("X", "SEA", 3, "5.1", Some(23.0)),
            appearance("Y", "SEA", 3, "5.2", Some(23.0)),
            appearance("Z", "SEA", 3, "4.0", Some(20.0)),
        ];
        let filter = StarterFilter::default();
        let first = filter.select(&rows);
        for _ in 0..10 {
            assert_eq!(filter.select(&rows), first);
        }
        assert_eq!(first, vec![0]);
    }
}
