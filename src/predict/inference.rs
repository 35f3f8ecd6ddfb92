//! Model inference for predictions

use crate::data::parse::round2;
use crate::data::{DataContext, ScheduledGame};
use crate::features::{FeatureMatrixBuilder, PitcherStartRow, TeamGameRow};
use crate::predict::model::Regressor;
use crate::{FeatureConfig, PitcherKPrediction, Result, TeamRunPrediction};

/// Runs a fitted model over design-matrix rows built from one data context
pub struct Predictor<'a, M: Regressor> {
    context: &'a DataContext,
    builder: FeatureMatrixBuilder,
    model: &'a M,
}

impl<'a, M: Regressor> Predictor<'a, M> {
    pub fn new(context: &'a DataContext, features: &FeatureConfig, model: &'a M) -> Result<Self> {
        Ok(Predictor {
            context,
            builder: FeatureMatrixBuilder::new(features)?,
            model,
        })
    }

    pub fn context(&self) -> &DataContext {
        self.context
    }

    fn team_prediction(&self, row: &TeamGameRow) -> TeamRunPrediction {
        TeamRunPrediction {
            date: row.date,
            team: row.team.clone(),
            opponent: row.opponent.clone(),
            starting_pitcher: row.starting_pitcher.clone(),
            opponent_pitcher: row.opponent_pitcher.clone(),
            home: row.home == 1,
            predicted_runs: round2(self.model.predict(&row.features())),
            actual_runs: row.target_runs,
            game_id: row.game_id.clone(),
        }
    }

    fn strikeout_prediction(&self, row: &PitcherStartRow) -> PitcherKPrediction {
        PitcherKPrediction {
            date: row.date,
            team: row.team.clone(),
            opponent: row.opponent.clone(),
            pitcher: row.pitcher.clone(),
            predicted_ks: round2(self.model.predict(&row.features())),
            actual_ks: row.target_ks,
        }
    }

    /// Predicted runs for both teams of each scheduled game.
    /// Sides without enough history are left out.
    pub fn predict_team_runs(&self, schedule: &[ScheduledGame]) -> Vec<TeamRunPrediction> {
        let (rows, report) = self
            .builder
            .team_rows_for_schedule(self.context.logs(), schedule);
        if report.dropped() > 0 {
            log::info!(
                "{} of {} team sides skipped for missing history",
                report.dropped(),
                report.candidates
            );
        }
        rows.iter().map(|row| self.team_prediction(row)).collect()
    }

    /// Predicted strikeouts for both probable starters of each scheduled game
    pub fn predict_strikeouts(&self, schedule: &[ScheduledGame]) -> Vec<PitcherKPrediction> {
        let (rows, report) = self
            .builder
            .strikeout_rows_for_schedule(self.context.logs(), schedule);
        if report.dropped() > 0 {
            log::info!(
                "{} of {} starters skipped for missing history",
                report.dropped(),
                report.candidates
            );
        }
        rows.iter().map(|row| self.strikeout_prediction(row)).collect()
    }

    /// Score every historical team game, pairing each prediction with the
    /// runs actually scored.
    pub fn backfill_team_runs(&self) -> Vec<TeamRunPrediction> {
        let (rows, _) = self.builder.build_team_rows(self.context.logs());
        rows.iter().map(|row| self.team_prediction(row)).collect()
    }

    pub fn backfill_strikeouts(&self) -> Vec<PitcherKPrediction> {
        let (rows, _) = self.builder.build_strikeout_rows(self.context.logs());
        rows.iter().map(|row| self.strikeout_prediction(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{april, sample_logs};
    use crate::Config;

    /// Predicts the first feature plus a third of a run at home
    struct FirstFeature;

    impl Regressor for FirstFeature {
        fn predict(&self, features: &[f64]) -> f64 {
            features[0] + features[features.len() - 1] / 3.0
        }
    }

    fn game(day: u32, home_pitcher: &str, away_pitcher: &str) -> ScheduledGame {
        ScheduledGame {
            game_id: Some(format!("g{}", day)),
            date: april(day),
            home_team: "BOS".into(),
            away_team: "NYY".into(),
            home_pitcher: home_pitcher.into(),
            away_pitcher: away_pitcher.into(),
        }
    }

    #[test]
    fn test_predict_team_runs_rounds_to_two_places() {
        let context = DataContext::from_logs(sample_logs());
        let predictor = Predictor::new(&context, &Config::default().features, &FirstFeature).unwrap();
        let preds = predictor.predict_team_runs(&[game(5, "Brayan Bello", "Gerrit Cole")]);

        assert_eq!(preds.len(), 2);
        let bos = preds.iter().find(|p| p.team == "BOS").unwrap();
        assert!(bos.home);
        assert_eq!(bos.game_id.as_deref(), Some("g5"));
        // 8/3 + 1/3 = 3.0
        assert!((bos.predicted_runs - 3.0).abs() < 1e-9);
        assert_eq!(bos.actual_runs, None);
        let nyy = preds.iter().find(|p| p.team == "NYY").unwrap();
        // (5 + 6 + 7) / 3 = 6.0
        assert!((nyy.predicted_runs - 6.0).abs() < 1e-9);
        assert_eq!(nyy.starting_pitcher, "Gerrit Cole");
    }

    #[test]
    fn test_missing_history_skips_side_without_error() {
        let context = DataContext::from_logs(sample_logs());
        let predictor = Predictor::new(&context, &Config::default().features, &FirstFeature).unwrap();
        // Day 3 has only two prior games for everyone
        assert!(predictor.predict_team_runs(&[game(3, "Brayan Bello", "Gerrit Cole")]).is_empty());
        let preds = predictor.predict_strikeouts(&[game(5, "Call Up", "Gerrit Cole")]);
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].pitcher, "Gerrit Cole");
        // (7 + 6 + 9) / 3, away
        assert!((preds[0].predicted_ks - 7.33).abs() < 1e-9);
    }

    #[test]
    fn test_backfill_carries_actuals() {
        let context = DataContext::from_logs(sample_logs());
        let predictor = Predictor::new(&context, &Config::default().features, &FirstFeature).unwrap();

        let runs = predictor.backfill_team_runs();
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().all(|p| p.actual_runs.is_some()));

        let ks = predictor.backfill_strikeouts();
        let cole = ks.iter().find(|p| p.pitcher == "Gerrit Cole").unwrap();
        assert_eq!(cole.actual_ks, Some(9.0));
        assert_eq!(cole.team, "NYY");
    }
}
