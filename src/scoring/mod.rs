//! Confidence tiering of predictions against a line
//!
//! A prediction's tier is how many buckets of `bucket_width` it sits away from
//! the line, capped at `max_tier`:
//!
//! ```text
//! tier = min(floor(diff / bucket_width), max_tier)
//! ```
//!
//! Two-sided scoring uses `|predicted - line|`. One-sided scoring only counts
//! distance on the chosen side, so a prediction on the wrong side is tier 0.

pub mod backfill;
pub mod views;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Market, MlbError, Result, ScoringConfig};

/// Allowance for binary floating point when a difference lands exactly on a
/// bucket boundary, e.g. `9.0 - 8.5`
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Which side of the line a value falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Over,
    Under,
}

impl Direction {
    /// Over only when strictly above the line; landing on it is Under
    pub fn of(value: f64, threshold: f64) -> Self {
        if value > threshold {
            Direction::Over
        } else {
            Direction::Under
        }
    }

    /// Display label for a market (spreads read Cover/Miss)
    pub fn label(&self, market: Market) -> &'static str {
        let (over, under) = market.direction_labels();
        match self {
            Direction::Over => over,
            Direction::Under => under,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Over => write!(f, "Over"),
            Direction::Under => write!(f, "Under"),
        }
    }
}

/// The side a one-sided score measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Over,
    Under,
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "over" => Ok(Side::Over),
            "under" => Ok(Side::Under),
            _ => Err(format!("Unknown side: {}. Use over or under.", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    TwoSided,
    OneSided(Side),
}

/// Confidence in a pick, 0 up to the scorer's `max_tier`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfidenceTier(pub u8);

impl ConfidenceTier {
    pub fn value(&self) -> u8 {
        self.0
    }

    /// One-sided tiers show a fireball per level, or "No Pick" at zero.
    /// Two-sided tiers show the number, zero included.
    pub fn label(&self, mode: ScoreMode) -> String {
        match mode {
            ScoreMode::TwoSided => self.0.to_string(),
            ScoreMode::OneSided(_) if self.0 == 0 => "No Pick".to_string(),
            ScoreMode::OneSided(_) => "🔥".repeat(self.0 as usize),
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Buckets the distance between a prediction and a line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scorer {
    bucket_width: f64,
    max_tier: u8,
}

impl Default for Scorer {
    fn default() -> Self {
        Scorer {
            bucket_width: 0.5,
            max_tier: 5,
        }
    }
}

impl Scorer {
    pub fn new(bucket_width: f64, max_tier: u8) -> Result<Self> {
        if !(bucket_width > 0.0) || !bucket_width.is_finite() {
            return Err(MlbError::Config(format!(
                "bucket width must be positive, got {}",
                bucket_width
            )));
        }
        Ok(Scorer {
            bucket_width,
            max_tier,
        })
    }

    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        Self::new(config.bucket_width, config.max_tier)
    }

    pub fn bucket_width(&self) -> f64 {
        self.bucket_width
    }

    pub fn max_tier(&self) -> u8 {
        self.max_tier
    }

    pub fn tier(&self, predicted: f64, threshold: f64, mode: ScoreMode) -> ConfidenceTier {
        let diff = match mode {
            ScoreMode::TwoSided => (predicted - threshold).abs(),
            ScoreMode::OneSided(Side::Over) => predicted - threshold,
            ScoreMode::OneSided(Side::Under) => threshold - predicted,
        };
        if !diff.is_finite() || diff <= 0.0 {
            return ConfidenceTier(0);
        }
        let buckets = (diff / self.bucket_width + BOUNDARY_EPSILON).floor();
        ConfidenceTier(buckets.min(self.max_tier as f64) as u8)
    }

    /// Direction and two-sided tier of a prediction
    pub fn score(&self, predicted: f64, threshold: f64) -> (Direction, ConfidenceTier) {
        (
            Direction::of(predicted, threshold),
            self.tier(predicted, threshold, ScoreMode::TwoSided),
        )
    }

    /// Whether the prediction called the right side; unknown without an actual
    pub fn hit(&self, predicted: f64, actual: Option<f64>, threshold: f64) -> Option<bool> {
        let actual = actual?;
        Some(Direction::of(predicted, threshold) == Direction::of(actual, threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_direction_is_strict() {
        assert_eq!(Direction::of(8.6, 8.5), Direction::Over);
        assert_eq!(Direction::of(8.5, 8.5), Direction::Under);
        assert_eq!(Direction::of(8.4, 8.5), Direction::Under);
    }

    #[test]
    fn test_two_sided_tiers() {
        let scorer = Scorer::default();
        assert_eq!(scorer.score(8.5, 8.5), (Direction::Under, ConfidenceTier(0)));
        assert_eq!(scorer.score(8.9, 8.5).1, ConfidenceTier(0));
        // Exactly one bucket away despite 9.0 - 8.5 in floating point
        assert_eq!(scorer.score(9.0, 8.5).1, ConfidenceTier(1));
        assert_eq!(scorer.score(7.4, 8.5), (Direction::Under, ConfidenceTier(2)));
        assert_eq!(scorer.score(11.0, 8.5).1, ConfidenceTier(5));
        assert_eq!(scorer.score(14.0, 8.5).1, ConfidenceTier(5));
    }

    #[test]
    fn test_boundaries_with_awkward_lines() {
        let scorer = Scorer::default();
        assert_eq!(scorer.tier(4.6, 4.1, ScoreMode::TwoSided), ConfidenceTier(1));
        assert_eq!(scorer.tier(0.3, 0.1, ScoreMode::TwoSided), ConfidenceTier(0));
        assert_eq!(scorer.tier(7.3, 6.0, ScoreMode::TwoSided), ConfidenceTier(2));
    }

    #[test]
    fn test_one_sided_tiers() {
        let scorer = Scorer::default();
        let over = ScoreMode::OneSided(Side::Over);
        let under = ScoreMode::OneSided(Side::Under);
        assert_eq!(scorer.tier(5.6, 4.5, over), ConfidenceTier(2));
        assert_eq!(scorer.tier(5.6, 4.5, under), ConfidenceTier(0));
        assert_eq!(scorer.tier(3.0, 4.5, under), ConfidenceTier(3));
        assert_eq!(scorer.tier(4.5, 4.5, over), ConfidenceTier(0));
    }

    #[test]
    fn test_prediction_on_the_line_is_under_tier_zero() {
        let mut rng = StdRng::seed_from_u64(11);
        let scorers = [Scorer::default(), Scorer::new(0.25, 8).unwrap(), Scorer::new(1.5, 3).unwrap()];
        for _ in 0..500 {
            // Half-point lines like real markets plus arbitrary floats
            let threshold = if rng.gen_bool(0.5) {
                rng.gen_range(0..40) as f64 * 0.5
            } else {
                rng.gen_range(-5.0..30.0)
            };
            for scorer in &scorers {
                assert_eq!(scorer.score(threshold, threshold), (Direction::Under, ConfidenceTier(0)));
                assert_eq!(scorer.tier(threshold, threshold, ScoreMode::OneSided(Side::Over)), ConfidenceTier(0));
                assert_eq!(scorer.tier(threshold, threshold, ScoreMode::OneSided(Side::Under)), ConfidenceTier(0));
                assert_eq!(scorer.hit(threshold, Some(threshold), threshold), Some(true));
            }
        }
    }

    #[test]
    fn test_tier_is_monotone_and_capped() {
        let scorer = Scorer::default();
        let mut last = 0;
        for i in 0..200 {
            let predicted = 8.5 + i as f64 * 0.05;
            let tier = scorer.tier(predicted, 8.5, ScoreMode::TwoSided).value();
            assert!(tier >= last);
            assert!(tier <= 5);
            last = tier;
        }
        assert_eq!(last, 5);
    }

    #[test]
    fn test_labels() {
        let over = ScoreMode::OneSided(Side::Over);
        assert_eq!(ConfidenceTier(0).label(over), "No Pick");
        assert_eq!(ConfidenceTier(3).label(over), "🔥🔥🔥");
        assert_eq!(ConfidenceTier(0).label(ScoreMode::TwoSided), "0");
        assert_eq!(ConfidenceTier(4).to_string(), "4");
        assert_eq!(Direction::Over.label(Market::Spread), "Cover");
        assert_eq!(Direction::Under.label(Market::GameTotal), "Under");
    }

    #[test]
    fn test_hit_requires_actual() {
        let scorer = Scorer::default();
        assert_eq!(scorer.hit(9.2, Some(10.0), 8.5), Some(true));
        assert_eq!(scorer.hit(9.2, Some(8.5), 8.5), Some(false));
        assert_eq!(scorer.hit(7.0, Some(3.0), 8.5), Some(true));
        assert_eq!(scorer.hit(9.2, None, 8.5), None);
    }

    #[test]
    fn test_invalid_bucket_width() {
        assert!(Scorer::new(0.0, 5).is_err());
        assert!(Scorer::new(f64::NAN, 5).is_err());
        assert!(Scorer::new(0.25, 8).is_ok());
    }
}
