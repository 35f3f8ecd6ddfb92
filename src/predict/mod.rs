//! Prediction and inference
//!
//! Load exported models and score design-matrix rows with them.

pub mod inference;
pub mod matchups;
pub mod model;

pub use inference::Predictor;
pub use matchups::{pair_matchups, GamePair};
pub use model::{LinearModel, Regressor};
