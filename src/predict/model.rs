//! Trained regressors
//!
//! Model fitting happens elsewhere. Here a model is only something that maps
//! a feature vector to a number, plus the exported linear form we can load.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{MlbError, Result};

/// A fitted model mapping one feature vector to one prediction
pub trait Regressor {
    fn predict(&self, features: &[f64]) -> f64;
}

/// Exported linear model: `intercept + Σ coefficient·feature`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub feature_names: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn new(feature_names: &[&str], intercept: f64, coefficients: Vec<f64>) -> Result<Self> {
        let model = LinearModel {
            feature_names: feature_names.iter().map(|s| s.to_string()).collect(),
            intercept,
            coefficients,
        };
        model.check_shape()?;
        Ok(model)
    }

    fn check_shape(&self) -> Result<()> {
        if self.coefficients.len() != self.feature_names.len() {
            return Err(MlbError::Model(format!(
                "{} coefficients for {} features",
                self.coefficients.len(),
                self.feature_names.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(MlbError::Model("non-finite coefficient".into()));
        }
        Ok(())
    }

    /// Ensure the model was trained on exactly this column layout
    pub fn check_layout(&self, layout: &[&str]) -> Result<()> {
        if self.feature_names.len() != layout.len()
            || self.feature_names.iter().zip(layout).any(|(a, b)| a != b)
        {
            return Err(MlbError::Model(format!(
                "model features [{}] do not match expected [{}]",
                self.feature_names.join(", "),
                layout.join(", ")
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let model: LinearModel = serde_json::from_str(json)?;
        model.check_shape()?;
        Ok(model)
    }

    /// Load a model file and check it against a design matrix layout
    pub fn load(path: impl AsRef<Path>, layout: &[&str]) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MlbError::NoModel(path.display().to_string()));
        }
        let model = Self::from_json(&std::fs::read_to_string(path)?)?;
        model.check_layout(layout)?;
        log::info!(
            "Loaded linear model with {} features from {}",
            model.feature_names.len(),
            path.display()
        );
        Ok(model)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl Regressor for LinearModel {
    fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{STRIKEOUT_FEATURES, TEAM_FEATURES};

    #[test]
    fn test_linear_prediction() {
        let model = LinearModel::new(&["a", "b"], 1.0, vec![2.0, -0.5]).unwrap();
        assert!((model.predict(&[3.0, 4.0]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        assert!(matches!(
            LinearModel::new(&["a", "b"], 0.0, vec![1.0]),
            Err(MlbError::Model(_))
        ));
        let json = r#"{"feature_names":["a"],"intercept":0.0,"coefficients":[1.0,2.0]}"#;
        assert!(LinearModel::from_json(json).is_err());
    }

    #[test]
    fn test_layout_check() {
        let model = LinearModel::new(&TEAM_FEATURES, 0.5, vec![0.1; TEAM_FEATURES.len()]).unwrap();
        assert!(model.check_layout(&TEAM_FEATURES).is_ok());
        assert!(matches!(
            model.check_layout(&STRIKEOUT_FEATURES),
            Err(MlbError::Model(_))
        ));
    }

    #[test]
    fn test_missing_model_file() {
        let err = LinearModel::load("/nonexistent/model.json", &TEAM_FEATURES).unwrap_err();
        assert!(matches!(err, MlbError::NoModel(_)));
    }

    #[test]
    fn test_json_roundtrip_through_file() {
        let dir = std::env::temp_dir().join(format!("mlb-model-{}", std::process::id()));
        let path = dir.join("k_model.json");
        let model =
            LinearModel::new(&STRIKEOUT_FEATURES, 1.2, vec![0.8, 0.1, -0.05, -0.1, 0.02, 0.15])
                .unwrap();
        model.save(&path).unwrap();
        let loaded = LinearModel::load(&path, &STRIKEOUT_FEATURES).unwrap();
        assert_eq!(loaded, model);
        std::fs::remove_dir_all(&dir).ok();
    }
}
