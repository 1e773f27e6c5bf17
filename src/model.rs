use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

use crate::features::StudentFeatures;

/// Boundary to the trained predictive model.
///
/// The engine treats the model as an opaque capability: stateless,
/// deterministic for identical input, safe for concurrent read-only use.
/// It is loaded once at process start and injected wherever a prediction
/// is needed.
pub trait Oracle {
    fn predict(&self, features: &StudentFeatures) -> Result<f64, OracleError>;
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("prediction failed: {0}")]
pub struct OracleError(pub String);

#[derive(Serialize, Clone)]
pub struct ModelInfo {
    pub algorithm: &'static str,
    pub features: Vec<&'static str>,
}

/// Pre-trained linear regression over the student attributes.
///
/// Training happens offline; this type only carries the fitted
/// coefficients, either from a JSON artifact or from the built-in set.
/// Optional features a record does not carry simply contribute nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionModel {
    pub intercept: f64,
    pub study_hours_weight: f64,
    pub attendance_weight: f64,
    pub previous_average_weight: f64,
    pub failures_weight: f64,
    pub participation_weight: f64,
    pub english_weight: f64,
}

impl RegressionModel {
    /// Coefficients fitted offline on the restored university dataset.
    pub fn pretrained() -> Self {
        Self {
            intercept: 4.8,
            study_hours_weight: 0.92,
            attendance_weight: 0.34,
            previous_average_weight: 0.31,
            failures_weight: -4.2,
            participation_weight: 1.15,
            english_weight: 0.08,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            algorithm: "linear_regression",
            features: vec![
                "study_hours_per_week",
                "attendance_rate",
                "previous_average",
                "failures_history",
                "participation_score",
                "english_score",
            ],
        }
    }
}

impl Oracle for RegressionModel {
    fn predict(&self, features: &StudentFeatures) -> Result<f64, OracleError> {
        let terms = [
            (Some(features.study_hours_per_week), self.study_hours_weight),
            (Some(features.attendance_rate), self.attendance_weight),
            (features.previous_average, self.previous_average_weight),
            (Some(features.failures_history as f64), self.failures_weight),
            (Some(features.participation_score), self.participation_weight),
            (features.english_score, self.english_weight),
        ];

        let (values, weights): (Vec<f64>, Vec<f64>) = terms
            .into_iter()
            .filter_map(|(value, weight)| value.map(|v| (v, weight)))
            .unzip();

        let score = Array1::from(values).dot(&Array1::from(weights)) + self.intercept;
        if !score.is_finite() {
            return Err(OracleError("model produced a non-finite score".into()));
        }
        Ok(score.clamp(0.0, 100.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> StudentFeatures {
        StudentFeatures {
            study_hours_per_week: 10.0,
            attendance_rate: 80.0,
            previous_average: Some(70.0),
            failures_history: 0,
            participation_score: 5.0,
            english_score: Some(50.0),
            marital_status: None,
        }
    }

    #[test]
    fn prediction_is_deterministic() {
        let model = RegressionModel::pretrained();
        let r = record();
        assert_eq!(model.predict(&r).unwrap(), model.predict(&r).unwrap());
    }

    #[test]
    fn more_study_hours_raise_the_score() {
        let model = RegressionModel::pretrained();
        let base = record();
        let mut harder = record();
        harder.study_hours_per_week += 5.0;
        assert!(model.predict(&harder).unwrap() > model.predict(&base).unwrap());
    }

    #[test]
    fn absent_optional_features_are_ignored() {
        let model = RegressionModel::pretrained();
        let mut r = record();
        r.previous_average = None;
        r.english_score = None;
        let score = model.predict(&r).unwrap();
        assert!(score.is_finite());
        assert!(score < model.predict(&record()).unwrap());
    }

    #[test]
    fn score_stays_in_percentage_range() {
        let model = RegressionModel::pretrained();
        let mut r = record();
        r.study_hours_per_week = 60.0;
        r.attendance_rate = 100.0;
        r.previous_average = Some(100.0);
        r.participation_score = 10.0;
        r.english_score = Some(100.0);
        assert!(model.predict(&r).unwrap() <= 100.0);

        r = record();
        r.failures_history = 30;
        r.study_hours_per_week = 0.0;
        r.attendance_rate = 0.0;
        r.previous_average = Some(0.0);
        r.participation_score = 0.0;
        r.english_score = Some(0.0);
        assert!(model.predict(&r).unwrap() >= 0.0);
    }
}
