//! Weighted logistic scoring, a smooth alternative to the rule cascade.
//!
//! ```text
//! z = b0 + b1*attendance + b2*urgency + b3*syllabus + b4*performance
//!        + b5*(attendance * syllabus)
//! P(safe) = 1 / (1 + e^-z)
//! ```
//!
//! The reference coefficients were fit offline on synthetic history. A
//! deployment that needs parity with a trained artifact loads its exact
//! coefficients with [`LogisticModel::from_path`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::NormalizedFeatures;
use crate::models::{AcademicSnapshot, Prediction, Recommendation};
use crate::risk::{risk_factors, signal_notes, RuleCascade, Scorer, Strategy};

pub const REFERENCE_INTERCEPT: f64 = 0.25;

pub const REFERENCE_COEFFICIENTS: [f64; 5] = [0.3759, -0.4284, -0.7126, 0.2141, 1.0086];

const REFERENCE_VERSION: &str = "reference-1.0";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model parameter {0} is not a finite number")]
    NonFinite(String),

    #[error("standardization scale for {0} must be a positive normal number")]
    InvalidScale(String),
}

/// Per-feature mean and scale applied before the weighted sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardization {
    pub mean: [f64; 5],
    pub scale: [f64; 5],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    #[serde(default = "default_version")]
    pub version: String,
    pub intercept: f64,
    /// Ordered as [`NormalizedFeatures::NAMES`].
    pub coefficients: [f64; 5],
    #[serde(default)]
    pub standardization: Option<Standardization>,
}

fn default_version() -> String {
    "artifact".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureWeight {
    pub feature: &'static str,
    pub coefficient: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_type: &'static str,
    pub version: String,
    pub intercept: f64,
    pub features: Vec<&'static str>,
    pub output_classes: Vec<&'static str>,
    pub feature_importance: Vec<FeatureWeight>,
    pub standardized: bool,
}

impl Default for LogisticModel {
    fn default() -> Self {
        Self::reference()
    }
}

impl LogisticModel {
    pub fn reference() -> Self {
        Self {
            version: REFERENCE_VERSION.to_string(),
            intercept: REFERENCE_INTERCEPT,
            coefficients: REFERENCE_COEFFICIENTS,
            standardization: None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let model: LogisticModel = serde_json::from_str(raw)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.intercept.is_finite() {
            return Err(ModelError::NonFinite("intercept".to_string()));
        }

        for (name, coefficient) in NormalizedFeatures::NAMES.into_iter().zip(self.coefficients) {
            if !coefficient.is_finite() {
                return Err(ModelError::NonFinite(name.to_string()));
            }
        }

        if let Some(standardization) = &self.standardization {
            for (index, name) in NormalizedFeatures::NAMES.iter().enumerate() {
                if !standardization.mean[index].is_finite() {
                    return Err(ModelError::NonFinite(format!("{name} mean")));
                }
                let scale = standardization.scale[index];
                if !scale.is_normal() || scale <= 0.0 {
                    return Err(ModelError::InvalidScale(name.to_string()));
                }
            }
        }

        Ok(())
    }

    pub fn log_odds(&self, features: &NormalizedFeatures) -> f64 {
        let mut values = features.to_array();

        if let Some(standardization) = &self.standardization {
            for (index, value) in values.iter_mut().enumerate() {
                *value = (*value - standardization.mean[index]) / standardization.scale[index];
            }
        }

        self.intercept
            + self
                .coefficients
                .iter()
                .zip(values)
                .map(|(coefficient, value)| coefficient * value)
                .sum::<f64>()
    }

    pub fn probability_safe(&self, features: &NormalizedFeatures) -> f64 {
        sigmoid(self.log_odds(features))
    }

    /// Features ordered by coefficient magnitude, strongest first.
    pub fn feature_importance(&self) -> Vec<FeatureWeight> {
        let mut weights: Vec<FeatureWeight> = NormalizedFeatures::NAMES
            .into_iter()
            .zip(self.coefficients)
            .map(|(feature, coefficient)| FeatureWeight {
                feature,
                coefficient,
            })
            .collect();

        weights.sort_by(|a, b| {
            b.coefficient
                .abs()
                .partial_cmp(&a.coefficient.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        weights
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model_type: "Logistic Regression",
            version: self.version.clone(),
            intercept: self.intercept,
            features: NormalizedFeatures::NAMES.to_vec(),
            output_classes: Recommendation::ALL.iter().map(|r| r.as_str()).collect(),
            feature_importance: self.feature_importance(),
            standardized: self.standardization.is_some(),
        }
    }
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[derive(Debug, Clone, Default)]
pub struct LogisticScorer {
    model: LogisticModel,
}

impl LogisticScorer {
    pub fn new(model: LogisticModel) -> Self {
        Self { model }
    }

    pub fn reference() -> Self {
        Self::new(LogisticModel::reference())
    }

    pub fn model(&self) -> &LogisticModel {
        &self.model
    }
}

impl Scorer for LogisticScorer {
    fn strategy(&self) -> Strategy {
        Strategy::Logistic
    }

    fn score(&self, snapshot: &AcademicSnapshot) -> Prediction {
        let features = NormalizedFeatures::from_snapshot(snapshot);
        let log_odds = self.model.log_odds(&features);
        if !log_odds.is_finite() {
            tracing::warn!(
                version = %self.model.version,
                log_odds,
                "logistic model overflowed, using rule cascade"
            );
            return RuleCascade.score(snapshot);
        }

        let probability = sigmoid(log_odds);
        let recommendation = Recommendation::from_probability(probability);
        tracing::debug!(probability, %recommendation, "logistic model scored snapshot");

        let headline = match recommendation {
            Recommendation::SafeToBunk => {
                "Your academic metrics indicate it's relatively safe to skip this class"
            }
            Recommendation::ModerateRisk => {
                "There's moderate risk in skipping this class, weigh your priorities"
            }
            Recommendation::NotSafe => "Skipping this class is not recommended",
        };
        let mut notes = signal_notes(snapshot);
        notes.push(format!(
            "Model estimate: {:.1}% chance it's safe",
            probability * 100.0
        ));

        Prediction::new(
            Strategy::Logistic,
            recommendation,
            probability.max(1.0 - probability),
            risk_factors(snapshot),
            format!("{headline}. {}", notes.join("; ")),
        )
        .with_probability(probability)
    }
}
