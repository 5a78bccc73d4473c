//! Advisory scoring for whether skipping an upcoming class is safe.
//!
//! Callers aggregate stored attendance, exam, and syllabus records into an
//! [`AcademicSnapshot`] and hand it to a [`Scorer`]. The rule cascade is the
//! normative strategy; the logistic model is a drop-in alternative.

pub mod batch;
pub mod fallback;
pub mod features;
pub mod logistic;
pub mod models;
pub mod report;
pub mod risk;

pub use logistic::{LogisticModel, LogisticScorer, ModelError};
pub use models::{AcademicSnapshot, Prediction, Recommendation, RiskLevel};
pub use risk::{RiskScorer, RuleCascade, Scorer, Strategy};
