use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::{clamp_days, clamp_percentage};
use crate::risk::Strategy;

/// Day count used when no exam is scheduled.
pub const NO_EXAM_DAYS: u32 = 365;

/// Past performance assumed for students with no exam history yet.
pub const NEUTRAL_PERFORMANCE: f64 = 70.0;

/// The four academic signals a caller aggregates before asking for advice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicSnapshot {
    attendance_percentage: f64,
    days_until_exam: Option<u32>,
    syllabus_completion: f64,
    past_performance: Option<f64>,
}

impl AcademicSnapshot {
    /// Builds a snapshot, clamping anything out of range instead of failing.
    pub fn new(
        attendance_percentage: f64,
        days_until_exam: Option<i64>,
        syllabus_completion: f64,
        past_performance: Option<f64>,
    ) -> Self {
        Self {
            attendance_percentage: clamp_percentage(attendance_percentage),
            days_until_exam: days_until_exam.map(clamp_days),
            syllabus_completion: clamp_percentage(syllabus_completion),
            past_performance: past_performance
                .filter(|value| !value.is_nan())
                .map(clamp_percentage),
        }
    }

    pub fn attendance_percentage(&self) -> f64 {
        self.attendance_percentage
    }

    pub fn days_until_exam(&self) -> Option<u32> {
        self.days_until_exam
    }

    pub fn syllabus_completion(&self) -> f64 {
        self.syllabus_completion
    }

    pub fn past_performance(&self) -> Option<f64> {
        self.past_performance
    }

    pub fn has_upcoming_exam(&self) -> bool {
        self.days_until_exam.is_some()
    }

    /// Days until the next exam, with "no exam" read as [`NO_EXAM_DAYS`].
    pub fn effective_days(&self) -> u32 {
        self.days_until_exam.unwrap_or(NO_EXAM_DAYS)
    }

    /// Past performance, or [`NEUTRAL_PERFORMANCE`] when unknown.
    pub fn performance_or_default(&self) -> f64 {
        self.past_performance.unwrap_or(NEUTRAL_PERFORMANCE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Safe to Bunk")]
    SafeToBunk,
    #[serde(rename = "Moderate Risk")]
    ModerateRisk,
    #[serde(rename = "Not Safe")]
    NotSafe,
}

impl Recommendation {
    pub const ALL: [Recommendation; 3] = [
        Recommendation::SafeToBunk,
        Recommendation::ModerateRisk,
        Recommendation::NotSafe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::SafeToBunk => "Safe to Bunk",
            Recommendation::ModerateRisk => "Moderate Risk",
            Recommendation::NotSafe => "Not Safe",
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            Recommendation::SafeToBunk => RiskLevel::Low,
            Recommendation::ModerateRisk => RiskLevel::Medium,
            Recommendation::NotSafe => RiskLevel::High,
        }
    }

    /// Maps a probability of "safe" onto the three advisory bands.
    pub fn from_probability(probability_safe: f64) -> Self {
        if probability_safe >= 0.7 {
            Recommendation::SafeToBunk
        } else if probability_safe >= 0.4 {
            Recommendation::ModerateRisk
        } else {
            Recommendation::NotSafe
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    pub fn recommendation(&self) -> Recommendation {
        match self {
            RiskLevel::Low => Recommendation::SafeToBunk,
            RiskLevel::Medium => Recommendation::ModerateRisk,
            RiskLevel::High => Recommendation::NotSafe,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub factors: Vec<String>,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability_safe: Option<f64>,
    pub strategy: Strategy,
}

impl Prediction {
    /// Assembles a prediction whose risk level always follows the recommendation.
    pub fn new(
        strategy: Strategy,
        recommendation: Recommendation,
        confidence: f64,
        factors: Vec<String>,
        explanation: String,
    ) -> Self {
        Self {
            recommendation,
            confidence: if confidence.is_nan() {
                0.0
            } else {
                confidence.clamp(0.0, 1.0)
            },
            risk_level: recommendation.risk_level(),
            factors,
            explanation,
            probability_safe: None,
            strategy,
        }
    }

    pub fn with_probability(mut self, probability_safe: f64) -> Self {
        self.probability_safe = Some(probability_safe);
        self
    }
}
