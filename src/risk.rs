use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::logistic::LogisticScorer;
use crate::models::{AcademicSnapshot, Prediction, Recommendation};

pub const GOOD_STANDING_FACTOR: &str = "Good attendance and performance";

/// Which scoring algorithm produced, or should produce, a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Rules,
    Logistic,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Rules => "rules",
            Strategy::Logistic => "logistic",
        }
    }
}

pub trait Scorer {
    fn strategy(&self) -> Strategy;

    /// Never fails: every snapshot gets some advice.
    fn score(&self, snapshot: &AcademicSnapshot) -> Prediction;
}

/// Exam-proximity band, checked before attendance or syllabus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Imminent,
    VeryClose,
    Close,
    Distant,
}

impl Tier {
    pub fn for_days(days: u32) -> Self {
        match days {
            0..=2 => Tier::Imminent,
            3..=5 => Tier::VeryClose,
            6..=10 => Tier::Close,
            _ => Tier::Distant,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Tier::Imminent => "Exam too close - critical preparation time",
            Tier::VeryClose => {
                "Exam within 5 days - only near-perfect preparation makes skipping tolerable"
            }
            Tier::Close => "Exam within 10 days - attendance and syllabus must both be strong",
            Tier::Distant => "No exam pressure - attendance and syllabus decide",
        }
    }
}

/// The tiered rule cascade keyed on days until the next exam.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleCascade;

impl RuleCascade {
    pub fn new() -> Self {
        Self
    }

    pub fn decide(snapshot: &AcademicSnapshot) -> (Tier, Recommendation, f64) {
        let attendance = snapshot.attendance_percentage();
        let syllabus = snapshot.syllabus_completion();
        let tier = Tier::for_days(snapshot.effective_days());

        let (recommendation, confidence) = match tier {
            Tier::Imminent => (Recommendation::NotSafe, 0.95),
            Tier::VeryClose => {
                if attendance >= 90.0 && syllabus >= 95.0 {
                    (Recommendation::ModerateRisk, 0.70)
                } else {
                    (Recommendation::NotSafe, 0.85)
                }
            }
            Tier::Close => {
                if attendance >= 85.0 && syllabus >= 80.0 {
                    (Recommendation::ModerateRisk, 0.65)
                } else {
                    (Recommendation::NotSafe, 0.75)
                }
            }
            Tier::Distant => {
                if attendance >= 85.0 && syllabus >= 70.0 {
                    (Recommendation::SafeToBunk, 0.80)
                } else if attendance >= 75.0 && syllabus >= 60.0 {
                    (Recommendation::ModerateRisk, 0.60)
                } else {
                    (Recommendation::NotSafe, 0.70)
                }
            }
        };

        (tier, recommendation, confidence)
    }
}

impl Scorer for RuleCascade {
    fn strategy(&self) -> Strategy {
        Strategy::Rules
    }

    fn score(&self, snapshot: &AcademicSnapshot) -> Prediction {
        let (tier, recommendation, confidence) = Self::decide(snapshot);
        tracing::debug!(
            ?tier,
            days = snapshot.effective_days(),
            %recommendation,
            "rule cascade matched"
        );

        let explanation = format!("{}. {}", tier.headline(), signal_notes(snapshot).join("; "));
        Prediction::new(
            Strategy::Rules,
            recommendation,
            confidence,
            risk_factors(snapshot),
            explanation,
        )
    }
}

/// Scorer picked at runtime; both strategies share the same contract.
#[derive(Debug, Clone)]
pub enum RiskScorer {
    Rules(RuleCascade),
    Logistic(LogisticScorer),
}

impl RiskScorer {
    pub fn rules() -> Self {
        RiskScorer::Rules(RuleCascade::new())
    }

    pub fn logistic(scorer: LogisticScorer) -> Self {
        RiskScorer::Logistic(scorer)
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::rules()
    }
}

impl Scorer for RiskScorer {
    fn strategy(&self) -> Strategy {
        match self {
            RiskScorer::Rules(inner) => inner.strategy(),
            RiskScorer::Logistic(inner) => inner.strategy(),
        }
    }

    fn score(&self, snapshot: &AcademicSnapshot) -> Prediction {
        match self {
            RiskScorer::Rules(inner) => inner.score(snapshot),
            RiskScorer::Logistic(inner) => inner.score(snapshot),
        }
    }
}

/// Signals that count against skipping, in a fixed order.
pub fn risk_factors(snapshot: &AcademicSnapshot) -> Vec<String> {
    let mut factors = Vec::new();

    if snapshot.effective_days() <= 7 {
        factors.push("Exam is very close (within 7 days)".to_string());
    }
    if snapshot.attendance_percentage() < 75.0 {
        factors.push("Low attendance (below 75%)".to_string());
    }
    if snapshot.syllabus_completion() < 50.0 {
        factors.push("Low syllabus completion (below 50%)".to_string());
    }
    if snapshot.past_performance().is_some_and(|value| value < 60.0) {
        factors.push("Weak past performance (below 60%)".to_string());
    }

    if factors.is_empty() {
        factors.push(GOOD_STANDING_FACTOR.to_string());
    }

    factors
}

/// One short note per signal describing where it stands.
pub fn signal_notes(snapshot: &AcademicSnapshot) -> Vec<String> {
    let attendance = snapshot.attendance_percentage();
    let syllabus = snapshot.syllabus_completion();

    let attendance_note = if attendance >= 85.0 {
        format!("Good attendance ({attendance:.1}%)")
    } else if attendance >= 75.0 {
        format!("Moderate attendance ({attendance:.1}%)")
    } else {
        format!("Low attendance ({attendance:.1}%)")
    };

    let exam_note = match snapshot.days_until_exam() {
        None => "No upcoming exams scheduled".to_string(),
        Some(0..=1) => "Exam is today or tomorrow".to_string(),
        Some(days @ 2..=5) => format!("Exam is only {days} days away"),
        Some(days @ 6..=10) => format!("Exam is {days} days away"),
        Some(days) => format!("Exam is {days} days away - safe distance"),
    };

    let syllabus_note = if syllabus >= 80.0 {
        format!("Good syllabus progress ({syllabus:.1}%)")
    } else if syllabus >= 60.0 {
        format!("Moderate syllabus progress ({syllabus:.1}%)")
    } else {
        format!("Low syllabus progress ({syllabus:.1}%)")
    };

    vec![attendance_note, exam_note, syllabus_note]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;

    fn snapshot(attendance: f64, syllabus: f64, days: i64, performance: f64) -> AcademicSnapshot {
        AcademicSnapshot::new(attendance, Some(days), syllabus, Some(performance))
    }

    fn assert_outcome(prediction: &Prediction, recommendation: Recommendation, confidence: f64) {
        assert_eq!(prediction.recommendation, recommendation);
        assert!(
            (prediction.confidence - confidence).abs() < 1e-9,
            "expected confidence {confidence}, got {}",
            prediction.confidence
        );
        assert_eq!(prediction.risk_level, recommendation.risk_level());
    }

    #[test]
    fn tiers_follow_day_boundaries() {
        assert_eq!(Tier::for_days(0), Tier::Imminent);
        assert_eq!(Tier::for_days(2), Tier::Imminent);
        assert_eq!(Tier::for_days(3), Tier::VeryClose);
        assert_eq!(Tier::for_days(5), Tier::VeryClose);
        assert_eq!(Tier::for_days(6), Tier::Close);
        assert_eq!(Tier::for_days(10), Tier::Close);
        assert_eq!(Tier::for_days(11), Tier::Distant);
    }

    #[test]
    fn imminent_exam_overrides_perfect_record() {
        let prediction = RuleCascade.score(&snapshot(100.0, 100.0, 1, 100.0));
        assert_outcome(&prediction, Recommendation::NotSafe, 0.95);
        assert_eq!(prediction.risk_level, RiskLevel::High);
        assert!(prediction
            .explanation
            .starts_with("Exam too close - critical preparation time"));
    }

    #[test]
    fn day_two_is_imminent_and_day_three_is_not() {
        let perfect_two = RuleCascade.score(&snapshot(100.0, 100.0, 2, 90.0));
        assert_outcome(&perfect_two, Recommendation::NotSafe, 0.95);

        let perfect_three = RuleCascade.score(&snapshot(100.0, 100.0, 3, 90.0));
        assert_outcome(&perfect_three, Recommendation::ModerateRisk, 0.70);
    }

    #[test]
    fn very_close_exam_needs_near_perfect_preparation() {
        let at_threshold = RuleCascade.score(&snapshot(90.0, 95.0, 5, 80.0));
        assert_outcome(&at_threshold, Recommendation::ModerateRisk, 0.70);

        let one_point_short = RuleCascade.score(&snapshot(89.0, 95.0, 5, 80.0));
        assert_outcome(&one_point_short, Recommendation::NotSafe, 0.85);
    }

    #[test]
    fn close_exam_requires_attendance_and_syllabus() {
        let strong = RuleCascade.score(&snapshot(85.0, 80.0, 10, 70.0));
        assert_outcome(&strong, Recommendation::ModerateRisk, 0.65);

        let weak_syllabus = RuleCascade.score(&snapshot(95.0, 79.0, 8, 70.0));
        assert_outcome(&weak_syllabus, Recommendation::NotSafe, 0.75);
    }

    #[test]
    fn distant_exam_bands() {
        let safe = RuleCascade.score(&snapshot(85.0, 70.0, 30, 70.0));
        assert_outcome(&safe, Recommendation::SafeToBunk, 0.80);

        let moderate = RuleCascade.score(&snapshot(75.0, 60.0, 30, 70.0));
        assert_outcome(&moderate, Recommendation::ModerateRisk, 0.60);

        let poor = RuleCascade.score(&snapshot(50.0, 40.0, 30, 70.0));
        assert_outcome(&poor, Recommendation::NotSafe, 0.70);
    }

    #[test]
    fn no_exam_scheduled_is_scored_as_distant() {
        let snapshot = AcademicSnapshot::new(90.0, None, 75.0, None);
        let prediction = RuleCascade.score(&snapshot);
        assert_outcome(&prediction, Recommendation::SafeToBunk, 0.80);
        assert!(prediction.explanation.contains("No upcoming exams scheduled"));
    }

    #[test]
    fn past_performance_does_not_move_the_cascade() {
        let strong = RuleCascade.score(&snapshot(80.0, 65.0, 20, 95.0));
        let weak = RuleCascade.score(&snapshot(80.0, 65.0, 20, 20.0));
        let unknown = RuleCascade.score(&AcademicSnapshot::new(80.0, Some(20), 65.0, None));

        assert_eq!(strong.recommendation, weak.recommendation);
        assert_eq!(strong.confidence, weak.confidence);
        assert_eq!(strong.recommendation, unknown.recommendation);
    }

    #[test]
    fn factors_name_each_failed_threshold_in_order() {
        let prediction = RuleCascade.score(&snapshot(60.0, 30.0, 4, 50.0));
        assert_eq!(
            prediction.factors,
            vec![
                "Exam is very close (within 7 days)",
                "Low attendance (below 75%)",
                "Low syllabus completion (below 50%)",
                "Weak past performance (below 60%)",
            ]
        );
    }

    #[test]
    fn healthy_snapshot_gets_single_positive_factor() {
        let prediction = RuleCascade.score(&snapshot(92.0, 85.0, 40, 88.0));
        assert_eq!(prediction.factors, vec![GOOD_STANDING_FACTOR]);
    }

    #[test]
    fn explanation_combines_headline_and_signal_notes() {
        let prediction = RuleCascade.score(&snapshot(78.0, 65.0, 7, 70.0));
        assert_eq!(
            prediction.explanation,
            "Exam within 10 days - attendance and syllabus must both be strong. \
             Moderate attendance (78.0%); Exam is 7 days away; Moderate syllabus progress (65.0%)"
        );
    }

    #[test]
    fn confidence_and_labels_stay_in_range_across_grid() {
        for attendance in (0..=100).step_by(5) {
            for syllabus in (0..=100).step_by(5) {
                for days in [0, 1, 2, 3, 5, 6, 10, 11, 30, 365] {
                    let prediction =
                        RuleCascade.score(&snapshot(attendance as f64, syllabus as f64, days, 70.0));
                    assert!((0.0..=1.0).contains(&prediction.confidence));
                    assert!(Recommendation::ALL.contains(&prediction.recommendation));
                    assert_eq!(prediction.risk_level, prediction.recommendation.risk_level());
                }
            }
        }
    }

    #[test]
    fn scoring_is_deterministic() {
        let input = snapshot(83.5, 71.25, 14, 66.0);
        let first = serde_json::to_string(&RuleCascade.score(&input)).unwrap();
        let second = serde_json::to_string(&RuleCascade.score(&input)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn risk_scorer_dispatches_to_selected_strategy() {
        let rules = RiskScorer::default();
        assert_eq!(rules.strategy(), Strategy::Rules);
        assert_eq!(rules.score(&snapshot(100.0, 100.0, 1, 100.0)).strategy, Strategy::Rules);

        let logistic = RiskScorer::logistic(LogisticScorer::reference());
        assert_eq!(logistic.strategy(), Strategy::Logistic);
        let prediction = logistic.score(&snapshot(100.0, 100.0, 1, 100.0));
        assert_eq!(prediction.strategy, Strategy::Logistic);
        assert!(prediction.probability_safe.is_some());
    }
}
