use chrono::NaiveDate;

use crate::models::AcademicSnapshot;

/// Horizon, in days, at which an upcoming exam starts adding urgency.
pub const URGENCY_HORIZON_DAYS: f64 = 30.0;

pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

pub fn clamp_days(days: i64) -> u32 {
    days.clamp(0, u32::MAX as i64) as u32
}

/// `part / total * 100`, or `None` when there is nothing to divide by.
pub fn percentage(part: u32, total: u32) -> Option<f64> {
    if total == 0 {
        return None;
    }

    Some(clamp_percentage(part as f64 / total as f64 * 100.0))
}

/// Mean percentage across `(obtained, max)` exam results.
pub fn average_score(scores: &[(f64, f64)]) -> Option<f64> {
    let percentages: Vec<f64> = scores
        .iter()
        .filter(|(_, max)| *max > 0.0)
        .map(|(obtained, max)| clamp_percentage(obtained / max * 100.0))
        .collect();

    if percentages.is_empty() {
        return None;
    }

    Some(percentages.iter().sum::<f64>() / percentages.len() as f64)
}

/// Days from `today` to the nearest exam on or after it.
pub fn days_until_exam(today: NaiveDate, exams: &[NaiveDate]) -> Option<i64> {
    exams
        .iter()
        .filter(|exam| **exam >= today)
        .map(|exam| (*exam - today).num_days())
        .min()
}

/// Exam urgency in `[0, 1]`: saturated inside the horizon, decaying past it.
pub fn exam_urgency(days: u32) -> f64 {
    if days == 0 {
        return 1.0;
    }

    (URGENCY_HORIZON_DAYS / days as f64).clamp(0.0, 1.0)
}

/// Snapshot features scaled to `[0, 1]` for weighted scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedFeatures {
    pub attendance: f64,
    pub exam_urgency: f64,
    pub syllabus: f64,
    pub performance: f64,
    pub attendance_syllabus: f64,
}

impl NormalizedFeatures {
    pub const NAMES: [&'static str; 5] = [
        "attendance_normalized",
        "exam_urgency",
        "syllabus_normalized",
        "performance_normalized",
        "attendance_syllabus_interaction",
    ];

    pub fn from_snapshot(snapshot: &AcademicSnapshot) -> Self {
        let attendance = snapshot.attendance_percentage() / 100.0;
        let syllabus = snapshot.syllabus_completion() / 100.0;

        Self {
            attendance,
            exam_urgency: exam_urgency(snapshot.effective_days()),
            syllabus,
            performance: snapshot.performance_or_default() / 100.0,
            attendance_syllabus: attendance * syllabus,
        }
    }

    /// Values in the same order as [`NormalizedFeatures::NAMES`].
    pub fn to_array(&self) -> [f64; 5] {
        [
            self.attendance,
            self.exam_urgency,
            self.syllabus,
            self.performance,
            self.attendance_syllabus,
        ]
    }
}
