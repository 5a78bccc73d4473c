use std::fmt::Write;

use crate::batch::BatchOutcome;
use crate::models::{AcademicSnapshot, Prediction, Recommendation};

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSummary {
    pub recommendation: Recommendation,
    pub count: usize,
    pub avg_confidence: f64,
}

pub fn summarize_by_recommendation(outcome: &BatchOutcome) -> Vec<RecommendationSummary> {
    let mut map: std::collections::BTreeMap<Recommendation, (usize, f64)> =
        std::collections::BTreeMap::new();

    for result in &outcome.results {
        let entry = map
            .entry(result.prediction.recommendation)
            .or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += result.prediction.confidence;
    }

    let mut summaries: Vec<RecommendationSummary> = map
        .into_iter()
        .map(|(recommendation, (count, total_confidence))| RecommendationSummary {
            recommendation,
            count,
            avg_confidence: if count == 0 {
                0.0
            } else {
                total_confidence / count as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

fn format_days(snapshot: &AcademicSnapshot) -> String {
    match snapshot.days_until_exam() {
        Some(days) => days.to_string(),
        None => "no exam scheduled".to_string(),
    }
}

fn format_performance(snapshot: &AcademicSnapshot) -> String {
    match snapshot.past_performance() {
        Some(value) => format!("{value:.1}%"),
        None => format!("{:.1}% (no exam history)", snapshot.performance_or_default()),
    }
}

pub fn render_prediction(snapshot: &AcademicSnapshot, prediction: &Prediction) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Should I Bunk?");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Inputs");
    let _ = writeln!(
        output,
        "- Attendance: {:.1}%",
        snapshot.attendance_percentage()
    );
    let _ = writeln!(output, "- Days until exam: {}", format_days(snapshot));
    let _ = writeln!(
        output,
        "- Syllabus completion: {:.1}%",
        snapshot.syllabus_completion()
    );
    let _ = writeln!(output, "- Past performance: {}", format_performance(snapshot));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Advice");
    let _ = writeln!(
        output,
        "**{}** (risk {}, confidence {:.0}%, {} strategy)",
        prediction.recommendation,
        prediction.risk_level,
        prediction.confidence * 100.0,
        prediction.strategy.as_str()
    );
    if let Some(probability) = prediction.probability_safe {
        let _ = writeln!(output, "Probability safe: {:.1}%", probability * 100.0);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", prediction.explanation);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Factors");
    for factor in &prediction.factors {
        let _ = writeln!(output, "- {factor}");
    }

    output
}

pub fn build_batch_report(source: &str, outcome: &BatchOutcome) -> String {
    let summaries = summarize_by_recommendation(outcome);

    let mut output = String::new();

    let _ = writeln!(output, "# Bunk Risk Batch Report");
    let _ = writeln!(
        output,
        "Generated from {} ({} scored, {} rejected)",
        source,
        outcome.total_processed(),
        outcome.total_errors()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendation Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No rows scored.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} rows (avg confidence {:.2})",
                summary.recommendation, summary.count, summary.avg_confidence
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Rows");

    if outcome.results.is_empty() {
        let _ = writeln!(output, "No rows scored.");
    } else {
        for result in outcome.results.iter() {
            let _ = writeln!(
                output,
                "- {} (attendance {:.1}%, exam in {}, syllabus {:.1}%): {} at {:.2} - {}",
                result.label,
                result.snapshot.attendance_percentage(),
                format_days(&result.snapshot),
                result.snapshot.syllabus_completion(),
                result.prediction.recommendation,
                result.prediction.confidence,
                result.prediction.factors.join(", ")
            );
        }
    }

    if !outcome.errors.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Rejected Rows");
        for error in outcome.errors.iter() {
            let _ = writeln!(output, "- row {}: {}", error.index, error.message);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::score_reader;
    use crate::risk::{RuleCascade, Scorer};

    fn sample_outcome() -> BatchOutcome {
        let csv = "label,attendance_percentage,days_until_exam,syllabus_completion,past_performance\n\
                   maths,90,1,95,80\n\
                   physics,60,30,40,\n\
                   history,88,40,75,82\n\
                   biology,x,4,50,60\n";
        score_reader(csv.as_bytes(), &RuleCascade).unwrap()
    }

    #[test]
    fn summary_orders_by_count() {
        let summaries = summarize_by_recommendation(&sample_outcome());
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].recommendation, Recommendation::NotSafe);
        assert_eq!(summaries[0].count, 2);
        assert!((summaries[0].avg_confidence - (0.95 + 0.70) / 2.0).abs() < 1e-9);
        assert_eq!(summaries[1].recommendation, Recommendation::SafeToBunk);
    }

    #[test]
    fn batch_report_lists_rows_and_rejections() {
        let report = build_batch_report("subjects.csv", &sample_outcome());
        assert!(report.starts_with("# Bunk Risk Batch Report"));
        assert!(report.contains("Generated from subjects.csv (3 scored, 1 rejected)"));
        assert!(report.contains("- Not Safe: 2 rows"));
        assert!(report.contains("- history (attendance 88.0%, exam in 40, syllabus 75.0%): Safe to Bunk at 0.80"));
        assert!(report.contains("## Rejected Rows"));
        assert!(report.contains("- row 3:"));
    }

    #[test]
    fn empty_batch_report_says_so() {
        let report = build_batch_report("empty.csv", &BatchOutcome::default());
        assert!(report.contains("No rows scored."));
        assert!(!report.contains("## Rejected Rows"));
    }

    #[test]
    fn single_prediction_shows_inputs_alongside_advice() {
        let snapshot = AcademicSnapshot::new(72.0, None, 55.0, None);
        let prediction = RuleCascade.score(&snapshot);
        let rendered = render_prediction(&snapshot, &prediction);

        assert!(rendered.contains("- Days until exam: no exam scheduled"));
        assert!(rendered.contains("- Past performance: 70.0% (no exam history)"));
        assert!(rendered.contains("**Not Safe** (risk high, confidence 70%, rules strategy)"));
        assert!(rendered.contains("- Low attendance (below 75%)"));
        assert!(!rendered.contains("Probability safe"));
    }
}
