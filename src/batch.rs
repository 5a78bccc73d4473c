use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::{AcademicSnapshot, Prediction};
use crate::risk::Scorer;

pub const MAX_BATCH_ROWS: usize = 100;

#[derive(Debug, Deserialize)]
struct CsvRow {
    label: String,
    attendance_percentage: f64,
    days_until_exam: Option<i64>,
    syllabus_completion: f64,
    past_performance: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub index: usize,
    pub label: String,
    pub snapshot: AcademicSnapshot,
    pub prediction: Prediction,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub results: Vec<BatchResult>,
    pub errors: Vec<RowError>,
}

impl BatchOutcome {
    pub fn total_processed(&self) -> usize {
        self.results.len()
    }

    pub fn total_errors(&self) -> usize {
        self.errors.len()
    }
}

pub fn score_csv(csv_path: &Path, scorer: &dyn Scorer) -> anyhow::Result<BatchOutcome> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    score_reader(file, scorer)
}

/// Scores every row, recording bad rows instead of aborting the batch.
/// Reading stops at [`MAX_BATCH_ROWS`] with a single limit error.
pub fn score_reader<R: Read>(input: R, scorer: &dyn Scorer) -> anyhow::Result<BatchOutcome> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    reader.headers().context("failed to read CSV header")?;

    let mut outcome = BatchOutcome::default();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        if index >= MAX_BATCH_ROWS {
            tracing::warn!(limit = MAX_BATCH_ROWS, "batch truncated");
            outcome.errors.push(RowError {
                index,
                message: format!("batch limit of {MAX_BATCH_ROWS} rows exceeded"),
            });
            break;
        }

        let row = match result {
            Ok(row) => row,
            Err(err) => {
                tracing::warn!(index, "skipping malformed row: {err}");
                outcome.errors.push(RowError {
                    index,
                    message: err.to_string(),
                });
                continue;
            }
        };

        let snapshot = AcademicSnapshot::new(
            row.attendance_percentage,
            row.days_until_exam,
            row.syllabus_completion,
            row.past_performance,
        );
        let prediction = scorer.score(&snapshot);

        outcome.results.push(BatchResult {
            index,
            label: row.label,
            snapshot,
            prediction,
        });
    }

    tracing::info!(
        processed = outcome.total_processed(),
        errors = outcome.total_errors(),
        strategy = scorer.strategy().as_str(),
        "batch scored"
    );

    Ok(outcome)
}
