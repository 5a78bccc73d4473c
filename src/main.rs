use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use bunk_advisor::batch;
use bunk_advisor::report;
use bunk_advisor::{AcademicSnapshot, LogisticModel, LogisticScorer, RiskScorer, Scorer, Strategy};

const MODEL_ENV: &str = "BUNK_ADVISOR_MODEL";

#[derive(Parser)]
#[command(name = "bunk-advisor", version)]
#[command(about = "Scores whether skipping an upcoming class is safe", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single academic snapshot
    Score {
        /// Attendance percentage (0-100)
        #[arg(long, allow_negative_numbers = true)]
        attendance: f64,
        /// Syllabus completion percentage (0-100)
        #[arg(long, allow_negative_numbers = true)]
        syllabus: f64,
        /// Days until the next exam; omit when none is scheduled
        #[arg(long, allow_negative_numbers = true)]
        days: Option<i64>,
        /// Average past exam score percentage; omit when there is no history
        #[arg(long, allow_negative_numbers = true)]
        performance: Option<f64>,
        #[arg(long, value_enum, default_value_t = Strategy::Rules)]
        strategy: Strategy,
        /// Trained logistic model artifact (JSON)
        #[arg(long)]
        model: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Score every row of a CSV file
    Batch {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, value_enum, default_value_t = Strategy::Rules)]
        strategy: Strategy,
        #[arg(long)]
        model: Option<PathBuf>,
        /// Write a markdown report here instead of printing a summary
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Describe the logistic model in use
    ModelInfo {
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

fn resolve_model(flag: Option<PathBuf>) -> anyhow::Result<LogisticModel> {
    let path = flag.or_else(|| std::env::var_os(MODEL_ENV).map(PathBuf::from));

    match path {
        Some(path) => {
            let model = LogisticModel::from_path(&path)
                .with_context(|| format!("failed to load model from {}", path.display()))?;
            tracing::info!(path = %path.display(), version = %model.version, "loaded model artifact");
            Ok(model)
        }
        None => Ok(LogisticModel::reference()),
    }
}

/// Where a model artifact was named even though the rule cascade ignores it.
fn unused_model_source(
    strategy: Strategy,
    flag: Option<&Path>,
    env: Option<&std::ffi::OsStr>,
) -> Option<String> {
    if strategy != Strategy::Rules {
        return None;
    }

    match (flag, env) {
        (Some(path), _) => Some(format!("--model {}", path.display())),
        (None, Some(path)) => Some(format!("{MODEL_ENV}={}", Path::new(path).display())),
        (None, None) => None,
    }
}

fn build_scorer(strategy: Strategy, model: Option<PathBuf>) -> anyhow::Result<RiskScorer> {
    let env = std::env::var_os(MODEL_ENV);
    if let Some(source) = unused_model_source(strategy, model.as_deref(), env.as_deref()) {
        tracing::warn!(%source, "model artifact ignored by the rules strategy");
    }

    match strategy {
        Strategy::Rules => Ok(RiskScorer::rules()),
        Strategy::Logistic => Ok(RiskScorer::logistic(LogisticScorer::new(resolve_model(
            model,
        )?))),
    }
}

fn write_output(out: &Path, contents: &str) -> anyhow::Result<()> {
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bunk_advisor=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            attendance,
            syllabus,
            days,
            performance,
            strategy,
            model,
            json,
        } => {
            let scorer = build_scorer(strategy, model)?;
            let snapshot = AcademicSnapshot::new(attendance, days, syllabus, performance);
            let prediction = scorer.score(&snapshot);

            if json {
                let payload = serde_json::json!({
                    "input": snapshot,
                    "prediction": prediction,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print!("{}", report::render_prediction(&snapshot, &prediction));
            }
        }
        Commands::Batch {
            csv,
            strategy,
            model,
            out,
            json,
        } => {
            let scorer = build_scorer(strategy, model)?;
            let outcome = batch::score_csv(&csv, &scorer)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else if let Some(out) = out {
                let source = csv.display().to_string();
                write_output(&out, &report::build_batch_report(&source, &outcome))?;
                println!("Report written to {}.", out.display());
            } else {
                println!(
                    "Scored {} rows from {} ({} rejected).",
                    outcome.total_processed(),
                    csv.display(),
                    outcome.total_errors()
                );
                for result in outcome.results.iter() {
                    println!(
                        "- {}: {} ({:.2})",
                        result.label, result.prediction.recommendation, result.prediction.confidence
                    );
                }
                for error in outcome.errors.iter() {
                    println!("- row {} rejected: {}", error.index, error.message);
                }
            }
        }
        Commands::ModelInfo { model } => {
            let model = resolve_model(model)?;
            println!("{}", serde_json::to_string_pretty(&model.model_info())?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn flags_model_named_for_rules_strategy() {
        let source = unused_model_source(Strategy::Rules, Some(Path::new("model.json")), None);
        assert_eq!(source.as_deref(), Some("--model model.json"));

        let source = unused_model_source(Strategy::Rules, None, Some(OsStr::new("trained.json")));
        assert_eq!(source.as_deref(), Some("BUNK_ADVISOR_MODEL=trained.json"));
    }

    #[test]
    fn model_is_expected_for_logistic_strategy() {
        assert_eq!(
            unused_model_source(Strategy::Logistic, Some(Path::new("model.json")), None),
            None
        );
        assert_eq!(unused_model_source(Strategy::Rules, None, None), None);
    }
}
