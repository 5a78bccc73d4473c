//! Remote-first scoring with the local scorer as the last resort.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::{AcademicSnapshot, Prediction};
use crate::risk::{RiskScorer, Scorer};

/// An externally hosted model that answers the same question.
#[async_trait]
pub trait RemoteScorer: Send + Sync {
    fn name(&self) -> &str;

    async fn score(&self, snapshot: &AcademicSnapshot) -> anyhow::Result<Prediction>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scored {
    pub source: Source,
    pub prediction: Prediction,
}

fn is_consistent(prediction: &Prediction) -> bool {
    (0.0..=1.0).contains(&prediction.confidence)
        && prediction.risk_level == prediction.recommendation.risk_level()
}

/// Asks `remote` first and falls back to `local` on error, timeout, or an
/// answer with a confidence outside `[0, 1]` or a mismatched risk level.
pub async fn score_with_fallback(
    remote: &dyn RemoteScorer,
    local: &RiskScorer,
    snapshot: &AcademicSnapshot,
    timeout: Duration,
) -> Scored {
    match tokio::time::timeout(timeout, remote.score(snapshot)).await {
        Ok(Ok(prediction)) if is_consistent(&prediction) => {
            return Scored {
                source: Source::Remote,
                prediction,
            };
        }
        Ok(Ok(prediction)) => {
            tracing::warn!(
                remote = remote.name(),
                confidence = prediction.confidence,
                risk_level = %prediction.risk_level,
                recommendation = %prediction.recommendation,
                "remote scorer returned an inconsistent prediction, using local scorer"
            );
        }
        Ok(Err(err)) => {
            tracing::warn!(remote = remote.name(), "remote scorer failed: {err:#}");
        }
        Err(_) => {
            tracing::warn!(
                remote = remote.name(),
                timeout_ms = timeout.as_millis() as u64,
                "remote scorer timed out"
            );
        }
    }

    Scored {
        source: Source::Local,
        prediction: local.score(snapshot),
    }
}
