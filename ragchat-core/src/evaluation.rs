//! Heuristic answer scoring and the evaluation results file.
//!
//! The scores are crude stand-ins meant for smoke testing. Faithfulness only
//! checks that some context was retrieved, and completeness only looks at
//! answer length. The results file is rewritten in full on every request.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::Document;
use crate::error::{ChatError, Result};

const GROUNDED_FAITHFULNESS: f64 = 0.8;
const UNGROUNDED_FAITHFULNESS: f64 = 0.5;
const COMPLETENESS_CAP: f64 = 0.9;

/// Aggregate score object, serialized as `{"score": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallScore {
    pub score: f64,
}

/// Metrics for one answered request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub overall: OverallScore,
    pub faithfulness: f64,
    pub completeness: f64,
    pub latency_ms: u64,
    pub tokens_approx: usize,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Computes [`EvaluationResult`]s and writes them to a results file.
#[derive(Debug, Clone)]
pub struct EvaluationScorer {
    path: PathBuf,
}

impl EvaluationScorer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Scores an answer without touching the filesystem.
    pub fn score(answer: &str, contexts: &[Document], latency_ms: f64) -> EvaluationResult {
        let faithfulness =
            if contexts.is_empty() { UNGROUNDED_FAITHFULNESS } else { GROUNDED_FAITHFULNESS };
        let completeness = COMPLETENESS_CAP.min(0.5 + answer.chars().count() as f64 / 500.0);
        let overall = 0.5 * faithfulness + 0.5 * completeness;

        EvaluationResult {
            overall: OverallScore { score: round4(overall) },
            faithfulness: round4(faithfulness),
            completeness: round4(completeness),
            latency_ms: latency_ms.max(0.0) as u64,
            tokens_approx: answer.split_whitespace().count(),
        }
    }

    /// Overwrites the results file with `result` as 2-space indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Persist`] if the file cannot be written.
    pub async fn persist(&self, result: &EvaluationResult) -> Result<()> {
        let persist_error = |source: std::io::Error| {
            error!(path = %self.path.display(), error = %source, "failed to write evaluation results");
            ChatError::Persist { path: self.path.display().to_string(), source }
        };

        let json = serde_json::to_string_pretty(result).map_err(|e| persist_error(e.into()))?;
        tokio::fs::write(&self.path, json).await.map_err(persist_error)?;
        debug!(path = %self.path.display(), "evaluation results written");
        Ok(())
    }

    /// [`score`](Self::score) followed by [`persist`](Self::persist).
    pub async fn evaluate(
        &self,
        answer: &str,
        contexts: &[Document],
        latency_ms: f64,
    ) -> Result<EvaluationResult> {
        let result = Self::score(answer, contexts, latency_ms);
        self.persist(&result).await?;
        Ok(result)
    }
}
