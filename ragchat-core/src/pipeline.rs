//! Chat pipeline orchestrator.
//!
//! [`ChatPipeline`] runs one request through validate → retrieve → prompt →
//! generate → score. Stages run strictly in order and the first failure
//! aborts the request. The role bindings are fixed when the pipeline is
//! built.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragchat_core::{ChatPipeline, ChatRequest, PipelineConfig, ResolvedRoles};
//!
//! let pipeline = ChatPipeline::new(ResolvedRoles::fallbacks(), PipelineConfig::default());
//! let response = pipeline.chat(&ChatRequest::new("What is RAG?")).await?;
//! ```

use std::time::Instant;

use tracing::{error, info, warn};

use crate::config::{PipelineConfig, RetrieverFailurePolicy};
use crate::document::Document;
use crate::error::{ChatError, Result, RoleError};
use crate::evaluation::EvaluationScorer;
use crate::lexical::LexicalRetriever;
use crate::protocol::{ChatRequest, ChatResponse};
use crate::registry::{ResolvedRoles, RoleSources};
use crate::role::{Retriever, Role};

/// Answer used when the generator produces nothing.
pub const NO_ANSWER: &str = "I couldn't generate an answer.";

fn stage_error(stage: Role, source: RoleError) -> ChatError {
    error!(%stage, error = %source, "pipeline stage failed");
    ChatError::Stage { stage, source }
}

/// The request pipeline shared by every handler.
pub struct ChatPipeline {
    roles: ResolvedRoles,
    config: PipelineConfig,
    scorer: EvaluationScorer,
    degraded_retriever: LexicalRetriever,
}

impl ChatPipeline {
    pub fn new(roles: ResolvedRoles, config: PipelineConfig) -> Self {
        let scorer = EvaluationScorer::new(config.results_path.clone());
        Self { roles, config, scorer, degraded_retriever: LexicalRetriever::default() }
    }

    pub fn sources(&self) -> RoleSources {
        self.roles.sources()
    }

    /// Answer one chat request and overwrite the evaluation results file.
    ///
    /// # Errors
    ///
    /// - [`ChatError::Validation`] if the trimmed message is empty. No stage
    ///   runs and nothing is written.
    /// - [`ChatError::Stage`] if a role implementation fails.
    /// - [`ChatError::Persist`] if the results file cannot be written.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let started = Instant::now();

        let message = request.trimmed_message();
        if message.is_empty() {
            return Err(ChatError::Validation);
        }

        let contexts = self.retrieve(message).await?;

        let prompt = self
            .roles
            .prompt_builder
            .implementation
            .build_prompt(message, &contexts)
            .await
            .map_err(|e| stage_error(Role::PromptBuilder, e))?;

        let answer = self.generate(&prompt).await?;

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        let eval_results = self.scorer.evaluate(&answer, &contexts, latency_ms).await?;

        info!(
            context_count = contexts.len(),
            latency_ms = eval_results.latency_ms,
            overall = eval_results.overall.score,
            "chat request completed"
        );

        Ok(ChatResponse::new(answer, request.tags().to_vec(), eval_results))
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        let bound = &self.roles.retriever;
        let top_k = self.config.top_k;

        let outcome = match bound.implementation.retrieve(query, Some(top_k)).await {
            Err(RoleError::TopKUnsupported) => {
                warn!(source = %bound.source, "retriever rejected top_k, retrying without it");
                bound.implementation.retrieve(query, None).await
            }
            outcome => outcome,
        };

        match outcome {
            Ok(documents) => Ok(documents),
            Err(e)
                if self.config.retriever_failure == RetrieverFailurePolicy::Fallback
                    && !bound.source.is_fallback() =>
            {
                warn!(source = %bound.source, error = %e, "retriever failed, using lexical fallback");
                self.degraded_retriever
                    .retrieve(query, Some(top_k))
                    .await
                    .map_err(|e| stage_error(Role::Retriever, e))
            }
            Err(e) => Err(stage_error(Role::Retriever, e)),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let output = self
            .roles
            .generator
            .implementation
            .generate(prompt)
            .await
            .map_err(|e| stage_error(Role::Generator, e))?;

        let answer = output.as_deref().map(str::trim).unwrap_or_default();
        if answer.is_empty() {
            warn!(source = %self.roles.generator.source, "generator returned no text");
            return Ok(NO_ANSWER.to_string());
        }
        Ok(answer.to_string())
    }
}
