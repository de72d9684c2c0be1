//! Retrieve → prompt → generate chat pipeline with pluggable roles.
//!
//! Each of the three roles ([`Retriever`], [`PromptBuilder`], [`Generator`])
//! is bound once at startup, either to an implementation registered in a
//! [`ProviderRegistry`] or to a built-in fallback:
//!
//! - [`LexicalRetriever`]: Jaccard similarity over a tiny fixed corpus
//! - [`TemplatePromptBuilder`]: fixed instruction template
//! - [`StubGenerator`]: echoes the prompt's context bullets
//!
//! Every answered request is scored by the [`EvaluationScorer`] and the
//! scores are written to a results file for offline checks.

pub mod config;
pub mod document;
pub mod error;
pub mod evaluation;
pub mod generator;
pub mod lexical;
pub mod pipeline;
pub mod prompt;
pub mod protocol;
pub mod registry;
pub mod role;

pub use config::{
    DEFAULT_RESULTS_PATH, DEFAULT_TOP_K, PipelineConfig, PipelineConfigBuilder, ResolverConfig,
    RetrieverFailurePolicy, RoleOverride,
};
pub use document::Document;
pub use error::{ChatError, Result, RoleError, RoleResult};
pub use evaluation::{EvaluationResult, EvaluationScorer, OverallScore};
pub use generator::StubGenerator;
pub use lexical::{LexicalRetriever, jaccard_score, tokenize};
pub use pipeline::{ChatPipeline, NO_ANSWER};
pub use prompt::{TemplatePromptBuilder, render_prompt};
pub use protocol::{ChatRequest, ChatResponse, ErrorBody};
pub use registry::{Binding, Bound, ProviderRegistry, Resolution, ResolvedRoles, RoleSources, Source};
pub use role::{Generator, PromptBuilder, Retriever, Role};
