//! The three pluggable roles of a chat request and their contracts.
//!
//! Every role is an object-safe async trait. External implementations and
//! the built-in fallbacks satisfy the same trait, so the pipeline never
//! needs to know which one it is talking to.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::RoleResult;

/// A logical stage that can be bound to an implementation at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Retriever,
    PromptBuilder,
    Generator,
}

impl Role {
    /// Environment variable naming the module to bind this role to.
    pub fn module_var(self) -> &'static str {
        match self {
            Role::Retriever => "RAG_RETRIEVER_MODULE",
            Role::PromptBuilder => "AGENT_MODULE",
            Role::Generator => "LLM_MODULE",
        }
    }

    /// Environment variable naming the function within the override module.
    pub fn function_var(self) -> &'static str {
        match self {
            Role::Retriever => "RAG_RETRIEVE_FUNC",
            Role::PromptBuilder => "AGENT_BUILD_FUNC",
            Role::Generator => "LLM_FUNC",
        }
    }

    /// Function name used when the override module is set without a function.
    pub fn default_function(self) -> &'static str {
        match self {
            Role::Retriever => "retrieve",
            Role::PromptBuilder => "build_prompt",
            Role::Generator => "call",
        }
    }

    /// Conventional `(module, function)` bindings, tried in order when no
    /// override resolves.
    pub fn conventions(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Role::Retriever => &[
                ("retriever", "retrieve"),
                ("rag", "retrieve"),
                ("rag_pipeline", "retrieve"),
                ("retrieval", "retrieve"),
            ],
            Role::PromptBuilder => &[
                ("agent", "build_prompt"),
                ("agent", "build_agent_prompt"),
                ("prompting", "build_prompt"),
                ("orchestrator", "build_prompt"),
            ],
            Role::Generator => &[
                ("llm_client", "call"),
                ("llm", "generate"),
                ("model", "complete"),
                ("client", "infer"),
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Retriever => "retriever",
            Role::PromptBuilder => "prompt_builder",
            Role::Generator => "generator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fetches context documents for a query.
///
/// `top_k` is `Some(k)` on the first call. Implementations with no notion of
/// a result limit return [`RoleError::TopKUnsupported`](crate::RoleError::TopKUnsupported)
/// and are called again with `None`.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, top_k: Option<usize>) -> RoleResult<Vec<Document>>;
}

/// Renders the prompt handed to the generator.
#[async_trait]
pub trait PromptBuilder: Send + Sync {
    async fn build_prompt(&self, query: &str, contexts: &[Document]) -> RoleResult<String>;
}

/// Produces an answer for a rendered prompt.
///
/// `Ok(None)` and blank output are both treated as "no answer".
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> RoleResult<Option<String>>;
}
