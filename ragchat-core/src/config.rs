//! Configuration for role resolution and the chat pipeline.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};
use crate::role::Role;

/// Number of documents retrieved per request.
pub const DEFAULT_TOP_K: usize = 2;

/// Default location of the evaluation results file.
pub const DEFAULT_RESULTS_PATH: &str = "results.json";

/// Explicit binding requested for one role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleOverride {
    pub module: Option<String>,
    pub function: Option<String>,
}

impl RoleOverride {
    /// The `(module, function)` pair to look up, if a module was requested.
    ///
    /// Empty values count as unset; a missing function falls back to the
    /// role's default function name.
    pub fn binding(&self, role: Role) -> Option<(&str, &str)> {
        let module = self.module.as_deref().filter(|m| !m.is_empty())?;
        let function =
            self.function.as_deref().filter(|f| !f.is_empty()).unwrap_or(role.default_function());
        Some((module, function))
    }
}

/// Overrides for all three roles, usually read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverConfig {
    pub retriever: RoleOverride,
    pub prompt_builder: RoleOverride,
    pub generator: RoleOverride,
}

impl ResolverConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |role: Role| RoleOverride {
            module: lookup(role.module_var()),
            function: lookup(role.function_var()),
        };
        Self {
            retriever: read(Role::Retriever),
            prompt_builder: read(Role::PromptBuilder),
            generator: read(Role::Generator),
        }
    }
}

/// What to do when a resolved retriever fails even after the `top_k` retry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrieverFailurePolicy {
    /// Fail the request.
    #[default]
    Propagate,
    /// Answer this request with the built-in lexical retriever instead.
    Fallback,
}

impl FromStr for RetrieverFailurePolicy {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(Self::Propagate),
            "fallback" => Ok(Self::Fallback),
            other => Err(ChatError::Config(format!(
                "unknown retriever failure policy '{other}' (expected 'propagate' or 'fallback')"
            ))),
        }
    }
}

/// Parameters of the chat pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Number of documents requested from the retriever.
    pub top_k: usize,
    /// Where evaluation results are written after every request.
    pub results_path: PathBuf,
    pub retriever_failure: RetrieverFailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            results_path: PathBuf::from(DEFAULT_RESULTS_PATH),
            retriever_failure: RetrieverFailurePolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for a validated [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    pub fn results_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.results_path = path.into();
        self
    }

    pub fn retriever_failure(mut self, policy: RetrieverFailurePolicy) -> Self {
        self.config.retriever_failure = policy;
        self
    }

    /// Build the [`PipelineConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] if `top_k == 0` or the results path is
    /// empty.
    pub fn build(self) -> Result<PipelineConfig> {
        if self.config.top_k == 0 {
            return Err(ChatError::Config("top_k must be greater than zero".to_string()));
        }
        if self.config.results_path.as_os_str().is_empty() {
            return Err(ChatError::Config("results_path must not be empty".to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn override_uses_default_function_name() {
        let o = RoleOverride { module: Some("my_rag".into()), function: None };
        assert_eq!(o.binding(Role::Retriever), Some(("my_rag", "retrieve")));
        assert_eq!(o.binding(Role::Generator), Some(("my_rag", "call")));
    }

    #[test]
    fn empty_module_counts_as_unset() {
        let o = RoleOverride { module: Some(String::new()), function: Some("f".into()) };
        assert_eq!(o.binding(Role::Retriever), None);
    }

    #[test]
    fn from_lookup_reads_role_variables() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("RAG_RETRIEVER_MODULE", "retriever_x"),
            ("AGENT_BUILD_FUNC", "render"),
            ("LLM_MODULE", "llm_x"),
            ("LLM_FUNC", "complete"),
        ]);
        let config = ResolverConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.retriever.binding(Role::Retriever), Some(("retriever_x", "retrieve")));
        assert_eq!(config.prompt_builder.binding(Role::PromptBuilder), None);
        assert_eq!(config.generator.binding(Role::Generator), Some(("llm_x", "complete")));
    }

    #[test]
    fn builder_rejects_zero_top_k() {
        assert!(PipelineConfig::builder().top_k(0).build().is_err());
        assert_eq!(PipelineConfig::builder().build().unwrap().top_k, DEFAULT_TOP_K);
    }

    #[test]
    fn failure_policy_parses() {
        assert_eq!("Fallback".parse::<RetrieverFailurePolicy>().unwrap(), RetrieverFailurePolicy::Fallback);
        assert!("retry".parse::<RetrieverFailurePolicy>().is_err());
    }
}
