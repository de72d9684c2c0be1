use std::path::PathBuf;

use anyhow::Context;
use ragchat_core::{DEFAULT_RESULTS_PATH, ResolverConfig, RetrieverFailurePolicy};

/// Process-wide settings, read once at startup.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `RESULTS_JSON_PATH`
    pub results_path: PathBuf,
    /// `RAG_RETRIEVER_ON_ERROR`
    pub retriever_failure: RetrieverFailurePolicy,
    pub resolver: ResolverConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            results_path: PathBuf::from(DEFAULT_RESULTS_PATH),
            retriever_failure: RetrieverFailurePolicy::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Unset or unparsable `HOST`/`PORT` values keep their defaults. An
    /// unknown `RAG_RETRIEVER_ON_ERROR` value is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let host = lookup("HOST").filter(|h| !h.is_empty()).unwrap_or(defaults.host);
        let port =
            lookup("PORT").and_then(|value| value.parse::<u16>().ok()).unwrap_or(defaults.port);
        let results_path = lookup("RESULTS_JSON_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.results_path);
        let retriever_failure = match lookup("RAG_RETRIEVER_ON_ERROR") {
            Some(value) => value
                .parse::<RetrieverFailurePolicy>()
                .context("invalid RAG_RETRIEVER_ON_ERROR")?,
            None => defaults.retriever_failure,
        };

        Ok(Self {
            host,
            port,
            results_path,
            retriever_failure,
            resolver: ResolverConfig::from_lookup(&lookup),
        })
    }
}
