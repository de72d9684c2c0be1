//! JSON shapes of the `/chat` request and response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::evaluation::EvaluationResult;

/// Value of `metadata.source` in every [`ChatResponse`].
pub const RESPONSE_SOURCE: &str = "single_file_pipeline";

/// Incoming chat request.
///
/// Built leniently from JSON by [`ChatRequest::from_slice`]: unknown fields
/// are ignored and malformed optional fields never hide a valid message.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub metadata: Option<RequestMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RequestMetadata {
    pub tags: Vec<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: Some(message.into()), metadata: None }
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.metadata = Some(RequestMetadata { tags: tags.into_iter().map(Into::into).collect() });
        self
    }

    /// Reads a request body. Anything that is not a JSON object yields an
    /// empty request.
    pub fn from_slice(body: &[u8]) -> Self {
        serde_json::from_slice::<Value>(body).map(|v| Self::from_value(&v)).unwrap_or_default()
    }

    /// Takes `message` only when it is a string, and keeps the string
    /// entries of `metadata.tags` when that is an array. Every other shape
    /// counts as absent.
    pub fn from_value(body: &Value) -> Self {
        let message = body.get("message").and_then(Value::as_str).map(str::to_string);
        let metadata = body.get("metadata").filter(|m| m.is_object()).map(|m| RequestMetadata {
            tags: m
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default(),
        });
        Self { message, metadata }
    }

    /// The message with surrounding whitespace removed; empty if absent.
    pub fn trimmed_message(&self) -> &str {
        self.message.as_deref().unwrap_or_default().trim()
    }

    pub fn tags(&self) -> &[String] {
        self.metadata.as_ref().map(|m| m.tags.as_slice()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageContent {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseMetadata {
    pub source: String,
    pub tags: Vec<String>,
    pub latency_ms: u64,
}

/// Successful chat response. The answer is repeated under
/// `message.content` for clients that read chat-message shaped payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub answer: String,
    pub message: MessageContent,
    pub metadata: ResponseMetadata,
    pub eval_results: EvaluationResult,
}

impl ChatResponse {
    pub fn new(answer: String, tags: Vec<String>, eval_results: EvaluationResult) -> Self {
        Self {
            message: MessageContent { content: answer.clone() },
            answer,
            metadata: ResponseMetadata {
                source: RESPONSE_SOURCE.to_string(),
                tags,
                latency_ms: eval_results.latency_ms,
            },
            eval_results,
        }
    }
}

/// Body of every non-200 response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}
