//! Error types for the `ragchat-core` crate.

use thiserror::Error;

use crate::role::Role;

/// Errors reported by a role implementation (retriever, prompt builder or
/// generator).
#[derive(Debug, Error)]
pub enum RoleError {
    /// The retriever does not accept an explicit `top_k`.
    ///
    /// The pipeline answers this by calling the retriever again with
    /// `top_k = None`.
    #[error("retriever does not accept a top_k argument")]
    TopKUnsupported,

    /// The implementation failed while producing its output.
    #[error("{implementation} failed: {message}")]
    Failed {
        /// Name of the implementation that failed.
        implementation: String,
        /// A description of the failure.
        message: String,
    },
}

impl RoleError {
    /// Shorthand for [`RoleError::Failed`].
    pub fn failed(implementation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed { implementation: implementation.into(), message: message.into() }
    }
}

/// Result type returned by role implementations.
pub type RoleResult<T> = std::result::Result<T, RoleError>;

/// Errors that abort a chat request.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request carried no usable message.
    #[error("message is required")]
    Validation,

    /// A pipeline stage failed; later stages were not run.
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// The role whose stage failed.
        stage: Role,
        /// The underlying role failure.
        #[source]
        source: RoleError,
    },

    /// The evaluation results could not be written.
    #[error("failed to persist evaluation results to {path}: {source}")]
    Persist {
        /// Destination of the results file.
        path: String,
        /// The underlying I/O or encoding failure.
        #[source]
        source: std::io::Error,
    },

    /// A configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, ChatError>;
