//! Documents exchanged between the retriever and the prompt builder.

use serde::{Deserialize, Serialize};

/// A retrievable piece of text. The pipeline only reads
/// [`text`](Document::text).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Identifier, unique within the retriever's corpus.
    pub id: String,
    /// The text handed to the prompt builder.
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}
