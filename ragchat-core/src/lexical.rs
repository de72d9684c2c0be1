//! Built-in lexical retriever.
//!
//! Ranks a small in-memory corpus by token-set Jaccard similarity. It is a
//! stand-in used when no real retriever is registered, not a search engine.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::document::Document;
use crate::error::RoleResult;
use crate::role::Retriever;

const BUILTIN_CORPUS: [(&str, &str); 3] = [
    (
        "d1",
        "A chatbot gets a user query, retrieves context via a RAG system, then an LLM agent crafts the final answer.",
    ),
    (
        "d2",
        "RAG = Retrieval Augmented Generation: fetch relevant snippets and pass them to the model.",
    ),
    ("d3", "Prompt Layer metadata helps trace prompts and evaluate results later."),
];

/// The documents served by [`LexicalRetriever::default`].
pub fn builtin_corpus() -> Vec<Document> {
    BUILTIN_CORPUS.iter().map(|(id, text)| Document::new(*id, *text)).collect()
}

/// Lower-cases `text`, turns every character that is neither alphanumeric
/// nor whitespace into a space, and splits on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    normalized.split_whitespace().map(str::to_string).collect()
}

/// Jaccard similarity of the token sets of `query` and `text`.
///
/// The union size is floored at 1, so two empty inputs score 0.
pub fn jaccard_score(query: &str, text: &str) -> f64 {
    let a: HashSet<String> = tokenize(query).into_iter().collect();
    let b: HashSet<String> = tokenize(text).into_iter().collect();
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count().max(1);
    intersection as f64 / union as f64
}

/// Jaccard-ranked retrieval over a fixed corpus.
#[derive(Debug, Clone)]
pub struct LexicalRetriever {
    corpus: Vec<Document>,
}

impl Default for LexicalRetriever {
    fn default() -> Self {
        Self::with_corpus(builtin_corpus())
    }
}

impl LexicalRetriever {
    pub fn with_corpus(corpus: Vec<Document>) -> Self {
        Self { corpus }
    }

    /// Scores every document against `query` and returns them by descending
    /// score, ties kept in corpus order, truncated to `top_k` if given.
    pub fn rank(&self, query: &str, top_k: Option<usize>) -> Vec<(Document, f64)> {
        let mut scored: Vec<(Document, f64)> =
            self.corpus.iter().map(|doc| (doc.clone(), jaccard_score(query, &doc.text))).collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        if let Some(k) = top_k {
            scored.truncate(k);
        }
        scored
    }
}

#[async_trait]
impl Retriever for LexicalRetriever {
    async fn retrieve(&self, query: &str, top_k: Option<usize>) -> RoleResult<Vec<Document>> {
        Ok(self.rank(query, top_k).into_iter().map(|(doc, _)| doc).collect())
    }
}
