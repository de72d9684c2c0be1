//! Built-in stand-in for a language model.

use async_trait::async_trait;

use crate::error::RoleResult;
use crate::role::Generator;

/// Answer used when the prompt carries no bullet lines.
pub const CANNED_ANSWER: &str = "This pipeline takes the user's question, retrieves helpful context, and lets an LLM agent produce a concise answer.";

/// Hard cap on the stub answer, in characters.
pub const MAX_ANSWER_CHARS: usize = 500;

/// Echoes the `- ` bullet lines of a prompt back as the answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubGenerator;

impl StubGenerator {
    pub fn answer(prompt: &str) -> String {
        let bullets: Vec<&str> = prompt
            .lines()
            .filter(|line| line.trim().starts_with("- "))
            .map(|line| line.trim_matches(|c: char| c == '-' || c == ' ').trim())
            .filter(|text| !text.is_empty())
            .collect();

        let answer = if bullets.is_empty() { CANNED_ANSWER.to_string() } else { bullets.join(" ") };
        answer.chars().take(MAX_ANSWER_CHARS).collect()
    }
}

#[async_trait]
impl Generator for StubGenerator {
    async fn generate(&self, prompt: &str) -> RoleResult<Option<String>> {
        Ok(Some(Self::answer(prompt)))
    }
}
