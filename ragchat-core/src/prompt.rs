//! Built-in prompt template.

use async_trait::async_trait;

use crate::document::Document;
use crate::error::RoleResult;
use crate::role::PromptBuilder;

const INSTRUCTIONS: &str = "You are a helpful assistant.\nUse CONTEXT to answer USER in 1–2 sentences.";

/// Renders the fixed instruction template.
///
/// Each context becomes a `- ` bullet under `CONTEXT:`, followed by the user
/// query and an empty `ASSISTANT:` turn for the generator to continue.
pub fn render_prompt(query: &str, contexts: &[Document]) -> String {
    let context = contexts.iter().map(|c| format!("- {}", c.text)).collect::<Vec<_>>().join("\n");
    format!("{INSTRUCTIONS}\n\nCONTEXT:\n{context}\n\nUSER: {query}\nASSISTANT:")
}

/// [`PromptBuilder`] backed by [`render_prompt`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplatePromptBuilder;

#[async_trait]
impl PromptBuilder for TemplatePromptBuilder {
    async fn build_prompt(&self, query: &str, contexts: &[Document]) -> RoleResult<String> {
        Ok(render_prompt(query, contexts))
    }
}
