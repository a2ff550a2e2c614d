//! Transcript summarization.

use crate::config::Prompts;
use crate::error::{HuskError, Result};
use crate::llm::{ChatMessage, ChatModel};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Produces short abstracts of transcripts with a generative model.
pub struct Summarizer {
    llm: Arc<dyn ChatModel>,
    model: String,
    temperature: f32,
    max_chars: usize,
    prompts: Prompts,
}

impl Summarizer {
    /// Create a summarizer with the default input ceiling (10,000 characters).
    pub fn new(llm: Arc<dyn ChatModel>, model: &str, temperature: f32) -> Self {
        Self {
            llm,
            model: model.to_string(),
            temperature,
            max_chars: 10_000,
            prompts: Prompts::default(),
        }
    }

    /// Set the character ceiling for summarization input.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Build the summarization prompt, truncating the input at the ceiling.
    pub fn build_prompt(&self, text: &str) -> String {
        let input = match text.char_indices().nth(self.max_chars) {
            Some((cut, _)) => format!("{}{}", &text[..cut], self.prompts.summary.truncation_marker),
            None => text.to_string(),
        };

        let vars = HashMap::from([("text".to_string(), input)]);
        self.prompts.render_with_custom(&self.prompts.summary.user, &vars)
    }

    /// Summarize a transcript.
    ///
    /// Fails with a generation error when the model returns no choices or blank content.
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn summarize(&self, text: &str) -> Result<String> {
        let prompt = self.build_prompt(text);

        let choices = self
            .llm
            .chat_completion(&self.model, &[ChatMessage::user(prompt)], self.temperature)
            .await?;

        let summary = choices
            .into_iter()
            .next()
            .ok_or_else(|| HuskError::Generation("no response from language model".to_string()))?;

        if summary.trim().is_empty() {
            return Err(HuskError::Generation(
                "language model returned an empty summary".to_string(),
            ));
        }

        debug!("Generated summary of {} chars", summary.len());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedChatModel;

    #[tokio::test]
    async fn test_summarize_uses_configured_model_and_temperature() {
        let llm = Arc::new(ScriptedChatModel::replying("A short summary."));
        let summarizer = Summarizer::new(llm.clone(), "llama3", 0.3);

        let summary = summarizer.summarize("Long meeting transcript").await.unwrap();
        assert_eq!(summary, "A short summary.");

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "llama3");
        assert_eq!(calls[0].temperature, 0.3);
        assert_eq!(
            calls[0].messages[0].content,
            "Please provide a concise summary of the following transcription:\n\nLong meeting transcript"
        );
    }

    #[test]
    fn test_prompt_truncates_at_ceiling() {
        let llm = Arc::new(ScriptedChatModel::replying("x"));
        let summarizer = Summarizer::new(llm, "m", 0.7).with_max_chars(5);

        let prompt = summarizer.build_prompt("abcdefghij");
        assert!(prompt.ends_with("\n\nabcde... [truncated]"));

        let prompt = summarizer.build_prompt("abcde");
        assert!(prompt.ends_with("\n\nabcde"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let llm = Arc::new(ScriptedChatModel::replying("x"));
        let summarizer = Summarizer::new(llm, "m", 0.7).with_max_chars(3);

        let prompt = summarizer.build_prompt("ååååå");
        assert!(prompt.ends_with("ååå... [truncated]"));
    }

    #[tokio::test]
    async fn test_no_choices_is_generation_error() {
        let llm = Arc::new(ScriptedChatModel::with_choices(Vec::new()));
        let summarizer = Summarizer::new(llm, "m", 0.7);
        assert!(matches!(
            summarizer.summarize("text").await,
            Err(HuskError::Generation(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_completion_is_generation_error() {
        let llm = Arc::new(ScriptedChatModel::replying("   "));
        let summarizer = Summarizer::new(llm, "m", 0.7);
        assert!(matches!(
            summarizer.summarize("text").await,
            Err(HuskError::Generation(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let llm = Arc::new(ScriptedChatModel::failing());
        let summarizer = Summarizer::new(llm, "m", 0.7);
        assert!(matches!(
            summarizer.summarize("text").await,
            Err(HuskError::Provider { .. })
        ));
    }
}
