//! Ask command implementation.

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::services::Services;
use anyhow::Result;
use std::time::Duration;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    temperature: Option<f32>,
    settings: Settings,
) -> Result<()> {
    let services = Services::initialize(&settings).await?;
    let rag = match preflight::require_rag(&services) {
        Ok(rag) => rag,
        Err(e) => {
            Output::error(&e.to_string());
            Output::info("Set the embedding, vector_store and llm sections, or their environment variables.");
            return Err(e.into());
        }
    };

    let model = model
        .or_else(|| settings.llm.model.clone())
        .unwrap_or_default();

    let spinner = Output::spinner("Searching transcripts...");
    let answer = tokio::time::timeout(
        Duration::from_secs(settings.rag.chat_timeout_secs),
        rag.chat(question, &model, temperature),
    )
    .await;
    spinner.finish_and_clear();

    match answer {
        Ok(Ok(response)) => {
            println!("\n{}\n", response);
            Ok(())
        }
        Ok(Err(e)) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            Err(e.into())
        }
        Err(_) => {
            Output::error("Timed out waiting for an answer.");
            anyhow::bail!("chat timed out after {}s", settings.rag.chat_timeout_secs)
        }
    }
}
