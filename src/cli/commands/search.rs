//! Search command implementation.

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::services::Services;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    let services = Services::initialize(&settings).await?;
    let rag = preflight::require_rag(&services)?;

    let spinner = Output::spinner("Searching...");
    let results = rag.query(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(documents) => {
            if documents.is_empty() {
                Output::warning("No documents stored yet. Run 'husk backfill' to ingest completed jobs.");
            } else {
                Output::success(&format!("Found {} documents", documents.len()));
                for (i, document) in documents.iter().enumerate() {
                    Output::document(i + 1, document);
                }
                println!();
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
