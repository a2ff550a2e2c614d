//! Stats command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::services::Services;
use anyhow::Result;

/// Run the stats command.
pub async fn run_stats(settings: Settings) -> Result<()> {
    let services = Services::initialize(&settings).await?;

    Output::header("RAG Status");

    let Some(rag) = &services.rag else {
        Output::kv("Status", "inactive");
        if let Some(reason) = &services.inactive_reason {
            Output::kv("Reason", reason);
        }
        Output::kv(
            "Completed transcripts",
            &services.jobs.count_ingestible().await?.to_string(),
        );
        return Ok(());
    };

    let stats = rag.stats().await?;
    Output::kv("Status", "active");
    Output::kv("Collection", rag.collection());
    Output::kv("Completed transcripts", &stats.transcript_count.to_string());

    // The job record and the store can drift when storage fails after completion.
    match rag.stored_count().await {
        Ok(stored) => {
            Output::kv("Stored documents", &stored.to_string());
            if stored < stats.transcript_count {
                Output::warning(&format!(
                    "{} completed transcripts are not stored. Run 'husk backfill' to catch up.",
                    stats.transcript_count - stored
                ));
            }
        }
        Err(e) => Output::warning(&format!("Could not count stored documents: {}", e)),
    }

    Ok(())
}
