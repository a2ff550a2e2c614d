//! Ingest command implementation.

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::jobs::TranscriptionJob;
use crate::pipeline::IngestOutcome;
use crate::services::Services;
use anyhow::{Context, Result};

/// Run the ingest command.
pub async fn run_ingest(job_id: &str, transcript: Option<String>, settings: Settings) -> Result<()> {
    let services = Services::initialize(&settings).await?;
    let pipeline = preflight::require_pipeline(&services)?;

    if let Some(path) = transcript {
        let path = Settings::expand_path(&path);
        let payload = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read transcript {}", path.display()))?;

        let mut job = TranscriptionJob::completed(job_id, &payload);
        if let Some(existing) = services.jobs.get(job_id).await? {
            job.summary = existing.summary;
            job.created_at = existing.created_at;
        }
        services.jobs.upsert(&job).await?;
        Output::info(&format!("Recorded job {} as completed", job_id));
    }

    let spinner = Output::spinner(&format!("Ingesting job {}...", job_id));
    let outcome = pipeline.on_transcription_completed(job_id).await;
    spinner.finish_and_clear();

    let outcome = outcome?;
    match &outcome {
        IngestOutcome::Stored { .. } => {
            Output::success(&format!("Stored job {}", job_id));
            Output::kv("Summarized", if outcome.summarized() { "yes" } else { "no" });
            if let Some(message) = outcome.message() {
                Output::warning(&message);
            }
        }
        IngestOutcome::Skipped(reason) => {
            Output::warning(&format!("Skipped job {}: {}", job_id, reason));
        }
        IngestOutcome::Aborted(_) | IngestOutcome::StoreFailed { .. } => {
            let message = outcome.message().unwrap_or_default();
            Output::error(&format!("Failed to ingest job {}: {}", job_id, message));
            anyhow::bail!("ingestion failed for job {}", job_id);
        }
    }

    Ok(())
}
