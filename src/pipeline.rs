//! Post-processing pipeline for completed transcription jobs.
//!
//! Each job goes through extract -> validate -> summarize -> embed + store in a
//! single pass. Severity is tiered: a failed summary degrades the stored content
//! but never blocks storage, while missing text aborts the job.

use crate::error::{HuskError, Result};
use crate::jobs::{JobRepository, JobStatus, TranscriptionJob};
use crate::rag::RagService;
use crate::summarizer::Summarizer;
use crate::transcription::extract_text;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Where a job's summary comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryPolicy {
    /// Ask the model for a fresh summary and save it on the job record.
    Generate,
    /// Use the summary already on the job record, never calling the model.
    ReuseStored,
}

/// What happened to the summary stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Generated,
    Reused,
    /// Generation failed; the document was stored without a summary.
    Failed(String),
    /// No summary was available under `ReuseStored`.
    Absent,
}

impl SummaryOutcome {
    pub fn has_summary(&self) -> bool {
        matches!(self, SummaryOutcome::Generated | SummaryOutcome::Reused)
    }
}

/// Why the hook did not process a job at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotFound,
    NotCompleted(JobStatus),
    NoTranscript,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "job not found"),
            SkipReason::NotCompleted(status) => write!(f, "job not completed (status: {})", status),
            SkipReason::NoTranscript => write!(f, "job has no transcript"),
        }
    }
}

/// Result of running the pipeline for one job.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The document was embedded and upserted.
    Stored { summary: SummaryOutcome },
    /// Embedding or upsert failed after the summary stage.
    StoreFailed {
        summary: SummaryOutcome,
        error: HuskError,
    },
    /// No usable transcript text; nothing was stored.
    Aborted(HuskError),
    /// The job was not eligible for ingestion.
    Skipped(SkipReason),
}

impl IngestOutcome {
    /// Whether this outcome counts against a backfill.
    pub fn counts_as_failure(&self) -> bool {
        matches!(
            self,
            IngestOutcome::Aborted(_) | IngestOutcome::StoreFailed { .. }
        )
    }

    /// Short machine-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            IngestOutcome::Stored { .. } => "stored",
            IngestOutcome::Skipped(_) => "skipped",
            IngestOutcome::StoreFailed { .. } | IngestOutcome::Aborted(_) => "failed",
        }
    }

    /// Whether the stored (or attempted) document carried a summary.
    pub fn summarized(&self) -> bool {
        match self {
            IngestOutcome::Stored { summary } | IngestOutcome::StoreFailed { summary, .. } => {
                summary.has_summary()
            }
            _ => false,
        }
    }

    /// Human-readable detail for non-stored outcomes.
    pub fn message(&self) -> Option<String> {
        match self {
            IngestOutcome::Stored {
                summary: SummaryOutcome::Failed(e),
            } => Some(format!("stored without summary: {}", e)),
            IngestOutcome::Stored { .. } => None,
            IngestOutcome::StoreFailed { error, .. } => Some(error.to_string()),
            IngestOutcome::Aborted(error) => Some(error.to_string()),
            IngestOutcome::Skipped(reason) => Some(reason.to_string()),
        }
    }
}

/// Aggregate result of a backfill sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
}

/// Turns completed transcription jobs into stored RAG documents.
pub struct IngestPipeline {
    jobs: Arc<dyn JobRepository>,
    rag: Arc<RagService>,
    summarizer: Arc<Summarizer>,
}

impl IngestPipeline {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        rag: Arc<RagService>,
        summarizer: Arc<Summarizer>,
    ) -> Self {
        Self {
            jobs,
            rag,
            summarizer,
        }
    }

    /// Post-processing hook, called once per job completion.
    ///
    /// Only a failure to read the job record is returned as an error; every
    /// pipeline failure is reported through the outcome.
    #[instrument(skip(self))]
    pub async fn on_transcription_completed(&self, job_id: &str) -> Result<IngestOutcome> {
        let Some(job) = self.jobs.get(job_id).await? else {
            warn!("Job {} not found, skipping", job_id);
            return Ok(IngestOutcome::Skipped(SkipReason::NotFound));
        };

        if job.status != JobStatus::Completed {
            info!("Job {} not completed (status: {}), skipping", job_id, job.status);
            return Ok(IngestOutcome::Skipped(SkipReason::NotCompleted(job.status)));
        }

        if job.transcript.as_deref().map_or(true, str::is_empty) {
            info!("Job {} has no transcript, skipping", job_id);
            return Ok(IngestOutcome::Skipped(SkipReason::NoTranscript));
        }

        Ok(self.ingest_job(&job, SummaryPolicy::Generate).await)
    }

    /// Run the pipeline for one job.
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    pub async fn ingest_job(&self, job: &TranscriptionJob, policy: SummaryPolicy) -> IngestOutcome {
        let payload = job.transcript.as_deref().unwrap_or_default();

        let text = match extract_text(payload) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to extract transcript text: {}", e);
                return IngestOutcome::Aborted(e);
            }
        };

        if text.trim().is_empty() {
            warn!("Transcript text is empty");
            return IngestOutcome::Aborted(HuskError::Extraction(
                "transcript text is empty".to_string(),
            ));
        }

        info!("Processing transcript ({} chars)", text.len());

        let (summary, summary_outcome) = match policy {
            SummaryPolicy::Generate => self.generate_summary(job, &text).await,
            SummaryPolicy::ReuseStored => match job.summary.as_deref() {
                Some(s) if !s.trim().is_empty() => (Some(s.to_string()), SummaryOutcome::Reused),
                _ => (None, SummaryOutcome::Absent),
            },
        };

        match self
            .rag
            .store_document(&job.id, summary.as_deref(), &text)
            .await
        {
            Ok(_) => {
                info!(summarized = summary.is_some(), "Stored transcript in RAG");
                IngestOutcome::Stored {
                    summary: summary_outcome,
                }
            }
            Err(e) => {
                warn!("Failed to store transcript in vector store: {}", e);
                IngestOutcome::StoreFailed {
                    summary: summary_outcome,
                    error: e,
                }
            }
        }
    }

    /// Summarize and save the summary on the job row; failures degrade, never abort.
    async fn generate_summary(
        &self,
        job: &TranscriptionJob,
        text: &str,
    ) -> (Option<String>, SummaryOutcome) {
        match self.summarizer.summarize(text).await {
            Ok(summary) => {
                info!("Generated summary ({} chars)", summary.len());
                if let Err(e) = self.jobs.save_summary(&job.id, &summary).await {
                    warn!("Failed to save summary on job record: {}", e);
                }
                (Some(summary), SummaryOutcome::Generated)
            }
            Err(e) => {
                warn!("Failed to generate summary (will store transcript without summary): {}", e);
                (None, SummaryOutcome::Failed(e.to_string()))
            }
        }
    }

    /// Re-run ingestion over every completed job with a transcript.
    ///
    /// Safe to repeat: documents are upserted by job id.
    #[instrument(skip(self))]
    pub async fn backfill(&self) -> Result<BackfillReport> {
        let jobs = self.jobs.list_ingestible().await?;
        let mut report = BackfillReport {
            total: jobs.len(),
            ..Default::default()
        };

        info!("Backfilling {} jobs", jobs.len());

        for job in &jobs {
            let outcome = self.ingest_job(job, SummaryPolicy::ReuseStored).await;
            if outcome.counts_as_failure() {
                report.failed += 1;
            } else {
                report.processed += 1;
            }
        }

        info!(
            "Backfill finished: {} processed, {} failed of {}",
            report.processed, report.failed, report.total
        );
        Ok(report)
    }
}
