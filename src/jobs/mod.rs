//! Transcription job records.
//!
//! The relational job table is owned by the transcription system; the RAG
//! pipeline reads completed transcripts from it and writes back summaries.

mod sqlite;

pub use sqlite::SqliteJobStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a transcription job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Unknown job status: {}", s)),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transcription job row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionJob {
    pub id: String,
    pub status: JobStatus,
    /// Raw transcript payload (JSON or plain text).
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TranscriptionJob {
    /// Create a completed job carrying a transcript.
    pub fn completed(id: &str, transcript: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            status: JobStatus::Completed,
            transcript: Some(transcript.to_string()),
            summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach an existing summary.
    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    /// Completed with a non-empty transcript payload.
    pub fn is_ingestible(&self) -> bool {
        self.status == JobStatus::Completed
            && self.transcript.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Access to the transcription job record.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Fetch a job by id.
    async fn get(&self, id: &str) -> Result<Option<TranscriptionJob>>;

    /// All completed jobs with a non-empty transcript, oldest first.
    async fn list_ingestible(&self) -> Result<Vec<TranscriptionJob>>;

    /// Number of completed jobs with a non-empty transcript.
    async fn count_ingestible(&self) -> Result<usize>;

    /// Store a generated summary on a job row.
    async fn save_summary(&self, id: &str, summary: &str) -> Result<()>;

    /// Insert or replace a job row.
    async fn upsert(&self, job: &TranscriptionJob) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("done".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_ingestible_requires_completed_and_transcript() {
        assert!(TranscriptionJob::completed("a", "text").is_ingestible());
        assert!(!TranscriptionJob::completed("a", "").is_ingestible());

        let mut job = TranscriptionJob::completed("a", "text");
        job.status = JobStatus::Processing;
        assert!(!job.is_ingestible());
    }
}
