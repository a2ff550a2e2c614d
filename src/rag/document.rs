//! The unit stored in the vector store for each transcription job.

use crate::vector_store::Metadata;
use serde_json::json;

/// Metadata `type` tag for transcription documents.
pub const DOCUMENT_TYPE: &str = "summary";

/// One stored document per completed transcription job.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionDocument {
    /// Equal to the owning job id; the upsert key.
    pub id: String,
    /// The literal text that is embedded and returned as retrieved context.
    pub content: String,
}

impl TranscriptionDocument {
    /// Compose the document for a job. A blank summary is treated as absent.
    pub fn new(job_id: &str, summary: Option<&str>, transcript: &str) -> Self {
        let content = match summary.filter(|s| !s.trim().is_empty()) {
            Some(summary) => format!("Summary: {}\n\nTranscript: {}", summary, transcript),
            None => format!("Transcript: {}", transcript),
        };

        Self {
            id: job_id.to_string(),
            content,
        }
    }

    /// Metadata stored alongside the embedding.
    pub fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("transcription_id".to_string(), json!(self.id));
        metadata.insert("type".to_string(), json!(DOCUMENT_TYPE));
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_with_summary() {
        let doc = TranscriptionDocument::new("job-1", Some("Budget talk."), "Full text.");
        assert_eq!(doc.content, "Summary: Budget talk.\n\nTranscript: Full text.");
    }

    #[test]
    fn test_content_without_summary() {
        let doc = TranscriptionDocument::new(
            "job-42",
            None,
            "Quarterly budget review. No blockers.",
        );
        assert_eq!(doc.content, "Transcript: Quarterly budget review. No blockers.");

        let blank = TranscriptionDocument::new("job-42", Some("  "), "x");
        assert_eq!(blank.content, "Transcript: x");
    }

    #[test]
    fn test_metadata_keys() {
        let doc = TranscriptionDocument::new("job-7", None, "x");
        let metadata = doc.metadata();
        assert_eq!(metadata["transcription_id"], json!("job-7"));
        assert_eq!(metadata["type"], json!("summary"));
    }
}
