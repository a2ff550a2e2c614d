//! Pre-flight checks before commands that need the RAG stack.
//!
//! Fails early with a readable message instead of midway through a provider call.

use crate::error::{HuskError, Result};
use crate::pipeline::IngestPipeline;
use crate::rag::RagService;
use crate::services::Services;
use std::sync::Arc;

/// Return the RAG service, or a config error naming what is missing.
pub fn require_rag(services: &Services) -> Result<Arc<RagService>> {
    services.rag.clone().ok_or_else(|| inactive(services))
}

/// Return the ingestion pipeline, or a config error naming what is missing.
pub fn require_pipeline(services: &Services) -> Result<Arc<IngestPipeline>> {
    services.pipeline.clone().ok_or_else(|| inactive(services))
}

fn inactive(services: &Services) -> HuskError {
    HuskError::Config(
        services
            .inactive_reason
            .clone()
            .unwrap_or_else(|| "RAG service not initialized".to_string()),
    )
}
