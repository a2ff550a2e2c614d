//! RAG (Retrieval-Augmented Generation) over stored transcripts.
//!
//! Provides document storage for the ingestion pipeline and grounded chat for callers.

pub mod context;
mod document;
mod service;

pub use context::build_chat_prompt;
pub use document::TranscriptionDocument;
pub use service::{RagService, RagStats, ServiceStatus};
