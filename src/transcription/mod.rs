//! Transcript payload handling.
//!
//! Completed transcripts arrive as opaque payloads (usually JSON from the
//! transcription engine, sometimes legacy plain text) and are normalized into
//! plain text before summarization and embedding.

mod extract;
mod models;

pub use extract::extract_text;
pub use models::{TranscriptResult, TranscriptSegment};
