//! Husk - retrieval-augmented chat over transcribed audio
//!
//! Turns completed transcription jobs into searchable documents and answers
//! questions grounded in them.
//!
//! # Overview
//!
//! When a transcription job completes, Husk:
//! - Extracts plain text from the stored transcript payload
//! - Asks a language model for a short summary (best effort)
//! - Embeds summary and transcript together and upserts them into a vector store
//!
//! Callers can then chat over the corpus, inspect stats, and backfill missed jobs.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `error` - Error taxonomy
//! - `jobs` - Transcription job record
//! - `transcription` - Transcript payload parsing and text extraction
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `llm` - Chat completion models
//! - `summarizer` - Transcript summarization
//! - `rag` - Document storage, retrieval and grounded chat
//! - `pipeline` - Post-processing hook and backfill
//! - `services` - Startup wiring of the above
//!
//! # Example
//!
//! ```rust,no_run
//! use husk::config::Settings;
//! use husk::services::Services;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let services = Services::initialize(&settings).await?;
//!
//!     if let Some(pipeline) = &services.pipeline {
//!         let report = pipeline.backfill().await?;
//!         println!("Stored {} of {} jobs", report.processed, report.total);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod jobs;
pub mod llm;
pub mod pipeline;
pub mod rag;
pub mod services;
pub mod summarizer;
pub mod transcription;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{HuskError, Result};
