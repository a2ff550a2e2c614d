//! Configuration module for Husk.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts, SummaryPrompts};
pub use settings::{
    normalize_base_url, DatabaseSettings, EmbeddingSettings, GeneralSettings, LlmSettings,
    PromptSettings, RagEndpoints, RagSettings, ServerSettings, Settings, VectorStoreSettings,
};
