//! Configuration settings for Husk.

use crate::error::{HuskError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub database: DatabaseSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub llm: LlmSettings,
    pub rag: RagSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.husk".to_string(),
        }
    }
}

/// Location of the transcription job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite database holding transcription jobs.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "~/.husk/jobs.db".to_string(),
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Base URL of the embedding provider (e.g. an Ollama server).
    pub url: Option<String>,
    /// Embedding model name.
    pub model: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            url: None,
            model: None,
            timeout_secs: 60,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Base URL of the vector store.
    pub url: Option<String>,
    /// Name of the single collection holding transcription documents.
    pub collection: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            url: None,
            collection: "transcriptions".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Generative model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible chat completion endpoint.
    pub url: Option<String>,
    /// Default model, used for summaries.
    pub model: Option<String>,
    /// API key, if the endpoint requires one.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature for transcript summaries.
    pub summary_temperature: f32,
    /// Sampling temperature for chat when the caller does not pick one.
    pub chat_temperature: f32,
    /// Character ceiling for the text handed to the summarizer.
    pub summary_max_chars: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            url: None,
            model: None,
            api_key: None,
            timeout_secs: 60,
            summary_temperature: 0.7,
            chat_temperature: 0.7,
            summary_max_chars: 10_000,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Number of documents retrieved per chat query.
    pub top_k: usize,
    /// End-to-end budget for a chat request.
    pub chat_timeout_secs: u64,
    /// Budget for computing stats.
    pub stats_timeout_secs: u64,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            chat_timeout_secs: 120,
            stats_timeout_secs: 10,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

/// Endpoints and models the RAG pipeline cannot run without.
#[derive(Debug, Clone, PartialEq)]
pub struct RagEndpoints {
    pub embedding_url: String,
    pub embedding_model: String,
    pub vector_store_url: String,
    pub llm_url: String,
    pub llm_model: String,
}

impl Settings {
    /// Load settings from the default configuration file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply environment-style overrides. Empty values count as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("EMBEDDING_URL") {
            self.embedding.url = Some(v);
        }
        if let Some(v) = get("EMBEDDING_MODEL") {
            self.embedding.model = Some(v);
        }
        if let Some(v) = get("VECTOR_DB_URL") {
            self.vector_store.url = Some(v);
        }
        if let Some(v) = get("VECTOR_DB_COLLECTION") {
            self.vector_store.collection = v;
        }
        if let Some(v) = get("LLM_URL") {
            self.llm.url = Some(v);
        }
        if let Some(v) = get("LLM_MODEL") {
            self.llm.model = Some(v);
        }
        if let Some(v) = get("LLM_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = get("HUSK_DATABASE") {
            self.database.path = v;
        }
    }

    /// Names of the required RAG settings that are absent.
    pub fn missing_rag_settings(&self) -> Vec<&'static str> {
        let present = |v: &Option<String>| v.as_ref().is_some_and(|s| !s.trim().is_empty());

        let mut missing = Vec::new();
        if !present(&self.embedding.url) {
            missing.push("embedding.url");
        }
        if !present(&self.embedding.model) {
            missing.push("embedding.model");
        }
        if !present(&self.vector_store.url) {
            missing.push("vector_store.url");
        }
        if !present(&self.llm.url) {
            missing.push("llm.url");
        }
        if !present(&self.llm.model) {
            missing.push("llm.model");
        }
        missing
    }

    /// Resolve the RAG endpoints, or `None` when any is missing.
    ///
    /// URLs are validated and normalized without a trailing slash.
    pub fn rag_endpoints(&self) -> Result<Option<RagEndpoints>> {
        if !self.missing_rag_settings().is_empty() {
            return Ok(None);
        }

        let value = |v: &Option<String>| v.clone().unwrap_or_default().trim().to_string();

        Ok(Some(RagEndpoints {
            embedding_url: normalize_base_url(&value(&self.embedding.url))?,
            embedding_model: value(&self.embedding.model),
            vector_store_url: normalize_base_url(&value(&self.vector_store.url))?,
            llm_url: normalize_base_url(&value(&self.llm.url))?,
            llm_model: value(&self.llm.model),
        }))
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HuskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("husk")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded job database path.
    pub fn database_path(&self) -> PathBuf {
        Self::expand_path(&self.database.path)
    }
}

/// Validate a base URL and strip any trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| HuskError::Config(format!("Invalid URL '{}': {}", raw, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(HuskError::Config(format!(
            "URL '{}' must use http or https",
            raw
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}
