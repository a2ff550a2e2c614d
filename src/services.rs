//! Startup wiring for the RAG handles.
//!
//! Every collaborator is built once here and passed down explicitly, so the
//! pipeline and the HTTP layer can be assembled from fakes in tests.

use crate::config::{Prompts, RagEndpoints, Settings};
use crate::embedding::OllamaEmbedder;
use crate::error::Result;
use crate::jobs::{JobRepository, SqliteJobStore};
use crate::llm::OpenAIChatModel;
use crate::pipeline::IngestPipeline;
use crate::rag::RagService;
use crate::summarizer::Summarizer;
use crate::vector_store::ChromaVectorStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Process-wide service handles.
pub struct Services {
    pub jobs: Arc<dyn JobRepository>,
    /// `None` when the RAG settings are incomplete or invalid.
    pub rag: Option<Arc<RagService>>,
    pub pipeline: Option<Arc<IngestPipeline>>,
    /// Why the RAG handles are absent.
    pub inactive_reason: Option<String>,
}

impl Services {
    /// Open the job record and, when fully configured, the RAG stack.
    ///
    /// Missing or invalid RAG settings, or unreadable prompt overrides, leave the
    /// service inactive instead of failing. Only an unusable job database is an error.
    pub async fn initialize(settings: &Settings) -> Result<Self> {
        let jobs: Arc<dyn JobRepository> =
            Arc::new(SqliteJobStore::new(&settings.database_path())?);

        let missing = settings.missing_rag_settings();
        if !missing.is_empty() {
            let reason = format!("RAG not configured (missing: {})", missing.join(", "));
            warn!("{}", reason);
            return Ok(Self::inactive(jobs, reason));
        }

        let endpoints = match settings.rag_endpoints() {
            Ok(Some(endpoints)) => endpoints,
            Ok(None) => return Ok(Self::inactive(jobs, "RAG not configured".to_string())),
            Err(e) => {
                let reason = format!("RAG configuration invalid: {}", e);
                warn!("{}", reason);
                return Ok(Self::inactive(jobs, reason));
            }
        };

        let prompts = match Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        ) {
            Ok(prompts) => prompts,
            Err(e) => {
                let reason = format!("Prompt templates invalid: {}", e);
                warn!("{}", reason);
                return Ok(Self::inactive(jobs, reason));
            }
        };

        let (rag, pipeline) = build_rag(settings, &endpoints, prompts, jobs.clone())?;
        rag.initialize().await;

        info!(
            embedding = %endpoints.embedding_model,
            llm = %endpoints.llm_model,
            collection = %rag.collection(),
            "RAG service initialized"
        );

        Ok(Self {
            jobs,
            rag: Some(rag),
            pipeline: Some(pipeline),
            inactive_reason: None,
        })
    }

    /// Handles with only the job record available.
    pub fn inactive(jobs: Arc<dyn JobRepository>, reason: String) -> Self {
        Self {
            jobs,
            rag: None,
            pipeline: None,
            inactive_reason: Some(reason),
        }
    }
}

fn build_rag(
    settings: &Settings,
    endpoints: &RagEndpoints,
    prompts: Prompts,
    jobs: Arc<dyn JobRepository>,
) -> Result<(Arc<RagService>, Arc<IngestPipeline>)> {
    let embedder = Arc::new(OllamaEmbedder::new(
        &endpoints.embedding_url,
        &endpoints.embedding_model,
        Duration::from_secs(settings.embedding.timeout_secs),
    )?);

    let vector_store = Arc::new(ChromaVectorStore::new(
        &endpoints.vector_store_url,
        Duration::from_secs(settings.vector_store.timeout_secs),
    )?);

    let llm = Arc::new(OpenAIChatModel::new(
        &endpoints.llm_url,
        settings.llm.api_key.as_deref(),
        Duration::from_secs(settings.llm.timeout_secs),
    )?);

    let rag = Arc::new(
        RagService::new(vector_store, embedder, llm.clone(), jobs.clone())
            .with_collection(&settings.vector_store.collection)
            .with_prompts(prompts.clone())
            .with_top_k(settings.rag.top_k)
            .with_default_temperature(settings.llm.chat_temperature),
    );

    let summarizer = Arc::new(
        Summarizer::new(llm, &endpoints.llm_model, settings.llm.summary_temperature)
            .with_max_chars(settings.llm.summary_max_chars)
            .with_prompts(prompts),
    );

    let pipeline = Arc::new(IngestPipeline::new(jobs, rag.clone(), summarizer));

    Ok((rag, pipeline))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_in(dir: &tempfile::TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.database.path = dir.path().join("jobs.db").to_string_lossy().to_string();
        settings
    }

    #[tokio::test]
    async fn test_missing_settings_leave_service_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(&dir);
        settings.embedding.url = Some("http://localhost:11434".to_string());

        let services = Services::initialize(&settings).await.unwrap();
        assert!(services.rag.is_none());
        assert!(services.pipeline.is_none());
        let reason = services.inactive_reason.unwrap();
        assert!(reason.contains("embedding.model"));
        assert!(!reason.contains("embedding.url"));
    }

    #[tokio::test]
    async fn test_invalid_url_leaves_service_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(&dir);
        settings.embedding.url = Some("not a url".to_string());
        settings.embedding.model = Some("nomic-embed-text".to_string());
        settings.vector_store.url = Some("http://localhost:8000".to_string());
        settings.llm.url = Some("http://localhost:11434/v1".to_string());
        settings.llm.model = Some("llama3".to_string());

        let services = Services::initialize(&settings).await.unwrap();
        assert!(services.rag.is_none());
        assert!(services
            .inactive_reason
            .unwrap()
            .starts_with("RAG configuration invalid"));
    }

    #[tokio::test]
    async fn test_full_settings_build_handles_without_contacting_providers() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(&dir);
        // Nothing listens here; collection setup only logs a warning.
        settings.embedding.url = Some("http://127.0.0.1:9".to_string());
        settings.embedding.model = Some("nomic-embed-text".to_string());
        settings.vector_store.url = Some("http://127.0.0.1:9".to_string());
        settings.vector_store.timeout_secs = 1;
        settings.llm.url = Some("http://127.0.0.1:9/v1".to_string());
        settings.llm.model = Some("llama3".to_string());

        let services = Services::initialize(&settings).await.unwrap();
        assert!(services.inactive_reason.is_none());
        assert_eq!(services.rag.unwrap().collection(), "transcriptions");
        assert!(services.pipeline.is_some());
        assert!(dir.path().join("jobs.db").exists());
    }

    #[tokio::test]
    async fn test_malformed_prompt_override_leaves_service_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let prompts_dir = dir.path().join("prompts");
        std::fs::create_dir_all(&prompts_dir).unwrap();
        std::fs::write(prompts_dir.join("summary.toml"), "user = [not valid toml").unwrap();

        let mut settings = settings_in(&dir);
        settings.database.path = dir
            .path()
            .join("nested")
            .join("jobs.db")
            .to_string_lossy()
            .to_string();
        settings.embedding.url = Some("http://127.0.0.1:9".to_string());
        settings.embedding.model = Some("nomic-embed-text".to_string());
        settings.vector_store.url = Some("http://127.0.0.1:9".to_string());
        settings.llm.url = Some("http://127.0.0.1:9/v1".to_string());
        settings.llm.model = Some("llama3".to_string());
        settings.prompts.custom_dir = Some(prompts_dir.to_string_lossy().to_string());

        let services = Services::initialize(&settings).await.unwrap();
        assert!(services.rag.is_none());
        assert!(services.pipeline.is_none());
        assert!(services
            .inactive_reason
            .unwrap()
            .starts_with("Prompt templates invalid"));
        // The job store creates its own parent directory.
        assert!(dir.path().join("nested").join("jobs.db").exists());
    }
}
