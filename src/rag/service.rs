//! Retrieval and grounded chat over the transcription collection.

use super::context::build_chat_prompt;
use super::document::{TranscriptionDocument, DOCUMENT_TYPE};
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::{HuskError, Result};
use crate::jobs::JobRepository;
use crate::llm::{ChatMessage, ChatModel};
use crate::vector_store::{Metadata, UpsertBatch, VectorStore};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Operational state reported by stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Active,
    Inactive,
    Error,
}

/// RAG statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RagStats {
    pub status: ServiceStatus,
    /// Completed jobs with a transcript, according to the job record.
    pub transcript_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RagStats {
    /// Stats for a service that was never configured.
    pub fn inactive(message: impl Into<String>) -> Self {
        Self {
            status: ServiceStatus::Inactive,
            transcript_count: 0,
            collection_name: None,
            message: Some(message.into()),
        }
    }

    /// Stats for a service that failed to report.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ServiceStatus::Error,
            transcript_count: 0,
            collection_name: None,
            message: Some(message.into()),
        }
    }
}

/// Stores transcription documents and answers questions from them.
pub struct RagService {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn ChatModel>,
    jobs: Arc<dyn JobRepository>,
    collection: String,
    prompts: Prompts,
    top_k: usize,
    default_temperature: f32,
}

impl RagService {
    /// Create a new RAG service over the `transcriptions` collection.
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn ChatModel>,
        jobs: Arc<dyn JobRepository>,
    ) -> Self {
        Self {
            vector_store,
            embedder,
            llm,
            jobs,
            collection: "transcriptions".to_string(),
            prompts: Prompts::default(),
            top_k: 5,
            default_temperature: 0.7,
        }
    }

    /// Use a different collection name.
    pub fn with_collection(mut self, collection: &str) -> Self {
        self.collection = collection.to_string();
        self
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set how many documents chat retrieves.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Set the temperature used when a chat caller does not pick one.
    pub fn with_default_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = temperature;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Get or create the collection.
    ///
    /// Failure is logged and swallowed: the store may come up later, and every
    /// write will surface its own error until it does.
    pub async fn initialize(&self) {
        let mut metadata = Metadata::new();
        metadata.insert(
            "description".to_string(),
            json!("Transcription summaries and content"),
        );

        match self
            .vector_store
            .ensure_collection(&self.collection, &metadata)
            .await
        {
            Ok(()) => info!("RAG collection '{}' ready", self.collection),
            Err(e) => warn!(
                "Could not ensure collection '{}' (will retry implicitly on use): {}",
                self.collection, e
            ),
        }
    }

    /// Embed and upsert the document for a job.
    #[instrument(skip(self, summary, transcript), fields(job_id = %job_id))]
    pub async fn store_document(
        &self,
        job_id: &str,
        summary: Option<&str>,
        transcript: &str,
    ) -> Result<TranscriptionDocument> {
        if transcript.trim().is_empty() {
            return Err(HuskError::Validation(format!(
                "transcript for job {} is empty",
                job_id
            )));
        }

        let document = TranscriptionDocument::new(job_id, summary, transcript);
        let embedding = self.embedder.embed(&document.content).await?;

        let mut batch = UpsertBatch::default();
        batch.push(
            document.id.clone(),
            document.content.clone(),
            embedding,
            document.metadata(),
        );
        self.vector_store.upsert(&self.collection, batch).await?;

        debug!("Stored document ({} chars)", document.content.len());
        Ok(document)
    }

    /// Retrieve the `k` most similar document texts, closest first.
    #[instrument(skip(self, text))]
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<String>> {
        let k = if k == 0 { self.top_k } else { k };

        let embedding = self.embedder.embed(text).await?;
        let result = self
            .vector_store
            .query(&self.collection, &[embedding], k, None)
            .await?;

        let documents = result.first_documents();
        debug!("Retrieved {} documents", documents.len());
        Ok(documents)
    }

    /// Answer a question grounded in retrieved documents.
    #[instrument(skip(self, question), fields(model = %model))]
    pub async fn chat(&self, question: &str, model: &str, temperature: Option<f32>) -> Result<String> {
        let contexts = self.query(question, self.top_k).await?;
        let prompt = build_chat_prompt(&self.prompts.rag, &contexts, question);
        let temperature = temperature.unwrap_or(self.default_temperature);

        info!(
            "Answering question with {} context documents",
            contexts.len()
        );

        let choices = self
            .llm
            .chat_completion(model, &[ChatMessage::user(prompt)], temperature)
            .await?;

        choices
            .into_iter()
            .next()
            .ok_or_else(|| HuskError::Generation("no response from language model".to_string()))
    }

    /// Stats based on the job record, which is the source of ingestion eligibility.
    pub async fn stats(&self) -> Result<RagStats> {
        let transcript_count = self.jobs.count_ingestible().await?;

        Ok(RagStats {
            status: ServiceStatus::Active,
            transcript_count,
            collection_name: Some(self.collection.clone()),
            message: None,
        })
    }

    /// Number of transcription documents actually present in the vector store.
    pub async fn stored_count(&self) -> Result<usize> {
        let mut filter = Metadata::new();
        filter.insert("type".to_string(), json!(DOCUMENT_TYPE));
        self.vector_store
            .count(&self.collection, Some(&filter))
            .await
    }
}
