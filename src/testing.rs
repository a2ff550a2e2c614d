//! Scripted collaborators for unit tests.

use crate::embedding::Embedder;
use crate::error::{HuskError, Result};
use crate::llm::{ChatMessage, ChatModel};
use crate::vector_store::{Metadata, QueryResult, UpsertBatch, VectorStore};
use async_trait::async_trait;
use axum::http::StatusCode;
use axum::Router;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

/// Deterministic embedder: equal texts map to equal vectors.
pub struct ScriptedEmbedder {
    dims: usize,
    fail_on: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail whenever the text contains `needle`.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish() | 1;

        (0..self.dims)
            .map(|_| {
                // xorshift64
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                ((state % 2000) as f32 / 1000.0) - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for ScriptedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().unwrap().push(text.to_string());
        if let Some(needle) = &self.fail_on {
            if text.contains(needle.as_str()) {
                return Err(HuskError::provider_status(
                    "embedding provider",
                    500,
                    "model not loaded",
                ));
            }
        }
        Ok(self.vector_for(text))
    }
}

/// A recorded chat completion request.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

/// Chat model returning canned choices, or failing.
pub struct ScriptedChatModel {
    choices: Option<Vec<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedChatModel {
    pub fn replying(answer: &str) -> Self {
        Self::with_choices(vec![answer.to_string()])
    }

    pub fn with_choices(choices: Vec<String>) -> Self {
        Self {
            choices: Some(choices),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            choices: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            messages: messages.to_vec(),
            temperature,
        });
        self.choices
            .clone()
            .ok_or_else(|| HuskError::provider("language model", "connection refused"))
    }
}

/// Vector store whose every call fails like an unreachable server.
pub struct UnavailableVectorStore;

fn unavailable() -> HuskError {
    HuskError::provider("vector store", "connection refused")
}

#[async_trait]
impl VectorStore for UnavailableVectorStore {
    async fn ensure_collection(&self, _name: &str, _metadata: &Metadata) -> Result<()> {
        Err(unavailable())
    }

    async fn upsert(&self, _collection: &str, _batch: UpsertBatch) -> Result<()> {
        Err(unavailable())
    }

    async fn query(
        &self,
        _collection: &str,
        _query_embeddings: &[Vec<f32>],
        _n_results: usize,
        _filter: Option<&Metadata>,
    ) -> Result<QueryResult> {
        Err(unavailable())
    }

    async fn count(&self, _collection: &str, _filter: Option<&Metadata>) -> Result<usize> {
        Err(unavailable())
    }
}

/// Serve every request with the same status and body on an ephemeral local port.
///
/// Returns the base URL, without a trailing slash.
pub async fn serve_fixed(status: StatusCode, body: &'static str) -> String {
    let router = Router::new().fallback(move || async move { (status, body) });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
