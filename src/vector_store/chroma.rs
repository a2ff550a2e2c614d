//! HTTP client for a Chroma-style vector store.

use super::{Metadata, QueryResult, UpsertBatch, VectorStore};
use crate::error::{HuskError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

const PROVIDER: &str = "vector store";

/// Vector store speaking the Chroma v1 REST API.
pub struct ChromaVectorStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct CollectionRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "is_empty_metadata")]
    metadata: &'a Metadata,
    get_or_create: bool,
}

fn is_empty_metadata(metadata: &&Metadata) -> bool {
    metadata.is_empty()
}

#[derive(Serialize)]
struct AddRequest<'a> {
    collection_name: &'a str,
    ids: &'a [String],
    documents: &'a [String],
    embeddings: &'a [Vec<f32>],
    metadatas: &'a [Metadata],
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    collection_name: &'a str,
    query_embeddings: &'a [Vec<f32>],
    n_results: usize,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<&'a Metadata>,
}

#[derive(Serialize)]
struct CountRequest<'a> {
    collection_name: &'a str,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<&'a Metadata>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountResponse {
    Bare(usize),
    Wrapped { count: usize },
}

impl ChromaVectorStore {
    /// Create a new client. `base_url` must not carry a trailing slash.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HuskError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn collection_url(&self, collection: &str, action: &str) -> String {
        format!("{}/api/v1/collections/{}/{}", self.base_url, collection, action)
    }

    /// POST a JSON body and return the response on 2xx.
    async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| HuskError::from_transport(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(HuskError::provider_status(PROVIDER, status.as_u16(), body));
        }

        Ok(response)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        self.post(url, body)
            .await?
            .json()
            .await
            .map_err(|e| HuskError::from_transport(PROVIDER, e))
    }
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    #[instrument(skip(self, metadata))]
    async fn ensure_collection(&self, name: &str, metadata: &Metadata) -> Result<()> {
        let url = format!("{}/api/v1/collections", self.base_url);
        self.post(
            &url,
            &CollectionRequest {
                name,
                metadata,
                get_or_create: true,
            },
        )
        .await?;

        info!("Collection '{}' is ready", name);
        Ok(())
    }

    #[instrument(skip(self, batch), fields(count = batch.len()))]
    async fn upsert(&self, collection: &str, batch: UpsertBatch) -> Result<()> {
        batch.validate()?;
        if batch.is_empty() {
            return Ok(());
        }

        self.post(
            &self.collection_url(collection, "add"),
            &AddRequest {
                collection_name: collection,
                ids: &batch.ids,
                documents: &batch.documents,
                embeddings: &batch.embeddings,
                metadatas: &batch.metadatas,
            },
        )
        .await?;

        debug!("Upserted {} entries into '{}'", batch.len(), collection);
        Ok(())
    }

    #[instrument(skip(self, query_embeddings, filter))]
    async fn query(
        &self,
        collection: &str,
        query_embeddings: &[Vec<f32>],
        n_results: usize,
        filter: Option<&Metadata>,
    ) -> Result<QueryResult> {
        let result: QueryResult = self
            .post_json(
                &self.collection_url(collection, "query"),
                &QueryRequest {
                    collection_name: collection,
                    query_embeddings,
                    n_results,
                    filter,
                },
            )
            .await?;

        debug!(
            "Query returned {} documents",
            result.documents.first().map(Vec::len).unwrap_or(0)
        );
        Ok(result)
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, collection: &str, filter: Option<&Metadata>) -> Result<usize> {
        let response: CountResponse = self
            .post_json(
                &self.collection_url(collection, "count"),
                &CountRequest {
                    collection_name: collection,
                    filter,
                },
            )
            .await?;

        Ok(match response {
            CountResponse::Bare(n) | CountResponse::Wrapped { count: n } => n,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve_fixed;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_collection_urls() {
        let store = ChromaVectorStore::new("http://chroma:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            store.collection_url("transcriptions", "query"),
            "http://chroma:8000/api/v1/collections/transcriptions/query"
        );
    }

    #[test]
    fn test_query_request_wire_format() {
        let embeddings = vec![vec![0.5, 0.25]];
        let body = serde_json::to_value(QueryRequest {
            collection_name: "transcriptions",
            query_embeddings: &embeddings,
            n_results: 5,
            filter: None,
        })
        .unwrap();

        assert_eq!(
            body,
            json!({
                "collection_name": "transcriptions",
                "query_embeddings": [[0.5, 0.25]],
                "n_results": 5
            })
        );
    }

    #[test]
    fn test_collection_request_is_get_or_create() {
        let mut metadata = Metadata::new();
        metadata.insert("description".into(), json!("Transcription summaries and content"));
        let body = serde_json::to_value(CollectionRequest {
            name: "transcriptions",
            metadata: &metadata,
            get_or_create: true,
        })
        .unwrap();

        assert_eq!(body["get_or_create"], json!(true));
        assert_eq!(body["metadata"]["description"], json!("Transcription summaries and content"));
    }

    #[test]
    fn test_count_response_shapes() {
        let bare: CountResponse = serde_json::from_str("7").unwrap();
        let wrapped: CountResponse = serde_json::from_str(r#"{"count": 7}"#).unwrap();
        for response in [bare, wrapped] {
            let n = match response {
                CountResponse::Bare(n) | CountResponse::Wrapped { count: n } => n,
            };
            assert_eq!(n, 7);
        }
    }

    #[tokio::test]
    async fn test_ragged_upsert_rejected_before_any_request() {
        let store = ChromaVectorStore::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let batch = UpsertBatch {
            ids: vec!["a".into()],
            documents: vec![],
            embeddings: vec![vec![1.0]],
            metadatas: vec![Metadata::new()],
        };
        assert!(matches!(
            store.upsert("c", batch).await,
            Err(HuskError::Validation(_))
        ));
    }

    fn one_entry() -> UpsertBatch {
        let mut batch = UpsertBatch::default();
        batch.push("job-1".into(), "doc".into(), vec![1.0, 0.0], Metadata::new());
        batch
    }

    fn assert_status_error<T: std::fmt::Debug>(result: Result<T>, code: u16, body: &str) {
        match result {
            Err(HuskError::Provider {
                provider,
                status,
                message,
            }) => {
                assert_eq!(provider, "vector store");
                assert_eq!(status, Some(code));
                assert_eq!(message, body);
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    fn assert_decode_error<T: std::fmt::Debug>(result: Result<T>) {
        match result {
            Err(HuskError::Provider { status, message, .. }) => {
                assert_eq!(status, None);
                assert!(message.starts_with("undecodable response"));
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_status_carries_code_and_body() {
        let base = serve_fixed(StatusCode::UNPROCESSABLE_ENTITY, "dim mismatch").await;
        let store = ChromaVectorStore::new(&base, Duration::from_secs(5)).unwrap();

        assert_status_error(store.upsert("t", one_entry()).await, 422, "dim mismatch");
        assert_status_error(
            store.query("t", &[vec![1.0, 0.0]], 5, None).await,
            422,
            "dim mismatch",
        );
        assert_status_error(store.count("t", None).await, 422, "dim mismatch");

        let base = serve_fixed(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
        let store = ChromaVectorStore::new(&base, Duration::from_secs(5)).unwrap();
        assert_status_error(
            store.ensure_collection("t", &Metadata::new()).await,
            500,
            "boom",
        );
        assert_status_error(store.upsert("t", one_entry()).await, 500, "boom");
    }

    #[tokio::test]
    async fn test_undecodable_body_is_provider_error() {
        let base = serve_fixed(StatusCode::OK, "not json").await;
        let store = ChromaVectorStore::new(&base, Duration::from_secs(5)).unwrap();

        assert_decode_error(store.query("t", &[vec![1.0, 0.0]], 5, None).await);
        assert_decode_error(store.count("t", None).await);
        // Upsert ignores the response body.
        assert!(store.upsert("t", one_entry()).await.is_ok());
    }

    #[tokio::test]
    async fn test_successful_responses_decode() {
        let base = serve_fixed(
            StatusCode::OK,
            r#"{"ids": [["job-1"]], "documents": [["doc"]], "distances": [[0.1]], "count": 3}"#,
        )
        .await;
        let store = ChromaVectorStore::new(&base, Duration::from_secs(5)).unwrap();

        let result = store.query("t", &[vec![1.0, 0.0]], 5, None).await.unwrap();
        assert_eq!(result.first_documents(), vec!["doc".to_string()]);
        assert_eq!(store.count("t", None).await.unwrap(), 3);
    }
}
