//! Vector store abstraction for Husk.
//!
//! A thin facade over a remote similarity index. Every call names the collection it
//! operates on; callers in this crate only ever use one.

mod chroma;
mod memory;

pub use chroma::ChromaVectorStore;
pub use memory::MemoryVectorStore;

use crate::error::{HuskError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Free-form metadata attached to a stored entry or used as an equality filter.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Entries to write in one upsert call. The four sequences are parallel.
#[derive(Debug, Clone, Default)]
pub struct UpsertBatch {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub metadatas: Vec<Metadata>,
}

impl UpsertBatch {
    /// Append one entry.
    pub fn push(&mut self, id: String, document: String, embedding: Vec<f32>, metadata: Metadata) {
        self.ids.push(id);
        self.documents.push(document);
        self.embeddings.push(embedding);
        self.metadatas.push(metadata);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Check that all parallel sequences have equal length.
    pub fn validate(&self) -> Result<()> {
        let n = self.ids.len();
        if self.documents.len() != n || self.embeddings.len() != n || self.metadatas.len() != n {
            return Err(HuskError::Validation(format!(
                "upsert sequences differ in length: {} ids, {} documents, {} embeddings, {} metadatas",
                n,
                self.documents.len(),
                self.embeddings.len(),
                self.metadatas.len()
            )));
        }
        Ok(())
    }
}

/// Similarity query results, grouped per query vector (closest first within a group).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub ids: Vec<Vec<String>>,
    #[serde(default)]
    pub documents: Vec<Vec<String>>,
    #[serde(default)]
    pub distances: Vec<Vec<f32>>,
    #[serde(default)]
    pub metadatas: Vec<Vec<Option<Metadata>>>,
}

impl QueryResult {
    /// Documents matched by the first query vector, or empty when there were none.
    pub fn first_documents(self) -> Vec<String> {
        self.documents.into_iter().next().unwrap_or_default()
    }
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Get or create a collection. Idempotent.
    async fn ensure_collection(&self, name: &str, metadata: &Metadata) -> Result<()>;

    /// Insert or replace entries keyed by id.
    async fn upsert(&self, collection: &str, batch: UpsertBatch) -> Result<()>;

    /// Return the `n_results` nearest entries for each query vector.
    async fn query(
        &self,
        collection: &str,
        query_embeddings: &[Vec<f32>],
        n_results: usize,
        filter: Option<&Metadata>,
    ) -> Result<QueryResult>;

    /// Count entries, optionally restricted by a metadata filter.
    async fn count(&self, collection: &str, filter: Option<&Metadata>) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_batch_validation_rejects_ragged_sequences() {
        let mut batch = UpsertBatch::default();
        batch.push("a".into(), "doc".into(), vec![1.0], Metadata::new());
        assert!(batch.validate().is_ok());

        batch.documents.push("extra".into());
        assert!(matches!(batch.validate(), Err(HuskError::Validation(_))));
    }

    #[test]
    fn test_query_result_decodes_store_payload() {
        let json = r#"{
            "ids": [["job-1", "job-2"]],
            "documents": [["Transcript: a", "Transcript: b"]],
            "distances": [[0.1, 0.4]],
            "metadatas": [[{"transcription_id": "job-1", "type": "summary"}, null]]
        }"#;
        let result: QueryResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.metadatas[0][1], None);
        assert_eq!(
            result.first_documents(),
            vec!["Transcript: a".to_string(), "Transcript: b".to_string()]
        );
    }

    #[test]
    fn test_empty_query_result_has_no_documents() {
        let result: QueryResult = serde_json::from_str(r#"{"ids": [], "documents": []}"#).unwrap();
        assert!(result.first_documents().is_empty());
    }
}
