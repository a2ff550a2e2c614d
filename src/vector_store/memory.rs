//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets. Distances are cosine distances
//! (`1 - cosine similarity`), so smaller means more similar.

use super::{cosine_similarity, Metadata, QueryResult, UpsertBatch, VectorStore};
use crate::error::{HuskError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

const PROVIDER: &str = "memory vector store";

#[derive(Debug, Clone)]
struct Entry {
    document: String,
    embedding: Vec<f32>,
    metadata: Metadata,
}

#[derive(Debug, Default)]
struct Collection {
    /// Fixed by the first write.
    dimension: Option<usize>,
    entries: HashMap<String, Entry>,
}

/// In-memory vector store.
pub struct MemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the stored document text for an id, if any.
    pub fn document(&self, collection: &str, id: &str) -> Option<String> {
        let collections = self.collections.read().ok()?;
        collections
            .get(collection)?
            .entries
            .get(id)
            .map(|e| e.document.clone())
    }

    /// Fetch the stored metadata for an id, if any.
    pub fn metadata(&self, collection: &str, id: &str) -> Option<Metadata> {
        let collections = self.collections.read().ok()?;
        collections
            .get(collection)?
            .entries
            .get(id)
            .map(|e| e.metadata.clone())
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error<E: std::fmt::Display>(e: E) -> HuskError {
    HuskError::provider(PROVIDER, format!("Failed to acquire lock: {}", e))
}

fn matches_filter(metadata: &Metadata, filter: Option<&Metadata>) -> bool {
    filter.map_or(true, |f| f.iter().all(|(k, v)| metadata.get(k) == Some(v)))
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn ensure_collection(&self, name: &str, _metadata: &Metadata) -> Result<()> {
        let mut collections = self.collections.write().map_err(lock_error)?;
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn upsert(&self, collection: &str, batch: UpsertBatch) -> Result<()> {
        batch.validate()?;

        let mut collections = self.collections.write().map_err(lock_error)?;
        let target = collections.get_mut(collection).ok_or_else(|| {
            HuskError::provider(PROVIDER, format!("collection '{}' does not exist", collection))
        })?;

        // Validate everything before writing so a bad batch leaves no partial state.
        let mut dimension = target.dimension;
        for embedding in &batch.embeddings {
            match dimension {
                Some(d) if d != embedding.len() => {
                    return Err(HuskError::provider(
                        PROVIDER,
                        format!(
                            "embedding dimension {} does not match collection dimension {}",
                            embedding.len(),
                            d
                        ),
                    ));
                }
                Some(_) => {}
                None => dimension = Some(embedding.len()),
            }
        }
        target.dimension = dimension;

        let UpsertBatch {
            ids,
            documents,
            embeddings,
            metadatas,
        } = batch;
        for (((id, document), embedding), metadata) in
            ids.into_iter().zip(documents).zip(embeddings).zip(metadatas)
        {
            target.entries.insert(
                id,
                Entry {
                    document,
                    embedding,
                    metadata,
                },
            );
        }

        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query_embeddings: &[Vec<f32>],
        n_results: usize,
        filter: Option<&Metadata>,
    ) -> Result<QueryResult> {
        let collections = self.collections.read().map_err(lock_error)?;
        let target = collections.get(collection).ok_or_else(|| {
            HuskError::provider(PROVIDER, format!("collection '{}' does not exist", collection))
        })?;

        let mut result = QueryResult::default();
        for query in query_embeddings {
            if let Some(d) = target.dimension {
                if d != query.len() {
                    return Err(HuskError::provider(
                        PROVIDER,
                        format!(
                            "query dimension {} does not match collection dimension {}",
                            query.len(),
                            d
                        ),
                    ));
                }
            }

            let mut scored: Vec<(&String, &Entry, f32)> = target
                .entries
                .iter()
                .filter(|(_, entry)| matches_filter(&entry.metadata, filter))
                .map(|(id, entry)| (id, entry, 1.0 - cosine_similarity(query, &entry.embedding)))
                .collect();

            scored.sort_by(|a, b| {
                a.2.partial_cmp(&b.2)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(b.0))
            });
            scored.truncate(n_results);

            result.ids.push(scored.iter().map(|(id, _, _)| (*id).clone()).collect());
            result
                .documents
                .push(scored.iter().map(|(_, e, _)| e.document.clone()).collect());
            result.distances.push(scored.iter().map(|(_, _, d)| *d).collect());
            result
                .metadatas
                .push(scored.iter().map(|(_, e, _)| Some(e.metadata.clone())).collect());
        }

        Ok(result)
    }

    async fn count(&self, collection: &str, filter: Option<&Metadata>) -> Result<usize> {
        let collections = self.collections.read().map_err(lock_error)?;
        Ok(collections
            .get(collection)
            .map(|c| {
                c.entries
                    .values()
                    .filter(|e| matches_filter(&e.metadata, filter))
                    .count()
            })
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(job: &str) -> Metadata {
        let mut m = Metadata::new();
        m.insert("transcription_id".into(), json!(job));
        m.insert("type".into(), json!("summary"));
        m
    }

    async fn seeded() -> MemoryVectorStore {
        let store = MemoryVectorStore::new();
        store.ensure_collection("t", &Metadata::new()).await.unwrap();

        let mut batch = UpsertBatch::default();
        batch.push("job-1".into(), "Hello world".into(), vec![1.0, 0.0, 0.0], meta("job-1"));
        batch.push("job-2".into(), "Goodbye world".into(), vec![0.0, 1.0, 0.0], meta("job-2"));
        store.upsert("t", batch).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_query_orders_closest_first() {
        let store = seeded().await;

        let result = store.query("t", &[vec![0.9, 0.1, 0.0]], 10, None).await.unwrap();
        assert_eq!(result.ids[0], vec!["job-1".to_string(), "job-2".to_string()]);
        assert!(result.distances[0][0] < result.distances[0][1]);

        let top = store.query("t", &[vec![0.0, 1.0, 0.0]], 1, None).await.unwrap();
        assert_eq!(top.first_documents(), vec!["Goodbye world".to_string()]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = seeded().await;

        let mut batch = UpsertBatch::default();
        batch.push("job-1".into(), "Hello again".into(), vec![1.0, 0.0, 0.0], meta("job-1"));
        store.upsert("t", batch).await.unwrap();

        assert_eq!(store.count("t", None).await.unwrap(), 2);
        assert_eq!(store.document("t", "job-1").as_deref(), Some("Hello again"));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_provider_error() {
        let store = seeded().await;

        let mut batch = UpsertBatch::default();
        batch.push("job-3".into(), "x".into(), vec![1.0, 0.0], meta("job-3"));
        let err = store.upsert("t", batch).await.unwrap_err();
        assert!(matches!(err, HuskError::Provider { .. }));
        assert_eq!(store.count("t", None).await.unwrap(), 2);

        assert!(store.query("t", &[vec![1.0]], 1, None).await.is_err());
    }

    #[tokio::test]
    async fn test_count_with_filter_and_missing_collection() {
        let store = seeded().await;

        let mut filter = Metadata::new();
        filter.insert("transcription_id".into(), json!("job-2"));
        assert_eq!(store.count("t", Some(&filter)).await.unwrap(), 1);
        assert_eq!(store.count("missing", None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_collection_returns_empty_group() {
        let store = MemoryVectorStore::new();
        store.ensure_collection("t", &Metadata::new()).await.unwrap();
        let result = store.query("t", &[vec![1.0]], 5, None).await.unwrap();
        assert_eq!(result.documents, vec![Vec::<String>::new()]);
    }

    #[tokio::test]
    async fn test_upsert_into_unknown_collection_fails() {
        let store = MemoryVectorStore::new();
        let mut batch = UpsertBatch::default();
        batch.push("a".into(), "doc".into(), vec![1.0], Metadata::new());
        assert!(store.upsert("nope", batch).await.is_err());
    }
}
