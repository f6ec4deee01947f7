// Retrieval service: query text -> embedding -> index search -> ranked results
use std::sync::Arc;
use std::time::Duration;

use crate::embedding::Embedder;
use crate::errors::{EmbedError, IndexError, Result, RetrievalError};
use crate::index::VectorIndex;

use super::types::{map_hits, Query, SearchResult};

/// Bound on a single index search when none is configured
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Answers school questions from a fixed collection.
///
/// Holds shared read-only handles only, so one instance serves any number of
/// concurrent requests.
pub struct RetrievalService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    search_timeout: Duration,
}

impl RetrievalService {
    /// Create new retrieval service
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            index,
            collection: collection.into(),
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }

    /// Override the index search bound
    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Startup check: the collection exists and was built with the
    /// embedder's dimension
    pub async fn verify(&self) -> std::result::Result<(), IndexError> {
        let expected = self.index.collection_dimension(&self.collection).await?;
        let actual = self.embedder.dimension();
        if expected != actual {
            return Err(IndexError::DimensionMismatch { expected, actual });
        }

        tracing::info!(collection = %self.collection, dimension = actual, "vector index verified");
        Ok(())
    }

    /// Retrieve the passages most similar to `request.text`.
    ///
    /// Results keep the index's order and never exceed `request.top_k`.
    pub async fn query_school(&self, request: &Query) -> Result<Vec<SearchResult>> {
        let limit = validate(request)?;

        let vector = self.embed(&request.text).await?;

        let search = self.index.search(&self.collection, vector, limit);
        let hits = match tokio::time::timeout(self.search_timeout, search).await {
            Ok(hits) => hits?,
            Err(_) => {
                return Err(IndexError::Unavailable(format!(
                    "search did not complete within {}ms",
                    self.search_timeout.as_millis()
                ))
                .into())
            }
        };

        tracing::debug!(
            collection = %self.collection,
            requested = limit,
            returned = hits.len(),
            "search complete"
        );

        Ok(map_hits(&hits, limit as usize))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedder = Arc::clone(&self.embedder);
        let text = text.to_string();

        let vector = tokio::task::spawn_blocking(move || embedder.encode(&text))
            .await
            .map_err(|e| EmbedError::Inference(format!("embedding task failed: {}", e)))??;

        Ok(vector)
    }
}

/// Reject empty text and non-positive counts before any work is done
fn validate(request: &Query) -> Result<u64> {
    if request.text.trim().is_empty() {
        return Err(RetrievalError::InvalidInput("query must not be empty".to_string()));
    }

    if request.top_k < 1 {
        return Err(RetrievalError::InvalidInput(format!(
            "top_k must be at least 1, got {}",
            request.top_k
        )));
    }

    Ok(request.top_k as u64)
}
