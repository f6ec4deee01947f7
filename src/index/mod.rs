//! Vector index access
//!
//! [`VectorIndex`] is the seam between the retrieval service and the
//! externally maintained index; [`QdrantIndex`] talks to a Qdrant server.

pub mod qdrant;

pub use qdrant::QdrantIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::errors::IndexError;

/// Payload key holding the original passage text
pub const TEXT_PAYLOAD_KEY: &str = "text";

/// One raw hit returned by the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub payload: Map<String, JsonValue>,
}

impl SearchHit {
    pub fn new(id: impl Into<String>, score: f32, payload: Map<String, JsonValue>) -> Self {
        Self {
            id: id.into(),
            score,
            payload,
        }
    }

    /// The stored passage, if the payload carries it as a string
    pub fn text(&self) -> Option<&str> {
        self.payload.get(TEXT_PAYLOAD_KEY).and_then(JsonValue::as_str)
    }
}

/// Approximate nearest-neighbor search over named collections.
///
/// Implementations are shared across concurrent requests and must not hold
/// per-request mutable state.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Search `collection` for the `limit` vectors closest to `vector`.
    ///
    /// Hits come back ordered by descending similarity and never exceed
    /// `limit`. `limit` must be at least 1.
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<SearchHit>, IndexError>;

    /// Vector size the collection was built with
    async fn collection_dimension(&self, collection: &str) -> Result<usize, IndexError>;
}
