//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Map, Value as JsonValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use school_rag::embedding::Embedder;
use school_rag::errors::{EmbedError, IndexError, RelayError};
use school_rag::index::{SearchHit, VectorIndex};
use school_rag::relay::ChatProvider;
use school_rag::retrieval::RetrievalService;

pub const DIMENSION: usize = 4;
pub const COLLECTION: &str = "school_info";

/// Embedder returning a constant vector and counting calls
pub struct FakeEmbedder {
    dimension: usize,
    calls: AtomicUsize,
    failure: Option<String>,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicUsize::new(0),
            failure: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(DIMENSION)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for FakeEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(EmbedError::Inference(message.clone()));
        }
        if text.trim().is_empty() {
            return Err(EmbedError::InvalidInput("text is empty".to_string()));
        }
        Ok(vec![0.5; self.dimension])
    }
}

/// Index answering every search with scripted hits (truncated to the limit)
/// or a scripted error
pub struct FakeIndex {
    hits: Vec<SearchHit>,
    failure: Option<IndexError>,
    delay: Option<Duration>,
    dimension: usize,
    calls: AtomicUsize,
    last_request: Mutex<Option<(String, usize, u64)>>,
}

impl FakeIndex {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            failure: None,
            delay: None,
            dimension: DIMENSION,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing(error: IndexError) -> Self {
        Self {
            failure: Some(error),
            ..Self::with_hits(Vec::new())
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::with_hits(Vec::new())
        }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// (collection, vector length, limit) of the last search
    pub fn last_request(&self) -> Option<(String, usize, u64)> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<SearchHit>, IndexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((collection.to_string(), vector.len(), limit));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self.hits.iter().take(limit as usize).cloned().collect())
    }

    async fn collection_dimension(&self, collection: &str) -> Result<usize, IndexError> {
        if collection != COLLECTION {
            return Err(IndexError::CollectionNotFound(collection.to_string()));
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self.dimension)
    }
}

/// Provider recording every delivery
#[derive(Default)]
pub struct FakeProvider {
    pub sent: Mutex<Vec<(String, String)>>,
    pub failure: Option<(u16, String)>,
}

impl FakeProvider {
    pub fn rejecting(status: u16, body: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Some((status, body.to_string())),
        }
    }
}

#[async_trait]
impl ChatProvider for FakeProvider {
    async fn send_chat_message(&self, attendee_id: &str, text: &str) -> Result<JsonValue, RelayError> {
        if let Some((status, body)) = &self.failure {
            return Err(RelayError::RelayFailed {
                status: *status,
                body: body.clone(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((attendee_id.to_string(), text.to_string()));
        Ok(json!({"object": "ChatStarted", "chat_id": "chat_1", "message_id": "msg_1"}))
    }
}

/// Hit carrying `{"text": text}`
pub fn text_hit(id: &str, score: f32, text: &str) -> SearchHit {
    let mut payload = Map::new();
    payload.insert("text".to_string(), JsonValue::from(text));
    SearchHit::new(id, score, payload)
}

/// The two passages of the "school start" scenario
pub fn school_hits() -> Vec<SearchHit> {
    vec![
        text_hit("1", 0.91, "School starts at 8:00 AM"),
        text_hit("2", 0.77, "Office hours are 9-5"),
    ]
}

pub fn service(embedder: Arc<FakeEmbedder>, index: Arc<FakeIndex>) -> RetrievalService {
    RetrievalService::new(embedder, index, COLLECTION)
}
