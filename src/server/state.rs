use std::sync::Arc;

use crate::relay::MessageRelay;
use crate::retrieval::RetrievalService;

/// Shared application state, constructed once at startup
#[derive(Clone)]
pub struct AppState {
    pub retrieval: Arc<RetrievalService>,

    /// Absent when no provider account is configured
    pub relay: Option<Arc<MessageRelay>>,
}

impl AppState {
    pub fn new(retrieval: Arc<RetrievalService>, relay: Option<Arc<MessageRelay>>) -> Self {
        Self { retrieval, relay }
    }
}
