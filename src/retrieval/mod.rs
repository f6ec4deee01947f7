// Retrieval pipeline: the only part of the service with a real contract
pub mod service;
pub mod types;

pub use service::{RetrievalService, DEFAULT_SEARCH_TIMEOUT};
pub use types::{map_hits, Query, SearchResult, DEFAULT_TOP_K};
