//! Startup wiring for the service
//!
//! Loads the embedding model, connects to the vector index and checks that
//! the two agree on vector dimension before anything is served. Any failure
//! here is fatal.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::embedding::{CandleEmbedder, Embedder};
use crate::index::{QdrantIndex, VectorIndex};
use crate::relay::{MessageRelay, UnipileProvider};
use crate::retrieval::RetrievalService;

/// Load the configured embedding model on a blocking thread
pub async fn load_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let embedding_config = config.embedding.clone();
    tracing::info!(model = %embedding_config.model_id, "loading embedding model");

    let embedder = tokio::task::spawn_blocking(move || CandleEmbedder::load(&embedding_config))
        .await
        .context("Embedding model loader panicked")?
        .context("Failed to load embedding model")?;

    Ok(Arc::new(embedder))
}

/// Create the vector index client
pub fn connect_index(config: &Config) -> Result<Arc<dyn VectorIndex>> {
    let index = QdrantIndex::connect(&config.index)
        .with_context(|| format!("Failed to connect to vector index at {}", config.index.url))?;

    Ok(Arc::new(index))
}

/// Build the retrieval service from explicit handles and verify the collection
pub async fn retrieval_service(
    config: &Config,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
) -> Result<RetrievalService> {
    config.validate()?;

    let service = RetrievalService::new(embedder, index, config.index.collection.clone())
        .with_search_timeout(config.index.timeout());

    service
        .verify()
        .await
        .with_context(|| format!("Vector index check failed for collection {}", config.index.collection))?;

    Ok(service)
}

/// Load the model, connect the index and verify them against each other
pub async fn build_retrieval_service(config: &Config) -> Result<RetrievalService> {
    config.validate()?;

    let embedder = load_embedder(config).await?;
    let index = connect_index(config)?;
    retrieval_service(config, embedder, index).await
}

/// Relay for the configured provider account, or `None` when the account
/// hasn't been linked yet
pub fn build_relay(config: &Config) -> Result<Option<Arc<MessageRelay>>> {
    if !config.relay.is_configured() {
        tracing::warn!("messaging relay not configured; /send_whatsapp will fail");
        return Ok(None);
    }

    let provider = UnipileProvider::from_config(&config.relay).context("Failed to create messaging provider")?;
    let relay = MessageRelay::new(Arc::new(provider), config.relay.address_suffix.clone());

    Ok(Some(Arc::new(relay)))
}
