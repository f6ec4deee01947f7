//! Text embedding
//!
//! The retrieval service depends only on the [`Embedder`] trait; the
//! candle-backed [`CandleEmbedder`] is the production implementation.

pub mod engine;

pub use engine::CandleEmbedder;

use crate::errors::EmbedError;

/// Maps text to a vector of fixed dimension.
///
/// The dimension is decided when the implementation is constructed and must
/// not change afterwards. `encode` is CPU bound and may block; async callers
/// should run it on a blocking thread.
pub trait Embedder: Send + Sync {
    /// Length of every vector returned by [`Embedder::encode`]
    fn dimension(&self) -> usize;

    /// Embed a single text.
    ///
    /// Fails with [`EmbedError::InvalidInput`] for empty text or text longer
    /// than the model accepts.
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}
