//! school-rag - School question answering over a vector index
//!
//! Turns a free-text question into a sentence embedding, searches a Qdrant
//! collection of school documents and returns the closest passages with their
//! similarity scores. A side channel relays answers to WhatsApp through
//! Unipile.
//!
//! # Architecture
//!
//! - **embedding**: text -> fixed-dimension vector (candle BERT model)
//! - **index**: nearest-neighbor search against a named collection (Qdrant)
//! - **retrieval**: composes the two and maps hits to the public schema
//! - **relay**: phone number normalization and provider delivery
//! - **server**: axum HTTP surface

pub mod errors;
pub use errors::{EmbedError, IndexError, RelayError, Result, RetrievalError};

pub mod config;
pub mod embedding;
pub mod index;
pub mod retrieval;
pub mod relay;

// Process plumbing
pub mod bootstrap;
pub mod cli;
pub mod server;
pub mod telemetry;
