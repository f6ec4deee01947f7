// Embedding engine: local sentence embeddings via candle
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::Deserialize;
use tokenizers::Tokenizer;

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::errors::EmbedError;

/// Shape facts read from the model's `config.json`
#[derive(Debug, Deserialize)]
struct ModelShape {
    hidden_size: usize,
    max_position_embeddings: usize,
}

/// sentence-transformers publishes the sequence limit it was trained with here
#[derive(Debug, Deserialize)]
struct SentenceBertConfig {
    max_seq_length: usize,
}

/// BERT sentence embedder (mean pooling + L2 normalization) running on CPU
pub struct CandleEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    dimension: usize,
    max_input_tokens: usize,
}

impl CandleEmbedder {
    /// Fetch the model from the Hugging Face hub (cached after first use) and load it
    pub fn load(config: &EmbeddingConfig) -> Result<Self, EmbedError> {
        let device = Device::Cpu;

        let api = Api::new()
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to create HuggingFace API client: {}", e)))?;
        let repo = api.repo(Repo::with_revision(
            config.model_id.clone(),
            RepoType::Model,
            config.revision.clone(),
        ));

        let config_path = repo
            .get("config.json")
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to download model config: {}", e)))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to download tokenizer: {}", e)))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to download model weights: {}", e)))?;

        let config_contents = std::fs::read_to_string(&config_path)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to read model config: {}", e)))?;
        let bert_config: BertConfig = serde_json::from_str(&config_contents)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to parse model config: {}", e)))?;
        let shape: ModelShape = serde_json::from_str(&config_contents)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to parse model shape: {}", e)))?;

        // Optional file; plain BERT checkpoints don't ship it
        let trained_limit = repo
            .get("sentence_bert_config.json")
            .ok()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|contents| serde_json::from_str::<SentenceBertConfig>(&contents).ok())
            .map(|c| c.max_seq_length);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to load tokenizer: {}", e)))?;
        // Over-length input must be rejected, not silently cut
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(None)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to configure tokenizer: {}", e)))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .map_err(|e| EmbedError::ModelLoad(format!("Failed to load model weights: {}", e)))?
        };
        let model = BertModel::load(vb, &bert_config)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to create BERT model: {}", e)))?;

        let max_input_tokens = resolve_input_limit(
            shape.max_position_embeddings,
            trained_limit,
            config.max_input_tokens,
        );

        tracing::info!(
            model = %config.model_id,
            dimension = shape.hidden_size,
            max_input_tokens,
            "embedding model loaded"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            model_id: config.model_id.clone(),
            dimension: shape.hidden_size,
            max_input_tokens,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn max_input_tokens(&self) -> usize {
        self.max_input_tokens
    }

    /// Mean pooling with attention mask
    fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor, EmbedError> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .expand(embeddings.shape())?
            .to_dtype(embeddings.dtype())?;

        let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
        let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

        Ok(sum_embeddings.broadcast_div(&sum_mask)?)
    }

    fn l2_normalize(pooled: &Tensor) -> Result<Tensor, EmbedError> {
        let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
        Ok(pooled.broadcast_div(&norm)?)
    }
}

impl Embedder for CandleEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.trim().is_empty() {
            return Err(EmbedError::InvalidInput("text is empty".to_string()));
        }

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbedError::Inference(format!("Tokenization failed: {}", e)))?;

        let ids = encoding.get_ids();
        check_token_budget(ids.len(), self.max_input_tokens)?;

        let token_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = token_ids.zeros_like()?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = Self::mean_pool(&hidden, &attention_mask)?;
        let normalized = Self::l2_normalize(&pooled)?;

        let vector = normalized.squeeze(0)?.to_vec1::<f32>()?;
        if vector.len() != self.dimension {
            return Err(EmbedError::Inference(format!(
                "model produced {} values, expected {}",
                vector.len(),
                self.dimension
            )));
        }

        Ok(vector)
    }
}

/// Effective token limit: the positional table caps everything, the trained
/// sequence length and the configured limit can only lower it
fn resolve_input_limit(
    max_position_embeddings: usize,
    trained_limit: Option<usize>,
    configured: Option<usize>,
) -> usize {
    [Some(max_position_embeddings), trained_limit, configured]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(max_position_embeddings)
}

/// Reject token sequences the model cannot attend over
fn check_token_budget(token_count: usize, max_input_tokens: usize) -> Result<(), EmbedError> {
    if token_count > max_input_tokens {
        return Err(EmbedError::InvalidInput(format!(
            "text is {} tokens, model accepts at most {}",
            token_count, max_input_tokens
        )));
    }
    Ok(())
}
