//! Configuration management for the school retrieval service
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.school-rag/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::relay::WHATSAPP_ADDRESS_SUFFIX;

type Result<T> = std::result::Result<T, ConfigError>;

/// Complete configuration, read once at process start
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub index: IndexConfig,
    pub embedding: EmbeddingConfig,
    pub relay: RelayConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allow any origin, method and header
    pub cors_permissive: bool,
}

/// Vector index connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Qdrant gRPC endpoint
    pub url: String,
    pub collection: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Embedding model selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Hugging Face model repository
    pub model_id: String,
    pub revision: String,
    /// Lower the model's own input limit (in tokens)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_input_tokens: Option<usize>,
}

/// Unipile messaging account used by the WhatsApp relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Unipile data source name, e.g. `api8.unipile.com:13851`
    pub dsn: String,
    pub api_key: String,
    pub account_id: String,
    pub address_suffix: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_permissive: true,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            collection: "school_info".to_string(),
            timeout_secs: 10,
            api_key: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            revision: "main".to_string(),
            max_input_tokens: None,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            api_key: String::new(),
            account_id: String::new(),
            address_suffix: WHATSAPP_ADDRESS_SUFFIX.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("Failed to read config {}: {}", path.display(), e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard config location, if a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".school-rag").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ConfigError("server.port must be greater than 0".to_string()));
        }

        if self.index.url.trim().is_empty() {
            return Err(ConfigError("index.url must not be empty".to_string()));
        }

        if self.index.collection.trim().is_empty() {
            return Err(ConfigError("index.collection must not be empty".to_string()));
        }

        if self.index.timeout_secs == 0 {
            return Err(ConfigError("index.timeout_secs must be greater than 0".to_string()));
        }

        if self.embedding.model_id.trim().is_empty() {
            return Err(ConfigError("embedding.model_id must not be empty".to_string()));
        }

        if self.embedding.max_input_tokens == Some(0) {
            return Err(ConfigError(
                "embedding.max_input_tokens must be greater than 0".to_string(),
            ));
        }

        if !self.relay.address_suffix.starts_with('@') {
            return Err(ConfigError(format!(
                "relay.address_suffix must start with '@': {}",
                self.relay.address_suffix
            )));
        }

        if self.relay.timeout_secs == 0 {
            return Err(ConfigError("relay.timeout_secs must be greater than 0".to_string()));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Copy safe to print: API keys masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.index.api_key.is_some() {
            config.index.api_key = Some("********".to_string());
        }
        if !config.relay.api_key.is_empty() {
            config.relay.api_key = "********".to_string();
        }
        config
    }
}

impl IndexConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RelayConfig {
    /// All credentials needed to send are present
    pub fn is_configured(&self) -> bool {
        !self.dsn.trim().is_empty()
            && !self.api_key.trim().is_empty()
            && !self.account_id.trim().is_empty()
    }

    /// Unipile REST base URL for this DSN
    pub fn base_url(&self) -> String {
        format!("https://{}/api/v1", self.dsn.trim())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
