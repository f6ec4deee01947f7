// Unipile REST client: chat delivery and account handshake endpoints
use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

use super::ChatProvider;
use crate::config::RelayConfig;
use crate::errors::RelayError;

/// Thin client over the Unipile API (`https://{dsn}/api/v1`)
#[derive(Clone)]
pub struct UnipileClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl UnipileClient {
    /// Create a client for an explicit base URL
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Create a client from the `[relay]` config table; account id not required
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        if config.dsn.trim().is_empty() {
            return Err(RelayError::NotConfigured("relay.dsn is empty".to_string()));
        }
        if config.api_key.trim().is_empty() {
            return Err(RelayError::NotConfigured("relay.api_key is empty".to_string()));
        }

        Self::new(config.base_url(), config.api_key.clone(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start (or reuse) a chat with one attendee and post `text` to it
    pub async fn start_chat(&self, account_id: &str, attendee_id: &str, text: &str) -> Result<JsonValue, RelayError> {
        let form = Form::new()
            .text("account_id", account_id.to_string())
            .text("attendees_ids", attendee_id.to_string())
            .text("text", text.to_string());

        let response = self
            .client
            .post(format!("{}/chats", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .header("accept", "application/json")
            .multipart(form)
            .send()
            .await?;

        Self::receipt(response).await
    }

    /// Ask the provider for a new WhatsApp account; the answer carries the
    /// account id and the QR checkpoint
    pub async fn create_whatsapp_account(&self) -> Result<JsonValue, RelayError> {
        let response = self
            .client
            .post(format!("{}/accounts", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .header("accept", "application/json")
            .json(&json!({
                "type": "messenger",
                "provider": "WHATSAPP",
            }))
            .send()
            .await?;

        Self::receipt(response).await
    }

    /// Current account record, or `None` while the provider still answers 404
    pub async fn account(&self, account_id: &str) -> Result<Option<JsonValue>, RelayError> {
        let response = self
            .client
            .get(format!("{}/accounts/{}", self.base_url, account_id))
            .header("X-API-KEY", &self.api_key)
            .header("accept", "application/json")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Self::receipt(response).await.map(Some)
    }

    async fn receipt(response: Response) -> Result<JsonValue, RelayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::RelayFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(JsonValue::Null);
        }

        serde_json::from_str(&body).map_err(|e| RelayError::RelayFailed {
            status: status.as_u16(),
            body: format!("unparseable provider response ({}): {}", e, body),
        })
    }
}

/// [`ChatProvider`] bound to one connected Unipile account
pub struct UnipileProvider {
    client: UnipileClient,
    account_id: String,
}

impl UnipileProvider {
    pub fn new(client: UnipileClient, account_id: impl Into<String>) -> Self {
        Self {
            client,
            account_id: account_id.into(),
        }
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        if config.account_id.trim().is_empty() {
            return Err(RelayError::NotConfigured(
                "relay.account_id is empty; run `school-rag whatsapp-login` first".to_string(),
            ));
        }

        Ok(Self::new(UnipileClient::from_config(config)?, config.account_id.clone()))
    }
}

#[async_trait]
impl ChatProvider for UnipileProvider {
    async fn send_chat_message(&self, attendee_id: &str, text: &str) -> Result<JsonValue, RelayError> {
        self.client.start_chat(&self.account_id, attendee_id, text).await
    }
}
