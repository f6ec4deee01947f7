//! One-time WhatsApp account linking
//!
//! Runs from the CLI, never inside the HTTP service: asks the provider for a
//! new account, hands the QR payload to the operator, then polls until the
//! phone has linked the device.

use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::Instant;

use super::UnipileClient;
use crate::errors::RelayError;

/// Polling behavior of the handshake
#[derive(Debug, Clone)]
pub struct LoginOptions {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(300),
        }
    }
}

/// Account created by the provider, waiting for its QR code to be scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrCheckpoint {
    pub account_id: String,
    pub qr_code: String,
}

impl QrCheckpoint {
    /// Extract account id and QR payload from the account-creation answer
    pub fn from_response(response: &JsonValue) -> Result<Self, RelayError> {
        let account_id = response
            .get("account_id")
            .and_then(JsonValue::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                RelayError::Login(format!("no account_id in provider response: {}", response))
            })?;

        let checkpoint = response.get("checkpoint");
        let qr_code = checkpoint
            .filter(|c| c.get("type").and_then(JsonValue::as_str) == Some("QRCODE"))
            .and_then(|c| c.get("qrcode"))
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                RelayError::Login(format!("no QR code checkpoint in provider response: {}", response))
            })?;

        Ok(Self {
            account_id: account_id.to_string(),
            qr_code: qr_code.to_string(),
        })
    }
}

/// Drives account creation and connection polling
pub struct LoginHandshake {
    client: UnipileClient,
    options: LoginOptions,
}

impl LoginHandshake {
    pub fn new(client: UnipileClient, options: LoginOptions) -> Self {
        Self { client, options }
    }

    /// Create the account and return its QR checkpoint
    pub async fn start(&self) -> Result<QrCheckpoint, RelayError> {
        let response = self.client.create_whatsapp_account().await?;
        let checkpoint = QrCheckpoint::from_response(&response)?;

        tracing::info!(account_id = %checkpoint.account_id, "WhatsApp account created, waiting for QR scan");
        Ok(checkpoint)
    }

    /// Poll until the account reports `connected`.
    ///
    /// A 404 means the provider is still initializing the account. Fails when
    /// the account reports `disconnected` or `max_wait` elapses.
    pub async fn wait_until_connected(&self, account_id: &str) -> Result<(), RelayError> {
        let deadline = Instant::now() + self.options.max_wait;

        loop {
            match self.client.account(account_id).await? {
                None => tracing::info!(account_id, "waiting for account initialization (404)"),
                Some(account) => {
                    let status = account.get("status").and_then(JsonValue::as_str).unwrap_or("unknown");
                    tracing::info!(account_id, status, "account status");

                    match status {
                        "connected" => return Ok(()),
                        "disconnected" => {
                            return Err(RelayError::Login(
                                "account disconnected; the QR code expired or was rejected".to_string(),
                            ))
                        }
                        _ => {}
                    }
                }
            }

            if Instant::now() + self.options.poll_interval > deadline {
                return Err(RelayError::Login(format!(
                    "account {} not connected within {}s",
                    account_id,
                    self.options.max_wait.as_secs()
                )));
            }

            tokio::time::sleep(self.options.poll_interval).await;
        }
    }
}
