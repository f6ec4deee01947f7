//! Outbound WhatsApp relay
//!
//! Turns a free-form phone number into a provider chat address and forwards
//! text to the messaging provider. The provider sits behind [`ChatProvider`]
//! so the relay can be exercised without network access.

pub mod login;
pub mod unipile;

pub use login::{LoginHandshake, LoginOptions, QrCheckpoint};
pub use unipile::{UnipileClient, UnipileProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::errors::RelayError;

/// Default WhatsApp chat address domain
pub const WHATSAPP_ADDRESS_SUFFIX: &str = "@s.whatsapp.net";

/// Body of a relay request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub phone_number: String,
    pub message: String,
}

/// Keep only the ASCII digits of a phone number
pub fn normalize_phone_number(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// A messaging provider able to start a chat with one attendee
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send `text` to the provider address `attendee_id`, returning the
    /// provider's receipt
    async fn send_chat_message(&self, attendee_id: &str, text: &str) -> Result<JsonValue, RelayError>;
}

/// Normalizes destinations and delegates delivery to a provider
pub struct MessageRelay {
    provider: Arc<dyn ChatProvider>,
    address_suffix: String,
}

impl MessageRelay {
    pub fn new(provider: Arc<dyn ChatProvider>, address_suffix: impl Into<String>) -> Self {
        Self {
            provider,
            address_suffix: address_suffix.into(),
        }
    }

    /// Provider address for a raw phone number
    pub fn destination_address(&self, phone_number: &str) -> Result<String, RelayError> {
        let digits = normalize_phone_number(phone_number);
        if digits.is_empty() {
            return Err(RelayError::InvalidInput(format!(
                "phone number has no digits: {:?}",
                phone_number
            )));
        }

        Ok(format!("{}{}", digits, self.address_suffix))
    }

    /// Send `message` to `phone_number` and return the provider receipt
    pub async fn send_message(&self, phone_number: &str, message: &str) -> Result<JsonValue, RelayError> {
        if message.trim().is_empty() {
            return Err(RelayError::InvalidInput("message must not be empty".to_string()));
        }

        let address = self.destination_address(phone_number)?;
        let receipt = self.provider.send_chat_message(&address, message).await?;

        tracing::info!(destination = %address, "message relayed");
        Ok(receipt)
    }
}
