//! Provider layer: the boundary to the external messaging API.
//!
//! The dispatch engine only ever talks to [`ProviderClient`]; the bundled
//! [`TwilioClient`](crate::client::TwilioClient) implements it, and tests
//! substitute scripted stubs.

use async_trait::async_trait;

use crate::domain::{CallbackUrl, Line, ProviderMessageId, UnixTimestamp};

#[derive(Debug, Clone, PartialEq)]
/// Provider acknowledgement of an accepted message.
pub struct ProviderMessage {
    pub provider_message_id: ProviderMessageId,
    /// Status as reported by the provider (e.g. `queued`), not yet
    /// title-cased.
    pub status: String,
    /// Sender address as echoed by the provider, usually `+`-prefixed.
    pub from: String,
    /// Acceptance time reported by the provider.
    pub created_at: UnixTimestamp,
    /// Serialized response body, kept for diagnostics.
    pub raw_payload: String,
}

impl ProviderMessage {
    /// Sending line as stored in the log `channel`: the echoed `from` with
    /// every `+` stripped.
    pub fn channel(&self) -> String {
        self.from.replace('+', "")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{detail}")]
/// A failed send attempt, carrying the provider's error detail.
pub struct ProviderError {
    detail: String,
}

impl ProviderError {
    /// Wrap an error detail string.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    /// The detail as recorded in the cycle error list.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Sends one message through the external provider.
///
/// `to` is the already-normalized destination
/// (see [`Destination::sendable`](crate::domain::Destination::sendable));
/// normalization is the engine's job, not the client's. Implementations
/// should bound the call with a timeout and report it as an error.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn send(
        &self,
        from: &Line,
        to: &str,
        body: &str,
        callback_url: Option<&CallbackUrl>,
    ) -> Result<ProviderMessage, ProviderError>;
}
