//! Dispatch engine: expiry, round-robin line selection, and the send cycle.
//!
//! [`DispatchEngine::sync`] is the unit of work an external scheduler invokes
//! periodically. One cycle expires stale pending messages, fetches a bounded
//! batch, and attempts to send each record in batch order. A failed send
//! never aborts the batch; only store failures end the cycle early.

mod allocator;

pub use allocator::LineAllocator;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::{
    CallbackUrl, Destination, Direction, InboundSms, KnownMessageStatus, Line, MessageBody,
    MessageId, MessageRecord, MessageStatus, NewMessage, ProviderMessageId, SyncReport,
    UnixTimestamp,
};
use crate::provider::{ProviderClient, ProviderError};
use crate::store::{MessageStore, RecordFilter, RecordPatch, StoreError};

/// Default cap on pending messages fetched per configured line, per cycle.
pub const DEFAULT_PER_LINE_LIMIT: usize = 50;

/// Default age (seconds) after which an unsent pending message is expired.
pub const DEFAULT_VALIDITY_WINDOW_SECS: u64 = 4320;

#[derive(Debug, thiserror::Error)]
/// Engine construction failure. Fatal; the engine never starts without lines.
pub enum ConfigError {
    #[error("no outbound lines configured")]
    NoLines,
}

#[derive(Debug, thiserror::Error)]
/// A dispatch cycle failure.
///
/// Per-message provider errors are *not* represented here; they are collected
/// into [`SyncReport::errors`]. Only store failures abort a cycle, and
/// partial progress from earlier steps is not rolled back.
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

trait Clock: Send + Sync {
    fn now(&self) -> UnixTimestamp;
}

struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixTimestamp {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        UnixTimestamp::new(secs)
    }
}

#[derive(Clone)]
/// Builder for [`DispatchEngine`].
pub struct DispatchEngineBuilder {
    store: Arc<dyn MessageStore>,
    provider: Arc<dyn ProviderClient>,
    lines: Vec<Line>,
    per_line_limit: usize,
    validity_window_secs: u64,
    callback_url: Option<CallbackUrl>,
}

impl DispatchEngineBuilder {
    /// Start a builder with default limits and no lines configured.
    pub fn new(store: Arc<dyn MessageStore>, provider: Arc<dyn ProviderClient>) -> Self {
        Self {
            store,
            provider,
            lines: Vec::new(),
            per_line_limit: DEFAULT_PER_LINE_LIMIT,
            validity_window_secs: DEFAULT_VALIDITY_WINDOW_SECS,
            callback_url: None,
        }
    }

    /// Add one sending line to the rotation.
    pub fn line(mut self, line: Line) -> Self {
        self.lines.push(line);
        self
    }

    /// Add sending lines to the rotation, in order.
    pub fn lines(mut self, lines: impl IntoIterator<Item = Line>) -> Self {
        self.lines.extend(lines);
        self
    }

    /// Cap on pending messages fetched per line, per cycle (default 50).
    pub fn per_line_limit(mut self, limit: usize) -> Self {
        self.per_line_limit = limit;
        self
    }

    /// Age in seconds after which an unsent pending message is expired to
    /// `SendingFailed` (default 4320).
    pub fn validity_window_secs(mut self, secs: u64) -> Self {
        self.validity_window_secs = secs;
        self
    }

    /// Status-callback URL passed to the provider with every send.
    pub fn callback_url(mut self, url: CallbackUrl) -> Self {
        self.callback_url = Some(url);
        self
    }

    /// Build a [`DispatchEngine`]. Fails if no lines were configured.
    pub fn build(self) -> Result<DispatchEngine, ConfigError> {
        let allocator = LineAllocator::new(self.lines)?;
        Ok(DispatchEngine {
            store: self.store,
            provider: self.provider,
            allocator,
            per_line_limit: self.per_line_limit,
            validity_window_secs: self.validity_window_secs,
            callback_url: self.callback_url,
            clock: Arc::new(SystemClock),
            sent_count: 0,
            errors: Vec::new(),
        })
    }
}

/// Queues outbound messages and forwards them to the provider.
///
/// `sync` takes `&mut self`: a given engine instance runs one cycle at a
/// time, and the caller decides when cycles happen.
pub struct DispatchEngine {
    store: Arc<dyn MessageStore>,
    provider: Arc<dyn ProviderClient>,
    allocator: LineAllocator,
    per_line_limit: usize,
    validity_window_secs: u64,
    callback_url: Option<CallbackUrl>,
    clock: Arc<dyn Clock>,
    sent_count: usize,
    errors: Vec<String>,
}

impl DispatchEngine {
    /// Start building an engine over a store and a provider client.
    pub fn builder(
        store: Arc<dyn MessageStore>,
        provider: Arc<dyn ProviderClient>,
    ) -> DispatchEngineBuilder {
        DispatchEngineBuilder::new(store, provider)
    }

    /// Queue an outbound message.
    ///
    /// The message is not sent here; it is inserted as `Pending` and picked
    /// up by the next [`DispatchEngine::sync`] cycle.
    pub async fn enqueue(
        &self,
        destination: Destination,
        body: MessageBody,
    ) -> Result<MessageId, StoreError> {
        let values = NewMessage::outbound(destination, body, self.clock.now());
        self.store.insert(values).await
    }

    /// Run one dispatch cycle: expire, fetch, send.
    ///
    /// Returns the cycle report; [`DispatchEngine::sent_count`] and
    /// [`DispatchEngine::errors`] reflect the same cycle until the next call.
    pub async fn sync(&mut self) -> Result<SyncReport, SyncError> {
        self.sent_count = 0;
        self.errors.clear();

        let now = self.clock.now();
        self.expire_pending(now).await?;

        let batch = self
            .store
            .fetch(
                RecordFilter {
                    status: Some(KnownMessageStatus::Pending.into()),
                    ..Default::default()
                },
                self.per_line_limit * self.allocator.len(),
            )
            .await?;

        tracing::debug!(batch = batch.len(), "dispatching pending messages");

        for record in &batch {
            if let Some(err) = self.send_one(record).await? {
                self.errors.push(format!(
                    "Error sending SMS to number {}. Error message: {err}",
                    record.destination.raw()
                ));
            }
            self.sent_count += 1;
        }

        Ok(SyncReport {
            sent_count: self.sent_count,
            errors: self.errors.clone(),
        })
    }

    /// Send attempts made by the most recent cycle.
    pub fn sent_count(&self) -> usize {
        self.sent_count
    }

    /// Errors collected by the most recent cycle.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Apply a provider status callback to the matching record.
    ///
    /// Callback parsing/verification happens outside this crate; this takes
    /// the provider message id and raw status value and title-cases the
    /// status into the log. Returns the number of records updated (zero when
    /// the sid is unknown).
    pub async fn apply_status_callback(
        &self,
        provider_message_id: &ProviderMessageId,
        raw_status: &str,
    ) -> Result<u64, StoreError> {
        self.store
            .update_where(
                RecordPatch {
                    status: Some(MessageStatus::from_provider(raw_status)),
                    ..Default::default()
                },
                RecordFilter {
                    provider_message_id: Some(provider_message_id.clone()),
                    ..Default::default()
                },
            )
            .await
    }

    /// Record an inbound SMS delivered by a provider receive callback.
    pub async fn record_inbound(&self, sms: InboundSms) -> Result<MessageId, StoreError> {
        let values = NewMessage {
            direction: Direction::Inbound,
            destination: sms.from,
            body: sms.body,
            created_at: self.clock.now(),
            status: KnownMessageStatus::Received.into(),
            provider_message_id: Some(sms.provider_message_id),
            channel: Some(sms.channel),
            raw_provider_payload: Some(sms.raw_payload),
        };
        self.store.insert(values).await
    }

    /// Expire pending outbound messages older than the validity window, as
    /// one set-based update. Runs before the fetch so an expired record can
    /// never be sent in the same cycle.
    async fn expire_pending(&self, now: UnixTimestamp) -> Result<(), StoreError> {
        let cutoff = now.saturating_sub_secs(self.validity_window_secs);
        let expired = self
            .store
            .update_where(
                RecordPatch {
                    status: Some(KnownMessageStatus::SendingFailed.into()),
                    ..Default::default()
                },
                RecordFilter {
                    status: Some(KnownMessageStatus::Pending.into()),
                    direction: Some(Direction::Outbound),
                    created_before: Some(cutoff),
                    ..Default::default()
                },
            )
            .await?;
        if expired > 0 {
            tracing::warn!(expired, "expired stale pending messages");
        }
        Ok(())
    }

    /// Attempt one record. A provider failure is returned as `Ok(Some(err))`
    /// and leaves the record `Pending` with the error detail attached; store
    /// failures propagate and abort the cycle.
    async fn send_one(&self, record: &MessageRecord) -> Result<Option<ProviderError>, StoreError> {
        let line = self.allocator.next_line();
        let to = record.destination.sendable();

        tracing::debug!(id = %record.id, to = %to, line = line.as_str(), "sending message");

        match self
            .provider
            .send(line, &to, record.body.as_str(), self.callback_url.as_ref())
            .await
        {
            Ok(message) => {
                let patch = RecordPatch {
                    status: Some(MessageStatus::from_provider(message.status.clone())),
                    provider_message_id: Some(message.provider_message_id.clone()),
                    channel: Some(message.channel()),
                    created_at: Some(message.created_at),
                    raw_provider_payload: Some(message.raw_payload),
                };
                self.store.update_by_id(record.id, patch).await?;
                Ok(None)
            }
            Err(err) => {
                tracing::warn!(id = %record.id, error = %err, "send failed");
                self.store
                    .update_by_id(
                        record.id,
                        RecordPatch {
                            raw_provider_payload: Some(err.detail().to_owned()),
                            ..Default::default()
                        },
                    )
                    .await?;
                Ok(Some(err))
            }
        }
    }
}
