//! Store layer: the message log behind a queryable/updatable port.
//!
//! The queue does not own persistence. Deployments back [`MessageStore`] with
//! their own database; [`InMemoryStore`] is the reference implementation used
//! in tests and demos.

mod memory;

pub use memory::InMemoryStore;

use std::error::Error as StdError;

use async_trait::async_trait;

use crate::domain::{
    Direction, MessageId, MessageRecord, MessageStatus, NewMessage, ProviderMessageId,
    UnixTimestamp,
};

#[derive(Debug, thiserror::Error)]
/// Errors surfaced by a [`MessageStore`] implementation.
pub enum StoreError {
    /// No row exists for the given id.
    #[error("message not found: {id}")]
    NotFound { id: MessageId },

    /// Backend failure (connection, query, serialization, etc).
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Conjunction of row predicates. `None` fields match everything.
pub struct RecordFilter {
    pub status: Option<MessageStatus>,
    pub direction: Option<Direction>,
    /// Strictly-less-than bound on `created_at`.
    pub created_before: Option<UnixTimestamp>,
    pub provider_message_id: Option<ProviderMessageId>,
}

impl RecordFilter {
    /// Whether a record satisfies every set predicate.
    pub fn matches(&self, record: &MessageRecord) -> bool {
        if let Some(status) = &self.status {
            if record.status != *status {
                return false;
            }
        }
        if let Some(direction) = self.direction {
            if record.direction != direction {
                return false;
            }
        }
        if let Some(cutoff) = self.created_before {
            if record.created_at >= cutoff {
                return false;
            }
        }
        if let Some(sid) = &self.provider_message_id {
            if record.provider_message_id.as_ref() != Some(sid) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Field updates applied to matching rows. `None` fields are left untouched.
pub struct RecordPatch {
    pub status: Option<MessageStatus>,
    pub provider_message_id: Option<ProviderMessageId>,
    pub channel: Option<String>,
    pub created_at: Option<UnixTimestamp>,
    pub raw_provider_payload: Option<String>,
}

impl RecordPatch {
    /// Apply every set field to a record in place.
    pub fn apply(&self, record: &mut MessageRecord) {
        if let Some(status) = &self.status {
            record.status = status.clone();
        }
        if let Some(sid) = &self.provider_message_id {
            record.provider_message_id = Some(sid.clone());
        }
        if let Some(channel) = &self.channel {
            record.channel = Some(channel.clone());
        }
        if let Some(created_at) = self.created_at {
            record.created_at = created_at;
        }
        if let Some(payload) = &self.raw_provider_payload {
            record.raw_provider_payload = Some(payload.clone());
        }
    }
}

/// Message log table as consumed by the dispatch engine.
///
/// Implementations must return [`MessageStore::fetch`] results in an order
/// that is deterministic for a given store state; the engine dispatches in
/// fetch order and tests rely on reproducibility.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert a new row and return its store-assigned id.
    async fn insert(&self, values: NewMessage) -> Result<MessageId, StoreError>;

    /// Apply a patch to every row matching the filter, as one set-based
    /// update. Returns the number of affected rows.
    async fn update_where(
        &self,
        patch: RecordPatch,
        filter: RecordFilter,
    ) -> Result<u64, StoreError>;

    /// Fetch up to `limit` rows matching the filter.
    async fn fetch(
        &self,
        filter: RecordFilter,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, StoreError>;

    /// Apply a patch to the single row with the given id.
    async fn update_by_id(&self, id: MessageId, patch: RecordPatch) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Destination, KnownMessageStatus, MessageBody};

    fn record(created_at: u64) -> MessageRecord {
        MessageRecord {
            id: MessageId::new(1),
            direction: Direction::Outbound,
            destination: Destination::new("5551234567").unwrap(),
            body: MessageBody::new("hi").unwrap(),
            created_at: UnixTimestamp::new(created_at),
            status: KnownMessageStatus::Pending.into(),
            provider_message_id: None,
            channel: None,
            raw_provider_payload: None,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(RecordFilter::default().matches(&record(0)));
    }

    #[test]
    fn filter_is_a_conjunction() {
        let filter = RecordFilter {
            status: Some(KnownMessageStatus::Pending.into()),
            direction: Some(Direction::Outbound),
            created_before: Some(UnixTimestamp::new(100)),
            ..Default::default()
        };

        assert!(filter.matches(&record(99)));
        // created_before is strict.
        assert!(!filter.matches(&record(100)));

        let mut inbound = record(99);
        inbound.direction = Direction::Inbound;
        assert!(!filter.matches(&inbound));

        let mut sent = record(99);
        sent.status = KnownMessageStatus::Sent.into();
        assert!(!filter.matches(&sent));
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut rec = record(50);
        let patch = RecordPatch {
            status: Some(KnownMessageStatus::SendingFailed.into()),
            raw_provider_payload: Some("boom".to_owned()),
            ..Default::default()
        };
        patch.apply(&mut rec);

        assert_eq!(rec.status.known(), Some(KnownMessageStatus::SendingFailed));
        assert_eq!(rec.raw_provider_payload.as_deref(), Some("boom"));
        assert_eq!(rec.created_at, UnixTimestamp::new(50));
        assert_eq!(rec.provider_message_id, None);
        assert_eq!(rec.channel, None);
    }
}
