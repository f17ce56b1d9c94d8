use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::{MessageId, MessageRecord, NewMessage};
use crate::store::{MessageStore, RecordFilter, RecordPatch, StoreError};

/// In-memory [`MessageStore`] with id-ascending (insertion) fetch order.
///
/// Intended for tests and demos; the ordering guarantee makes dispatch cycles
/// reproducible for a given sequence of inserts.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    rows: BTreeMap<u64, MessageRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up one row by id. Test/demo convenience, not part of the port.
    pub fn get(&self, id: MessageId) -> Option<MessageRecord> {
        let state = self.lock();
        state.rows.get(&id.value()).cloned()
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn insert(&self, values: NewMessage) -> Result<MessageId, StoreError> {
        let mut state = self.lock();
        state.next_id += 1;
        let id = MessageId::new(state.next_id);
        let record = MessageRecord {
            id,
            direction: values.direction,
            destination: values.destination,
            body: values.body,
            created_at: values.created_at,
            status: values.status,
            provider_message_id: values.provider_message_id,
            channel: values.channel,
            raw_provider_payload: values.raw_provider_payload,
        };
        state.rows.insert(id.value(), record);
        Ok(id)
    }

    async fn update_where(
        &self,
        patch: RecordPatch,
        filter: RecordFilter,
    ) -> Result<u64, StoreError> {
        let mut state = self.lock();
        let mut affected = 0;
        for record in state.rows.values_mut() {
            if filter.matches(record) {
                patch.apply(record);
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn fetch(
        &self,
        filter: RecordFilter,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, StoreError> {
        let state = self.lock();
        Ok(state
            .rows
            .values()
            .filter(|record| filter.matches(record))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_by_id(&self, id: MessageId, patch: RecordPatch) -> Result<(), StoreError> {
        let mut state = self.lock();
        let record = state
            .rows
            .get_mut(&id.value())
            .ok_or(StoreError::NotFound { id })?;
        patch.apply(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Destination, Direction, KnownMessageStatus, MessageBody, UnixTimestamp};

    fn queued(n: u64) -> NewMessage {
        NewMessage::outbound(
            Destination::new(format!("555123456{n}")).unwrap(),
            MessageBody::new(format!("msg {n}")).unwrap(),
            UnixTimestamp::new(1_000 + n),
        )
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = InMemoryStore::new();
        let a = store.insert(queued(1)).await.unwrap();
        let b = store.insert(queued(2)).await.unwrap();
        assert!(b > a);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn fetch_returns_rows_in_insertion_order_up_to_limit() {
        let store = InMemoryStore::new();
        for n in 0..5 {
            store.insert(queued(n)).await.unwrap();
        }

        let filter = RecordFilter {
            status: Some(KnownMessageStatus::Pending.into()),
            ..Default::default()
        };
        let rows = store.fetch(filter, 3).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].body.as_str(), "msg 0");
        assert_eq!(rows[1].body.as_str(), "msg 1");
        assert_eq!(rows[2].body.as_str(), "msg 2");
    }

    #[tokio::test]
    async fn update_where_is_set_based_and_counts_rows() {
        let store = InMemoryStore::new();
        for n in 0..3 {
            store.insert(queued(n)).await.unwrap();
        }
        // One row already dispatched; it must not match.
        let sent = store.insert(queued(9)).await.unwrap();
        store
            .update_by_id(
                sent,
                RecordPatch {
                    status: Some(KnownMessageStatus::Sent.into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let affected = store
            .update_where(
                RecordPatch {
                    status: Some(KnownMessageStatus::SendingFailed.into()),
                    ..Default::default()
                },
                RecordFilter {
                    status: Some(KnownMessageStatus::Pending.into()),
                    direction: Some(Direction::Outbound),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(affected, 3);

        let remaining = store
            .fetch(
                RecordFilter {
                    status: Some(KnownMessageStatus::Pending.into()),
                    ..Default::default()
                },
                10,
            )
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn update_by_id_rejects_unknown_ids() {
        let store = InMemoryStore::new();
        let err = store
            .update_by_id(MessageId::new(42), RecordPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id } if id == MessageId::new(42)));
    }
}
