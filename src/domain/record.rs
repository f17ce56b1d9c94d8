use crate::domain::value::{
    Destination, Direction, KnownMessageStatus, MessageBody, MessageId, MessageStatus,
    ProviderMessageId, UnixTimestamp,
};

#[derive(Debug, Clone, PartialEq)]
/// One row of the message log: a queued, dispatched, or received message.
pub struct MessageRecord {
    /// Store-assigned id.
    pub id: MessageId,
    pub direction: Direction,
    /// Raw recipient address as submitted (not normalized).
    pub destination: Destination,
    pub body: MessageBody,
    /// Queue time initially; overwritten with the provider acceptance time
    /// once a send succeeds.
    pub created_at: UnixTimestamp,
    pub status: MessageStatus,
    /// Set if and only if the provider accepted the message.
    pub provider_message_id: Option<ProviderMessageId>,
    /// Sending line used, without a leading `+`.
    pub channel: Option<String>,
    /// Serialized provider response or error detail, for diagnostics.
    pub raw_provider_payload: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
/// Values for a new message log row.
pub struct NewMessage {
    pub direction: Direction,
    pub destination: Destination,
    pub body: MessageBody,
    pub created_at: UnixTimestamp,
    pub status: MessageStatus,
    pub provider_message_id: Option<ProviderMessageId>,
    pub channel: Option<String>,
    pub raw_provider_payload: Option<String>,
}

impl NewMessage {
    /// A freshly queued outbound message, awaiting dispatch.
    pub fn outbound(
        destination: Destination,
        body: MessageBody,
        created_at: UnixTimestamp,
    ) -> Self {
        Self {
            direction: Direction::Outbound,
            destination,
            body,
            created_at,
            status: KnownMessageStatus::Pending.into(),
            provider_message_id: None,
            channel: None,
            raw_provider_payload: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// An inbound SMS already parsed out of a provider receive callback.
///
/// Webhook parsing and signature verification happen outside this crate;
/// this type carries the cleaned values only.
pub struct InboundSms {
    pub provider_message_id: ProviderMessageId,
    /// Sender number, without a leading `+`.
    pub from: Destination,
    /// Receiving line, without a leading `+`.
    pub channel: String,
    pub body: MessageBody,
    /// Raw callback payload kept for diagnostics.
    pub raw_payload: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Outcome of one dispatch cycle.
pub struct SyncReport {
    /// Number of send attempts made this cycle (successful or not).
    pub sent_count: usize,
    /// One formatted entry per failed send attempt, in batch order.
    pub errors: Vec<String>,
}
