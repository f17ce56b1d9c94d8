//! Domain layer: strong types with validation and invariants (no I/O).

mod record;
mod validation;
mod value;

pub use record::{InboundSms, MessageRecord, NewMessage, SyncReport};
pub use validation::ValidationError;
pub use value::{
    AccountSid, AuthToken, CallbackUrl, Destination, Direction, KnownMessageStatus, Line,
    MessageBody, MessageId, MessageStatus, ProviderMessageId, UnixTimestamp,
};
