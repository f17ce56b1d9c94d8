//! Outbound SMS queue with round-robin line dispatch for Twilio-style
//! messaging APIs.
//!
//! Messages are queued as `Pending` rows in a [`store::MessageStore`] and
//! forwarded by [`engine::DispatchEngine::sync`], the unit of work an
//! external scheduler invokes periodically: one cycle expires stale pending
//! messages, then sends a bounded batch, rotating across the configured
//! sending lines. The provider sits behind the [`provider::ProviderClient`]
//! trait; the bundled [`client::TwilioClient`] implements it.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use smsqueue::{
//!     Auth, CallbackUrl, Destination, DispatchEngine, InMemoryStore, Line, MessageBody,
//!     TwilioClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let provider = Arc::new(TwilioClient::new(Auth::new("AC...", "...")?));
//!
//!     let mut engine = DispatchEngine::builder(store, provider)
//!         .line(Line::new("15005550006")?)
//!         .callback_url(CallbackUrl::new("https://example.com/sms/status")?)
//!         .build()?;
//!
//!     engine
//!         .enqueue(Destination::new("5551234567")?, MessageBody::new("hello")?)
//!         .await?;
//!
//!     let report = engine.sync().await?;
//!     println!("attempted: {}, errors: {:?}", report.sent_count, report.errors);
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod domain;
pub mod engine;
pub mod provider;
pub mod store;
pub mod transport;

pub use client::{Auth, TwilioClient, TwilioClientBuilder, TwilioError};
pub use domain::{
    CallbackUrl, Destination, Direction, InboundSms, KnownMessageStatus, Line, MessageBody,
    MessageId, MessageRecord, MessageStatus, NewMessage, ProviderMessageId, SyncReport,
    UnixTimestamp, ValidationError,
};
pub use engine::{
    ConfigError, DEFAULT_PER_LINE_LIMIT, DEFAULT_VALIDITY_WINDOW_SECS, DispatchEngine,
    DispatchEngineBuilder, LineAllocator, SyncError,
};
pub use provider::{ProviderClient, ProviderError, ProviderMessage};
pub use store::{InMemoryStore, MessageStore, RecordFilter, RecordPatch, StoreError};
