use std::io;
use std::sync::Arc;

use smsqueue::{
    Auth, CallbackUrl, Destination, DispatchEngine, InMemoryStore, Line, MessageBody, TwilioClient,
};

fn require_env(name: &str) -> Result<String, io::Error> {
    std::env::var(name).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{name} environment variable is required"),
        )
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smsqueue=debug".into()),
        )
        .init();

    let account_sid = require_env("TWILIO_ACCOUNT_SID")?;
    let auth_token = require_env("TWILIO_AUTH_TOKEN")?;
    let line = require_env("TWILIO_LINE")?;
    let destination = require_env("SMS_DESTINATION")?;
    let message = std::env::var("SMS_MESSAGE")
        .unwrap_or_else(|_| "Hello from the smsqueue demo.".to_owned());

    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(TwilioClient::new(Auth::new(account_sid, auth_token)?));

    let mut builder = DispatchEngine::builder(store, provider).line(Line::new(line)?);
    if let Ok(callback) = std::env::var("SMS_STATUS_CALLBACK") {
        builder = builder.callback_url(CallbackUrl::new(callback)?);
    }
    let mut engine = builder.build()?;

    engine
        .enqueue(Destination::new(destination)?, MessageBody::new(message)?)
        .await?;

    let report = engine.sync().await?;
    println!(
        "attempted: {}, errors: {:?}",
        report.sent_count, report.errors
    );

    Ok(())
}
