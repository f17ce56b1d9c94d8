use serde::Deserialize;

use crate::domain::{CallbackUrl, Destination, Line, MessageBody, ProviderMessageId, UnixTimestamp};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response contains invalid message sid")]
    InvalidSid,

    #[error("response is missing date_created")]
    MissingDateCreated,

    #[error("invalid date_created value: {value}")]
    InvalidDateCreated { value: String },
}

#[derive(Debug, Clone, Deserialize)]
struct MessageJsonResponse {
    sid: String,
    status: String,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    date_created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorJsonResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    more_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
/// Decoded message resource returned by a successful create-message call.
pub struct MessageResource {
    pub sid: ProviderMessageId,
    /// Provider status string (e.g. `queued`), verbatim.
    pub status: String,
    /// Sender address as echoed by the API, when present.
    pub from: Option<String>,
    pub to: Option<String>,
    /// `date_created`, parsed from RFC 2822 into epoch seconds.
    pub date_created: UnixTimestamp,
    /// Raw response body, preserved for the message log.
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
/// Decoded error body returned with a non-2xx create-message response.
pub struct ApiErrorBody {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub more_info: Option<String>,
}

pub fn encode_create_message_form(
    from: &Line,
    to: &str,
    body: &str,
    callback_url: Option<&CallbackUrl>,
) -> Vec<(String, String)> {
    let mut params = vec![
        (Destination::FIELD.to_owned(), to.to_owned()),
        (Line::FIELD.to_owned(), from.as_from()),
        (MessageBody::FIELD.to_owned(), body.to_owned()),
    ];
    if let Some(callback_url) = callback_url {
        params.push((CallbackUrl::FIELD.to_owned(), callback_url.as_str().to_owned()));
    }
    params
}

pub fn decode_message_json_response(json: &str) -> Result<MessageResource, TransportError> {
    let parsed: MessageJsonResponse = serde_json::from_str(json)?;

    let sid = ProviderMessageId::new(parsed.sid).map_err(|_| TransportError::InvalidSid)?;

    let date_created = parsed
        .date_created
        .ok_or(TransportError::MissingDateCreated)?;
    let date_created = parse_rfc2822_timestamp(&date_created)?;

    Ok(MessageResource {
        sid,
        status: parsed.status,
        from: parsed.from,
        to: parsed.to,
        date_created,
        raw: json.to_owned(),
    })
}

pub fn decode_error_json_response(json: &str) -> Result<ApiErrorBody, TransportError> {
    let parsed: ErrorJsonResponse = serde_json::from_str(json)?;
    Ok(ApiErrorBody {
        code: parsed.code,
        message: parsed.message,
        more_info: parsed.more_info,
    })
}

fn parse_rfc2822_timestamp(value: &str) -> Result<UnixTimestamp, TransportError> {
    let parsed = chrono::DateTime::parse_from_rfc2822(value).map_err(|_| {
        TransportError::InvalidDateCreated {
            value: value.to_owned(),
        }
    })?;
    let secs =
        u64::try_from(parsed.timestamp()).map_err(|_| TransportError::InvalidDateCreated {
            value: value.to_owned(),
        })?;
    Ok(UnixTimestamp::new(secs))
}
