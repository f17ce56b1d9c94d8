use crate::domain::validation::ValidationError;

use phonenumber::country;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Outbound sending line (a provisioned phone number).
///
/// Invariant: non-empty after trimming. The value is stored without a leading
/// `+`; [`Line::as_from`] re-attaches it for the provider `From` parameter.
pub struct Line(String);

impl Line {
    /// Form field name used by the messaging API (`From`).
    pub const FIELD: &'static str = "From";

    /// Create a validated [`Line`].
    ///
    /// A leading `+` is stripped so that configured lines compare equal
    /// regardless of how they were written in the config file.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Parse and validate a line as a real phone number (E.164).
    ///
    /// `default_region` is used when the input does not carry an explicit
    /// country prefix. Use this for config validation at startup; [`Line::new`]
    /// accepts any non-empty value.
    pub fn parse(
        default_region: Option<country::Id>,
        input: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let input = input.into();
        let raw = input.trim().to_owned();
        if raw.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }

        let parsed = phonenumber::parse(default_region, &raw)
            .map_err(|_| ValidationError::InvalidPhoneNumber { input: raw.clone() })?;

        let e164 = phonenumber::format(&parsed)
            .mode(phonenumber::Mode::E164)
            .to_string();

        Self::new(e164)
    }

    /// The line without a leading `+`, as stored in the message log `channel`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `+`-prefixed form sent as the provider `From` parameter.
    pub fn as_from(&self) -> String {
        format!("+{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Messaging API account sid.
///
/// Invariant: non-empty after trimming. Also part of the request path, not
/// only the credentials.
pub struct AccountSid(String);

impl AccountSid {
    /// Create a validated [`AccountSid`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty {
                field: "account_sid",
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated sid.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Messaging API auth token.
///
/// Invariant: must not be empty (whitespace is preserved and allowed).
pub struct AuthToken(String);

impl AuthToken {
    /// Create a validated [`AuthToken`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::Empty { field: "auth_token" });
        }
        Ok(Self(value))
    }

    /// Borrow the token as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Raw recipient address as submitted to the queue (`To`).
///
/// Invariant: non-empty after trimming. This type does not normalize on
/// construction; [`Destination::sendable`] produces the form passed to the
/// provider.
pub struct Destination(String);

impl Destination {
    /// Form field name used by the messaging API (`To`).
    pub const FIELD: &'static str = "To";

    /// Country prefix attached to every outbound number.
    pub const COUNTRY_PREFIX: &'static str = "+1";

    /// Create a validated (non-empty) destination.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Raw (trimmed) value as stored in the message log.
    pub fn raw(&self) -> &str {
        &self.0
    }

    /// The number actually handed to the provider.
    ///
    /// Historical log data may carry a leading formatting digit: values longer
    /// than ten characters have their first character dropped. The result is
    /// always prefixed with `+1`. This must match what older exports already
    /// contain, so the rule is reproduced as-is.
    pub fn sendable(&self) -> String {
        let digits = if self.0.len() > 10 {
            let mut chars = self.0.chars();
            chars.next();
            chars.as_str()
        } else {
            &self.0
        };
        format!("{}{digits}", Self::COUNTRY_PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// SMS message text (`Body`).
///
/// Invariant: non-empty after trimming. The original value (including
/// whitespace) is preserved.
pub struct MessageBody(String);

impl MessageBody {
    /// Form field name used by the messaging API (`Body`).
    pub const FIELD: &'static str = "Body";

    /// Create validated message text.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the message text as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Store-assigned identifier of a queued message.
pub struct MessageId(u64);

impl MessageId {
    /// Construct an id from its integer representation.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the underlying integer id.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Provider-assigned message id (`sid`), set once the provider accepts a send.
///
/// Invariant: non-empty after trimming.
pub struct ProviderMessageId(String);

impl ProviderMessageId {
    /// Create a validated [`ProviderMessageId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "sid" });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Unix timestamp in seconds.
pub struct UnixTimestamp(u64);

impl UnixTimestamp {
    /// Create a timestamp value (no range validation is performed).
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the underlying timestamp in seconds.
    pub fn value(self) -> u64 {
        self.0
    }

    /// Subtract a number of seconds, saturating at the epoch.
    pub fn saturating_sub_secs(self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Transfer direction of a message record.
pub enum Direction {
    Outbound,
    Inbound,
}

impl Direction {
    /// Canonical string form as stored in the log.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outbound => "Outbound",
            Self::Inbound => "Inbound",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Message status as stored in the log, in title case.
///
/// Provider-reported statuses pass through [`MessageStatus::from_provider`]
/// and are preserved as-is even when unknown to this crate; use
/// [`MessageStatus::known`] to map onto the statuses the queue itself
/// understands.
pub struct MessageStatus(String);

impl MessageStatus {
    /// Title-case a provider-reported status (`queued` → `Queued`).
    ///
    /// Only the first character is upcased; the remainder is preserved so the
    /// stored value stays byte-compatible with historical log rows.
    pub fn from_provider(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut chars = raw.chars();
        let titled = match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => raw,
        };
        Self(titled)
    }

    /// The stored (title-cased) status string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Map this status to a known variant, if one exists.
    pub fn known(&self) -> Option<KnownMessageStatus> {
        KnownMessageStatus::from_str(&self.0)
    }

    /// Returns `true` if this status still awaits a dispatch attempt.
    pub fn is_pending(&self) -> bool {
        self.known() == Some(KnownMessageStatus::Pending)
    }
}

impl From<KnownMessageStatus> for MessageStatus {
    fn from(value: KnownMessageStatus) -> Self {
        Self(value.as_str().to_owned())
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
/// Statuses the queue understands.
///
/// `Pending` exists only locally: it marks a message queued for sending but
/// not yet handed to the provider. The rest mirror provider delivery states.
pub enum KnownMessageStatus {
    Pending,
    Queued,
    Sent,
    Delivered,
    DeliveryFailed,
    SendingFailed,
    Received,
}

impl KnownMessageStatus {
    /// Canonical title-cased string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Queued => "Queued",
            Self::Sent => "Sent",
            Self::Delivered => "Delivered",
            Self::DeliveryFailed => "DeliveryFailed",
            Self::SendingFailed => "SendingFailed",
            Self::Received => "Received",
        }
    }

    /// Convert a stored status string into a known variant.
    pub fn from_str(value: &str) -> Option<Self> {
        Some(match value {
            "Pending" => Self::Pending,
            "Queued" => Self::Queued,
            "Sent" => Self::Sent,
            "Delivered" => Self::Delivered,
            "DeliveryFailed" => Self::DeliveryFailed,
            "SendingFailed" => Self::SendingFailed,
            "Received" => Self::Received,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Status-callback URL passed to the provider (`StatusCallback`).
///
/// Invariant: a syntactically valid absolute URL.
pub struct CallbackUrl(url::Url);

impl CallbackUrl {
    /// Form field name used by the messaging API (`StatusCallback`).
    pub const FIELD: &'static str = "StatusCallback";

    /// Create a validated [`CallbackUrl`].
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let value = value.as_ref();
        let parsed = url::Url::parse(value).map_err(|_| ValidationError::InvalidUrl {
            input: value.to_owned(),
        })?;
        Ok(Self(parsed))
    }

    /// The URL in serialized form.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<url::Url> for CallbackUrl {
    fn from(value: url::Url) -> Self {
        Self(value)
    }
}
