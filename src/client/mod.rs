//! Client layer: orchestrates transport calls and maps transport ↔ domain.

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{AccountSid, AuthToken, CallbackUrl, Line, ValidationError};
use crate::provider::{ProviderClient, ProviderError, ProviderMessage};
use crate::transport::{
    MessageResource, decode_error_json_response, decode_message_json_response,
    encode_create_message_form,
};

const DEFAULT_API_BASE: &str = "https://api.twilio.com/2010-04-01";

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone)]
struct HttpResponse {
    status: u16,
    body: String,
}

trait HttpTransport: Send + Sync {
    fn post_form<'a>(
        &'a self,
        url: &'a str,
        username: &'a str,
        password: &'a str,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>>;
}

#[derive(Debug, Clone)]
struct ReqwestTransport {
    client: reqwest::Client,
}

impl HttpTransport for ReqwestTransport {
    fn post_form<'a>(
        &'a self,
        url: &'a str,
        username: &'a str,
        password: &'a str,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
        Box::pin(async move {
            let response = self
                .client
                .post(url)
                .basic_auth(username, Some(password))
                .form(&params)
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(HttpResponse { status, body })
        })
    }
}

#[derive(Debug, Clone)]
/// API credentials: account sid + auth token, sent as HTTP basic auth.
pub struct Auth {
    account_sid: AccountSid,
    auth_token: AuthToken,
}

impl Auth {
    /// Create validated credentials.
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            account_sid: AccountSid::new(account_sid)?,
            auth_token: AuthToken::new(auth_token)?,
        })
    }

    /// The account sid, which is also part of the request path.
    pub fn account_sid(&self) -> &AccountSid {
        &self.account_sid
    }
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`TwilioClient`].
///
/// This error preserves:
/// - HTTP-level failures (non-2xx status or transport failures),
/// - API-level failures (a decoded error body with a code/message),
/// - validation/parse failures.
pub enum TwilioError {
    /// HTTP client / transport failure (DNS, TLS, timeouts, etc).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// Non-successful HTTP status with a body this client could not decode
    /// as an API error.
    #[error("unexpected HTTP status: {status}")]
    HttpStatus { status: u16, body: Option<String> },

    /// The API rejected the request with an error body.
    #[error("API error {code:?}: {message:?}")]
    Api {
        code: Option<i64>,
        message: Option<String>,
    },

    /// Response body could not be parsed as a message resource.
    #[error("parse error: {0}")]
    Parse(#[source] Box<dyn StdError + Send + Sync>),

    /// One of the domain constructors rejected an invalid value.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone)]
/// Builder for [`TwilioClient`].
///
/// Use this when you need to customize the API base URL, timeout, or
/// user-agent.
pub struct TwilioClientBuilder {
    auth: Auth,
    api_base: String,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl TwilioClientBuilder {
    /// Create a builder with the default API base and no timeout/user-agent
    /// override.
    pub fn new(auth: Auth) -> Self {
        Self {
            auth,
            api_base: DEFAULT_API_BASE.to_owned(),
            timeout: None,
            user_agent: None,
        }
    }

    /// Override the API base URL (everything before `/Accounts/...`).
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set an HTTP client timeout applied to the entire request.
    ///
    /// A timed-out send surfaces as [`TwilioError::Transport`] and, through
    /// the [`ProviderClient`] impl, as a per-message failure.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the HTTP `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build a [`TwilioClient`].
    pub fn build(self) -> Result<TwilioClient, TwilioError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder
            .build()
            .map_err(|err| TwilioError::Transport(Box::new(err)))?;

        Ok(TwilioClient {
            auth: self.auth,
            api_base: self.api_base,
            http: Arc::new(ReqwestTransport { client }),
        })
    }
}

#[derive(Clone)]
/// Messaging API client for the create-message endpoint.
///
/// This type orchestrates form encoding, HTTP basic auth, and response
/// parsing against `POST {api_base}/Accounts/{AccountSid}/Messages.json`.
/// It implements [`ProviderClient`], which is how the dispatch engine uses
/// it.
pub struct TwilioClient {
    auth: Auth,
    api_base: String,
    http: Arc<dyn HttpTransport>,
}

impl TwilioClient {
    /// Create a client using the default API base.
    ///
    /// For more customization, use [`TwilioClient::builder`].
    pub fn new(auth: Auth) -> Self {
        Self {
            auth,
            api_base: DEFAULT_API_BASE.to_owned(),
            http: Arc::new(ReqwestTransport {
                client: reqwest::Client::new(),
            }),
        }
    }

    /// Start building a client with custom settings.
    pub fn builder(auth: Auth) -> TwilioClientBuilder {
        TwilioClientBuilder::new(auth)
    }

    fn messages_endpoint(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.api_base,
            self.auth.account_sid().as_str()
        )
    }

    /// Send one message through the API.
    ///
    /// `to` must already be normalized
    /// (see [`Destination::sendable`](crate::domain::Destination::sendable)).
    ///
    /// Errors:
    /// - [`TwilioError::HttpStatus`] for non-2xx responses without a
    ///   decodable error body,
    /// - [`TwilioError::Api`] when the API returns an error body,
    /// - [`TwilioError::Parse`] when a 2xx body is not a message resource.
    pub async fn create_message(
        &self,
        from: &Line,
        to: &str,
        body: &str,
        callback_url: Option<&CallbackUrl>,
    ) -> Result<MessageResource, TwilioError> {
        let params = encode_create_message_form(from, to, body, callback_url);
        let endpoint = self.messages_endpoint();

        tracing::debug!(to, from = %from.as_from(), "sending message");

        let response = self
            .http
            .post_form(
                &endpoint,
                self.auth.account_sid.as_str(),
                self.auth.auth_token.as_str(),
                params,
            )
            .await
            .map_err(TwilioError::Transport)?;

        if !(200..=299).contains(&response.status) {
            if let Ok(api_error) = decode_error_json_response(&response.body) {
                if api_error.code.is_some() || api_error.message.is_some() {
                    tracing::warn!(
                        status = response.status,
                        code = api_error.code,
                        "message rejected by API"
                    );
                    return Err(TwilioError::Api {
                        code: api_error.code,
                        message: api_error.message,
                    });
                }
            }
            let body = if response.body.trim().is_empty() {
                None
            } else {
                Some(response.body)
            };
            return Err(TwilioError::HttpStatus {
                status: response.status,
                body,
            });
        }

        decode_message_json_response(&response.body)
            .map_err(|err| TwilioError::Parse(Box::new(err)))
    }
}

#[async_trait]
impl ProviderClient for TwilioClient {
    async fn send(
        &self,
        from: &Line,
        to: &str,
        body: &str,
        callback_url: Option<&CallbackUrl>,
    ) -> Result<ProviderMessage, ProviderError> {
        let resource = self
            .create_message(from, to, body, callback_url)
            .await
            .map_err(|err| ProviderError::new(err.to_string()))?;

        Ok(provider_message_from_resource(resource, from))
    }
}

fn provider_message_from_resource(resource: MessageResource, from: &Line) -> ProviderMessage {
    ProviderMessage {
        provider_message_id: resource.sid,
        status: resource.status,
        from: resource.from.unwrap_or_else(|| from.as_from()),
        created_at: resource.date_created,
        raw_payload: resource.raw,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::domain::UnixTimestamp;

    use super::*;

    #[derive(Debug, Clone)]
    struct FakeTransport {
        state: Arc<Mutex<FakeTransportState>>,
    }

    #[derive(Debug)]
    struct FakeTransportState {
        last_url: Option<String>,
        last_username: Option<String>,
        last_password: Option<String>,
        last_params: Vec<(String, String)>,
        response_status: u16,
        response_body: String,
    }

    impl FakeTransport {
        fn new(response_status: u16, response_body: impl Into<String>) -> Self {
            Self {
                state: Arc::new(Mutex::new(FakeTransportState {
                    last_url: None,
                    last_username: None,
                    last_password: None,
                    last_params: Vec::new(),
                    response_status,
                    response_body: response_body.into(),
                })),
            }
        }

        fn last_request(&self) -> (Option<String>, Vec<(String, String)>) {
            let state = self.state.lock().unwrap();
            (state.last_url.clone(), state.last_params.clone())
        }

        fn last_credentials(&self) -> (Option<String>, Option<String>) {
            let state = self.state.lock().unwrap();
            (state.last_username.clone(), state.last_password.clone())
        }
    }

    impl HttpTransport for FakeTransport {
        fn post_form<'a>(
            &'a self,
            url: &'a str,
            username: &'a str,
            password: &'a str,
            params: Vec<(String, String)>,
        ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
            Box::pin(async move {
                let (status, body) = {
                    let mut state = self.state.lock().unwrap();
                    state.last_url = Some(url.to_owned());
                    state.last_username = Some(username.to_owned());
                    state.last_password = Some(password.to_owned());
                    state.last_params = params;
                    (state.response_status, state.response_body.clone())
                };
                Ok(HttpResponse { status, body })
            })
        }
    }

    fn assert_param(params: &[(String, String)], key: &str, value: &str) {
        assert!(
            params.iter().any(|(k, v)| k == key && v == value),
            "missing param {key}={value}; got: {params:?}"
        );
    }

    fn make_client(transport: FakeTransport) -> TwilioClient {
        TwilioClient {
            auth: Auth::new("AC0123456789", "secret_token").unwrap(),
            api_base: "https://example.invalid/2010-04-01".to_owned(),
            http: Arc::new(transport),
        }
    }

    const CREATED_JSON: &str = r#"
    {
      "sid": "SM5f3c1458a8b74f12a3d4e5f6a7b8c9d0",
      "date_created": "Thu, 24 Aug 2023 05:20:00 +0000",
      "to": "+15551234567",
      "from": "+15005550006",
      "body": "hello",
      "status": "queued"
    }
    "#;

    #[tokio::test]
    async fn create_message_posts_basic_auth_form_to_account_endpoint() {
        let transport = FakeTransport::new(201, CREATED_JSON);
        let client = make_client(transport.clone());
        let from = Line::new("15005550006").unwrap();
        let callback = CallbackUrl::new("https://example.com/sms/status").unwrap();

        let resource = client
            .create_message(&from, "+15551234567", "hello", Some(&callback))
            .await
            .unwrap();

        assert_eq!(
            resource.sid.as_str(),
            "SM5f3c1458a8b74f12a3d4e5f6a7b8c9d0"
        );
        assert_eq!(resource.status, "queued");
        assert_eq!(resource.date_created, UnixTimestamp::new(1_692_854_400));

        let (url, params) = transport.last_request();
        assert_eq!(
            url.as_deref(),
            Some("https://example.invalid/2010-04-01/Accounts/AC0123456789/Messages.json")
        );
        assert_param(&params, "To", "+15551234567");
        assert_param(&params, "From", "+15005550006");
        assert_param(&params, "Body", "hello");
        assert_param(&params, "StatusCallback", "https://example.com/sms/status");

        let (username, password) = transport.last_credentials();
        assert_eq!(username.as_deref(), Some("AC0123456789"));
        assert_eq!(password.as_deref(), Some("secret_token"));
    }

    #[tokio::test]
    async fn create_message_maps_error_body_to_api_error() {
        let json = r#"
        {
          "code": 21211,
          "message": "The 'To' number is not a valid phone number.",
          "status": 400
        }
        "#;
        let transport = FakeTransport::new(400, json);
        let client = make_client(transport);
        let from = Line::new("15005550006").unwrap();

        let err = client
            .create_message(&from, "+1555", "hello", None)
            .await
            .unwrap_err();
        match err {
            TwilioError::Api { code, message } => {
                assert_eq!(code, Some(21211));
                assert_eq!(
                    message.as_deref(),
                    Some("The 'To' number is not a valid phone number.")
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_message_maps_undecodable_failure_to_http_status() {
        let transport = FakeTransport::new(500, "oops");
        let client = make_client(transport);
        let from = Line::new("15005550006").unwrap();

        let err = client
            .create_message(&from, "+15551234567", "hello", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TwilioError::HttpStatus {
                status: 500,
                body: Some(_)
            }
        ));
    }

    #[tokio::test]
    async fn create_message_maps_empty_http_body_to_none() {
        let transport = FakeTransport::new(503, "   ");
        let client = make_client(transport);
        let from = Line::new("15005550006").unwrap();

        let err = client
            .create_message(&from, "+15551234567", "hello", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TwilioError::HttpStatus {
                status: 503,
                body: None
            }
        ));
    }

    #[tokio::test]
    async fn create_message_maps_invalid_success_body_to_parse_error() {
        let transport = FakeTransport::new(200, "{ not json }");
        let client = make_client(transport);
        let from = Line::new("15005550006").unwrap();

        let err = client
            .create_message(&from, "+15551234567", "hello", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TwilioError::Parse(_)));
    }

    #[tokio::test]
    async fn provider_client_impl_maps_resource_and_errors() {
        let transport = FakeTransport::new(201, CREATED_JSON);
        let client = make_client(transport);
        let from = Line::new("15005550006").unwrap();

        let message = ProviderClient::send(&client, &from, "+15551234567", "hello", None)
            .await
            .unwrap();
        assert_eq!(
            message.provider_message_id.as_str(),
            "SM5f3c1458a8b74f12a3d4e5f6a7b8c9d0"
        );
        assert_eq!(message.status, "queued");
        assert_eq!(message.channel(), "15005550006");
        assert_eq!(message.created_at, UnixTimestamp::new(1_692_854_400));

        let failing = make_client(FakeTransport::new(500, "boom"));
        let err = ProviderClient::send(&failing, &from, "+15551234567", "hello", None)
            .await
            .unwrap_err();
        assert!(err.detail().contains("unexpected HTTP status: 500"));
    }

    #[test]
    fn auth_constructor_validates_inputs() {
        assert!(Auth::new("  ", "token").is_err());
        assert!(Auth::new("AC123", "").is_err());
        assert!(Auth::new("AC123", "token").is_ok());
    }

    #[test]
    fn builder_api_base_override_is_applied() {
        let client = TwilioClient::builder(Auth::new("AC123", "token").unwrap())
            .api_base("https://example.invalid/api")
            .build()
            .unwrap();
        assert_eq!(
            client.messages_endpoint(),
            "https://example.invalid/api/Accounts/AC123/Messages.json"
        );
    }
}
