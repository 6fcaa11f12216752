//! JSON-over-HTTP transport.
//!
//! [`JsonTransport`] is the seam every remote call goes through: POST a JSON
//! payload, get back a JSON object or a [`PlatformError`] carrying the HTTP
//! status, URL and body. [`HttpJsonTransport`] is the reqwest-backed
//! implementation; tests substitute a recording mock.

use crate::PlatformError;
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, instrument};

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout (default: 30s)
    pub timeout: Duration,
    /// Connection timeout (default: 15s)
    pub connect_timeout: Duration,
    /// Pool idle timeout (default: 90s)
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host (default: 4)
    pub pool_max_idle_per_host: usize,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(15),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 4,
            user_agent: concat!("akeyless-credential-resolver/", env!("CARGO_PKG_VERSION"))
                .to_string(),
        }
    }
}

impl HttpConfig {
    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Build a configured blocking HTTP client.
fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .use_rustls_tls()
        .build()
}

/// POST a JSON payload and receive a JSON object.
pub trait JsonTransport: Send + Sync {
    /// Send `payload` to `url`.
    ///
    /// # Errors
    ///
    /// [`PlatformError::Status`] on a non-2xx answer, [`PlatformError::Http`]
    /// when the request cannot be performed, and
    /// [`PlatformError::UnexpectedResponse`] / [`PlatformError::InvalidBody`]
    /// when the body is not a JSON object.
    fn post_json(&self, url: &str, payload: &Value) -> Result<Map<String, Value>, PlatformError>;
}

/// [`JsonTransport`] backed by a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpJsonTransport {
    client: Client,
}

impl HttpJsonTransport {
    /// Create a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self, PlatformError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

impl JsonTransport for HttpJsonTransport {
    #[instrument(skip(self, payload))]
    fn post_json(&self, url: &str, payload: &Value) -> Result<Map<String, Value>, PlatformError> {
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        debug!(status = status.as_u16(), bytes = text.len(), "Gateway responded");

        if !status.is_success() {
            return Err(PlatformError::status(status.as_u16(), url, text));
        }

        parse_object(status.as_u16(), url, &text)
    }
}

/// Parse a response body that must be a JSON object.
///
/// # Errors
///
/// [`PlatformError::InvalidBody`] when `body` is not JSON, and
/// [`PlatformError::UnexpectedResponse`] when it is JSON but not an object.
pub fn parse_object(
    status: u16,
    url: &str,
    body: &str,
) -> Result<Map<String, Value>, PlatformError> {
    let value = serde_json::from_str::<Value>(body)
        .map_err(|source| PlatformError::invalid_body(status, url, body, source))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(PlatformError::unexpected_response(url, json_kind(&other))),
    }
}

/// Name of the JSON kind of `value`, for error messages.
#[must_use]
pub const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
