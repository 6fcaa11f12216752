//! Mock implementations for testing.
//!
//! [`RecordingTransport`] stands in for the HTTP transport: it answers every
//! call through a handler closure and records the URL and payload of each
//! invocation so tests can assert on the exact wire traffic.

use rust_common::{JsonTransport, PlatformError};
use serde_json::{Map, Value};
use std::sync::{Mutex, PoisonError};

type Handler = dyn Fn(&str, &Value) -> Result<Map<String, Value>, PlatformError> + Send + Sync;

/// A recorded transport invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Request URL
    pub url: String,
    /// JSON payload sent
    pub payload: Value,
}

/// Mock transport that records every call.
pub struct RecordingTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl std::fmt::Debug for RecordingTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingTransport")
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

impl RecordingTransport {
    /// Create a transport answering through `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<Map<String, Value>, PlatformError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A well-behaved gateway: every auth call returns `token`, every
    /// get-secret-value call returns `{"secrets": {<name>: value}}` for the
    /// requested name.
    #[must_use]
    pub fn gateway(token: &str, value: Value) -> Self {
        let token = token.to_string();
        Self::new(move |url, payload| {
            if is_auth_url(url) {
                Ok(crate::fixtures::auth_response(&token))
            } else if is_get_secret_value_url(url) {
                let name = payload
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Ok(crate::fixtures::secrets_response(name, value.clone()))
            } else {
                Err(PlatformError::status(404, url, "unexpected URL"))
            }
        })
    }

    /// A transport that fails every call with `status`.
    #[must_use]
    pub fn failing(status: u16) -> Self {
        Self::new(move |url, _| Err(PlatformError::status(status, url, "mock failure")))
    }

    /// All calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().clone()
    }

    /// URLs of all calls recorded so far, in order.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.lock().iter().map(|c| c.url.clone()).collect()
    }

    /// Number of calls recorded so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    /// Payload of the most recent call to a URL ending in `suffix`.
    #[must_use]
    pub fn last_payload_for(&self, suffix: &str) -> Option<Value> {
        self.lock()
            .iter()
            .rev()
            .find(|c| c.url.ends_with(suffix))
            .map(|c| c.payload.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl JsonTransport for RecordingTransport {
    fn post_json(&self, url: &str, payload: &Value) -> Result<Map<String, Value>, PlatformError> {
        self.lock().push(RecordedCall {
            url: url.to_string(),
            payload: payload.clone(),
        });
        (self.handler)(url, payload)
    }
}

/// Whether `url` targets either generation of the auth endpoint.
#[must_use]
pub fn is_auth_url(url: &str) -> bool {
    url.ends_with("/auth")
}

/// Whether `url` targets either generation of the get-secret-value endpoint.
#[must_use]
pub fn is_get_secret_value_url(url: &str) -> bool {
    url.ends_with("/get-secret-value")
}

/// A `404 Not Found` error for `url`.
#[must_use]
pub fn not_found(url: &str) -> PlatformError {
    PlatformError::status(404, url, "Not Found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_calls_in_order() {
        let transport = RecordingTransport::gateway("TKN", json!("pw"));

        transport.post_json("https://gw/v2/auth", &json!({"a": 1})).unwrap();
        transport
            .post_json("https://gw/v2/get-secret-value", &json!({"name": "/s"}))
            .unwrap();

        assert_eq!(transport.call_count(), 2);
        assert_eq!(
            transport.urls(),
            vec!["https://gw/v2/auth", "https://gw/v2/get-secret-value"]
        );
        assert_eq!(transport.last_payload_for("/auth"), Some(json!({"a": 1})));
    }

    #[test]
    fn test_gateway_answers_requested_name() {
        let transport = RecordingTransport::gateway("TKN", json!("pw"));
        let resp = transport
            .post_json("https://gw/get-secret-value", &json!({"name": "/db"}))
            .unwrap();
        assert_eq!(resp["secrets"]["/db"], json!("pw"));
    }

    #[test]
    fn test_failing_transport() {
        let transport = RecordingTransport::failing(503);
        let err = transport.post_json("https://gw/v2/auth", &json!({})).unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(transport.call_count(), 1);
    }
}
