//! Transport-level error type shared by every crate in the workspace.
//!
//! A [`PlatformError`] describes what went wrong talking to a remote JSON
//! endpoint: the connection failed, the server answered with a non-2xx
//! status, or the body was not the JSON object the caller expects.

use thiserror::Error;

/// Error raised by a [`JsonTransport`](crate::JsonTransport).
#[derive(Error, Debug)]
pub enum PlatformError {
    /// HTTP request could not be sent or the response could not be read
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Request URL
        url: String,
        /// Response body, best-effort stringified
        body: String,
    },

    /// 2xx response whose body is not a JSON object
    #[error("Unexpected response type from {url}: {kind}")]
    UnexpectedResponse {
        /// Request URL
        url: String,
        /// JSON kind that was received instead of an object
        kind: String,
    },

    /// 2xx response whose body is not JSON at all
    #[error("Invalid JSON body (HTTP {status}) from {url}: {body}")]
    InvalidBody {
        /// HTTP status code
        status: u16,
        /// Request URL
        url: String,
        /// Response body as received
        body: String,
        /// Parse failure
        #[source]
        source: serde_json::Error,
    },
}

impl PlatformError {
    /// Create a status error for the given response.
    #[must_use]
    pub fn status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
            body: non_empty_body(body.into()),
        }
    }

    /// Create an invalid body error; an empty body is rendered as such.
    #[must_use]
    pub fn invalid_body(
        status: u16,
        url: impl Into<String>,
        body: impl Into<String>,
        source: serde_json::Error,
    ) -> Self {
        Self::InvalidBody {
            status,
            url: url.into(),
            body: non_empty_body(body.into()),
            source,
        }
    }

    /// Create an unexpected response error.
    #[must_use]
    pub fn unexpected_response(url: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            url: url.into(),
            kind: kind.into(),
        }
    }

    /// HTTP status carried by this error, if the server answered at all.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::InvalidBody { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::UnexpectedResponse { .. } => None,
        }
    }

    /// Whether the server answered `404 Not Found`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

fn non_empty_body(body: String) -> String {
    if body.is_empty() {
        "empty body".to_string()
    } else {
        body
    }
}
