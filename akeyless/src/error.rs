//! Resolver error types using thiserror 2.0.
//!
//! Every failure aborts the resolution request. [`ResolverError::kind`]
//! groups the variants into the four categories a host cares about.

use crate::cloud_id::CloudIdError;
use rust_common::PlatformError;
use thiserror::Error;

/// Resolver errors.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Missing or invalid input or configuration; raised before any network call
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Remote call failed
    #[error(transparent)]
    Transport(#[from] PlatformError),

    /// Auth call succeeded without a usable token
    #[error("Akeyless auth returned empty token")]
    EmptyToken,

    /// Secret name absent from the get-secret-value response
    #[error("Secret value not found for name: {0}")]
    SecretNotFound(String),

    /// Request body could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cloud identity provider failed
    #[error(transparent)]
    CloudIdentity(#[from] CloudIdError),
}

/// Result type for resolver operations.
pub type ResolverResult<T> = Result<T, ResolverError>;

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing required input or unsupported setting
    Configuration,
    /// Non-2xx response or unreadable body
    Transport,
    /// Well-formed response missing an expected field
    Protocol,
    /// External collaborator (cloud identity) failure
    Collaborator,
}

impl ResolverError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a secret not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::SecretNotFound(name.into())
    }

    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Transport(_) => ErrorKind::Transport,
            Self::EmptyToken | Self::SecretNotFound(_) | Self::Serialization(_) => {
                ErrorKind::Protocol
            }
            Self::CloudIdentity(_) => ErrorKind::Collaborator,
        }
    }
}
