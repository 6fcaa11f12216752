//! Cloud identity seam.
//!
//! Cloud-identity access strategies authenticate with an opaque identity
//! string issued by the cloud platform the caller runs on. Producing that
//! string is the job of a [`CloudIdentity`] collaborator injected into the
//! resolver.

use crate::config::PropertySource;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Cloud platform whose identity is exchanged for a gateway token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudProvider {
    /// AWS IAM (signed STS `GetCallerIdentity` request)
    AwsIam,
    /// Azure AD (managed identity token)
    AzureAd,
    /// GCP (metadata server identity token)
    Gcp,
}

impl CloudProvider {
    /// Wire tag, identical to the matching access type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwsIam => "aws_iam",
            Self::AzureAd => "azure_ad",
            Self::Gcp => "gcp",
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloud identity provider failure.
#[derive(Error, Debug)]
pub enum CloudIdError {
    /// No identity could be produced
    #[error("Cloud identity unavailable for {provider}: {reason}")]
    Unavailable {
        /// Provider that was asked
        provider: CloudProvider,
        /// Why it failed
        reason: String,
    },
}

impl CloudIdError {
    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(provider: CloudProvider, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            provider,
            reason: reason.into(),
        }
    }
}

/// Yields the opaque cloud identity string for a provider.
pub trait CloudIdentity: Send + Sync {
    /// Produce a cloud identity for `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudIdError`] when no identity can be produced.
    fn cloud_id(&self, provider: CloudProvider) -> Result<String, CloudIdError>;
}

impl<F> CloudIdentity for F
where
    F: Fn(CloudProvider) -> Result<String, CloudIdError> + Send + Sync,
{
    fn cloud_id(&self, provider: CloudProvider) -> Result<String, CloudIdError> {
        self(provider)
    }
}

/// Provider for hosts that only use access keys; every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCloudIdentity;

impl CloudIdentity for NoCloudIdentity {
    fn cloud_id(&self, provider: CloudProvider) -> Result<String, CloudIdError> {
        Err(CloudIdError::unavailable(
            provider,
            "no cloud identity provider configured",
        ))
    }
}

/// Reads a pre-issued cloud identity from a property source.
///
/// Looks up `AKEYLESS_CLOUD_ID_<PROVIDER>` (e.g. `AKEYLESS_CLOUD_ID_AWS_IAM`)
/// and then `AKEYLESS_CLOUD_ID`.
#[derive(Clone)]
pub struct PropertyCloudIdentity {
    source: Arc<dyn PropertySource>,
}

impl fmt::Debug for PropertyCloudIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyCloudIdentity").finish_non_exhaustive()
    }
}

impl PropertyCloudIdentity {
    /// Generic key consulted when no provider-specific key is set.
    pub const GENERIC_KEY: &'static str = "AKEYLESS_CLOUD_ID";

    /// Create a provider reading from `source`.
    #[must_use]
    pub fn new(source: Arc<dyn PropertySource>) -> Self {
        Self { source }
    }

    /// Provider-specific key for `provider`.
    #[must_use]
    pub fn key_for(provider: CloudProvider) -> String {
        format!("{}_{}", Self::GENERIC_KEY, provider.as_str().to_uppercase())
    }
}

impl CloudIdentity for PropertyCloudIdentity {
    fn cloud_id(&self, provider: CloudProvider) -> Result<String, CloudIdError> {
        let specific = Self::key_for(provider);
        self.source
            .get(&specific)
            .or_else(|| self.source.get(Self::GENERIC_KEY))
            .ok_or_else(|| {
                CloudIdError::unavailable(
                    provider,
                    format!("neither {specific} nor {} is set", Self::GENERIC_KEY),
                )
            })
    }
}
