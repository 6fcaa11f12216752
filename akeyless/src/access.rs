//! Access strategies: how the resolver proves its identity to the gateway.

use crate::cloud_id::CloudProvider;
use crate::error::{ResolverError, ResolverResult};
use crate::secrets::AuthRequest;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::str::FromStr;

/// Access type tag as configured and sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Static access id + access key
    AccessKey,
    /// AWS IAM cloud identity
    AwsIam,
    /// Azure AD cloud identity
    AzureAd,
    /// GCP cloud identity
    Gcp,
}

impl AccessType {
    /// All supported access types.
    pub const ALL: [Self; 4] = [Self::AccessKey, Self::AwsIam, Self::AzureAd, Self::Gcp];

    /// Wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessKey => "access_key",
            Self::AwsIam => "aws_iam",
            Self::AzureAd => "azure_ad",
            Self::Gcp => "gcp",
        }
    }

    /// Cloud provider whose identity this access type requires.
    #[must_use]
    pub const fn cloud_provider(self) -> Option<CloudProvider> {
        match self {
            Self::AccessKey => None,
            Self::AwsIam => Some(CloudProvider::AwsIam),
            Self::AzureAd => Some(CloudProvider::AzureAd),
            Self::Gcp => Some(CloudProvider::Gcp),
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessType {
    type Err = ResolverError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| {
                let supported: Vec<_> = Self::ALL.iter().map(|t| t.as_str()).collect();
                ResolverError::config(format!(
                    "Unsupported access type '{tag}'. Supported: {}",
                    supported.join(", ")
                ))
            })
    }
}

/// Configured authentication method.
#[derive(Debug, Clone)]
pub enum AccessStrategy {
    /// Static access key
    AccessKey {
        /// Access id
        id: String,
        /// Access key
        key: SecretString,
    },
    /// AWS IAM cloud identity
    AwsIam {
        /// Access id
        id: String,
    },
    /// Azure AD cloud identity
    AzureAd {
        /// Access id
        id: String,
    },
    /// GCP cloud identity
    Gcp {
        /// Access id
        id: String,
    },
}

impl AccessStrategy {
    /// Build a strategy from its configured parts.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `access_type` is not supported, or
    /// if it is `access_key` and no key is given.
    pub fn from_parts(
        access_type: &str,
        id: String,
        key: Option<SecretString>,
    ) -> ResolverResult<Self> {
        match access_type.parse::<AccessType>()? {
            AccessType::AccessKey => {
                let key = key.ok_or_else(|| {
                    ResolverError::config(
                        "Missing Akeyless access key: required for access type 'access_key'",
                    )
                })?;
                Ok(Self::AccessKey { id, key })
            }
            AccessType::AwsIam => Ok(Self::AwsIam { id }),
            AccessType::AzureAd => Ok(Self::AzureAd { id }),
            AccessType::Gcp => Ok(Self::Gcp { id }),
        }
    }

    /// Access type of this strategy.
    #[must_use]
    pub const fn access_type(&self) -> AccessType {
        match self {
            Self::AccessKey { .. } => AccessType::AccessKey,
            Self::AwsIam { .. } => AccessType::AwsIam,
            Self::AzureAd { .. } => AccessType::AzureAd,
            Self::Gcp { .. } => AccessType::Gcp,
        }
    }

    /// Access id.
    #[must_use]
    pub fn access_id(&self) -> &str {
        match self {
            Self::AccessKey { id, .. }
            | Self::AwsIam { id }
            | Self::AzureAd { id }
            | Self::Gcp { id } => id,
        }
    }

    /// Cloud provider to ask for a `cloud-id`, if any.
    #[must_use]
    pub const fn cloud_provider(&self) -> Option<CloudProvider> {
        self.access_type().cloud_provider()
    }

    /// Auth request body for this strategy.
    ///
    /// `cloud_id` is only sent for cloud identity strategies.
    #[must_use]
    pub fn auth_request(&self, cloud_id: Option<String>) -> AuthRequest<'_> {
        let (access_key, cloud_id) = match self {
            Self::AccessKey { key, .. } => (Some(key.expose_secret()), None),
            Self::AwsIam { .. } | Self::AzureAd { .. } | Self::Gcp { .. } => (None, cloud_id),
        };

        AuthRequest {
            access_type: self.access_type().as_str(),
            access_id: self.access_id(),
            access_key,
            cloud_id,
            json: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::{Value, json};

    fn body(strategy: &AccessStrategy, cloud_id: Option<&str>) -> Value {
        serde_json::to_value(strategy.auth_request(cloud_id.map(str::to_string))).unwrap()
    }

    #[test]
    fn test_parse_supported_tags() {
        for t in AccessType::ALL {
            assert_eq!(t.as_str().parse::<AccessType>().unwrap(), t);
        }
    }

    #[test]
    fn test_unsupported_tag_lists_supported_set() {
        let err = "password".parse::<AccessType>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Unsupported access type 'password'. \
             Supported: access_key, aws_iam, azure_ad, gcp"
        );
    }

    #[test]
    fn test_access_key_body() {
        let strategy =
            AccessStrategy::from_parts("access_key", "id1".into(), Some("k1".to_string().into()))
                .unwrap();
        // a stray cloud id is never sent with an access key
        assert_eq!(
            body(&strategy, Some("CLOUD")),
            json!({"access-type": "access_key", "access-id": "id1", "access-key": "k1", "json": true})
        );
    }

    #[test]
    fn test_cloud_bodies_omit_access_key() {
        for tag in ["aws_iam", "azure_ad", "gcp"] {
            let strategy =
                AccessStrategy::from_parts(tag, "id2".into(), Some("ignored".to_string().into()))
                    .unwrap();
            assert!(strategy.cloud_provider().is_some());
            assert_eq!(
                body(&strategy, Some("CLOUD-ID")),
                json!({"access-type": tag, "access-id": "id2", "cloud-id": "CLOUD-ID", "json": true})
            );
        }
    }

    #[test]
    fn test_access_key_requires_key() {
        let err = AccessStrategy::from_parts("access_key", "id1".into(), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_debug_redacts_key() {
        let strategy = AccessStrategy::from_parts(
            "access_key",
            "id1".into(),
            Some("super-secret-key".to_string().into()),
        )
        .unwrap();
        let debug = format!("{strategy:?}");
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("id1"));
    }
}
