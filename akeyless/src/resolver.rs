//! Resolution entry point: one request in, one credential field map out.

use crate::{
    client::GatewayClient,
    cloud_id::CloudIdentity,
    config::{LayeredConfig, ResolverSettings},
    error::{ResolverError, ResolverResult},
    mapping::{CredentialFields, CredentialType, map_secret},
};
use rust_common::JsonTransport;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument};

/// Host argument carrying the credential type.
pub const ARG_TYPE: &str = "type";
/// Host argument carrying the secret path.
pub const ARG_ID: &str = "id";
/// Host argument naming the requesting host.
pub const ARG_MID: &str = "mid";
/// Host argument carrying the target system address.
pub const ARG_IP: &str = "ip";

/// One credential resolution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    credential_type: CredentialType,
    secret_id: String,
    requester_id: Option<String>,
    requester_ip: Option<String>,
}

impl ResolutionRequest {
    /// Create a request for `secret_id` resolved as `credential_type`.
    ///
    /// # Errors
    ///
    /// Configuration error if either argument is empty. Neither is otherwise
    /// rewritten; the secret path goes to the gateway as given.
    pub fn new(credential_type: &str, secret_id: &str) -> ResolverResult<Self> {
        if credential_type.is_empty() {
            return Err(ResolverError::config("Missing arg 'type'"));
        }
        if secret_id.is_empty() {
            return Err(ResolverError::config(
                "Missing arg 'id' (use your Akeyless secret path)",
            ));
        }

        Ok(Self {
            credential_type: CredentialType::parse(credential_type),
            secret_id: secret_id.to_string(),
            requester_id: None,
            requester_ip: None,
        })
    }

    /// Attach the requesting host and target address.
    #[must_use]
    pub fn with_requester(
        mut self,
        requester_id: Option<String>,
        requester_ip: Option<String>,
    ) -> Self {
        self.requester_id = requester_id.filter(|v| !v.is_empty());
        self.requester_ip = requester_ip.filter(|v| !v.is_empty());
        self
    }

    /// Build a request from the host's argument map.
    ///
    /// # Errors
    ///
    /// Configuration error if `type` or `id` is missing or empty.
    pub fn from_args(args: &HashMap<String, String>) -> ResolverResult<Self> {
        let arg = |name: &str| args.get(name).map(String::as_str).unwrap_or_default();
        Ok(Self::new(arg(ARG_TYPE), arg(ARG_ID))?.with_requester(
            args.get(ARG_MID).cloned(),
            args.get(ARG_IP).cloned(),
        ))
    }

    /// Requested credential type.
    #[must_use]
    pub const fn credential_type(&self) -> &CredentialType {
        &self.credential_type
    }

    /// Secret path.
    #[must_use]
    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    /// Requesting host, if given.
    #[must_use]
    pub fn requester_id(&self) -> Option<&str> {
        self.requester_id.as_deref()
    }

    /// Target system address, if given.
    #[must_use]
    pub fn requester_ip(&self) -> Option<&str> {
        self.requester_ip.as_deref()
    }
}

/// Resolves credentials from Akeyless secrets.
///
/// Holds no per-request state; settings are read again on every call so
/// configuration changes apply to the next request.
pub struct CredentialResolver {
    config: LayeredConfig,
    transport: Arc<dyn JsonTransport>,
    cloud_identity: Arc<dyn CloudIdentity>,
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CredentialResolver {
    /// Create a resolver from its collaborators.
    #[must_use]
    pub fn new(
        config: LayeredConfig,
        transport: Arc<dyn JsonTransport>,
        cloud_identity: Arc<dyn CloudIdentity>,
    ) -> Self {
        Self {
            config,
            transport,
            cloud_identity,
        }
    }

    /// Resolve `request` into credential fields.
    ///
    /// Settings are validated before any remote call.
    ///
    /// # Errors
    ///
    /// Any configuration, transport, protocol or cloud identity failure.
    #[instrument(
        skip(self, request),
        fields(
            credential_type = %request.credential_type(),
            secret_id = request.secret_id(),
            requester = request.requester_id().unwrap_or("-"),
        )
    )]
    pub fn resolve(&self, request: &ResolutionRequest) -> ResolverResult<CredentialFields> {
        info!(ip = request.requester_ip().unwrap_or("-"), "Resolving credential");

        let settings = ResolverSettings::load(&self.config)?;
        let client = GatewayClient::new(
            settings.gateway_url,
            Arc::clone(&self.transport),
            Arc::clone(&self.cloud_identity),
        );

        let session = client.authenticate(&settings.strategy)?;
        let raw = client.fetch_secret(session, request.secret_id())?;
        let fields = map_secret(request.credential_type(), Some(&raw), &settings.aliases);

        info!(fields = ?fields.field_names(), "Resolved credential");
        Ok(fields)
    }

    /// Resolve a request given as the host's argument map.
    ///
    /// # Errors
    ///
    /// See [`ResolutionRequest::from_args`] and [`CredentialResolver::resolve`].
    pub fn resolve_args(
        &self,
        args: &HashMap<String, String>,
    ) -> ResolverResult<CredentialFields> {
        self.resolve(&ResolutionRequest::from_args(args)?)
    }
}
