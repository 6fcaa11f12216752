//! Akeyless gateway client: authenticate, then fetch one secret value.
//!
//! Both calls go to the `/v2/...` path first and, only when that answers
//! `404 Not Found`, once more to the legacy path with the same payload.

use crate::{
    access::AccessStrategy,
    cloud_id::CloudIdentity,
    error::ResolverResult,
    secrets::{GetSecretValueRequest, extract_secret, extract_token},
};
use rust_common::JsonTransport;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const AUTH_PATH: &str = "/v2/auth";
const LEGACY_AUTH_PATH: &str = "/auth";
const GET_SECRET_VALUE_PATH: &str = "/v2/get-secret-value";
const LEGACY_GET_SECRET_VALUE_PATH: &str = "/get-secret-value";

/// Token from one authenticate call, good for one fetch.
#[derive(Debug)]
pub struct AuthSession {
    token: SecretString,
}

impl AuthSession {
    /// Wrap a token.
    #[must_use]
    pub const fn new(token: SecretString) -> Self {
        Self { token }
    }

    /// The session token.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }
}

/// Client for the two gateway operations the resolver needs.
pub struct GatewayClient {
    gateway_url: String,
    transport: Arc<dyn JsonTransport>,
    cloud_identity: Arc<dyn CloudIdentity>,
}

impl fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayClient")
            .field("gateway_url", &self.gateway_url)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Create a client for `gateway_url`.
    #[must_use]
    pub fn new(
        gateway_url: impl Into<String>,
        transport: Arc<dyn JsonTransport>,
        cloud_identity: Arc<dyn CloudIdentity>,
    ) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            transport,
            cloud_identity,
        }
    }

    /// Gateway base URL.
    #[must_use]
    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    /// Authenticate with `strategy`.
    ///
    /// Cloud identity strategies first obtain a `cloud-id` from the injected
    /// provider.
    ///
    /// # Errors
    ///
    /// Cloud identity failures, transport failures, and
    /// [`ResolverError::EmptyToken`](crate::ResolverError::EmptyToken) when
    /// the gateway answers without a token.
    #[instrument(
        skip(self, strategy),
        fields(
            gateway = self.gateway_url(),
            access_type = %strategy.access_type(),
            access_id = strategy.access_id(),
        )
    )]
    pub fn authenticate(&self, strategy: &AccessStrategy) -> ResolverResult<AuthSession> {
        let cloud_id = match strategy.cloud_provider() {
            Some(provider) => {
                debug!(%provider, "Requesting cloud identity");
                Some(self.cloud_identity.cloud_id(provider)?)
            }
            None => None,
        };

        let payload = serde_json::to_value(strategy.auth_request(cloud_id))?;
        let response = self.post_with_fallback(AUTH_PATH, LEGACY_AUTH_PATH, &payload)?;
        let token = extract_token(&response)?;

        info!("Authenticated with Akeyless");
        Ok(AuthSession::new(token))
    }

    /// Fetch the raw text of `secret_id`, consuming `session`.
    ///
    /// Structured values come back as JSON text.
    ///
    /// # Errors
    ///
    /// Transport failures, and
    /// [`ResolverError::SecretNotFound`](crate::ResolverError::SecretNotFound)
    /// when the response does not contain `secret_id`.
    #[instrument(skip(self, session), fields(gateway = self.gateway_url()))]
    pub fn fetch_secret(&self, session: AuthSession, secret_id: &str) -> ResolverResult<String> {
        let request = GetSecretValueRequest::new(session.token.expose_secret(), secret_id);
        let payload = serde_json::to_value(request)?;
        let response = self.post_with_fallback(
            GET_SECRET_VALUE_PATH,
            LEGACY_GET_SECRET_VALUE_PATH,
            &payload,
        )?;

        let raw = extract_secret(&response, secret_id)?;
        debug!(bytes = raw.len(), "Fetched secret value");
        Ok(raw)
    }

    fn post_with_fallback(
        &self,
        path: &str,
        legacy_path: &str,
        payload: &Value,
    ) -> ResolverResult<Map<String, Value>> {
        let url = join_url(&self.gateway_url, path);
        match self.transport.post_json(&url, payload) {
            Ok(response) => Ok(response),
            Err(err) if err.is_not_found() => {
                let legacy_url = join_url(&self.gateway_url, legacy_path);
                warn!(%url, %legacy_url, "Gateway path not found, retrying legacy path");
                Ok(self.transport.post_json(&legacy_url, payload)?)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Join `base` and `path` with exactly one `/` between them.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud_id::{CloudIdError, CloudProvider, NoCloudIdentity};
    use crate::error::{ErrorKind, ResolverError};
    use rust_common::PlatformError;
    use serde_json::json;
    use std::sync::Mutex;
    use test_utils::fixtures::{auth_response, bare_secrets_response, secrets_response};
    use test_utils::mocks::not_found;
    use test_utils::RecordingTransport;

    const GW: &str = "https://fake";

    fn client(transport: &Arc<RecordingTransport>) -> GatewayClient {
        GatewayClient::new(GW, transport.clone(), Arc::new(NoCloudIdentity))
    }

    fn access_key() -> AccessStrategy {
        AccessStrategy::from_parts("access_key", "id1".into(), Some("k1".to_string().into()))
            .unwrap()
    }

    fn session(token: &str) -> AuthSession {
        AuthSession::new(token.to_string().into())
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://gw", "/v2/auth"), "https://gw/v2/auth");
        assert_eq!(join_url("https://gw/", "/v2/auth"), "https://gw/v2/auth");
        assert_eq!(join_url("https://gw", "auth"), "https://gw/auth");
        assert_eq!(join_url("https://gw/", "auth"), "https://gw/auth");
        assert_eq!(join_url("", "/auth"), "/auth");
    }

    #[test]
    fn test_gateway_url_is_kept_verbatim() {
        let transport = Arc::new(RecordingTransport::gateway("TKN", json!("pw")));
        let client = GatewayClient::new("https://gw.corp:8000/", transport, Arc::new(NoCloudIdentity));
        assert_eq!(client.gateway_url(), "https://gw.corp:8000/");
    }

    #[test]
    fn test_access_key_authenticate() {
        let transport = Arc::new(RecordingTransport::gateway("TKN", json!("pw")));
        let session = client(&transport).authenticate(&access_key()).unwrap();

        assert_eq!(session.token().expose_secret(), "TKN");
        assert_eq!(transport.urls(), vec!["https://fake/v2/auth"]);
        assert_eq!(
            transport.last_payload_for("/auth").unwrap(),
            json!({"access-type": "access_key", "access-id": "id1", "access-key": "k1", "json": true})
        );
    }

    #[test]
    fn test_cloud_identity_authenticate() {
        let transport = Arc::new(RecordingTransport::gateway("TKN", json!("pw")));
        let asked = Arc::new(Mutex::new(Vec::new()));
        let recorder = asked.clone();
        let identity = move |p: CloudProvider| -> Result<String, CloudIdError> {
            recorder.lock().unwrap().push(p);
            Ok("CLOUD-ID".to_string())
        };
        let client = GatewayClient::new(GW, transport.clone(), Arc::new(identity));

        let strategy = AccessStrategy::from_parts("aws_iam", "id2".into(), None).unwrap();
        client.authenticate(&strategy).unwrap();

        assert_eq!(*asked.lock().unwrap(), vec![CloudProvider::AwsIam]);
        let payload = transport.last_payload_for("/auth").unwrap();
        assert_eq!(
            payload,
            json!({"access-type": "aws_iam", "access-id": "id2", "cloud-id": "CLOUD-ID", "json": true})
        );
    }

    #[test]
    fn test_cloud_identity_failure_stops_before_network() {
        let transport = Arc::new(RecordingTransport::gateway("TKN", json!("pw")));
        let strategy = AccessStrategy::from_parts("gcp", "id3".into(), None).unwrap();

        let err = client(&transport).authenticate(&strategy).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Collaborator);
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_auth_falls_back_once_on_404() {
        let transport = Arc::new(RecordingTransport::new(|url, _| {
            if url.ends_with("/v2/auth") {
                Err(not_found(url))
            } else {
                Ok(auth_response("LEGACY"))
            }
        }));

        let session = client(&transport).authenticate(&access_key()).unwrap();

        assert_eq!(session.token().expose_secret(), "LEGACY");
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].url, "https://fake/v2/auth");
        assert_eq!(calls[1].url, "https://fake/auth");
        assert_eq!(calls[0].payload, calls[1].payload);
    }

    #[test]
    fn test_second_404_propagates() {
        let transport = Arc::new(RecordingTransport::failing(404));
        let err = client(&transport).authenticate(&access_key()).unwrap_err();

        assert!(matches!(err, ResolverError::Transport(ref e) if e.is_not_found()));
        assert!(err.to_string().contains("https://fake/auth"));
        assert_eq!(transport.call_count(), 2);
    }

    #[test]
    fn test_other_statuses_are_not_retried() {
        for status in [400, 401, 403, 500, 503] {
            let transport = Arc::new(RecordingTransport::failing(status));
            let err = client(&transport).authenticate(&access_key()).unwrap_err();

            assert_eq!(err.kind(), ErrorKind::Transport);
            assert_eq!(transport.call_count(), 1, "status {status} must not be retried");
        }
    }

    #[test]
    fn test_non_status_errors_are_not_retried() {
        let transport = Arc::new(RecordingTransport::new(|url, _| {
            Err(PlatformError::unexpected_response(url, "array"))
        }));
        let err = client(&transport).authenticate(&access_key()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn test_empty_token() {
        let transport = Arc::new(RecordingTransport::new(|_, _| Ok(Map::new())));
        let err = client(&transport).authenticate(&access_key()).unwrap_err();
        assert!(matches!(err, ResolverError::EmptyToken));
    }

    #[test]
    fn test_fetch_secret_payload() {
        let transport = Arc::new(RecordingTransport::gateway("TKN", json!("pw123")));
        let raw = client(&transport).fetch_secret(session("TKN"), "/s").unwrap();

        assert_eq!(raw, "pw123");
        assert_eq!(transport.urls(), vec!["https://fake/v2/get-secret-value"]);
        assert_eq!(
            transport.last_payload_for("/get-secret-value").unwrap(),
            json!({"token": "TKN", "name": "/s", "names": ["/s"], "json": true})
        );
    }

    #[test]
    fn test_fetch_falls_back_once_on_404() {
        let transport = Arc::new(RecordingTransport::new(|url, payload| {
            if url.ends_with("/v2/get-secret-value") {
                Err(not_found(url))
            } else {
                let name = payload["name"].as_str().unwrap_or_default();
                Ok(secrets_response(name, json!({"username": "u"})))
            }
        }));

        let raw = client(&transport).fetch_secret(session("T"), "/db").unwrap();

        assert_eq!(raw, r#"{"username":"u"}"#);
        assert_eq!(
            transport.urls(),
            vec!["https://fake/v2/get-secret-value", "https://fake/get-secret-value"]
        );
    }

    #[test]
    fn test_fetch_missing_secret() {
        let transport = Arc::new(RecordingTransport::new(|_, _| {
            Ok(secrets_response("/other", json!("x")))
        }));
        let err = client(&transport).fetch_secret(session("T"), "/s").unwrap_err();

        assert!(matches!(err, ResolverError::SecretNotFound(ref name) if name == "/s"));
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    // Compatibility case: response keyed by secret name without a `secrets`
    // wrapper.
    #[test]
    fn test_fetch_without_secrets_wrapper() {
        let transport = Arc::new(RecordingTransport::new(|_, _| {
            Ok(bare_secrets_response("/s", json!("bare-pw")))
        }));
        let raw = client(&transport).fetch_secret(session("T"), "/s").unwrap();
        assert_eq!(raw, "bare-pw");
    }
}
