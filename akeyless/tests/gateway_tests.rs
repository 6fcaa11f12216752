//! End-to-end resolver tests over HTTP against a wiremock gateway.
//!
//! The resolver is blocking, so each resolution runs on a `spawn_blocking`
//! thread.

use akeyless_resolver::{
    CredentialField, CredentialFields, CredentialResolver, ErrorKind, HostProperties,
    LayeredConfig, NoCloudIdentity, ResolutionRequest, ResolverError, ResolverResult,
};
use rust_common::{HttpConfig, HttpJsonTransport};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AUTH_BODY: &str = r#"{"access-type":"access_key","access-id":"p-abc","access-key":"k-xyz","json":true}"#;

async fn resolve(
    gateway: String,
    credential_type: &'static str,
    secret_id: &'static str,
) -> ResolverResult<CredentialFields> {
    tokio::task::spawn_blocking(move || {
        let overrides: HostProperties = [
            ("ext.cred.akeyless.gw_url", gateway.as_str()),
            ("ext.cred.akeyless.access_id", "p-abc"),
            ("ext.cred.akeyless.access_key", "k-xyz"),
        ]
        .into_iter()
        .collect();
        let config = LayeredConfig::new(Arc::new(overrides), Arc::new(HostProperties::default()));
        let transport = HttpJsonTransport::new(&HttpConfig::default())?;
        let resolver = CredentialResolver::new(config, Arc::new(transport), Arc::new(NoCloudIdentity));
        resolver.resolve(&ResolutionRequest::new(credential_type, secret_id)?)
    })
    .await
    .expect("blocking task panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_v2_endpoints() {
    let server = MockServer::start().await;
    let auth_body: serde_json::Value = serde_json::from_str(AUTH_BODY).unwrap();

    Mock::given(method("POST"))
        .and(path("/v2/auth"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/json"))
        .and(body_json(&auth_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t-1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/get-secret-value"))
        .and(body_json(json!({"token": "t-1", "name": "/db", "names": ["/db"], "json": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secrets": {"/db": {"username": "Ssa", "password": "ddd"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fields = resolve(server.uri(), "basic", "/db").await.unwrap();

    assert_eq!(fields.get(CredentialField::Username), Some("Ssa"));
    assert_eq!(fields.get(CredentialField::Password), Some("ddd"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_legacy_endpoints_after_404() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/auth"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t-legacy"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/get-secret-value"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/get-secret-value"))
        .and(body_json(json!({"token": "t-legacy", "name": "/s", "names": ["/s"], "json": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"secrets": {"/s": "pw123"}})))
        .expect(1)
        .mount(&server)
        .await;

    let fields = resolve(server.uri(), "windows", "/s").await.unwrap();

    assert_eq!(fields.into_map().get("password").map(String::as_str), Some("pw123"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/auth"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "never"})))
        .expect(0)
        .mount(&server)
        .await;

    let err = resolve(server.uri(), "basic", "/s").await.unwrap_err();

    assert!(matches!(err, ResolverError::Transport(ref e) if e.status_code() == Some(500)));
    assert!(err.to_string().contains("boom"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_secret_in_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t-1"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/get-secret-value"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"secrets": {}})))
        .mount(&server)
        .await;

    let err = resolve(server.uri(), "basic", "/missing").await.unwrap_err();

    assert_eq!(err.to_string(), "Secret value not found for name: /missing");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_html_auth_response_names_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = resolve(server.uri(), "basic", "/s").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.to_string().contains("/v2/auth"), "got: {err}");
}
