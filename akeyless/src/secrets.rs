//! Gateway wire types and response extraction.

use crate::error::{ResolverError, ResolverResult};
use crate::mapping::stringify;
use secrecy::SecretString;
use serde::Serialize;
use serde_json::{Map, Value};

/// Body of `POST /v2/auth`.
///
/// Deliberately not `Debug`: it carries the access key.
#[derive(Serialize)]
pub struct AuthRequest<'a> {
    /// Access type tag
    #[serde(rename = "access-type")]
    pub access_type: &'static str,
    /// Access id
    #[serde(rename = "access-id")]
    pub access_id: &'a str,
    /// Access key (`access_key` only)
    #[serde(rename = "access-key", skip_serializing_if = "Option::is_none")]
    pub access_key: Option<&'a str>,
    /// Cloud identity (cloud strategies only)
    #[serde(rename = "cloud-id", skip_serializing_if = "Option::is_none")]
    pub cloud_id: Option<String>,
    /// Ask for a JSON answer
    pub json: bool,
}

/// Body of `POST /v2/get-secret-value`.
#[derive(Serialize)]
pub struct GetSecretValueRequest<'a> {
    /// Session token
    pub token: &'a str,
    /// Secret name
    pub name: &'a str,
    /// Secret names; always the single `name`
    pub names: [&'a str; 1],
    /// Ask for a JSON answer
    pub json: bool,
}

impl<'a> GetSecretValueRequest<'a> {
    /// Request for one secret.
    #[must_use]
    pub const fn new(token: &'a str, name: &'a str) -> Self {
        Self {
            token,
            name,
            names: [name],
            json: true,
        }
    }
}

/// Token from an auth response.
///
/// # Errors
///
/// [`ResolverError::EmptyToken`] if `token` is absent, null or empty.
pub fn extract_token(response: &Map<String, Value>) -> ResolverResult<SecretString> {
    response
        .get("token")
        .and_then(stringify)
        .filter(|token| !token.is_empty())
        .map(SecretString::from)
        .ok_or(ResolverError::EmptyToken)
}

/// Raw text of `name` from a get-secret-value response.
///
/// The value is looked up in the `secrets` object, or in the response body
/// itself when there is no `secrets` key. Containers come back as JSON text,
/// scalars as their string form.
///
/// # Errors
///
/// [`ResolverError::SecretNotFound`] if `name` is absent or null.
pub fn extract_secret(response: &Map<String, Value>, name: &str) -> ResolverResult<String> {
    let value = match response.get("secrets") {
        Some(Value::Object(secrets)) => secrets.get(name),
        Some(_) => None,
        None => response.get(name),
    };

    value
        .and_then(stringify)
        .ok_or_else(|| ResolverError::not_found(name))
}
