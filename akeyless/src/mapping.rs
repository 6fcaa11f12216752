//! Field-mapping engine.
//!
//! Turns the raw text of a secret into the credential fields the discovery
//! host expects. A secret that parses as a JSON object is projected through
//! the field table of the requested [`CredentialType`]; anything else is
//! treated as a bare password.

use crate::config::FieldAliasConfig;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A secret value after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSecretValue {
    /// Bare value (plain string, or JSON that is not an object)
    Scalar(String),
    /// Keyed record
    Structured(Map<String, Value>),
}

impl RawSecretValue {
    /// Classify raw secret text.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self::Structured(map),
            _ => Self::Scalar(raw.to_string()),
        }
    }

    /// Whether this is a keyed record.
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

/// String form of a JSON value; `None` for `null`.
///
/// Strings are returned as-is, numbers and booleans in their textual form,
/// arrays and objects as compact JSON.
#[must_use]
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            Some(value.to_string())
        }
    }
}

/// Output field understood by the discovery host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CredentialField {
    /// `username`
    Username,
    /// `password`
    Password,
    /// `private_key`
    PrivateKey,
    /// `passphrase`
    Passphrase,
    /// `auth-protocol`
    AuthProtocol,
    /// `auth-key`
    AuthKey,
    /// `privacy-protocol`
    PrivacyProtocol,
    /// `privacy-key`
    PrivacyKey,
}

impl CredentialField {
    /// Field name as handed to the host.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Password => "password",
            Self::PrivateKey => "private_key",
            Self::Passphrase => "passphrase",
            Self::AuthProtocol => "auth-protocol",
            Self::AuthKey => "auth-key",
            Self::PrivacyProtocol => "privacy-protocol",
            Self::PrivacyKey => "privacy-key",
        }
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a field is read from in a structured secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKey {
    User,
    Pass,
    PrivateKey,
    Passphrase,
    Fixed(&'static str),
}

impl SourceKey {
    fn resolve(self, aliases: &FieldAliasConfig) -> &str {
        match self {
            Self::User => &aliases.user_field,
            Self::Pass => &aliases.pass_field,
            Self::PrivateKey => &aliases.private_key_field,
            Self::Passphrase => &aliases.passphrase_field,
            Self::Fixed(key) => key,
        }
    }
}

type FieldTable = &'static [(CredentialField, SourceKey)];

const USER_PASSWORD: FieldTable = &[
    (CredentialField::Username, SourceKey::User),
    (CredentialField::Password, SourceKey::Pass),
];

const SSH_PRIVATE_KEY: FieldTable = &[
    (CredentialField::Username, SourceKey::User),
    (CredentialField::PrivateKey, SourceKey::PrivateKey),
    (CredentialField::Passphrase, SourceKey::Passphrase),
];

const SNMPV3: FieldTable = &[
    (CredentialField::Username, SourceKey::User),
    (CredentialField::AuthProtocol, SourceKey::Fixed("auth_protocol")),
    (CredentialField::AuthKey, SourceKey::Fixed("auth_key")),
    (CredentialField::PrivacyProtocol, SourceKey::Fixed("privacy_protocol")),
    (CredentialField::PrivacyKey, SourceKey::Fixed("privacy_key")),
];

/// Credential type requested by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialType {
    /// Windows
    Windows,
    /// Basic auth
    Basic,
    /// SSH with password
    SshPassword,
    /// VMware
    Vmware,
    /// JDBC
    Jdbc,
    /// JMS
    Jms,
    /// SSH with private key
    SshPrivateKey,
    /// SNMPv3
    Snmpv3,
    /// Any other type; mapped like basic auth
    Custom(String),
}

impl CredentialType {
    /// Parse a type tag, case-insensitively.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        let tag = tag.to_lowercase();
        match tag.as_str() {
            "windows" => Self::Windows,
            "basic" => Self::Basic,
            "ssh_password" => Self::SshPassword,
            "vmware" => Self::Vmware,
            "jdbc" => Self::Jdbc,
            "jms" => Self::Jms,
            "ssh_private_key" => Self::SshPrivateKey,
            "snmpv3" => Self::Snmpv3,
            _ => Self::Custom(tag),
        }
    }

    /// Lowercase type tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Windows => "windows",
            Self::Basic => "basic",
            Self::SshPassword => "ssh_password",
            Self::Vmware => "vmware",
            Self::Jdbc => "jdbc",
            Self::Jms => "jms",
            Self::SshPrivateKey => "ssh_private_key",
            Self::Snmpv3 => "snmpv3",
            Self::Custom(tag) => tag,
        }
    }

    const fn field_table(&self) -> FieldTable {
        match self {
            Self::Windows
            | Self::Basic
            | Self::SshPassword
            | Self::Vmware
            | Self::Jdbc
            | Self::Jms
            | Self::Custom(_) => USER_PASSWORD,
            Self::SshPrivateKey => SSH_PRIVATE_KEY,
            Self::Snmpv3 => SNMPV3,
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved credential fields. Unset fields are absent.
///
/// `Debug` lists field names only.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialFields(BTreeMap<CredentialField, String>);

impl CredentialFields {
    /// Value of `field`, if set.
    #[must_use]
    pub fn get(&self, field: CredentialField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Number of fields set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of the fields set.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.0.keys().map(|f| f.as_str()).collect()
    }

    /// Convert into the host's name → value map.
    #[must_use]
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
            .into_iter()
            .map(|(f, v)| (f.as_str().to_string(), v))
            .collect()
    }

    fn insert(&mut self, field: CredentialField, value: String) {
        self.0.insert(field, value);
    }
}

impl fmt::Debug for CredentialFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.keys().map(|k| (k.as_str(), "[REDACTED]")))
            .finish()
    }
}

impl From<CredentialFields> for BTreeMap<String, String> {
    fn from(fields: CredentialFields) -> Self {
        fields.into_map()
    }
}

/// Project a classified value onto the fields of `credential_type`.
#[must_use]
pub fn project(
    credential_type: &CredentialType,
    value: &RawSecretValue,
    aliases: &FieldAliasConfig,
) -> CredentialFields {
    let mut out = CredentialFields::default();
    match value {
        RawSecretValue::Scalar(secret) => {
            out.insert(CredentialField::Password, secret.clone());
        }
        RawSecretValue::Structured(record) => {
            for (field, source) in credential_type.field_table() {
                if let Some(v) = record.get(source.resolve(aliases)).and_then(stringify) {
                    out.insert(*field, v);
                }
            }
        }
    }
    out
}

/// Map raw secret text onto credential fields.
///
/// Empty or absent text yields no fields.
#[must_use]
pub fn map_secret(
    credential_type: &CredentialType,
    raw: Option<&str>,
    aliases: &FieldAliasConfig,
) -> CredentialFields {
    match raw {
        None | Some("") => CredentialFields::default(),
        Some(raw) => project(credential_type, &RawSecretValue::classify(raw), aliases),
    }
}
