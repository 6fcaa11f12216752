//! Resolver configuration.
//!
//! Every tunable is resolved through three layers: an explicit override
//! property (as set on the discovery host), a default under a distinct
//! environment-style name, and finally a hardcoded default. Both property
//! layers are [`PropertySource`]s chosen at startup.

use crate::access::AccessStrategy;
use crate::error::{ResolverError, ResolverResult};
use secrecy::SecretString;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Default gateway: the public Akeyless API.
pub const DEFAULT_GATEWAY_URL: &str = "https://api.akeyless.io";

/// Default access type.
pub const DEFAULT_ACCESS_TYPE: &str = "access_key";

/// Prefix under which the host may also publish a property.
pub const HOST_PROPERTY_PREFIX: &str = "mid.property.";

/// A string key/value store.
pub trait PropertySource: Send + Sync {
    /// Look up `name`. Empty values are reported as absent.
    fn get(&self, name: &str) -> Option<String>;
}

/// Properties published by the host process.
///
/// A name is looked up as-is and then under [`HOST_PROPERTY_PREFIX`].
#[derive(Debug, Clone, Default)]
pub struct HostProperties {
    values: HashMap<String, String>,
}

impl HostProperties {
    /// Set a property.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Parse `key=value` lines. Blank lines and lines starting with `#` or
    /// `!` are ignored; `:` is accepted as separator too.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
            .filter_map(|line| {
                let (key, value) = line.split_once(['=', ':'])?;
                Some((key.trim().to_string(), value.trim().to_string()))
            })
            .collect()
    }

    /// Load a properties file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> ResolverResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ResolverError::config(format!("Cannot read properties file {}: {e}", path.display()))
        })?;
        Ok(Self::parse(&text))
    }

    fn non_empty(&self, name: &str) -> Option<String> {
        self.values.get(name).filter(|v| !v.is_empty()).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HostProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl PropertySource for HostProperties {
    fn get(&self, name: &str) -> Option<String> {
        self.non_empty(name)
            .or_else(|| self.non_empty(&format!("{HOST_PROPERTY_PREFIX}{name}")))
    }
}

/// Process environment.
///
/// A name is looked up as-is and then in its environment-variable spelling
/// (see [`env_key`]), so `ext.cred.akeyless.gw_url` also answers to
/// `EXT_CRED_AKEYLESS_GW_URL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProperties;

impl PropertySource for EnvProperties {
    fn get(&self, name: &str) -> Option<String> {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        read(name).or_else(|| {
            let key = env_key(name);
            if key == name { None } else { read(&key) }
        })
    }
}

/// Environment-variable spelling of a dotted property name.
#[must_use]
pub fn env_key(name: &str) -> String {
    name.replace('.', "_").to_uppercase()
}

/// A configurable value and where it is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tunable {
    /// Override property name
    pub property: &'static str,
    /// Default-layer name
    pub default_name: &'static str,
    /// Hardcoded default
    pub fallback: Option<&'static str>,
}

/// Gateway base URL.
pub const GATEWAY_URL: Tunable = Tunable {
    property: "ext.cred.akeyless.gw_url",
    default_name: "AKEYLESS_GW_URL",
    fallback: Some(DEFAULT_GATEWAY_URL),
};

/// Access type tag.
pub const ACCESS_TYPE: Tunable = Tunable {
    property: "ext.cred.akeyless.access_type",
    default_name: "AKEYLESS_ACCESS_TYPE",
    fallback: Some(DEFAULT_ACCESS_TYPE),
};

/// Access id (required).
pub const ACCESS_ID: Tunable = Tunable {
    property: "ext.cred.akeyless.access_id",
    default_name: "AKEYLESS_ACCESS_ID",
    fallback: None,
};

/// Access key (`access_key` strategy only).
pub const ACCESS_KEY: Tunable = Tunable {
    property: "ext.cred.akeyless.access_key",
    default_name: "AKEYLESS_ACCESS_KEY",
    fallback: None,
};

/// Source key holding the username.
pub const MAP_USERNAME: Tunable = Tunable {
    property: "ext.cred.akeyless.map.username",
    default_name: "AKEYLESS_MAP_USERNAME",
    fallback: Some("username"),
};

/// Source key holding the password.
pub const MAP_PASSWORD: Tunable = Tunable {
    property: "ext.cred.akeyless.map.password",
    default_name: "AKEYLESS_MAP_PASSWORD",
    fallback: Some("password"),
};

/// Source key holding the private key.
pub const MAP_PRIVATE_KEY: Tunable = Tunable {
    property: "ext.cred.akeyless.map.private_key",
    default_name: "AKEYLESS_MAP_PRIVATE_KEY",
    fallback: Some("private_key"),
};

/// Source key holding the passphrase.
pub const MAP_PASSPHRASE: Tunable = Tunable {
    property: "ext.cred.akeyless.map.passphrase",
    default_name: "AKEYLESS_MAP_PASSPHRASE",
    fallback: Some("passphrase"),
};

/// Override layer on top of a default layer.
#[derive(Clone)]
pub struct LayeredConfig {
    overrides: Arc<dyn PropertySource>,
    defaults: Arc<dyn PropertySource>,
}

impl fmt::Debug for LayeredConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredConfig").finish_non_exhaustive()
    }
}

impl LayeredConfig {
    /// Create a layered configuration.
    #[must_use]
    pub fn new(overrides: Arc<dyn PropertySource>, defaults: Arc<dyn PropertySource>) -> Self {
        Self {
            overrides,
            defaults,
        }
    }

    /// Standalone configuration: both layers read the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(Arc::new(EnvProperties), Arc::new(EnvProperties))
    }

    /// Resolve `tunable`, falling back to its hardcoded default.
    #[must_use]
    pub fn lookup(&self, tunable: &Tunable) -> Option<String> {
        self.overrides
            .get(tunable.property)
            .or_else(|| self.defaults.get(tunable.default_name))
            .or_else(|| tunable.fallback.map(str::to_string))
    }

    /// Resolve a tunable that has a hardcoded fallback.
    ///
    /// Yields an empty string for a tunable without one.
    #[must_use]
    pub fn value(&self, tunable: &Tunable) -> String {
        self.lookup(tunable).unwrap_or_default()
    }

    /// Resolve `tunable`, failing if no layer provides it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming both lookup keys.
    pub fn require(&self, tunable: &Tunable, what: &str) -> ResolverResult<String> {
        self.lookup(tunable).ok_or_else(|| {
            ResolverError::config(format!(
                "Missing Akeyless {what}: set MID '{}' or env '{}'",
                tunable.property, tunable.default_name
            ))
        })
    }
}

/// Keys read from a structured secret for the aliasable logical fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAliasConfig {
    /// Source key for `username`
    pub user_field: String,
    /// Source key for `password`
    pub pass_field: String,
    /// Source key for `private_key`
    pub private_key_field: String,
    /// Source key for `passphrase`
    pub passphrase_field: String,
}

impl Default for FieldAliasConfig {
    fn default() -> Self {
        let fallback = |t: Tunable| t.fallback.unwrap_or_default().to_string();
        Self {
            user_field: fallback(MAP_USERNAME),
            pass_field: fallback(MAP_PASSWORD),
            private_key_field: fallback(MAP_PRIVATE_KEY),
            passphrase_field: fallback(MAP_PASSPHRASE),
        }
    }
}

impl FieldAliasConfig {
    /// Resolve all four aliases.
    #[must_use]
    pub fn load(config: &LayeredConfig) -> Self {
        Self {
            user_field: config.value(&MAP_USERNAME),
            pass_field: config.value(&MAP_PASSWORD),
            private_key_field: config.value(&MAP_PRIVATE_KEY),
            passphrase_field: config.value(&MAP_PASSPHRASE),
        }
    }

    /// Set the username source key.
    #[must_use]
    pub fn with_user_field(mut self, field: impl Into<String>) -> Self {
        self.user_field = field.into();
        self
    }

    /// Set the password source key.
    #[must_use]
    pub fn with_pass_field(mut self, field: impl Into<String>) -> Self {
        self.pass_field = field.into();
        self
    }

    /// Set the private key source key.
    #[must_use]
    pub fn with_private_key_field(mut self, field: impl Into<String>) -> Self {
        self.private_key_field = field.into();
        self
    }

    /// Set the passphrase source key.
    #[must_use]
    pub fn with_passphrase_field(mut self, field: impl Into<String>) -> Self {
        self.passphrase_field = field.into();
        self
    }
}

/// Everything one resolution request needs from configuration.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Gateway base URL
    pub gateway_url: String,
    /// Authentication strategy
    pub strategy: AccessStrategy,
    /// Structured secret source keys
    pub aliases: FieldAliasConfig,
}

impl ResolverSettings {
    /// Resolve settings from layered configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the access id is missing, the access
    /// type is unsupported, or an access key strategy has no key.
    pub fn load(config: &LayeredConfig) -> ResolverResult<Self> {
        let aliases = FieldAliasConfig::load(config);
        let gateway_url = config.value(&GATEWAY_URL);
        let access_type = config.value(&ACCESS_TYPE);
        let access_id = config.require(&ACCESS_ID, "access id")?;
        let access_key = config.lookup(&ACCESS_KEY).map(SecretString::from);

        let strategy = AccessStrategy::from_parts(&access_type, access_id, access_key)?;

        Ok(Self {
            gateway_url,
            strategy,
            aliases,
        })
    }
}
