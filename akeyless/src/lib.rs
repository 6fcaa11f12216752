//! Akeyless credential resolver.
//!
//! Turns a discovery host's credential request (credential type plus secret
//! path) into a map of credential fields: authenticate against the Akeyless
//! gateway, fetch one secret value, project it onto the fields the requested
//! credential type needs.

pub mod access;
pub mod client;
pub mod cloud_id;
pub mod config;
pub mod error;
pub mod mapping;
pub mod resolver;
pub mod secrets;

pub use access::{AccessStrategy, AccessType};
pub use client::{AuthSession, GatewayClient};
pub use cloud_id::{
    CloudIdError, CloudIdentity, CloudProvider, NoCloudIdentity, PropertyCloudIdentity,
};
pub use config::{
    EnvProperties, FieldAliasConfig, HostProperties, LayeredConfig, PropertySource,
};
pub use error::{ErrorKind, ResolverError, ResolverResult};
pub use mapping::{
    CredentialField, CredentialFields, CredentialType, RawSecretValue, map_secret,
};
pub use resolver::{CredentialResolver, ResolutionRequest};
