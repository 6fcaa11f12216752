//! Shared library for cross-cutting concerns of the Akeyless credential resolver.
//!
//! This crate provides:
//! - A transport error type carrying HTTP status, URL and body
//! - The `JsonTransport` seam and its blocking reqwest implementation
//! - Tracing subscriber initialisation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod tracing_config;

pub use error::PlatformError;
pub use http::{HttpConfig, HttpJsonTransport, JsonTransport};
pub use tracing_config::{TracingConfig, init_tracing};
