//! Shared test utilities for the Akeyless credential resolver.
//!
//! This crate provides:
//! - Proptest generators for secret names, credential types and secret values
//! - A recording mock of the JSON transport
//! - Sample gateway responses and secret payloads

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
pub use mocks::{RecordedCall, RecordingTransport};
