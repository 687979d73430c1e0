//! Core types and utilities shared by the piper-rs crates.
//!
//! - [`Error`] / [`Result`]: the error type every library crate returns
//! - [`env`]: tolerant environment variable reads
//! - [`http`]: blocking HTTP client with timeout, retry budget and bearer auth
//! - [`redaction`]: secret redaction for log output

pub mod env;
pub mod error;
pub mod http;
pub mod redaction;

pub use error::{Error, Result};
