//! # Observability Infrastructure
//!
//! Structured logging for the SSLinker client. Every backend request runs in an
//! `api_request` span and every provisioning run in a `provision` span.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingConfig};
