//! # Error Handling
//!
//! Error handling for the SSLinker client. Library code returns the typed
//! [`SslinkerError`]; the command line front end wraps it with `anyhow`.

pub mod types;

pub use types::{Result, SslinkerError};
