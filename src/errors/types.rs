//! # Error Types
//!
//! Error types for the SSLinker client using `thiserror`. The variants follow the
//! three failure classes an operator can see: client-side validation, transport
//! failures and messages reported by the backend itself.

/// Custom result type for SSLinker operations
pub type Result<T> = std::result::Result<T, SslinkerError>;

/// Main error type for the SSLinker client
#[derive(thiserror::Error, Debug)]
pub enum SslinkerError {
    /// Input rejected before any request was sent
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Network failure, or a non-2xx response without a readable message
    #[error("Request failed: {context}")]
    Request {
        context: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Failure reported by the backend (`success: false` or an error `detail`)
    #[error("{message}")]
    Backend { message: String, status: Option<u16> },

    /// Response that does not honour the documented data contract
    #[error("Backend contract violation: {message}")]
    Contract { message: String },

    /// The same action is already in flight
    #[error("'{action}' is already in progress")]
    Busy { action: String },

    /// Illegal workflow stage transition
    #[error("Invalid workflow transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },
}

impl SslinkerError {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a request error without an underlying transport error
    pub fn request<S: Into<String>>(context: S) -> Self {
        Self::Request { context: context.into(), source: None }
    }

    /// Create a request error wrapping a reqwest failure
    pub fn request_with_source<S: Into<String>>(context: S, source: reqwest::Error) -> Self {
        Self::Request { context: context.into(), source: Some(source) }
    }

    /// Create a backend-reported error
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend { message: message.into(), status: None }
    }

    /// Create a backend-reported error carrying the HTTP status
    pub fn backend_with_status<S: Into<String>>(message: S, status: u16) -> Self {
        Self::Backend { message: message.into(), status: Some(status) }
    }

    /// Create a contract violation error
    pub fn contract<S: Into<String>>(message: S) -> Self {
        Self::Contract { message: message.into() }
    }

    /// Create a busy error for a duplicate submission
    pub fn busy<S: Into<String>>(action: S) -> Self {
        Self::Busy { action: action.into() }
    }

    /// Create an error for a workflow stage change that is not allowed
    pub fn invalid_transition<F: ToString, T: ToString>(from: F, to: T) -> Self {
        Self::InvalidTransition { from: from.to_string(), to: to.to_string() }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create an I/O error with context
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io { source, context: context.into() }
    }

    /// True when the failure was detected locally and nothing was sent
    pub fn is_validation(&self) -> bool {
        matches!(self, SslinkerError::Validation { .. })
    }

    /// Message suitable for a transient notice shown to the operator.
    ///
    /// Backend messages are surfaced verbatim; transport failures collapse into a
    /// generic notice.
    pub fn notice_message(&self) -> String {
        match self {
            SslinkerError::Backend { message, .. } => message.clone(),
            SslinkerError::Validation { message, .. } => message.clone(),
            SslinkerError::Request { .. } => "Request failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for SslinkerError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for SslinkerError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { source: error, context: "JSON deserialization failed".to_string() }
    }
}

impl From<reqwest::Error> for SslinkerError {
    fn from(error: reqwest::Error) -> Self {
        Self::request_with_source("HTTP transport error", error)
    }
}
