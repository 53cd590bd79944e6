//! Widget error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Widget error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Diagram Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed diagram metadata: {message}")]
    Metadata { message: String },

    #[error("Malformed diagram payload: {message}")]
    Payload { message: String },

    // ─────────────────────────────────────────────────────────────
    // Hover Info Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Hover info request failed: {message}")]
    HoverFetch { message: String },

    #[error("Host invoke '{method}' timed out after {timeout_ms}ms")]
    InvokeTimeout { method: String, timeout_ms: u64 },

    // ─────────────────────────────────────────────────────────────
    // Host Protocol Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Host protocol error: {message}")]
    Protocol { message: String },

    #[error("Host transport error: {message}")]
    Transport { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    // ─────────────────────────────────────────────────────────────
    // Startup Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata {
            message: message.into(),
        }
    }

    pub fn payload(message: impl Into<String>) -> Self {
        Self::Payload {
            message: message.into(),
        }
    }

    pub fn hover_fetch(message: impl Into<String>) -> Self {
        Self::HoverFetch {
            message: message.into(),
        }
    }

    pub fn invoke_timeout(method: impl Into<String>, timeout_ms: u64) -> Self {
        Self::InvokeTimeout {
            method: method.into(),
            timeout_ms,
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors degrade a single interactive feature (hover,
    /// menu, metadata echo) and leave the mounted session untouched.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Json(_)
                | Error::Metadata { .. }
                | Error::Payload { .. }
                | Error::HoverFetch { .. }
                | Error::InvokeTimeout { .. }
                | Error::Protocol { .. }
                | Error::Transport { .. }
        )
    }

    /// Check if this error should stop the host bridge at start-up
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::LoggingInit(_) | Error::ConfigNotFound { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
