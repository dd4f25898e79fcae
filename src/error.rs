//! Error handling for ReSampler
//!
//! Real-time operations never surface these: an uninitialized buffer or a
//! paused transport makes `write`/`read` inert. Control-thread operations
//! (resize, export, settings) return them to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for ReSampler operations
pub type Result<T> = std::result::Result<T, ResamplerError>;

/// Main error type for ReSampler operations
#[derive(Error, Debug)]
pub enum ResamplerError {
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Buffer has not been initialized")]
    Uninitialized,

    #[error("I/O failure at {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

impl ResamplerError {
    /// Shorthand for building an `InvalidArgument` error
    pub fn invalid(reason: impl Into<String>) -> Self {
        ResamplerError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResamplerError::IoFailure {
            path: path.into(),
            source,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ResamplerError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            ResamplerError::Uninitialized => "UNINITIALIZED",
            ResamplerError::IoFailure { .. } => "IO_FAILURE",
            ResamplerError::Wav(_) => "WAV_ERROR",
            ResamplerError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            ResamplerError::Settings(_) => "SETTINGS_ERROR",
        }
    }

    /// Check if the user can fix this without restarting the session
    pub fn is_recoverable(&self) -> bool {
        match self {
            ResamplerError::InvalidArgument { .. } => true,
            ResamplerError::IoFailure { .. } => true,
            ResamplerError::UnsupportedFormat { .. } => true,
            ResamplerError::Settings(_) => true,
            ResamplerError::Uninitialized | ResamplerError::Wav(_) => false,
        }
    }

    /// Get a user-facing message, e.g. for an export failure dialog
    pub fn friendly_message(&self) -> String {
        match self {
            ResamplerError::IoFailure { path, .. } => format!(
                "Couldn't write to '{}'. Check that the recording folder exists and is writable.",
                path.display()
            ),
            ResamplerError::Uninitialized => {
                "The plugin hasn't received audio settings from the host yet.".to_string()
            }
            _ => self.to_string(),
        }
    }
}
