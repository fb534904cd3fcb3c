// src/error.rs

//! Unified error handling for the seeker.

use std::fmt;

use thiserror::Error;

/// Result type alias for seeker operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport fault that is not a reqwest error (mock transports, status codes)
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// The extraction service could not turn a body into fields
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A whole per-target run failed
    #[error("Job failed for {target}: {message}")]
    Job { target: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a transport error for a URL.
    pub fn transport(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an extraction error.
    pub fn extraction(message: impl fmt::Display) -> Self {
        Self::Extraction(message.to_string())
    }

    /// Create a job failure with context.
    pub fn job(target: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Job {
            target: target.into(),
            message: message.to_string(),
        }
    }
}
