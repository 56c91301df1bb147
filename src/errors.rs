//! # Structured Error Types
//!
//! Every remote call made by this crate fails with an [`ApiError`], and a single error
//! path presents any of them to the user:
//!
//! - [`ApiError::Transport`]: the request never produced a usable response (connection
//!   failures, undecodable bodies, server-side 5xx errors).
//! - [`ApiError::Authorization`]: the caller is not allowed to act on the resource.
//! - [`ApiError::Validation`]: the request itself was rejected (bad input, unknown project).
//!
//! ## Example
//!
//! ```rust
//! use dioxus_studio_reports::errors::ApiError;
//!
//! let error = ApiError::from_status(401, "unauthorized");
//! assert!(matches!(error, ApiError::Authorization { .. }));
//! assert_eq!(error.message(), "unauthorized");
//! ```

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the analytics API and the mutations built on it
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Connection, decoding or server-side failures
    #[error("Transport error{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The caller is not authorized against the resource
    #[error("Authorization failed (HTTP {status}): {message}")]
    Authorization { status: u16, message: String },

    /// The request was rejected as invalid
    #[error("Validation failed{}: {message}", status_suffix(.status))]
    Validation {
        status: Option<u16>,
        message: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl ApiError {
    /// Builds a transport error that has no HTTP status attached
    pub fn transport(message: impl Into<String>) -> Self {
        ApiError::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Builds a validation error raised before any request was sent
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::Validation {
            status: None,
            message: message.into(),
        }
    }

    /// Classifies a non-success HTTP status into the error taxonomy
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => ApiError::Authorization { status, message },
            400 | 404 | 409 | 422 => ApiError::Validation {
                status: Some(status),
                message,
            },
            _ => ApiError::Transport {
                status: Some(status),
                message,
            },
        }
    }

    /// The human-readable message, without the classification prefix
    pub fn message(&self) -> &str {
        match self {
            ApiError::Transport { message, .. }
            | ApiError::Authorization { message, .. }
            | ApiError::Validation { message, .. } => message,
        }
    }

    /// The HTTP status that produced this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { status, .. } | ApiError::Validation { status, .. } => *status,
            ApiError::Authorization { status, .. } => Some(*status),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::Transport {
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }
}

/// Error body returned by the platform API
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseError {
    pub message: String,
}

/// Convenience type alias for Results with ApiError
pub type ApiResult<T> = Result<T, ApiError>;
