//! Error types and handling for the pollenmap service

use thiserror::Error;

/// Outcome of a lookup that did not produce a result.
///
/// `Superseded` is not an error in the user-facing sense: it means a newer
/// lookup was issued while this one was still in flight, and this one was
/// canceled. Callers swallow it silently. `Failed` covers everything else
/// (network errors, malformed responses, non-success statuses) and is the
/// caller's responsibility to surface.
#[derive(Error, Debug)]
pub enum LookupError {
    /// A newer lookup canceled this one; produces no user-visible state change
    #[error("lookup superseded by a newer request")]
    Superseded,

    /// Either fetch failed for a reason other than cancellation
    #[error("lookup failed: {message}")]
    Failed { message: String },
}

impl LookupError {
    /// Create a lookup failure from any displayable cause
    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// True when this outcome must not be reported to the user
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        Self::Failed {
            message: err.to_string(),
        }
    }
}

/// Main error type for the pollenmap application
#[derive(Error, Debug)]
pub enum PollenMapError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },
}

impl PollenMapError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PollenMapError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            PollenMapError::Api { .. } => {
                "Unable to reach external services. Please check your internet connection."
                    .to_string()
            }
            PollenMapError::Validation { message } => {
                format!("Invalid input: {message}")
            }
        }
    }
}
