//! Error types for the gateway module.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur talking to the destination platform.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The platform asked us to back off for a mandated wait time.
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// The platform rejected the call.
    #[error("API error: {description}")]
    Api { description: String },

    /// The platform did not return a usable file reference.
    #[error("No stable file reference in response for: {context}")]
    MissingReference { context: String },

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Response body could not be decoded.
    #[error("Failed to parse response: {reason}")]
    ParseError { reason: String },
}

impl GatewayError {
    pub fn api(description: impl Into<String>) -> Self {
        Self::Api {
            description: description.into(),
        }
    }

    /// Mandated wait time, if this is a rate-limit signal.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Http(_) | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after() {
        let err = GatewayError::RateLimited {
            retry_after: Duration::from_secs(7),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
        assert!(err.is_retryable());

        let err = GatewayError::api("bad request");
        assert_eq!(err.retry_after(), None);
        assert!(!err.is_retryable());
    }
}
