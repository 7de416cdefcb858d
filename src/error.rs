//! Error types for the relay pipeline.
//!
//! The taxonomy splits along one line that matters operationally: whether
//! the webhook sender still receives an acknowledgment. Authentication and
//! configuration failures terminate the request with an error status;
//! everything downstream of a verified signature is best-effort and must
//! never surface to the sender, because the order platform retries failed
//! webhooks and alert delivery is not safe to repeat blindly.

use thiserror::Error;

/// Result type alias using `RelayError`.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors raised while relaying an order webhook.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The shared webhook secret is not configured.
    #[error("webhook secret is not configured")]
    SecretNotConfigured,

    /// The supplied signature does not match the request body.
    #[error("webhook signature verification failed")]
    InvalidSignature,

    /// The destination directory could not be fetched.
    #[error("destination directory unreachable: {reason}")]
    DirectoryUnavailable {
        /// Transport-level failure description.
        reason: String,
    },

    /// The destination directory host answered with a non-success status.
    #[error("destination directory returned status {status}")]
    DirectoryStatus {
        /// HTTP status code returned by the directory host.
        status: u16,
    },

    /// An outbound HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// An alert delivery to a single destination failed.
    #[error("alert delivery to {url} failed: {reason}")]
    Delivery {
        /// Destination URL that failed.
        url: String,
        /// Failure description (timeout, connection, HTTP status).
        reason: String,
    },
}

impl RelayError {
    /// Returns a stable snake_case code for error responses and logs.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SecretNotConfigured => "secret_not_configured",
            Self::InvalidSignature => "invalid_signature",
            Self::DirectoryUnavailable { .. } => "directory_unavailable",
            Self::DirectoryStatus { .. } => "directory_status",
            Self::ClientBuild(_) => "client_build",
            Self::Delivery { .. } => "delivery_failed",
        }
    }

    /// Whether the webhook sender is still acknowledged with 200.
    ///
    /// True for every failure downstream of signature verification: those
    /// are logged and swallowed so the sender never retries.
    pub const fn acknowledges_sender(&self) -> bool {
        matches!(
            self,
            Self::DirectoryUnavailable { .. }
                | Self::DirectoryStatus { .. }
                | Self::Delivery { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(RelayError::SecretNotConfigured.code(), "secret_not_configured");
        assert_eq!(RelayError::InvalidSignature.code(), "invalid_signature");
        assert_eq!(RelayError::DirectoryStatus { status: 503 }.code(), "directory_status");
    }

    #[test]
    fn post_verification_failures_acknowledge_sender() {
        assert!(!RelayError::SecretNotConfigured.acknowledges_sender());
        assert!(!RelayError::InvalidSignature.acknowledges_sender());
        assert!(RelayError::DirectoryUnavailable { reason: "refused".into() }
            .acknowledges_sender());
        assert!(RelayError::DirectoryStatus { status: 500 }.acknowledges_sender());
        assert!(RelayError::Delivery { url: "http://a".into(), reason: "timeout".into() }
            .acknowledges_sender());
    }
}
