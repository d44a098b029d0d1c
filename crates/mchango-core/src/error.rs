// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mchango bot.

use thiserror::Error;

/// The primary error type used across Mchango components and collaborator traits.
#[derive(Debug, Error)]
pub enum MchangoError {
    /// Configuration errors (invalid TOML, missing required fields, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transient transport errors (network failure, gateway 5xx, malformed response).
    ///
    /// Retried by the outbound queue up to the configured maximum; inbound poll
    /// errors of this class are logged and retried on the next tick.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authentication or credential failure against the messaging gateway.
    ///
    /// Fatal for the notification poller: polling stops and operator
    /// intervention is required.
    #[error("authentication failure: {0}")]
    Auth(String),

    /// The per-minute send budget is exhausted.
    ///
    /// Never surfaced to the end user; the outbound queue absorbs it by
    /// pacing and retrying the same message.
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// An external call did not return within its bounded timeout.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Persistence collaborator errors (user/group/contribution store).
    #[error("persistence error: {message}")]
    Persistence {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MchangoError {
    /// Convenience constructor for transient transport errors without a source.
    pub fn transport(message: impl Into<String>) -> Self {
        MchangoError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Convenience constructor for persistence errors without a source.
    pub fn persistence(message: impl Into<String>) -> Self {
        MchangoError::Persistence {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error should halt the notification poller permanently.
    pub fn is_fatal_for_polling(&self) -> bool {
        matches!(self, MchangoError::Auth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_fatal_for_polling() {
        assert!(MchangoError::Auth("bad token".into()).is_fatal_for_polling());
        assert!(!MchangoError::transport("connection reset").is_fatal_for_polling());
        assert!(!MchangoError::RateLimitExceeded.is_fatal_for_polling());
    }

    #[test]
    fn display_includes_message() {
        let err = MchangoError::transport("gateway returned 502");
        assert_eq!(err.to_string(), "transport error: gateway returned 502");

        let err = MchangoError::Config("queue.max_retries must be > 0".into());
        assert!(err.to_string().contains("max_retries"));
    }
}
