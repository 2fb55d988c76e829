//! Error types for record stores and rating providers.

use thiserror::Error;
use trend_engine_core::EngineError;

/// Errors raised by external data collaborators.
#[derive(Debug, Error)]
pub enum DataError {
    /// Record file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Record file has an extension no adapter handles.
    #[error("unsupported record file format: {0}")]
    UnsupportedFormat(String),

    /// JSON payload could not be decoded.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV payload could not be decoded.
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Stored row could not be mapped to a game record.
    #[error("invalid stored record {id}: {reason}")]
    InvalidRecord {
        /// Record identifier.
        id: String,
        /// What was wrong.
        reason: String,
    },

    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Provider answered with an error status.
    #[error("{provider} returned HTTP {status}: {message}")]
    Http {
        /// Provider name.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Provider answered with a body that could not be decoded.
    #[error("{provider} returned an unreadable response: {message}")]
    Decode {
        /// Provider name.
        provider: String,
        /// Decoder message.
        message: String,
    },

    /// Provider could not be reached.
    #[error("{provider} request failed: {message}")]
    Network {
        /// Provider name.
        provider: String,
        /// Failure description.
        message: String,
        /// Whether the request timed out.
        timed_out: bool,
    },
}

impl DataError {
    /// Returns true if the caller may retry.
    ///
    /// Timeouts, connection failures, rate limits and server errors are
    /// transient; malformed data and client errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Network { .. } => true,
            Self::Database(err) => matches!(
                err,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed
            ),
            Self::Io { .. }
            | Self::UnsupportedFormat(_)
            | Self::Json(_)
            | Self::Csv(_)
            | Self::Decode { .. }
            | Self::InvalidRecord { .. } => false,
        }
    }

    pub(crate) fn from_reqwest(provider: &str, err: &reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode {
                provider: provider.to_string(),
                message: err.to_string(),
            };
        }
        match err.status() {
            Some(status) => Self::Http {
                provider: provider.to_string(),
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => Self::Network {
                provider: provider.to_string(),
                message: err.to_string(),
                timed_out: err.is_timeout(),
            },
        }
    }

    fn source_name(&self) -> String {
        match self {
            Self::Http { provider, .. }
            | Self::Decode { provider, .. }
            | Self::Network { provider, .. } => provider.clone(),
            Self::Database(_) => "record store".to_string(),
            _ => "record file".to_string(),
        }
    }
}

impl From<DataError> for EngineError {
    fn from(err: DataError) -> Self {
        Self::External {
            source_name: err.source_name(),
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}
