//! Error types for HTTP transport and webhook dispatch.

use thiserror::Error;

/// Error type for HTTP transport operations.
#[derive(Debug, Error, Clone)]
pub enum HttpError {
    /// Network connection failed (DNS, connection refused, TLS, ...).
    #[error("connection error: {0}")]
    Connection(String),
    /// Request timed out.
    #[error("request timed out")]
    Timeout,
    /// The provided URL is invalid.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Error type for a single dispatch attempt (spec §4.4).
///
/// There is deliberately no retrying variant here: the dispatcher makes
/// exactly one attempt per cycle (spec §4.4 "Dispatcher retries: none at
/// dispatch level").
#[derive(Debug, Error, Clone)]
pub enum DispatchError {
    /// No well-formed webhook URL could be resolved.
    #[error("no webhook configured")]
    NoWebhookConfigured,
    /// A transport-level error occurred.
    #[error(transparent)]
    Http(#[from] HttpError),
    /// The server responded with a non-2xx status.
    #[error("webhook returned status {status}")]
    NonSuccessStatus {
        /// The HTTP status code returned.
        status: u16,
    },
}

impl From<DispatchError> for crate::error::EngineError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NoWebhookConfigured => Self::NoWebhookConfigured,
            DispatchError::Http(HttpError::Timeout) => Self::WebhookTimeout,
            DispatchError::Http(HttpError::Connection(m) | HttpError::InvalidUrl(m)) => {
                Self::WebhookNetworkError(m)
            }
            DispatchError::NonSuccessStatus { status } => Self::WebhookHttpError { status },
        }
    }
}
