//! The engine-wide error taxonomy (spec §7). Every variant carries a stable
//! machine `code`, used by the Command/Query API's `{success, code, message}`
//! response shape.

use thiserror::Error;

/// Every error the engine can surface to a direct API caller.
///
/// Errors raised *inside* the Cycle Pipeline are never propagated this way
/// (spec §7 propagation policy) — they are logged and counted by the
/// Failure Tracker instead. This type is used only for direct command
/// results (`start_target`, `stop_target`, `send_now`, ...).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Configuration: `selector` was empty.
    #[error("selector must be non-empty")]
    InvalidSelector,
    /// Configuration: `interval` was below the 5s floor.
    #[error("interval must be at least 5 seconds")]
    InvalidInterval,
    /// Configuration: a webhook URL was not a well-formed absolute http(s) URL.
    #[error("invalid webhook url: {0}")]
    InvalidWebhookUrl(String),
    /// Configuration: `initial_url` was not a well-formed absolute http(s) URL.
    #[error("invalid page url: {0}")]
    InvalidPageUrl(String),
    /// No effective webhook URL could be resolved (spec §4.4).
    #[error("no webhook configured")]
    NoWebhookConfigured,
    /// `stop_target`/`status` referenced an id not in the live set.
    #[error("target not found")]
    TargetNotFound,
    /// `start_target` was called for a `page_ref` already running.
    #[error("target already running")]
    TargetAlreadyRunning,
    /// Page Agent: `ensure_ready` could not reach the page.
    #[error("page unreachable")]
    PageUnreachable,
    /// Page Agent: the page reference no longer resolves.
    #[error("page gone")]
    PageGone,
    /// Page Agent: the page reference is not http/https.
    #[error("unsupported page")]
    UnsupportedPage,
    /// Page Agent: no element matched the selector.
    #[error("element not found")]
    ElementNotFound,
    /// Page Agent: the page was still loading past the wait-for-ready ceiling.
    #[error("page still loading")]
    PageStillLoading,
    /// Extraction: trimmed content was under 100 characters.
    #[error("content too short")]
    ContentTooShort,
    /// Extraction: trimmed content matched a loading-marker pattern.
    #[error("content contains loading markers")]
    ContentContainsLoadingMarkers,
    /// Extraction: text-mode content had fewer than 3 non-empty lines.
    #[error("content has insufficient lines")]
    ContentInsufficientLines,
    /// Webhook: the server returned a non-2xx status.
    #[error("webhook http error: status {status}")]
    WebhookHttpError {
        /// The HTTP status code returned.
        status: u16,
    },
    /// Webhook: a transport-level error (DNS, connection, TLS).
    #[error("webhook network error: {0}")]
    WebhookNetworkError(String),
    /// Webhook: the request exceeded the 30s timeout.
    #[error("webhook timeout")]
    WebhookTimeout,
    /// Config Store read or write failed.
    #[error("persistence error: {0}")]
    PersistenceError(String),
    /// The operation was cancelled; does not count against the Failure Tracker.
    #[error("cancelled")]
    Cancelled,
}

impl EngineError {
    /// The stable machine-readable code for this error (spec §7).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidSelector => "invalid_selector",
            Self::InvalidInterval => "invalid_interval",
            Self::InvalidWebhookUrl(_) => "invalid_webhook_url",
            Self::InvalidPageUrl(_) => "invalid_page_url",
            Self::NoWebhookConfigured => "no_webhook_configured",
            Self::TargetNotFound => "target_not_found",
            Self::TargetAlreadyRunning => "target_already_running",
            Self::PageUnreachable => "page_unreachable",
            Self::PageGone => "page_gone",
            Self::UnsupportedPage => "unsupported_page",
            Self::ElementNotFound => "element_not_found",
            Self::PageStillLoading => "page_still_loading",
            Self::ContentTooShort => "content_too_short",
            Self::ContentContainsLoadingMarkers => "content_contains_loading_markers",
            Self::ContentInsufficientLines => "content_insufficient_lines",
            Self::WebhookHttpError { .. } => "webhook_http_error",
            Self::WebhookNetworkError(_) => "webhook_network_error",
            Self::WebhookTimeout => "webhook_timeout",
            Self::PersistenceError(_) => "persistence_error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<crate::page_agent::PageAgentError> for EngineError {
    fn from(err: crate::page_agent::PageAgentError) -> Self {
        use crate::page_agent::PageAgentError as P;
        match err {
            P::Unreachable => Self::PageUnreachable,
            P::UnsupportedPage => Self::UnsupportedPage,
            P::PageGone => Self::PageGone,
            P::ElementNotFound { .. } => Self::ElementNotFound,
            P::PageError(message) => Self::WebhookNetworkError(message),
        }
    }
}
