//! The Page Agent interface (spec §4.3) — the core's consumed contract with
//! whatever owns page navigation and DOM extraction.
//!
//! The core never implements a browser; it only talks to this trait. Two
//! implementations ship with this crate: [`reqwest_agent::ReqwestPageAgent`]
//! for running the engine standalone over plain HTTP, and a test-only mock
//! behind `#[cfg(test)]`.

mod reqwest_agent;

pub use reqwest_agent::ReqwestPageAgent;

use thiserror::Error;

use crate::model::{ContentMode, PageRef};

/// Errors surfaced by a Page Agent call (spec §7, Page Agent category).
#[derive(Debug, Error, Clone)]
pub enum PageAgentError {
    /// `ensure_ready` could not reach the page at all.
    #[error("page unreachable")]
    Unreachable,
    /// The page reference does not resolve to an http/https page.
    #[error("unsupported page (non-http/https)")]
    UnsupportedPage,
    /// The page reference no longer resolves to a live page.
    #[error("page gone")]
    PageGone,
    /// `extract` could not find any element matching the selector.
    #[error("element not found for selector '{selector}'")]
    ElementNotFound {
        /// The selector that failed to match.
        selector: String,
    },
    /// A generic page-side error not covered by the other variants.
    #[error("page error: {0}")]
    PageError(String),
}

/// The content returned by a successful `extract` call.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// The extracted markup or text, not yet trimmed or validated.
    pub content: String,
}

/// One page the agent currently has open, independent of any target's
/// configuration (spec §4.1 restart matching).
#[derive(Debug, Clone)]
pub struct KnownPage {
    /// The handle the agent would use to address this page.
    pub page_ref: PageRef,
    /// The page's current (post-redirect) URL.
    pub url: String,
}

/// The minimal surface the Cycle Pipeline consumes from whatever owns page
/// navigation and extraction (spec §4.3).
///
/// Calls are logically synchronous from the pipeline's perspective but may
/// suspend (spec §5). Implementations need not be thread-safe across
/// distinct `page_ref`s; the supervisor guarantees at-most-one in-flight
/// call per `page_ref`.
pub trait PageAgent: Send + Sync {
    /// Ensures the page is ready for extraction calls. Must be idempotent;
    /// the supervisor may call it on every cycle.
    fn ensure_ready(
        &self,
        page_ref: &PageRef,
    ) -> impl std::future::Future<Output = Result<(), PageAgentError>> + Send;

    /// Returns the page's current URL, for navigation-away detection.
    fn current_url(
        &self,
        page_ref: &PageRef,
    ) -> impl std::future::Future<Output = Result<String, PageAgentError>> + Send;

    /// Instructs the agent to reload the page.
    fn refresh(
        &self,
        page_ref: &PageRef,
    ) -> impl std::future::Future<Output = Result<(), PageAgentError>> + Send;

    /// Reports whether the page has finished loading.
    fn is_loaded(&self, page_ref: &PageRef) -> impl std::future::Future<Output = bool> + Send;

    /// Extracts the fragment matched by `selector` in the given mode.
    fn extract(
        &self,
        page_ref: &PageRef,
        selector: &str,
        content_mode: ContentMode,
    ) -> impl std::future::Future<Output = Result<ExtractedContent, PageAgentError>> + Send;

    /// Enumerates every page the agent currently has open, for restart
    /// rebinding (spec §4.1: "enumerates pages known to the Page Agent,
    /// matches each config to a page by normalized-URL equality").
    ///
    /// An agent with no notion of pages independent from a `page_ref`
    /// literal (e.g. a plain HTTP agent, where `page_ref` already *is* the
    /// URL) returns an empty list; the supervisor then falls back to
    /// re-using each target's persisted `page_ref` unchanged.
    fn known_pages(&self) -> impl std::future::Future<Output = Vec<KnownPage>> + Send;
}

/// Normalizes a URL for restart-matching and navigation-away comparisons
/// (spec §4.1): strips a trailing `/`, drops the fragment, preserves the
/// query, and case-folds the host.
#[must_use]
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(raw) else {
        return raw.to_string();
    };
    parsed.set_fragment(None);
    if let Some(host) = parsed.host_str() {
        let folded = host.to_lowercase();
        let _ = parsed.set_host(Some(&folded));
    }
    let mut normalized = parsed.to_string();
    if normalized.ends_with('/') && parsed.path() == "/" && parsed.query().is_none() {
        normalized.pop();
    }
    normalized
}

#[cfg(test)]
pub(crate) mod mock {
    use super::{ContentMode, ExtractedContent, KnownPage, PageAgent, PageAgentError, PageRef};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A scripted [`PageAgent`] for pipeline/supervisor tests.
    ///
    /// Each method pulls the next programmed result off its own queue;
    /// calling past the end of a queue panics, which surfaces test bugs
    /// (an unexpected extra call) loudly rather than silently looping.
    pub(crate) struct MockPageAgent {
        current_url: Mutex<VecDeque<Result<String, PageAgentError>>>,
        extract: Mutex<VecDeque<Result<ExtractedContent, PageAgentError>>>,
        ensure_ready: Mutex<VecDeque<Result<(), PageAgentError>>>,
        is_loaded: Mutex<VecDeque<bool>>,
        known_pages: Mutex<Vec<KnownPage>>,
        pub(crate) extract_calls: std::sync::atomic::AtomicUsize,
    }

    impl MockPageAgent {
        pub(crate) fn new() -> Self {
            Self {
                current_url: Mutex::new(VecDeque::new()),
                extract: Mutex::new(VecDeque::new()),
                ensure_ready: Mutex::new(VecDeque::new()),
                is_loaded: Mutex::new(VecDeque::new()),
                known_pages: Mutex::new(Vec::new()),
                extract_calls: std::sync::atomic::AtomicUsize::new(0),
            }
        }

        pub(crate) fn with_url(self, url: &str) -> Self {
            self.current_url
                .lock()
                .unwrap()
                .push_back(Ok(url.to_string()));
            self
        }

        pub(crate) fn with_extract_ok(self, content: &str) -> Self {
            self.extract.lock().unwrap().push_back(Ok(ExtractedContent {
                content: content.to_string(),
            }));
            self
        }

        pub(crate) fn with_extract_err(self, err: PageAgentError) -> Self {
            self.extract.lock().unwrap().push_back(Err(err));
            self
        }

        pub(crate) fn always_ready(self) -> Self {
            self.ensure_ready.lock().unwrap().push_back(Ok(()));
            self.is_loaded.lock().unwrap().push_back(true);
            self
        }

        pub(crate) fn with_known_pages(self, pages: Vec<KnownPage>) -> Self {
            *self.known_pages.lock().unwrap() = pages;
            self
        }
    }

    impl PageAgent for MockPageAgent {
        async fn ensure_ready(&self, _page_ref: &PageRef) -> Result<(), PageAgentError> {
            self.ensure_ready
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(()))
        }

        async fn current_url(&self, _page_ref: &PageRef) -> Result<String, PageAgentError> {
            self.current_url
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PageAgentError::PageGone))
        }

        async fn refresh(&self, _page_ref: &PageRef) -> Result<(), PageAgentError> {
            Ok(())
        }

        async fn is_loaded(&self, _page_ref: &PageRef) -> bool {
            self.is_loaded.lock().unwrap().pop_front().unwrap_or(true)
        }

        async fn extract(
            &self,
            _page_ref: &PageRef,
            _selector: &str,
            _content_mode: ContentMode,
        ) -> Result<ExtractedContent, PageAgentError> {
            self.extract_calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.extract
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PageAgentError::ElementNotFound {
                    selector: "unset".into(),
                }))
        }

        async fn known_pages(&self) -> Vec<KnownPage> {
            self.known_pages.lock().unwrap().clone()
        }
    }
}
