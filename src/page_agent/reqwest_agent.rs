//! Reference [`PageAgent`] implementation using `reqwest` and `scraper`.
//!
//! This is not part of the core contract (spec §4.3 treats the Page Agent
//! as an external collaborator) — it exists so the engine is runnable
//! standalone, over plain HTTP, without embedding in a real browser host.
//! `page_ref` is simply the request URL.

use std::sync::Mutex;

use scraper::{Html, Selector};

use super::{ContentMode, ExtractedContent, KnownPage, PageAgent, PageAgentError};
use crate::model::PageRef;

/// Fetches and scrapes pages over plain HTTP.
///
/// Because there is no client-side rendering to wait for, `is_loaded`
/// always reports `true` once a page has been fetched at least once.
pub struct ReqwestPageAgent {
    client: reqwest::Client,
    /// Last URL actually reached for each page_ref, after following
    /// whatever redirects `reqwest` already followed.
    resolved_urls: Mutex<std::collections::HashMap<PageRef, String>>,
}

impl ReqwestPageAgent {
    /// Creates a new agent with a default `reqwest::Client`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            resolved_urls: Mutex::new(std::collections::HashMap::new()),
        }
    }

    fn request_url(page_ref: &PageRef) -> Result<url::Url, PageAgentError> {
        let parsed = url::Url::parse(&page_ref.0).map_err(|_| PageAgentError::UnsupportedPage)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(PageAgentError::UnsupportedPage);
        }
        Ok(parsed)
    }

    async fn fetch(&self, page_ref: &PageRef) -> Result<String, PageAgentError> {
        let url = Self::request_url(page_ref)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|_| PageAgentError::Unreachable)?;

        if response.status().as_u16() == 404 {
            return Err(PageAgentError::PageGone);
        }
        let resolved = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| PageAgentError::PageError(e.to_string()))?;

        self.resolved_urls
            .lock()
            .unwrap()
            .insert(page_ref.clone(), resolved);

        Ok(body)
    }
}

impl Default for ReqwestPageAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl PageAgent for ReqwestPageAgent {
    async fn ensure_ready(&self, page_ref: &PageRef) -> Result<(), PageAgentError> {
        self.fetch(page_ref).await.map(|_| ())
    }

    async fn current_url(&self, page_ref: &PageRef) -> Result<String, PageAgentError> {
        if let Some(resolved) = self.resolved_urls.lock().unwrap().get(page_ref).cloned() {
            return Ok(resolved);
        }
        self.fetch(page_ref).await?;
        self.resolved_urls
            .lock()
            .unwrap()
            .get(page_ref)
            .cloned()
            .ok_or(PageAgentError::PageGone)
    }

    async fn refresh(&self, page_ref: &PageRef) -> Result<(), PageAgentError> {
        self.fetch(page_ref).await.map(|_| ())
    }

    async fn is_loaded(&self, page_ref: &PageRef) -> bool {
        self.resolved_urls.lock().unwrap().contains_key(page_ref)
    }

    async fn extract(
        &self,
        page_ref: &PageRef,
        selector: &str,
        content_mode: ContentMode,
    ) -> Result<ExtractedContent, PageAgentError> {
        let body = self.fetch(page_ref).await?;
        let parsed_selector = Selector::parse(selector).map_err(|_| PageAgentError::ElementNotFound {
            selector: selector.to_string(),
        })?;
        let document = Html::parse_document(&body);
        let element = document
            .select(&parsed_selector)
            .next()
            .ok_or_else(|| PageAgentError::ElementNotFound {
                selector: selector.to_string(),
            })?;

        let content = match content_mode {
            ContentMode::Markup => element.html(),
            ContentMode::Text => element.text().collect::<Vec<_>>().join(""),
        };

        Ok(ExtractedContent { content })
    }

    /// Plain HTTP has no notion of an already-open page distinct from the
    /// URL itself, so this agent cannot enumerate one independently of a
    /// request; restart always falls back to the persisted `page_ref`.
    async fn known_pages(&self) -> Vec<KnownPage> {
        Vec::new()
    }
}
