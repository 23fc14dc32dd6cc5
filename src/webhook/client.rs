//! Production HTTP client implementation using reqwest.

use std::time::Duration;

use super::error::HttpError;
use super::http::{HttpClient, HttpRequest, HttpResponse};

/// Production HTTP client using reqwest.
///
/// A thin wrapper implementing [`HttpClient`]; the 30s webhook timeout
/// (spec §4.4) is applied per-request via `reqwest::RequestBuilder::timeout`
/// rather than baked into the client, so the same client could in
/// principle serve requests with different timeout budgets.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Creates a new HTTP client with the given request timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: reqwest::Client::new(),
            timeout,
        }
    }
}

impl HttpClient for ReqwestClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = self
            .inner
            .request(req.method, req.url.as_str())
            .timeout(self.timeout);

        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else if e.is_builder() {
                HttpError::InvalidUrl(e.to_string())
            } else {
                HttpError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::Connection(e.to_string()))?
            .to_vec();

        Ok(HttpResponse::new(status, headers, body))
    }
}
