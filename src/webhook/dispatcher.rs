//! Effective-URL resolution and single-attempt dispatch (spec §4.4).

use chrono::Utc;

use crate::activity_log::{ActivityLog, Category, Level};
use crate::config::defaults::SENTINEL_WEBHOOK_URL;

use super::error::{DispatchError, HttpError};
use super::http::{HttpClient, HttpRequest};
use super::payload::WebhookPayload;

/// Returns `true` iff `raw` is an absolute `http`/`https` URL and is not the
/// sentinel placeholder (spec §4.4).
#[must_use]
pub fn is_well_formed_webhook_url(raw: &str) -> bool {
    if raw == SENTINEL_WEBHOOK_URL {
        return false;
    }
    url::Url::parse(raw).is_ok_and(|parsed| parsed.scheme() == "http" || parsed.scheme() == "https")
}

/// Resolves the effective webhook URL from the three candidate sources, in
/// precedence order: explicit override, target override, global default.
/// The first well-formed candidate wins; `None` if none qualifies.
#[must_use]
pub fn resolve_effective_webhook(
    explicit_override: Option<&str>,
    target_override: Option<&str>,
    global_default: Option<&str>,
) -> Option<String> {
    [explicit_override, target_override, global_default]
        .into_iter()
        .flatten()
        .find(|candidate| is_well_formed_webhook_url(candidate))
        .map(ToString::to_string)
}

/// Dispatches a single webhook POST with no retries at this level, logging
/// success or failure (with a masked URL) to the [`ActivityLog`].
pub struct WebhookDispatcher<C> {
    client: C,
}

impl<C: HttpClient> WebhookDispatcher<C> {
    /// Wraps an [`HttpClient`] implementation.
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// Sends `payload` to `webhook_url` and logs the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the URL cannot be parsed, the request
    /// fails at the transport level, or the response status is not 2xx.
    /// In every case the outcome is also recorded to `log` before the error
    /// is returned.
    pub async fn dispatch(
        &self,
        webhook_url: &str,
        payload: &WebhookPayload,
        log: &ActivityLog,
    ) -> Result<(), DispatchError> {
        let result = self.send(webhook_url, payload).await;
        match &result {
            Ok(()) => {
                log.record(Utc::now(), Level::Success, Category::Webhook, "webhook/sent")
                    .detail("webhookUrl", serde_json::Value::String(webhook_url.to_string()))
                    .detail("contentLength", serde_json::json!(payload.content_len()))
                    .detail("changeDetected", serde_json::json!(payload.change_detected()))
                    .finish();
            }
            Err(err) => {
                log.record(Utc::now(), Level::Error, Category::Webhook, "webhook/failed")
                    .detail("webhookUrl", serde_json::Value::String(webhook_url.to_string()))
                    .detail("error", serde_json::Value::String(err.to_string()))
                    .finish();
            }
        }
        result
    }

    async fn send(&self, webhook_url: &str, payload: &WebhookPayload) -> Result<(), DispatchError> {
        let url = url::Url::parse(webhook_url)
            .map_err(|e| DispatchError::Http(HttpError::InvalidUrl(e.to_string())))?;
        let body = payload
            .to_json_bytes()
            .map_err(|e| DispatchError::Http(HttpError::InvalidUrl(e.to_string())))?;

        let request = HttpRequest::post(url)
            .with_header(http::header::CONTENT_TYPE, http::HeaderValue::from_static("application/json"))
            .with_body(body);

        let response = self.client.request(request).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(DispatchError::NonSuccessStatus {
                status: response.status.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::client::mock::MockHttpClient;
    use super::super::error::HttpError;
    use super::*;

    fn payload() -> WebhookPayload {
        WebhookPayload::new(
            Utc::now(),
            "https://a.example/x",
            "hello",
            "#c",
            true,
            std::time::Duration::from_secs(60),
            None,
            "https://hooks.example/y",
        )
    }

    #[test]
    fn sentinel_is_not_well_formed() {
        assert!(!is_well_formed_webhook_url(SENTINEL_WEBHOOK_URL));
    }

    #[test]
    fn non_http_scheme_is_not_well_formed() {
        assert!(!is_well_formed_webhook_url("ftp://example.com/x"));
    }

    #[test]
    fn effective_url_precedence_override_wins() {
        let resolved = resolve_effective_webhook(
            Some("https://override.example/x"),
            Some("https://target.example/x"),
            Some("https://global.example/x"),
        );
        assert_eq!(resolved.as_deref(), Some("https://override.example/x"));
    }

    #[test]
    fn effective_url_falls_through_to_global_when_others_malformed() {
        let resolved = resolve_effective_webhook(None, Some(SENTINEL_WEBHOOK_URL), Some("https://global.example/x"));
        assert_eq!(resolved.as_deref(), Some("https://global.example/x"));
    }

    #[test]
    fn no_candidate_qualifies() {
        assert!(resolve_effective_webhook(None, None, None).is_none());
    }

    #[tokio::test]
    async fn successful_dispatch_logs_success() {
        let dispatcher = WebhookDispatcher::new(MockHttpClient::ok(http::StatusCode::OK));
        let log = ActivityLog::new();
        dispatcher
            .dispatch("https://hooks.example/y", &payload(), &log)
            .await
            .unwrap();
        let entries = log.get_all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::Success);
    }

    #[tokio::test]
    async fn non_2xx_status_is_a_dispatch_failure() {
        let dispatcher = WebhookDispatcher::new(MockHttpClient::ok(http::StatusCode::INTERNAL_SERVER_ERROR));
        let log = ActivityLog::new();
        let result = dispatcher.dispatch("https://hooks.example/y", &payload(), &log).await;
        assert!(matches!(result, Err(DispatchError::NonSuccessStatus { status: 500 })));
        assert_eq!(log.get_all()[0].level, Level::Error);
    }

    #[tokio::test]
    async fn transport_error_is_logged_and_returned() {
        let dispatcher = WebhookDispatcher::new(MockHttpClient::err(HttpError::Timeout));
        let log = ActivityLog::new();
        let result = dispatcher.dispatch("https://hooks.example/y", &payload(), &log).await;
        assert!(matches!(result, Err(DispatchError::Http(HttpError::Timeout))));
        assert_eq!(log.get_all()[0].level, Level::Error);
    }
}
