//! The fixed outbound JSON payload shape (spec §4.4).

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The body posted to the effective webhook URL on dispatch.
///
/// Field names and casing (`camelCase` for `changeDetected`/`refreshInterval`
/// /`tabId`/`webhookUrl`) are fixed by the wire format and must not change.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp: DateTime<Utc>,
    url: String,
    content: String,
    selector: String,
    #[serde(rename = "changeDetected")]
    change_detected: bool,
    metadata: WebhookMetadata,
}

#[derive(Debug, Clone, Serialize)]
struct WebhookMetadata {
    #[serde(rename = "refreshInterval")]
    refresh_interval: u64,
    #[serde(rename = "tabId", skip_serializing_if = "Option::is_none")]
    tab_id: Option<u64>,
    #[serde(rename = "webhookUrl")]
    webhook_url: String,
}

impl WebhookPayload {
    /// Builds the payload for one dispatch.
    ///
    /// `tab_id` is `Some` only when `page_ref` parses as an integer (spec
    /// §4.4: "rendered as integer if applicable, else omitted").
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: DateTime<Utc>,
        url: impl Into<String>,
        content: impl Into<String>,
        selector: impl Into<String>,
        change_detected: bool,
        refresh_interval: std::time::Duration,
        tab_id: Option<u64>,
        webhook_url: impl Into<String>,
    ) -> Self {
        Self {
            kind: "page_monitor",
            timestamp,
            url: url.into(),
            content: content.into(),
            selector: selector.into(),
            change_detected,
            metadata: WebhookMetadata {
                refresh_interval: u64::try_from(refresh_interval.as_millis()).unwrap_or(u64::MAX),
                tab_id,
                webhook_url: webhook_url.into(),
            },
        }
    }

    /// Serializes the payload to a UTF-8 JSON byte vector.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails, which cannot
    /// happen for this type's fields in practice but is still propagated
    /// rather than unwrapped.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// The content length in bytes, for logging (spec §4.4).
    #[must_use]
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// Whether this dispatch represents a detected change, for logging.
    #[must_use]
    pub const fn change_detected(&self) -> bool {
        self.change_detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_fixed_field_names_and_casing() {
        let payload = WebhookPayload::new(
            Utc::now(),
            "https://a.example/x",
            "hello",
            "#c",
            true,
            std::time::Duration::from_secs(60),
            Some(7),
            "https://hooks.example/y",
        );
        let json: serde_json::Value = serde_json::from_slice(&payload.to_json_bytes().unwrap()).unwrap();
        assert_eq!(json["type"], "page_monitor");
        assert_eq!(json["changeDetected"], true);
        assert_eq!(json["metadata"]["refreshInterval"], 60_000);
        assert_eq!(json["metadata"]["tabId"], 7);
        assert_eq!(json["metadata"]["webhookUrl"], "https://hooks.example/y");
    }

    #[test]
    fn omits_tab_id_when_none() {
        let payload = WebhookPayload::new(
            Utc::now(),
            "https://a.example/x",
            "hello",
            "#c",
            false,
            std::time::Duration::from_secs(5),
            None,
            "https://hooks.example/y",
        );
        let json: serde_json::Value = serde_json::from_slice(&payload.to_json_bytes().unwrap()).unwrap();
        assert!(json["metadata"].get("tabId").is_none());
    }
}
