//! Target-config validation (spec §3 invariants, §7 Configuration errors).

use std::time::Duration;

use crate::error::EngineError;
use crate::model::{ContentMode, PageRef, Target, TargetId};

use super::defaults::min_interval;

/// Parameters accepted by `start_target` (spec §6): every [`Target`] field
/// except the ones the supervisor/pipeline own (`last_hash`,
/// `last_check_at`, `enabled`, and the generated [`TargetId`]).
#[derive(Debug, Clone)]
pub struct NewTargetConfig {
    /// Opaque handle the Page Agent resolves to a live page.
    pub page_ref: PageRef,
    /// URL at start time.
    pub initial_url: String,
    /// CSS selector scoping the extracted fragment.
    pub selector: String,
    /// Which part of the matched element to extract.
    pub content_mode: ContentMode,
    /// Polling cadence.
    pub interval: Duration,
    /// Whether change detection gates dispatch.
    pub change_detection: bool,
    /// Optional per-target webhook override.
    pub webhook_override: Option<String>,
    /// Opaque UI tag naming the saved profile that created this target.
    pub profile_name: Option<String>,
}

/// Validates `config` against spec §3's invariants and, if valid, mints a
/// fresh [`Target`] with `enabled = true` and no baseline.
///
/// # Errors
///
/// Returns [`EngineError::InvalidSelector`], [`EngineError::InvalidInterval`],
/// [`EngineError::InvalidPageUrl`], or [`EngineError::InvalidWebhookUrl`].
pub fn validate_new_target(config: NewTargetConfig) -> Result<Target, EngineError> {
    if config.selector.trim().is_empty() {
        return Err(EngineError::InvalidSelector);
    }
    if config.interval < min_interval() {
        return Err(EngineError::InvalidInterval);
    }
    if !is_http_or_https(&config.initial_url) {
        return Err(EngineError::InvalidPageUrl(config.initial_url));
    }
    if let Some(ref webhook) = config.webhook_override {
        if !crate::webhook::is_well_formed_webhook_url(webhook) {
            return Err(EngineError::InvalidWebhookUrl(webhook.clone()));
        }
    }

    Ok(Target {
        id: TargetId::next(),
        page_ref: config.page_ref,
        initial_url: config.initial_url,
        selector: config.selector,
        content_mode: config.content_mode,
        interval: config.interval,
        change_detection: config.change_detection,
        webhook_override: config.webhook_override,
        profile_name: config.profile_name,
        enabled: true,
        last_hash: None,
        last_check_at: None,
    })
}

fn is_http_or_https(raw: &str) -> bool {
    url::Url::parse(raw).is_ok_and(|parsed| parsed.scheme() == "http" || parsed.scheme() == "https")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> NewTargetConfig {
        NewTargetConfig {
            page_ref: PageRef("https://a.example/x".into()),
            initial_url: "https://a.example/x".into(),
            selector: "#c".into(),
            content_mode: ContentMode::Text,
            interval: Duration::from_secs(5),
            change_detection: true,
            webhook_override: None,
            profile_name: None,
        }
    }

    #[test]
    fn boundary_interval_5s_is_accepted() {
        assert!(validate_new_target(base_config()).is_ok());
    }

    #[test]
    fn boundary_interval_below_5s_is_rejected() {
        let mut config = base_config();
        config.interval = Duration::from_millis(4_999);
        assert_eq!(
            validate_new_target(config).unwrap_err(),
            EngineError::InvalidInterval
        );
    }

    #[test]
    fn empty_selector_is_rejected() {
        let mut config = base_config();
        config.selector = "   ".into();
        assert_eq!(
            validate_new_target(config).unwrap_err(),
            EngineError::InvalidSelector
        );
    }

    #[test]
    fn non_http_initial_url_is_rejected() {
        let mut config = base_config();
        config.initial_url = "ftp://a.example/x".into();
        assert!(matches!(
            validate_new_target(config),
            Err(EngineError::InvalidPageUrl(_))
        ));
    }

    #[test]
    fn malformed_webhook_override_is_rejected() {
        let mut config = base_config();
        config.webhook_override = Some("not-a-url".into());
        assert!(matches!(
            validate_new_target(config),
            Err(EngineError::InvalidWebhookUrl(_))
        ));
    }

    #[test]
    fn valid_target_has_no_baseline_and_is_enabled() {
        let target = validate_new_target(base_config()).unwrap();
        assert!(target.enabled);
        assert!(!target.has_baseline());
    }
}
