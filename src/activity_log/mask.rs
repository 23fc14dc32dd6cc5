//! Webhook URL masking applied to log details at append time (spec §4.6).

const PATH_PREFIX_LEN: usize = 20;

/// Field names treated as carrying a webhook URL and therefore masked.
const WEBHOOK_URL_KEYS: &[&str] = &["webhookUrl", "webhook_url"];

/// Masks a single webhook URL to `scheme://host` plus up to a 20-char path
/// prefix; everything after that is replaced with `...`. A malformed URL
/// becomes the literal string `***`.
#[must_use]
pub fn mask_webhook_url(raw: &str) -> String {
    let Ok(parsed) = url::Url::parse(raw) else {
        return "***".to_string();
    };
    let Some(host) = parsed.host_str() else {
        return "***".to_string();
    };

    let path = parsed.path();
    let prefix: String = path.chars().take(PATH_PREFIX_LEN).collect();
    let truncated = path.chars().count() > PATH_PREFIX_LEN;

    let mut masked = format!("{}://{host}{prefix}", parsed.scheme());
    if truncated || parsed.query().is_some() {
        masked.push_str("...");
    }
    masked
}

/// Rewrites any webhook-URL-shaped fields in `details` in place, masking
/// their values per [`mask_webhook_url`].
pub fn mask_details(details: &mut std::collections::BTreeMap<String, serde_json::Value>) {
    for key in WEBHOOK_URL_KEYS {
        if let Some(value) = details.get_mut(*key) {
            if let Some(url_str) = value.as_str() {
                *value = serde_json::Value::String(mask_webhook_url(url_str));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_scheme_host_and_short_path() {
        let masked = mask_webhook_url("https://hooks.example.com/abc");
        assert_eq!(masked, "https://hooks.example.com/abc");
    }

    #[test]
    fn truncates_long_paths_with_ellipsis() {
        let masked = mask_webhook_url("https://hooks.example.com/0123456789/0123456789/secret");
        assert!(masked.starts_with("https://hooks.example.com/0123456789/01234567"));
        assert!(masked.ends_with("..."));
    }

    #[test]
    fn malformed_url_becomes_triple_star() {
        assert_eq!(mask_webhook_url("not a url"), "***");
    }

    #[test]
    fn mask_is_idempotent() {
        let once = mask_webhook_url("https://hooks.example.com/0123456789/0123456789/secret");
        let twice = mask_webhook_url(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn mask_details_rewrites_known_keys_only() {
        let mut details = std::collections::BTreeMap::new();
        details.insert(
            "webhookUrl".to_string(),
            serde_json::Value::String("https://hooks.example.com/secret-token".into()),
        );
        details.insert(
            "other".to_string(),
            serde_json::Value::String("unchanged".into()),
        );
        mask_details(&mut details);
        assert_ne!(
            details["webhookUrl"].as_str().unwrap(),
            "https://hooks.example.com/secret-token"
        );
        assert_eq!(details["other"].as_str().unwrap(), "unchanged");
    }
}
