//! Parsing of the TOML configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub(super) struct TomlConfig {
    #[serde(default)]
    pub(super) webhook: WebhookSection,
    #[serde(default)]
    pub(super) monitor: MonitorSection,
    #[serde(default)]
    pub(super) store: StoreSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub(super) struct WebhookSection {
    pub(super) url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub(super) struct MonitorSection {
    pub(super) interval_secs: Option<u64>,
    pub(super) change_detection: Option<bool>,
    pub(super) failure_threshold: Option<u32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub(super) struct StoreSection {
    pub(super) path: Option<PathBuf>,
}

impl TomlConfig {
    pub(super) fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub(super) fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::TomlParse)
    }
}

/// Renders the commented default configuration template written by `init`.
#[must_use]
pub(super) fn default_config_template() -> String {
    r#"# page-watch configuration.
#
# Precedence for every setting: CLI flag > this file > built-in default.

[webhook]
# Default webhook URL used by targets with no per-target override.
url = "YOUR_WEBHOOK_URL"

[monitor]
# Default polling interval, in seconds, for newly created targets.
interval_secs = 60
# Default change-detection setting for newly created targets.
change_detection = true
# Consecutive-failure threshold before a target is auto-stopped.
failure_threshold = 5

[store]
# Path to the persisted JSON store (targets, global config, log snapshot).
path = "page-watch-store.json"
"#
    .to_string()
}

/// Writes the default configuration template to `path`.
///
/// # Errors
///
/// Returns [`ConfigError::FileWrite`] if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, default_config_template()).map_err(|source| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let toml = r#"
            [webhook]
            url = "https://hooks.example/x"
            [monitor]
            interval_secs = 30
            change_detection = false
            failure_threshold = 3
            [store]
            path = "/tmp/store.json"
        "#;
        let config = TomlConfig::parse(toml).unwrap();
        assert_eq!(config.webhook.url.as_deref(), Some("https://hooks.example/x"));
        assert_eq!(config.monitor.interval_secs, Some(30));
        assert_eq!(config.monitor.change_detection, Some(false));
        assert_eq!(config.monitor.failure_threshold, Some(3));
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let config = TomlConfig::parse("").unwrap();
        assert!(config.webhook.url.is_none());
        assert!(config.monitor.interval_secs.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let toml = "[webhook]\nbogus = 1\n";
        assert!(TomlConfig::parse(toml).is_err());
    }

    #[test]
    fn default_template_parses_back_successfully() {
        let template = default_config_template();
        assert!(TomlConfig::parse(&template).is_ok());
    }
}
