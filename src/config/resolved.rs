//! Merges CLI flags, the TOML file, and built-in defaults into one
//! validated [`ResolvedConfig`], following **CLI > TOML > default**
//! precedence throughout (see [`super::cli::Cli`] module docs).

use std::path::PathBuf;
use std::time::Duration;

use super::cli::Cli;
use super::defaults::{min_interval, DEFAULT_FAILURE_THRESHOLD};
use super::error::ConfigError;
use super::toml::TomlConfig;

/// The fully resolved, validated configuration the binary runs with.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Default webhook URL, if any was configured.
    pub webhook_url: Option<String>,
    /// Default polling interval for newly created targets.
    pub default_interval: Duration,
    /// Default change-detection setting for newly created targets.
    pub default_change_detection: bool,
    /// Consecutive-failure threshold before auto-stop.
    pub failure_threshold: u32,
    /// Path to the persisted JSON store.
    pub store_path: PathBuf,
    /// Whether verbose (debug) logging was requested.
    pub verbose: bool,
}

impl std::fmt::Display for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "webhook_url={:?} default_interval={:?} change_detection={} failure_threshold={} store={}",
            self.webhook_url,
            self.default_interval,
            self.default_change_detection,
            self.failure_threshold,
            self.store_path.display(),
        )
    }
}

impl ResolvedConfig {
    /// Loads and validates the configuration for a CLI invocation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML file cannot be read/parsed, or
    /// if the merged configuration fails validation.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = match &cli.config {
            Some(path) => TomlConfig::load(path)?,
            None => TomlConfig::default(),
        };
        Self::from_raw(cli, toml)
    }

    fn from_raw(cli: &Cli, toml: TomlConfig) -> Result<Self, ConfigError> {
        let webhook_url = cli.webhook_url.clone().or(toml.webhook.url);
        if let Some(ref url) = webhook_url {
            if url != super::defaults::SENTINEL_WEBHOOK_URL
                && !crate::webhook::is_well_formed_webhook_url(url)
            {
                return Err(ConfigError::InvalidUrl {
                    url: url.clone(),
                    reason: "must be an absolute http or https URL".into(),
                });
            }
        }

        let interval_secs = cli
            .default_interval_secs
            .or(toml.monitor.interval_secs)
            .unwrap_or(super::defaults::DEFAULT_INTERVAL_SECS);
        let default_interval = Duration::from_secs(interval_secs);
        if default_interval < min_interval() {
            return Err(ConfigError::InvalidInterval {
                reason: format!(
                    "must be at least {}s",
                    super::defaults::MIN_INTERVAL_SECS
                ),
            });
        }

        let default_change_detection = if cli.disable_change_detection {
            false
        } else {
            toml.monitor.change_detection.unwrap_or(true)
        };

        let failure_threshold = cli
            .failure_threshold
            .or(toml.monitor.failure_threshold)
            .unwrap_or(DEFAULT_FAILURE_THRESHOLD);
        if failure_threshold == 0 {
            return Err(ConfigError::InvalidFailureThreshold {
                reason: "must be at least 1".into(),
            });
        }

        let store_path = cli
            .store
            .clone()
            .or(toml.store.path)
            .unwrap_or_else(|| PathBuf::from("page-watch-store.json"));

        Ok(Self {
            webhook_url,
            default_interval,
            default_change_detection,
            failure_threshold,
            store_path,
            verbose: cli.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cli() -> Cli {
        Cli::parse_from_iter(["page-watch"])
    }

    #[test]
    fn cli_overrides_toml_webhook_url() {
        let mut cli = empty_cli();
        cli.webhook_url = Some("https://cli.example/x".into());
        let mut toml = TomlConfig::default();
        toml.webhook.url = Some("https://toml.example/x".into());
        let resolved = ResolvedConfig::from_raw(&cli, toml).unwrap();
        assert_eq!(resolved.webhook_url.as_deref(), Some("https://cli.example/x"));
    }

    #[test]
    fn falls_back_to_toml_when_cli_absent() {
        let cli = empty_cli();
        let mut toml = TomlConfig::default();
        toml.webhook.url = Some("https://toml.example/x".into());
        let resolved = ResolvedConfig::from_raw(&cli, toml).unwrap();
        assert_eq!(resolved.webhook_url.as_deref(), Some("https://toml.example/x"));
    }

    #[test]
    fn rejects_sub_5s_interval() {
        let mut cli = empty_cli();
        cli.default_interval_secs = Some(1);
        assert!(matches!(
            ResolvedConfig::from_raw(&cli, TomlConfig::default()),
            Err(ConfigError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn disable_change_detection_flag_wins_even_if_toml_enables_it() {
        let mut cli = empty_cli();
        cli.disable_change_detection = true;
        let mut toml = TomlConfig::default();
        toml.monitor.change_detection = Some(true);
        let resolved = ResolvedConfig::from_raw(&cli, toml).unwrap();
        assert!(!resolved.default_change_detection);
    }

    #[test]
    fn sentinel_webhook_url_is_accepted_at_config_load_time() {
        let mut cli = empty_cli();
        cli.webhook_url = Some("YOUR_WEBHOOK_URL".into());
        let resolved = ResolvedConfig::from_raw(&cli, TomlConfig::default()).unwrap();
        assert_eq!(resolved.webhook_url.as_deref(), Some("YOUR_WEBHOOK_URL"));
    }

    #[test]
    fn zero_failure_threshold_is_rejected() {
        let mut cli = empty_cli();
        cli.failure_threshold = Some(0);
        assert!(matches!(
            ResolvedConfig::from_raw(&cli, TomlConfig::default()),
            Err(ConfigError::InvalidFailureThreshold { .. })
        ));
    }
}
