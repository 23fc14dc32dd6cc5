//! CLI argument parsing for the `page-watch` binary.
//!
//! Precedence for every option below is **CLI > TOML file > built-in
//! default** (see [`super::resolved::ResolvedConfig::from_raw`]). Boolean
//! flags are OR'd with the TOML value: once set, a flag cannot be unset
//! from the command line, only enabled.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// page-watch: a page-watch engine.
///
/// Periodically fetches watched pages, extracts selector-scoped fragments,
/// detects change via hashing, and dispatches a webhook event on change.
#[derive(Debug, Parser)]
#[command(name = "page-watch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Default webhook URL used by targets with no override.
    #[arg(long)]
    pub webhook_url: Option<String>,

    /// Default polling interval in seconds for newly created targets.
    #[arg(long = "interval")]
    pub default_interval_secs: Option<u64>,

    /// Disable change detection by default for newly created targets.
    #[arg(long = "disable-change-detection")]
    pub disable_change_detection: bool,

    /// Consecutive-failure threshold before a target is auto-stopped.
    #[arg(long = "failure-threshold")]
    pub failure_threshold: Option<u32>,

    /// Path to the TOML configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Path to the persisted JSON store (targets, global config, log snapshot).
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for `page-watch`.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file.
    Init {
        /// Output path for the configuration file.
        #[arg(long, short, default_value = "page-watch.toml")]
        output: PathBuf,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns `true` if this is the `init` subcommand.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
