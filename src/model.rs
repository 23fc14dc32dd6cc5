//! Core data model: targets, log entries, and global configuration.
//!
//! These types are pure data — validation lives in [`crate::config`] and
//! mutation is owned exclusively by [`crate::supervisor::WatchSupervisor`]
//! and [`crate::pipeline`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque, process-unique identifier for a [`Target`].
///
/// Minted by the supervisor at `start_target` time. Stable across the
/// target's lifetime; never reused within a process run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(u64);

impl TargetId {
    /// Mints a new, unique `TargetId`.
    ///
    /// Backed by a process-wide counter seeded at 1; `0` is reserved and
    /// never returned by this function.
    #[must_use]
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw integer value, e.g. for serializing as a map key.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TargetId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Which part of the selected element is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// Inner HTML of the matched element.
    Markup,
    /// Visible text content of the matched element.
    Text,
}

/// An opaque reference the Page Agent can resolve to a live page.
///
/// In the original embedding this is a browser tab id; the reference
/// implementation ([`crate::page_agent::ReqwestPageAgent`]) uses the
/// request URL itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRef(pub String);

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A declared watch target.
///
/// See the invariants documented on each field; [`crate::config::validate`]
/// is the only place these are enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Process-unique identity, minted by the supervisor.
    pub id: TargetId,
    /// Opaque handle the Page Agent resolves to a live page.
    pub page_ref: PageRef,
    /// URL at start time; used for restart-matching and navigation checks.
    pub initial_url: String,
    /// CSS selector scoping the extracted fragment. Must be non-empty.
    pub selector: String,
    /// Which part of the matched element to extract.
    pub content_mode: ContentMode,
    /// Polling cadence. Must be `>= 5s`.
    pub interval: std::time::Duration,
    /// When `false`, every successful cycle dispatches unconditionally.
    pub change_detection: bool,
    /// Optional per-target webhook, overriding the global default.
    pub webhook_override: Option<String>,
    /// Opaque UI tag naming the saved profile that created this target.
    pub profile_name: Option<String>,
    /// Whether the supervisor currently considers this target active.
    pub enabled: bool,
    /// Digest of the last accepted fragment; `None` until the first
    /// successful cycle completes.
    pub last_hash: Option<String>,
    /// Timestamp of the most recent cycle completion.
    pub last_check_at: Option<DateTime<Utc>>,
}

impl Target {
    /// Returns `true` if at least one successful cycle has recorded a hash.
    #[must_use]
    pub const fn has_baseline(&self) -> bool {
        self.last_hash.is_some()
    }
}

/// (a) default webhook URL, (b) monitoring defaults — see spec §3.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default webhook URL used when a target has no override.
    pub webhook_url: Option<String>,
    /// Default polling interval for newly created targets.
    pub default_interval: Option<std::time::Duration>,
    /// Default change-detection setting for newly created targets.
    pub default_change_detection: Option<bool>,
}
