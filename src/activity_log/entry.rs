//! [`LogEntry`] and its enumerated fields (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::TargetId;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Routine, non-notable event.
    Info,
    /// A notable, positive outcome (e.g. a webhook was sent).
    Success,
    /// A recoverable but noteworthy condition.
    Warning,
    /// A failure.
    Error,
}

/// Which subsystem an event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Process lifecycle (startup, shutdown, restore).
    System,
    /// Watch Supervisor events (start/stop/auto-stop/navigation).
    Monitoring,
    /// Page Agent interactions.
    PageAgent,
    /// Extraction attempts and their outcomes.
    Extraction,
    /// Change-detection outcomes.
    Change,
    /// Webhook dispatch outcomes.
    Webhook,
    /// Failure-tracker bookkeeping.
    Failure,
}

/// One row of the activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique within a process run; regeneration across restarts is allowed.
    pub id: u64,
    /// Wall-clock time the event was appended.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub level: Level,
    /// Originating subsystem.
    pub category: Category,
    /// Short human-readable description.
    pub message: String,
    /// The target this event concerns, if any.
    pub target_id: Option<TargetId>,
    /// The page URL this event concerns, if any.
    pub url: Option<String>,
    /// Free-form structured details. Webhook URLs are masked at append time
    /// (see [`super::mask`]).
    pub details: std::collections::BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    /// Starts building an entry carrying only the mandatory fields.
    #[must_use]
    pub fn new(
        id: u64,
        timestamp: DateTime<Utc>,
        level: Level,
        category: Category,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            timestamp,
            level,
            category,
            message: message.into(),
            target_id: None,
            url: None,
            details: std::collections::BTreeMap::new(),
        }
    }

    /// Attaches a target id.
    #[must_use]
    pub fn with_target(mut self, target_id: TargetId) -> Self {
        self.target_id = Some(target_id);
        self
    }

    /// Attaches a page URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attaches a detail field.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}
