//! The bounded, queryable Activity Log (spec §4.6).

use std::sync::Mutex;

use circular_buffer::CircularBuffer;

use super::entry::{Category, Level, LogEntry};
use super::mask::mask_details;
use crate::config::defaults::LOG_SNAPSHOT_SIZE;
use crate::model::TargetId;

/// Default ring-buffer capacity.
pub const DEFAULT_CAPACITY: usize = 100;

/// Callback invoked with the most recent [`LOG_SNAPSHOT_SIZE`] entries after
/// every append, so the owner can persist it to its Config Store (spec
/// §4.6). Installed by [`crate::supervisor::WatchSupervisor`], which is the
/// only component holding both the log and the store.
type PersistHook = Box<dyn Fn(Vec<LogEntry>) + Send + Sync>;

/// Filter predicates for [`ActivityLog::query`]. All supplied predicates
/// compose by AND.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    /// Restrict to entries concerning this target.
    pub target_id: Option<TargetId>,
    /// Restrict to entries of this level.
    pub level: Option<Level>,
    /// Restrict to entries of this category.
    pub category: Option<Category>,
    /// Return at most this many entries (most recent first after filtering).
    pub limit: Option<usize>,
}

impl LogFilter {
    fn matches(&self, entry: &LogEntry) -> bool {
        self.target_id.is_none_or(|id| entry.target_id == Some(id))
            && self.level.is_none_or(|level| entry.level == level)
            && self
                .category
                .is_none_or(|category| entry.category == category)
    }
}

/// A process-wide, mutex-protected bounded ring buffer of [`LogEntry`]
/// values. Every component holds only a non-owning `&ActivityLog` handle
/// (spec §3 ownership rules).
pub struct ActivityLog {
    buffer: Mutex<Box<CircularBuffer<DEFAULT_CAPACITY, LogEntry>>>,
    next_id: std::sync::atomic::AtomicU64,
    on_append: Mutex<Option<PersistHook>>,
}

impl ActivityLog {
    /// Creates an empty activity log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(CircularBuffer::boxed()),
            next_id: std::sync::atomic::AtomicU64::new(1),
            on_append: Mutex::new(None),
        }
    }

    /// Installs the hook run after every append with the most recent
    /// [`LOG_SNAPSHOT_SIZE`] entries. Replaces any previously set hook.
    pub fn set_persist_hook<F>(&self, hook: F)
    where
        F: Fn(Vec<LogEntry>) + Send + Sync + 'static,
    {
        *self.on_append.lock().unwrap() = Some(Box::new(hook));
    }

    /// Appends an event, masking any webhook-URL-shaped detail fields.
    ///
    /// Distinct name from the field it backs (see spec §9 design notes:
    /// the original's `log` field/method shadowing bug), and the buffer is
    /// never exposed as a public field.
    pub fn record(
        &self,
        now: chrono::DateTime<chrono::Utc>,
        level: Level,
        category: Category,
        message: impl Into<String>,
    ) -> LogEntryBuilder<'_> {
        LogEntryBuilder {
            log: self,
            entry: LogEntry::new(
                self.next_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed),
                now,
                level,
                category,
                message,
            ),
        }
    }

    fn append(&self, mut entry: LogEntry) {
        mask_details(&mut entry.details);
        {
            self.buffer.lock().unwrap().push_back(entry);
        }
        if let Some(hook) = self.on_append.lock().unwrap().as_ref() {
            hook(self.get_recent(LOG_SNAPSHOT_SIZE));
        }
    }

    /// Returns every entry in chronological order (oldest first).
    #[must_use]
    pub fn get_all(&self) -> Vec<LogEntry> {
        self.buffer.lock().unwrap().iter().cloned().collect()
    }

    /// Returns the last `n` entries in chronological order.
    #[must_use]
    pub fn get_recent(&self, n: usize) -> Vec<LogEntry> {
        let all = self.get_all();
        let skip = all.len().saturating_sub(n);
        all[skip..].to_vec()
    }

    /// Returns entries matching every predicate in `filter`, most recent
    /// first if `limit` is set, otherwise in chronological order.
    #[must_use]
    pub fn query(&self, filter: &LogFilter) -> Vec<LogEntry> {
        let mut matched: Vec<LogEntry> = self
            .get_all()
            .into_iter()
            .filter(|entry| filter.matches(entry))
            .collect();
        if let Some(limit) = filter.limit {
            if matched.len() > limit {
                let start = matched.len() - limit;
                matched = matched.split_off(start);
            }
        }
        matched
    }

    /// The most recent `n` entries, oldest-first — used for the
    /// persistence snapshot (spec §4.6, default `n = 50`).
    #[must_use]
    pub fn snapshot(&self, n: usize) -> Vec<LogEntry> {
        self.get_recent(n)
    }

    /// Re-appends a previously persisted snapshot, in the order stored,
    /// without re-masking already-masked details.
    pub fn restore_snapshot(&self, entries: Vec<LogEntry>) {
        let mut buffer = self.buffer.lock().unwrap();
        for entry in entries {
            buffer.push_back(entry);
        }
    }

    /// Empties the buffer. Failure-counter reset and persisted-snapshot
    /// removal are handled by `WatchSupervisor::clear_all`, which wraps
    /// this call.
    pub fn clear(&self) {
        self.buffer.lock().unwrap().clear();
    }

    /// Current number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }

    /// Returns `true` if the log holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder handed back by [`ActivityLog::record`] for attaching optional
/// fields before the entry is appended.
#[must_use = "call `.finish()` to actually append the entry"]
pub struct LogEntryBuilder<'a> {
    log: &'a ActivityLog,
    entry: LogEntry,
}

impl LogEntryBuilder<'_> {
    /// Attaches a target id.
    pub fn target(mut self, target_id: TargetId) -> Self {
        self.entry.target_id = Some(target_id);
        self
    }

    /// Attaches a page URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.entry.url = Some(url.into());
        self
    }

    /// Attaches a detail field.
    pub fn detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.entry.details.insert(key.into(), value);
        self
    }

    /// Appends the built entry to the log.
    pub fn finish(self) {
        self.log.append(self.entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn now() -> chrono::DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn get_all_returns_chronological_order() {
        let log = ActivityLog::new();
        log.record(now(), Level::Info, Category::System, "first").finish();
        log.record(now(), Level::Info, Category::System, "second").finish();
        let all = log.get_all();
        assert_eq!(all[0].message, "first");
        assert_eq!(all[1].message, "second");
    }

    #[test]
    fn ring_buffer_overwrites_oldest_when_full() {
        let log = ActivityLog::new();
        for i in 0..(DEFAULT_CAPACITY + 1) {
            log.record(now(), Level::Info, Category::System, format!("entry-{i}"))
                .finish();
        }
        let all = log.get_all();
        assert_eq!(all.len(), DEFAULT_CAPACITY);
        assert_eq!(all.first().unwrap().message, "entry-1");
        assert_eq!(all.last().unwrap().message, format!("entry-{DEFAULT_CAPACITY}"));
    }

    #[test]
    fn query_filters_compose_by_and() {
        let log = ActivityLog::new();
        let target = TargetId::next();
        log.record(now(), Level::Error, Category::Webhook, "failed")
            .target(target)
            .finish();
        log.record(now(), Level::Info, Category::Webhook, "sent")
            .target(target)
            .finish();
        let filtered = log.query(&LogFilter {
            target_id: Some(target),
            level: Some(Level::Error),
            category: None,
            limit: None,
        });
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].message, "failed");
    }

    #[test]
    fn clear_empties_the_buffer() {
        let log = ActivityLog::new();
        log.record(now(), Level::Info, Category::System, "x").finish();
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn record_masks_webhook_url_details() {
        let log = ActivityLog::new();
        log.record(now(), Level::Error, Category::Webhook, "failed")
            .detail(
                "webhookUrl",
                serde_json::Value::String("https://hooks.example.com/super-secret-token".into()),
            )
            .finish();
        let entry = &log.get_all()[0];
        assert_ne!(
            entry.details["webhookUrl"].as_str().unwrap(),
            "https://hooks.example.com/super-secret-token"
        );
    }

    #[test]
    fn persist_hook_runs_after_every_append_with_recent_entries() {
        let log = ActivityLog::new();
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let seen_for_hook = std::sync::Arc::clone(&seen);
        log.set_persist_hook(move |snapshot| {
            *seen_for_hook.lock().unwrap() = snapshot;
        });

        log.record(now(), Level::Info, Category::System, "first").finish();
        assert_eq!(seen.lock().unwrap().len(), 1);

        log.record(now(), Level::Info, Category::System, "second").finish();
        let snapshot = seen.lock().unwrap().clone();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1].message, "second");
    }
}
