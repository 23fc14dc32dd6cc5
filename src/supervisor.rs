//! The Watch Supervisor (spec §4.1): owns the live target set, schedules
//! one cycle-task per target, and enforces the at-most-one-concurrent-cycle,
//! navigation-away, and page-gone policies.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::activity_log::{ActivityLog, Category, Level};
use crate::config::{ConfigStore, NewTargetConfig};
use crate::error::EngineError;
use crate::failure::FailureTracker;
use crate::model::{ContentMode, GlobalConfig, PageRef, Target, TargetId};
use crate::page_agent::{normalize_url, PageAgent};
use crate::pipeline::{CycleOutcome, CyclePipeline};
use crate::time::Sleeper;
use crate::webhook::{HttpClient, WebhookDispatcher};

struct TargetHandle {
    cancel: Arc<Notify>,
    task: JoinHandle<()>,
    page_ref: PageRef,
}

/// Parameters accepted by `send_now` (spec §4.7, §6): either a known
/// `target_id` or an ad-hoc `page_ref`, plus the selector/mode to extract
/// with. `selector` and `content_mode` always apply, overriding whatever a
/// known target has stored, so the UI's "Send Now" button can try a
/// one-off selector without mutating the target's configuration.
#[derive(Debug, Clone)]
pub struct SendNowRequest {
    /// A previously started target to reuse `page_ref`/`interval`/webhook
    /// override from.
    pub target_id: Option<TargetId>,
    /// An ad-hoc page reference, used when `target_id` is absent.
    pub page_ref: Option<PageRef>,
    /// Selector to extract with for this call.
    pub selector: String,
    /// Extraction mode for this call.
    pub content_mode: ContentMode,
    /// Overrides both the target's stored override and the global default.
    pub webhook_override: Option<String>,
}

/// A snapshot of one target's run state, returned by `status`/`status_all`.
#[derive(Debug, Clone)]
pub struct TargetStatus {
    /// Whether the supervisor currently has a live scheduling task for it.
    pub is_running: bool,
    /// The target's current persisted configuration.
    pub config: Target,
}

/// Holds the authoritative live set of targets (spec §3 ownership rules)
/// and drives their Cycle Pipelines on independent per-target schedules.
pub struct WatchSupervisor<A, S, W, C> {
    agent: Arc<A>,
    sleeper: Arc<S>,
    webhook: Arc<WebhookDispatcher<W>>,
    log: Arc<ActivityLog>,
    store: Arc<C>,
    failures: Arc<FailureTracker>,
    global: Mutex<GlobalConfig>,
    targets: Mutex<HashMap<TargetId, TargetHandle>>,
}

impl<A, S, W, C> WatchSupervisor<A, S, W, C>
where
    A: PageAgent + 'static,
    S: Sleeper + 'static,
    W: HttpClient + 'static,
    C: ConfigStore + 'static,
{
    /// Builds a supervisor over the given collaborators. `failure_threshold`
    /// and `global` come from the resolved configuration (spec §6).
    #[must_use]
    pub fn new(
        agent: A,
        sleeper: S,
        webhook: WebhookDispatcher<W>,
        log: Arc<ActivityLog>,
        store: C,
        failure_threshold: u32,
        global: GlobalConfig,
    ) -> Self {
        let store = Arc::new(store);

        let hook_store = Arc::clone(&store);
        log.set_persist_hook(move |snapshot| {
            let store = Arc::clone(&hook_store);
            tokio::spawn(async move {
                let mut document = store.load().into_document();
                document.activity_log_snapshot = snapshot;
                if let Err(err) = store.save(&document).await {
                    tracing::warn!("failed to persist activity log snapshot: {err}");
                }
            });
        });

        Self {
            agent: Arc::new(agent),
            sleeper: Arc::new(sleeper),
            webhook: Arc::new(webhook),
            log,
            store,
            failures: Arc::new(FailureTracker::new(failure_threshold)),
            global: Mutex::new(global),
            targets: Mutex::new(HashMap::new()),
        }
    }

    /// Validates `config`, persists it, and starts its scheduling task.
    ///
    /// If a target is already running for the same `page_ref`, it is
    /// stopped first (spec §4.1).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if `config` fails validation.
    pub async fn start_target(
        self: &Arc<Self>,
        config: NewTargetConfig,
    ) -> Result<TargetId, EngineError> {
        if let Some(existing) = self.find_running_by_page_ref(&config.page_ref) {
            self.stop_target(existing).await.ok();
        }

        let target = match crate::config::validate_new_target(config) {
            Ok(target) => target,
            Err(err) => {
                self.log
                    .record(Utc::now(), Level::Error, Category::System, "target/invalid_config")
                    .detail("error", serde_json::Value::String(err.to_string()))
                    .finish();
                return Err(err);
            }
        };

        self.persist_upsert(target.clone()).await;
        self.spawn_target(target.clone());

        self.log
            .record(Utc::now(), Level::Info, Category::Monitoring, "monitoring/started")
            .target(target.id)
            .url(target.initial_url.clone())
            .finish();

        Ok(target.id)
    }

    /// Cancels the target's task, removes it from the live set, and marks
    /// it disabled in persistent config. Idempotent in the sense that a
    /// second call on an already-stopped target returns `TargetNotFound`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TargetNotFound`] if no live target matches.
    pub async fn stop_target(self: &Arc<Self>, target_id: TargetId) -> Result<(), EngineError> {
        let handle = self.targets.lock().unwrap().remove(&target_id);
        let Some(handle) = handle else {
            return Err(EngineError::TargetNotFound);
        };
        handle.cancel.notify_one();
        handle.task.abort();
        self.failures.remove(target_id);
        self.mark_disabled(target_id).await;

        self.log
            .record(Utc::now(), Level::Info, Category::Monitoring, "monitoring/stopped")
            .target(target_id)
            .finish();
        Ok(())
    }

    /// Returns the current status of one target, if known to the store.
    #[must_use]
    pub fn status(&self, target_id: TargetId) -> Option<TargetStatus> {
        let document = self.store.load().into_document();
        let config = document
            .targets
            .values()
            .find(|t| t.id == target_id)?
            .clone();
        let is_running = self.targets.lock().unwrap().contains_key(&target_id);
        Some(TargetStatus { is_running, config })
    }

    /// Returns every currently-running target id.
    #[must_use]
    pub fn status_all(&self) -> Vec<TargetId> {
        self.targets.lock().unwrap().keys().copied().collect()
    }

    /// Rehydrates previously enabled targets from the store, matching each
    /// to a currently resolvable page by normalized-URL equality, and
    /// starts them. Called once at process start (spec §4.1).
    ///
    /// Also restores the persisted activity log snapshot (spec §4.6) before
    /// any target-related entries are appended, so it sorts first.
    pub async fn restore_from_store(self: &Arc<Self>) {
        let document = self.store.load().into_document();
        *self.global.lock().unwrap() = document.global.clone();
        self.log.restore_snapshot(document.activity_log_snapshot.clone());

        let known_pages = self.agent.known_pages().await;

        for target in document.enabled_targets() {
            let mut target = target.clone();
            let original_page_ref = target.page_ref.clone();

            if !known_pages.is_empty() {
                let normalized_initial = normalize_url(&target.initial_url);
                match known_pages
                    .iter()
                    .find(|page| normalize_url(&page.url) == normalized_initial)
                {
                    Some(page) => target.page_ref = page.page_ref.clone(),
                    None => {
                        self.log
                            .record(Utc::now(), Level::Warning, Category::System, "system/restore_deferred")
                            .target(target.id)
                            .finish();
                        continue;
                    }
                }
            }

            match self.agent.ensure_ready(&target.page_ref).await {
                Ok(()) => {
                    if target.page_ref != original_page_ref {
                        self.persist_upsert(target.clone()).await;
                    }
                    self.spawn_target(target.clone());
                    self.log
                        .record(Utc::now(), Level::Info, Category::Monitoring, "monitoring/restored")
                        .target(target.id)
                        .finish();
                }
                Err(_) => {
                    self.log
                        .record(Utc::now(), Level::Warning, Category::System, "system/restore_deferred")
                        .target(target.id)
                        .finish();
                }
            }
        }
    }

    /// Empties the activity log, resets every Failure Tracker counter, and
    /// removes the persisted log snapshot (spec §4.6 Clear).
    pub async fn clear_all(&self) {
        self.log.clear();
        self.failures.clear_all();

        let mut document = self.store.load().into_document();
        document.activity_log_snapshot.clear();
        if let Err(err) = self.store.save(&document).await {
            tracing::warn!("failed to persist activity log clear: {err}");
        }
    }

    /// Executes exactly one ad-hoc cycle's dispatch path, bypassing change
    /// detection and the Failure Tracker entirely (spec §4.7). Does not
    /// mutate any persisted target.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TargetNotFound`] if neither `target_id` nor
    /// `page_ref` resolves to a usable target, or whatever
    /// [`crate::pipeline::CyclePipeline::run_send_now`] surfaces.
    pub async fn send_now(self: &Arc<Self>, request: SendNowRequest) -> Result<(), EngineError> {
        let target = self.resolve_send_now_target(&request)?;
        let global_webhook = self.global.lock().unwrap().webhook_url.clone();
        let pipeline = CyclePipeline::new(self.agent.as_ref(), self.sleeper.as_ref(), self.log.as_ref());
        let result = pipeline
            .run_send_now(
                &target,
                self.webhook.as_ref(),
                request.webhook_override.as_deref(),
                global_webhook.as_deref(),
            )
            .await;

        if let Err(ref err) = result {
            self.log
                .record(Utc::now(), Level::Error, Category::Webhook, "send_now/failed")
                .target(target.id)
                .detail("error", serde_json::Value::String(err.to_string()))
                .finish();
        }
        result
    }

    fn resolve_send_now_target(&self, request: &SendNowRequest) -> Result<Target, EngineError> {
        if let Some(target_id) = request.target_id {
            let mut target = self
                .status(target_id)
                .map(|status| status.config)
                .ok_or(EngineError::TargetNotFound)?;
            target.selector = request.selector.clone();
            target.content_mode = request.content_mode;
            return Ok(target);
        }

        let page_ref = request.page_ref.clone().ok_or(EngineError::TargetNotFound)?;
        let default_interval = self
            .global
            .lock()
            .unwrap()
            .default_interval
            .unwrap_or_else(crate::config::defaults::min_interval);

        Ok(Target {
            id: TargetId::next(),
            initial_url: page_ref.0.clone(),
            page_ref,
            selector: request.selector.clone(),
            content_mode: request.content_mode,
            interval: default_interval,
            change_detection: true,
            webhook_override: None,
            profile_name: None,
            enabled: true,
            last_hash: None,
            last_check_at: None,
        })
    }

    fn find_running_by_page_ref(&self, page_ref: &PageRef) -> Option<TargetId> {
        self.targets
            .lock()
            .unwrap()
            .iter()
            .find(|(_, handle)| &handle.page_ref == page_ref)
            .map(|(id, _)| *id)
    }

    async fn persist_upsert(&self, target: Target) {
        let mut document = self.store.load().into_document();
        document.put_target(target);
        if let Err(err) = self.store.save(&document).await {
            tracing::warn!("failed to persist target: {err}");
        }
    }

    async fn mark_disabled(&self, target_id: TargetId) {
        let mut document = self.store.load().into_document();
        if let Some(target) = document.targets.values_mut().find(|t| t.id == target_id) {
            target.enabled = false;
        }
        if let Err(err) = self.store.save(&document).await {
            tracing::warn!("failed to persist target stop: {err}");
        }
    }

    fn spawn_target(self: &Arc<Self>, target: Target) {
        let cancel = Arc::new(Notify::new());
        let target_id = target.id;
        let page_ref = target.page_ref.clone();
        let supervisor = Arc::clone(self);
        let cancel_for_task = Arc::clone(&cancel);

        let task = tokio::spawn(async move {
            supervisor.run_target_loop(target, cancel_for_task).await;
        });

        self.targets.lock().unwrap().insert(
            target_id,
            TargetHandle {
                cancel,
                task,
                page_ref,
            },
        );
    }

    async fn run_target_loop(self: Arc<Self>, mut target: Target, cancel: Arc<Notify>) {
        let target_id = target.id;
        let mut interval = tokio::time::interval(target.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The immediate first cycle below is not billed against the periodic
        // schedule (spec §4.1); consume the interval's first (instant) tick
        // so the next one fires a full `interval` after this point.
        interval.tick().await;

        // Initial cycle, best-effort: if the page can't be reached the
        // periodic schedule still starts (spec §4.1).
        {
            let global_webhook = self.global.lock().unwrap().webhook_url.clone();
            let pipeline = CyclePipeline::new(self.agent.as_ref(), self.sleeper.as_ref(), self.log.as_ref());
            let (updated, outcome) = pipeline.run(target.clone(), self.webhook.as_ref(), global_webhook.as_deref()).await;
            target = updated;
            if self.handle_outcome(target_id, &outcome).await {
                return;
            }
            self.persist_upsert(target.clone()).await;
        }

        loop {
            // `tokio::select!` only re-enters this arm after the previous
            // cycle's `.await` has resolved, so ticks that fire mid-cycle
            // are simply skipped by `MissedTickBehavior::Skip` above — the
            // at-most-one-concurrent-cycle guarantee falls out of that.
            tokio::select! {
                biased;
                () = cancel.notified() => return,
                _ = interval.tick() => {
                    let global_webhook = self.global.lock().unwrap().webhook_url.clone();
                    let pipeline = CyclePipeline::new(self.agent.as_ref(), self.sleeper.as_ref(), self.log.as_ref());
                    let (updated, outcome) = pipeline.run(target.clone(), self.webhook.as_ref(), global_webhook.as_deref()).await;
                    target = updated;

                    if self.handle_outcome(target_id, &outcome).await {
                        return;
                    }
                    self.persist_upsert(target.clone()).await;
                }
            }
        }
    }

    /// Applies Failure Tracker and auto-stop/navigation/page-gone policy to
    /// one cycle's outcome. Returns `true` if the target's loop should exit
    /// (the supervisor has already removed it from the live set).
    async fn handle_outcome(self: &Arc<Self>, target_id: TargetId, outcome: &CycleOutcome) -> bool {
        match outcome {
            CycleOutcome::NavigatedAway | CycleOutcome::PageGone => {
                self.targets.lock().unwrap().remove(&target_id);
                self.failures.remove(target_id);
                self.mark_disabled(target_id).await;
                true
            }
            CycleOutcome::ExtractionExhausted | CycleOutcome::DispatchFailed => {
                let count = self.failures.record_failure(target_id);
                if self.failures.is_at_threshold(count) {
                    self.targets.lock().unwrap().remove(&target_id);
                    self.mark_disabled(target_id).await;
                    self.log
                        .record(Utc::now(), Level::Warning, Category::Monitoring, "monitoring/auto_stopped")
                        .target(target_id)
                        .detail("count", serde_json::json!(count))
                        .finish();
                    true
                } else {
                    false
                }
            }
            CycleOutcome::BaselineRecorded
            | CycleOutcome::Unchanged
            | CycleOutcome::DispatchedChange => {
                self.failures.record_success(target_id);
                false
            }
            CycleOutcome::Disabled => true,
        }
    }
}
