//! The Command/Query API (spec §4.7): a thin message-dispatch facade over
//! [`WatchSupervisor`], returning the `{success, code, message}` shape every
//! direct API call owes its caller (spec §7 propagation policy).

use std::sync::Arc;

use crate::activity_log::{ActivityLog, LogEntry, LogFilter};
use crate::config::{ConfigStore, NewTargetConfig};
use crate::error::EngineError;
use crate::model::TargetId;
use crate::page_agent::PageAgent;
use crate::supervisor::{SendNowRequest, TargetStatus, WatchSupervisor};
use crate::time::Sleeper;
use crate::webhook::{HttpClient, WebhookDispatcher};

/// The uniform response shape for every command (spec §4.7, §7).
///
/// `Ok(data)` maps to `{success: true, data}`; an [`EngineError`] maps to
/// `{success: false, code, message}`. Exists so every transport wrapping
/// this facade (in-process calls, a socket, message passing) only has to
/// serialize one shape.
#[derive(Debug, Clone)]
pub struct CommandOutcome<T> {
    /// Whether the command succeeded.
    pub success: bool,
    /// The stable machine code for a failure; absent on success.
    pub code: Option<&'static str>,
    /// A human-readable message; always present on failure.
    pub message: Option<String>,
    /// The command's return value; present only on success.
    pub data: Option<T>,
}

impl<T> CommandOutcome<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            code: None,
            message: None,
            data: Some(data),
        }
    }

    fn err(error: EngineError) -> Self {
        Self {
            success: false,
            code: Some(error.code()),
            message: Some(error.to_string()),
            data: None,
        }
    }
}

impl<T> From<Result<T, EngineError>> for CommandOutcome<T> {
    fn from(result: Result<T, EngineError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::err(err),
        }
    }
}

/// The engine's public facade: every command named in spec §4.7, wrapped
/// in [`CommandOutcome`]. A thin wrapper over [`WatchSupervisor`] plus the
/// Activity Log it shares with it.
pub struct Engine<A, S, W, C> {
    supervisor: Arc<WatchSupervisor<A, S, W, C>>,
    log: Arc<ActivityLog>,
}

impl<A, S, W, C> Engine<A, S, W, C>
where
    A: PageAgent + 'static,
    S: Sleeper + 'static,
    W: HttpClient + 'static,
    C: ConfigStore + 'static,
{
    /// Wraps an already-built supervisor and the log it was given.
    #[must_use]
    pub fn new(supervisor: Arc<WatchSupervisor<A, S, W, C>>, log: Arc<ActivityLog>) -> Self {
        Self { supervisor, log }
    }

    /// Rehydrates previously enabled targets from the Config Store. Call
    /// once at process start, before serving commands.
    pub async fn restore(&self) {
        self.supervisor.restore_from_store().await;
    }

    /// `start_target(config)` (spec §4.7).
    pub async fn start_target(&self, config: NewTargetConfig) -> CommandOutcome<TargetId> {
        self.supervisor.start_target(config).await.into()
    }

    /// `stop_target(target_id)` (spec §4.7).
    pub async fn stop_target(&self, target_id: TargetId) -> CommandOutcome<()> {
        self.supervisor.stop_target(target_id).await.into()
    }

    /// `status(target_id)` (spec §4.7).
    #[must_use]
    pub fn status(&self, target_id: TargetId) -> CommandOutcome<TargetStatus> {
        self.supervisor
            .status(target_id)
            .ok_or(EngineError::TargetNotFound)
            .into()
    }

    /// `status_all()` (spec §4.7). Always succeeds, even with no live targets.
    #[must_use]
    pub fn status_all(&self) -> CommandOutcome<Vec<TargetId>> {
        CommandOutcome::ok(self.supervisor.status_all())
    }

    /// `send_now(target_id_or_ad_hoc_config, webhook_override?)` (spec §4.7).
    /// Bypasses change detection and the Failure Tracker; does not touch
    /// `last_hash`.
    pub async fn send_now(&self, request: SendNowRequest) -> CommandOutcome<()> {
        self.supervisor.send_now(request).await.into()
    }

    /// `get_activity_log({target_id?, level?, category?, limit?})` (spec §4.7).
    /// Always succeeds, even with an empty result.
    #[must_use]
    pub fn get_activity_log(&self, filter: &LogFilter) -> CommandOutcome<Vec<LogEntry>> {
        CommandOutcome::ok(self.log.query(filter))
    }

    /// `clear_activity_log()` (spec §4.7). Always succeeds. Also resets
    /// every Failure Tracker counter and removes the persisted log snapshot
    /// (spec §4.6).
    pub async fn clear_activity_log(&self) -> CommandOutcome<()> {
        self.supervisor.clear_all().await;
        CommandOutcome::ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::mock::MockConfigStore;
    use crate::model::{ContentMode, GlobalConfig, PageRef};
    use crate::page_agent::mock::MockPageAgent;
    use crate::time::InstantSleeper;
    use crate::webhook::MockHttpClient;

    fn engine() -> Engine<MockPageAgent, InstantSleeper, MockHttpClient, MockConfigStore> {
        let agent = MockPageAgent::new()
            .with_url("https://a.example/x")
            .always_ready()
            .with_extract_ok(&"x".repeat(150));
        let log = Arc::new(ActivityLog::new());
        let supervisor = Arc::new(WatchSupervisor::new(
            agent,
            InstantSleeper,
            WebhookDispatcher::new(MockHttpClient::ok(http::StatusCode::OK)),
            Arc::clone(&log),
            MockConfigStore::not_found(),
            5,
            GlobalConfig::default(),
        ));
        Engine::new(supervisor, log)
    }

    fn good_config() -> NewTargetConfig {
        NewTargetConfig {
            page_ref: PageRef("https://a.example/x".into()),
            initial_url: "https://a.example/x".into(),
            selector: "#c".into(),
            content_mode: ContentMode::Text,
            interval: std::time::Duration::from_secs(5),
            change_detection: true,
            webhook_override: None,
            profile_name: None,
        }
    }

    #[tokio::test]
    async fn start_target_wraps_success_in_command_outcome() {
        let engine = engine();
        let outcome = engine.start_target(good_config()).await;
        assert!(outcome.success);
        assert!(outcome.data.is_some());
        assert!(outcome.code.is_none());
    }

    #[tokio::test]
    async fn invalid_config_surfaces_code_and_message() {
        let engine = engine();
        let mut config = good_config();
        config.selector = String::new();
        let outcome = engine.start_target(config).await;
        assert!(!outcome.success);
        assert_eq!(outcome.code, Some("invalid_selector"));
        assert!(outcome.message.is_some());
    }

    #[tokio::test]
    async fn status_of_unknown_target_is_target_not_found() {
        let engine = engine();
        let outcome = engine.status(TargetId::next());
        assert!(!outcome.success);
        assert_eq!(outcome.code, Some("target_not_found"));
    }

    #[tokio::test]
    async fn status_all_always_succeeds() {
        let engine = engine();
        let outcome = engine.status_all();
        assert!(outcome.success);
        assert_eq!(outcome.data, Some(Vec::new()));
    }

    #[tokio::test]
    async fn activity_log_commands_round_trip() {
        let engine = engine();
        engine.start_target(good_config()).await;
        let filter = LogFilter::default();
        let before = engine.get_activity_log(&filter);
        assert!(before.data.unwrap().len() >= 1);

        let cleared = engine.clear_activity_log().await;
        assert!(cleared.success);
        let after = engine.get_activity_log(&filter);
        assert!(after.data.unwrap().is_empty());
    }
}
