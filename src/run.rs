//! Application execution logic.
//!
//! Builds the engine's standalone collaborators (HTTP-only Page Agent,
//! file-backed Config Store, real tokio sleeper/HTTP client), restores
//! previously enabled targets, and runs until a shutdown signal arrives.

use std::sync::Arc;

use page_watch::activity_log::ActivityLog;
use page_watch::api::Engine;
use page_watch::config::defaults::webhook_timeout;
use page_watch::config::{FileConfigStore, ResolvedConfig};
use page_watch::model::GlobalConfig;
use page_watch::page_agent::ReqwestPageAgent;
use page_watch::supervisor::WatchSupervisor;
use page_watch::time::TokioSleeper;
use page_watch::webhook::{ReqwestClient, WebhookDispatcher};
use tokio::signal;

/// Concrete engine type this binary runs: a real HTTP Page Agent, tokio
/// sleeper/HTTP client, and a JSON file Config Store.
type AppEngine = Engine<ReqwestPageAgent, TokioSleeper, ReqwestClient, FileConfigStore>;

/// Runs the engine until a shutdown signal is received.
///
/// Restores previously enabled targets from the Config Store, waits for
/// `Ctrl+C`/`SIGTERM`, then stops every live target before returning (spec
/// §5: "no global cancellation token; shutdown iterates live targets and
/// calls `stop_target` on each").
///
/// Excluded from coverage: requires a real async runtime and OS signal
/// handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ResolvedConfig) {
    let engine = build_engine(&config);
    engine.restore().await;

    shutdown_signal().await;
    tracing::info!("shutdown signal received, stopping all targets");

    for target_id in engine.status_all().data.unwrap_or_default() {
        engine.stop_target(target_id).await;
    }
}

fn build_engine(config: &ResolvedConfig) -> AppEngine {
    let agent = ReqwestPageAgent::new();
    let sleeper = TokioSleeper;
    let webhook = WebhookDispatcher::new(ReqwestClient::new(webhook_timeout()));
    let log = Arc::new(ActivityLog::new());
    let store = FileConfigStore::new(config.store_path.clone());

    let global = GlobalConfig {
        webhook_url: config.webhook_url.clone(),
        default_interval: Some(config.default_interval),
        default_change_detection: Some(config.default_change_detection),
    };

    let supervisor = Arc::new(WatchSupervisor::new(
        agent,
        sleeper,
        webhook,
        Arc::clone(&log),
        store,
        config.failure_threshold,
        global,
    ));

    Engine::new(supervisor, log)
}

/// Resolves once `Ctrl+C` or, on Unix, `SIGTERM` is received.
///
/// Excluded from coverage: requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
