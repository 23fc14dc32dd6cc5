//! The Cycle Pipeline (spec §4.2): the 10-step sequence a single target's
//! scheduling task runs on every tick.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::Utc;
use regex::Regex;

use crate::activity_log::{ActivityLog, Category, Level};
use crate::config::defaults::{
    extract_retry_delay, extract_retry_initial_delay, wait_for_ready_ceiling,
    wait_for_ready_poll, EXTRACT_RETRY_MAX_ATTEMPTS, LIVENESS_MIN_LENGTH, LIVENESS_MIN_TEXT_LINES,
};
use crate::hash::hash_content;
use crate::model::{ContentMode, Target};
use crate::page_agent::{normalize_url, PageAgent, PageAgentError};
use crate::time::Sleeper;
use crate::webhook::{is_well_formed_webhook_url, resolve_effective_webhook, WebhookDispatcher, WebhookPayload};

static NAN_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bNaN\b").expect("valid regex"));

/// Fixed-delay retry policy for the extraction step (spec §4.2 step 5).
///
/// Distinct in shape from any exponential-backoff policy: the cycle pipeline
/// always waits the same interval between attempts.
#[derive(Debug, Clone, Copy)]
pub struct ExtractRetryPolicy {
    max_attempts: u32,
    delay: Duration,
    initial_delay: Duration,
}

impl ExtractRetryPolicy {
    /// The policy fixed by spec §4.2 step 5: 10 attempts, 3s apart, 5s
    /// deferred before the first attempt.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            max_attempts: EXTRACT_RETRY_MAX_ATTEMPTS,
            delay: extract_retry_delay(),
            initial_delay: extract_retry_initial_delay(),
        }
    }

    /// Overrides the maximum attempt count.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Overrides the delay between attempts.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Overrides the deferral before the first attempt.
    #[must_use]
    pub const fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }
}

/// Reason a cycle did not successfully validate extracted content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LivenessRejection {
    /// Trimmed content was under the minimum length.
    TooShort,
    /// Content matched a loading-marker pattern.
    LoadingMarker,
    /// Text-mode content had too few non-empty lines.
    InsufficientLines,
}

/// Validates trimmed content per spec §4.2.1.
///
/// # Errors
///
/// Returns [`LivenessRejection`] describing why the content was rejected.
pub fn validate_liveness(trimmed: &str, content_mode: ContentMode) -> Result<(), LivenessRejection> {
    if trimmed.chars().count() < LIVENESS_MIN_LENGTH {
        return Err(LivenessRejection::TooShort);
    }
    if contains_loading_marker(trimmed) {
        return Err(LivenessRejection::LoadingMarker);
    }
    if content_mode == ContentMode::Text {
        let non_empty_lines = trimmed.lines().filter(|line| !line.trim().is_empty()).count();
        if non_empty_lines < LIVENESS_MIN_TEXT_LINES {
            return Err(LivenessRejection::InsufficientLines);
        }
    }
    Ok(())
}

fn contains_loading_marker(text: &str) -> bool {
    text.contains("Loading...")
        || text.split_whitespace().any(|word| word == "loading")
        || NAN_WORD.is_match(text)
        || text.contains("undefined items")
        || text.contains("of NaN pages")
}

/// Outcome of one cycle, used by the supervisor to decide follow-up action
/// (auto-stop, navigation-away stop, page-gone stop).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The target was not enabled; the cycle was a no-op.
    Disabled,
    /// The live URL no longer matches `initial_url`.
    NavigatedAway,
    /// The page reference no longer resolves.
    PageGone,
    /// First successful cycle; baseline hash recorded, nothing dispatched.
    BaselineRecorded,
    /// Content unchanged; nothing dispatched.
    Unchanged,
    /// Content changed (or change detection is off) and the webhook was
    /// dispatched successfully.
    DispatchedChange,
    /// Content changed (or change detection is off) but dispatch failed;
    /// this counts as a Failure Tracker failure despite extraction having
    /// succeeded (spec §4.5(b)).
    DispatchFailed,
    /// The extraction retry budget was exhausted.
    ExtractionExhausted,
}

/// Runs one full cycle for `target` against `agent`, logging every
/// significant event and returning the updated target state alongside the
/// outcome the supervisor should act on.
pub struct CyclePipeline<'a, A, S> {
    agent: &'a A,
    sleeper: &'a S,
    log: &'a ActivityLog,
    retry_policy: ExtractRetryPolicy,
}

impl<'a, A: PageAgent, S: Sleeper> CyclePipeline<'a, A, S> {
    /// Builds a pipeline over the given collaborators and the standard
    /// retry policy.
    pub fn new(agent: &'a A, sleeper: &'a S, log: &'a ActivityLog) -> Self {
        Self {
            agent,
            sleeper,
            log,
            retry_policy: ExtractRetryPolicy::standard(),
        }
    }

    /// Overrides the extraction retry policy (used by tests to avoid real
    /// delays).
    #[must_use]
    pub const fn with_retry_policy(mut self, retry_policy: ExtractRetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Executes one cycle. `webhook` dispatches the payload if the content
    /// changed; `webhook_override`/`global_webhook` feed effective-URL
    /// resolution per spec §4.4.
    pub async fn run<W: crate::webhook::HttpClient>(
        &self,
        mut target: Target,
        webhook: &WebhookDispatcher<W>,
        global_webhook: Option<&str>,
    ) -> (Target, CycleOutcome) {
        if !target.enabled {
            return (target, CycleOutcome::Disabled);
        }

        match self.agent.current_url(&target.page_ref).await {
            Ok(live_url) => {
                if normalize_url(&live_url) != normalize_url(&target.initial_url) {
                    self.log
                        .record(Utc::now(), Level::Warning, Category::Monitoring, "monitoring/navigated_away")
                        .target(target.id)
                        .url(live_url)
                        .finish();
                    return (target, CycleOutcome::NavigatedAway);
                }
            }
            Err(PageAgentError::PageGone) => {
                self.log
                    .record(Utc::now(), Level::Warning, Category::Monitoring, "monitoring/page_gone")
                    .target(target.id)
                    .finish();
                return (target, CycleOutcome::PageGone);
            }
            Err(_) => {
                // Non-fatal for navigation purposes; extraction will surface the
                // same unreachability as an extraction failure.
            }
        }

        if let Err(err) = self.agent.refresh(&target.page_ref).await {
            if matches!(err, PageAgentError::PageGone) {
                self.log
                    .record(Utc::now(), Level::Warning, Category::Monitoring, "monitoring/page_gone")
                    .target(target.id)
                    .finish();
                return (target, CycleOutcome::PageGone);
            }
        }

        self.wait_for_ready(&target).await;

        let content = match self.extract_with_retries(&target).await {
            Some(content) => content,
            None => {
                self.log
                    .record(Utc::now(), Level::Error, Category::Extraction, "extraction/exhausted")
                    .target(target.id)
                    .finish();
                return (target, CycleOutcome::ExtractionExhausted);
            }
        };

        let trimmed = content.trim().to_string();
        let hash = hash_content(&trimmed);

        let changed = if !target.change_detection {
            true
        } else if let Some(ref last_hash) = target.last_hash {
            hash != *last_hash
        } else {
            target.last_hash = Some(hash.clone());
            target.last_check_at = Some(Utc::now());
            self.log
                .record(Utc::now(), Level::Info, Category::Change, "change/baseline_recorded")
                .target(target.id)
                .finish();
            return (target, CycleOutcome::BaselineRecorded);
        };

        if !changed {
            target.last_check_at = Some(Utc::now());
            self.log
                .record(Utc::now(), Level::Info, Category::Change, "change/none")
                .target(target.id)
                .finish();
            return (target, CycleOutcome::Unchanged);
        }

        target.last_hash = Some(hash);
        target.last_check_at = Some(Utc::now());

        let dispatched = self
            .dispatch_if_possible(&target, &trimmed, true, webhook, None, global_webhook)
            .await;

        let outcome = if dispatched {
            CycleOutcome::DispatchedChange
        } else {
            CycleOutcome::DispatchFailed
        };
        (target, outcome)
    }

    /// Executes an ad-hoc extraction against `target` and dispatches
    /// unconditionally (`changeDetected: true`), bypassing change detection
    /// and the Failure Tracker entirely (spec §4.7 `send_now`). Does not
    /// read or mutate `target.last_hash`/`last_check_at`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::EngineError::PageGone`],
    /// [`crate::error::EngineError::ElementNotFound`], or
    /// [`crate::error::EngineError::NoWebhookConfigured`] depending on
    /// which stage failed.
    pub async fn run_send_now<W: crate::webhook::HttpClient>(
        &self,
        target: &Target,
        webhook: &WebhookDispatcher<W>,
        explicit_override: Option<&str>,
        global_webhook: Option<&str>,
    ) -> Result<(), crate::error::EngineError> {
        use crate::error::EngineError;

        if let Err(err) = self.agent.refresh(&target.page_ref).await {
            if matches!(err, PageAgentError::PageGone) {
                return Err(EngineError::PageGone);
            }
        }
        self.wait_for_ready(target).await;
        let content = self
            .extract_with_retries(target)
            .await
            .ok_or(EngineError::ElementNotFound)?;

        let dispatched = self
            .dispatch_if_possible(target, &content, true, webhook, explicit_override, global_webhook)
            .await;
        if dispatched {
            Ok(())
        } else {
            Err(EngineError::NoWebhookConfigured)
        }
    }

    async fn dispatch_if_possible<W: crate::webhook::HttpClient>(
        &self,
        target: &Target,
        content: &str,
        change_detected: bool,
        webhook: &WebhookDispatcher<W>,
        explicit_override: Option<&str>,
        global_webhook: Option<&str>,
    ) -> bool {
        let Some(effective_url) = resolve_effective_webhook(
            explicit_override,
            target.webhook_override.as_deref(),
            global_webhook,
        ) else {
            self.log
                .record(Utc::now(), Level::Error, Category::Webhook, "webhook/failed")
                .target(target.id)
                .detail("error", serde_json::Value::String("no_webhook_configured".into()))
                .finish();
            return false;
        };
        debug_assert!(is_well_formed_webhook_url(&effective_url));

        let payload = WebhookPayload::new(
            Utc::now(),
            target.initial_url.clone(),
            content.to_string(),
            target.selector.clone(),
            change_detected,
            target.interval,
            target.page_ref.0.parse::<u64>().ok(),
            effective_url.clone(),
        );

        webhook.dispatch(&effective_url, &payload, self.log).await.is_ok()
    }

    async fn wait_for_ready(&self, target: &Target) {
        let ceiling = wait_for_ready_ceiling();
        let poll = wait_for_ready_poll();
        let mut waited = Duration::ZERO;
        while waited < ceiling {
            if self.agent.is_loaded(&target.page_ref).await {
                return;
            }
            self.sleeper.sleep(poll).await;
            waited += poll;
        }
    }

    async fn extract_with_retries(&self, target: &Target) -> Option<String> {
        self.sleeper.sleep(self.retry_policy.initial_delay).await;

        for attempt in 0..self.retry_policy.max_attempts {
            if attempt > 0 {
                self.sleeper.sleep(self.retry_policy.delay).await;
            }

            match self
                .agent
                .extract(&target.page_ref, &target.selector, target.content_mode)
                .await
            {
                Ok(extracted) => {
                    let trimmed = extracted.content.trim();
                    match validate_liveness(trimmed, target.content_mode) {
                        Ok(()) => return Some(extracted.content),
                        Err(_rejection) => continue,
                    }
                }
                Err(_) => continue,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity_log::ActivityLog;
    use crate::model::{PageRef, TargetId};
    use crate::page_agent::mock::MockPageAgent;
    use crate::time::InstantSleeper;
    use crate::webhook::MockHttpClient;

    fn live_content() -> String {
        "x".repeat(150)
    }

    fn base_target() -> Target {
        Target {
            id: TargetId::next(),
            page_ref: PageRef("https://a.example/x".into()),
            initial_url: "https://a.example/x".into(),
            selector: "#c".into(),
            content_mode: ContentMode::Markup,
            interval: Duration::from_secs(5),
            change_detection: true,
            webhook_override: None,
            profile_name: None,
            enabled: true,
            last_hash: None,
            last_check_at: None,
        }
    }

    fn fast_retry_policy() -> ExtractRetryPolicy {
        ExtractRetryPolicy::standard()
            .with_initial_delay(Duration::ZERO)
            .with_delay(Duration::ZERO)
    }

    #[test]
    fn validate_liveness_rejects_short_content() {
        assert_eq!(
            validate_liveness("short", ContentMode::Markup),
            Err(LivenessRejection::TooShort)
        );
    }

    #[test]
    fn validate_liveness_rejects_loading_ellipsis() {
        let content = format!("Loading...{}", "x".repeat(150));
        assert_eq!(
            validate_liveness(&content, ContentMode::Markup),
            Err(LivenessRejection::LoadingMarker)
        );
    }

    #[test]
    fn validate_liveness_rejects_standalone_nan_word() {
        let content = format!("{} NaN {}", "a".repeat(60), "b".repeat(60));
        assert_eq!(
            validate_liveness(&content, ContentMode::Markup),
            Err(LivenessRejection::LoadingMarker)
        );
    }

    #[test]
    fn validate_liveness_allows_nan_as_substring_of_a_longer_word() {
        let content = format!("{} Banana123 {}", "a".repeat(60), "b".repeat(60));
        assert!(validate_liveness(&content, ContentMode::Markup).is_ok());
    }

    #[test]
    fn validate_liveness_requires_three_lines_in_text_mode() {
        let content = "x".repeat(150);
        assert_eq!(
            validate_liveness(&content, ContentMode::Text),
            Err(LivenessRejection::InsufficientLines)
        );
    }

    #[test]
    fn boundary_100_chars_passes_99_fails() {
        let hundred = "x".repeat(100);
        let ninety_nine = "x".repeat(99);
        assert!(validate_liveness(&hundred, ContentMode::Markup).is_ok());
        assert_eq!(
            validate_liveness(&ninety_nine, ContentMode::Markup),
            Err(LivenessRejection::TooShort)
        );
    }

    #[tokio::test]
    async fn first_cycle_records_baseline_without_dispatch() {
        let agent = MockPageAgent::new()
            .with_url("https://a.example/x")
            .always_ready()
            .with_extract_ok(&live_content());
        let sleeper = InstantSleeper;
        let log = ActivityLog::new();
        let pipeline = CyclePipeline::new(&agent, &sleeper, &log).with_retry_policy(fast_retry_policy());
        let webhook = WebhookDispatcher::new(MockHttpClient::ok(http::StatusCode::OK));

        let (target, outcome) = pipeline.run(base_target(), &webhook, None).await;
        assert_eq!(outcome, CycleOutcome::BaselineRecorded);
        assert!(target.last_hash.is_some());
        assert_eq!(log.get_all().len(), 1);
    }

    #[tokio::test]
    async fn navigated_away_stops_before_refresh() {
        let agent = MockPageAgent::new().with_url("https://b.example/y");
        let sleeper = InstantSleeper;
        let log = ActivityLog::new();
        let pipeline = CyclePipeline::new(&agent, &sleeper, &log).with_retry_policy(fast_retry_policy());
        let webhook = WebhookDispatcher::new(MockHttpClient::ok(http::StatusCode::OK));

        let (_target, outcome) = pipeline.run(base_target(), &webhook, None).await;
        assert_eq!(outcome, CycleOutcome::NavigatedAway);
    }

    #[tokio::test]
    async fn disabled_target_is_a_no_op() {
        let agent = MockPageAgent::new();
        let sleeper = InstantSleeper;
        let log = ActivityLog::new();
        let pipeline = CyclePipeline::new(&agent, &sleeper, &log);
        let webhook = WebhookDispatcher::new(MockHttpClient::ok(http::StatusCode::OK));

        let mut target = base_target();
        target.enabled = false;
        let (_target, outcome) = pipeline.run(target, &webhook, None).await;
        assert_eq!(outcome, CycleOutcome::Disabled);
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn extraction_exhausted_after_budget() {
        // MockPageAgent's extract queue is empty, so every attempt falls
        // back to its default `element_not_found` error.
        let agent = MockPageAgent::new().with_url("https://a.example/x").always_ready();
        let sleeper = InstantSleeper;
        let log = ActivityLog::new();
        let pipeline = CyclePipeline::new(&agent, &sleeper, &log).with_retry_policy(fast_retry_policy());
        let webhook = WebhookDispatcher::new(MockHttpClient::ok(http::StatusCode::OK));

        let (_target, outcome) = pipeline.run(base_target(), &webhook, None).await;
        assert_eq!(outcome, CycleOutcome::ExtractionExhausted);
        assert_eq!(agent.extract_calls.load(std::sync::atomic::Ordering::SeqCst), EXTRACT_RETRY_MAX_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn unconditional_dispatch_when_change_detection_disabled() {
        let agent = MockPageAgent::new()
            .with_url("https://a.example/x")
            .always_ready()
            .with_extract_ok(&live_content());
        let sleeper = InstantSleeper;
        let log = ActivityLog::new();
        let pipeline = CyclePipeline::new(&agent, &sleeper, &log).with_retry_policy(fast_retry_policy());
        let webhook = WebhookDispatcher::new(MockHttpClient::ok(http::StatusCode::OK));

        let mut target = base_target();
        target.change_detection = false;
        let (_target, outcome) = pipeline
            .run(target, &webhook, Some("https://hooks.example/y"))
            .await;
        // change_detection off means every cycle is treated as "changed",
        // skipping the baseline/unchanged paths entirely.
        assert_eq!(outcome, CycleOutcome::DispatchedChange);
    }

    #[tokio::test]
    async fn dispatch_failure_is_reported_as_dispatch_failed() {
        let agent = MockPageAgent::new()
            .with_url("https://a.example/x")
            .always_ready()
            .with_extract_ok(&live_content());
        let sleeper = InstantSleeper;
        let log = ActivityLog::new();
        let pipeline = CyclePipeline::new(&agent, &sleeper, &log).with_retry_policy(fast_retry_policy());
        let webhook = WebhookDispatcher::new(MockHttpClient::ok(http::StatusCode::INTERNAL_SERVER_ERROR));

        let mut target = base_target();
        target.change_detection = false;
        let (_target, outcome) = pipeline
            .run(target, &webhook, Some("https://hooks.example/y"))
            .await;
        // A non-2xx webhook response is a dispatch failure, not a transport
        // error, but it still counts as CycleOutcome::DispatchFailed.
        assert_eq!(outcome, CycleOutcome::DispatchFailed);
    }
}
