//! Centralized constants so the numbers in spec §4 and §8 live in one place
//! instead of scattered as magic numbers.

use std::time::Duration;

/// Minimum accepted `Target::interval` (spec §3 invariant).
pub const MIN_INTERVAL_SECS: u64 = 5;

/// Default polling interval applied when neither CLI nor TOML set one.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Default consecutive-failure threshold before auto-stop (spec §4.5).
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Number of most-recent entries persisted after each log append (spec §4.6).
pub const LOG_SNAPSHOT_SIZE: usize = 50;

/// Wait-for-ready poll interval (spec §4.2 step 4).
pub const WAIT_FOR_READY_POLL_MS: u64 = 500;

/// Wait-for-ready hard ceiling (spec §4.2 step 4 / §5).
pub const WAIT_FOR_READY_CEILING_SECS: u64 = 10;

/// Maximum extraction attempts per cycle (spec §4.2 step 5).
pub const EXTRACT_RETRY_MAX_ATTEMPTS: u32 = 10;

/// Delay between extraction retries (spec §4.2 step 5).
pub const EXTRACT_RETRY_DELAY_SECS: u64 = 3;

/// Deferral before the first extraction attempt (spec §4.2 step 5).
pub const EXTRACT_RETRY_INITIAL_DELAY_SECS: u64 = 5;

/// Minimum trimmed-content length accepted by liveness validation (spec §4.2.1).
pub const LIVENESS_MIN_LENGTH: usize = 100;

/// Minimum non-empty lines required in `text` mode (spec §4.2.1).
pub const LIVENESS_MIN_TEXT_LINES: usize = 3;

/// Webhook POST request timeout (spec §4.4).
pub const WEBHOOK_TIMEOUT_SECS: u64 = 30;

/// Placeholder value treated as "no webhook configured" (spec §4.4).
pub const SENTINEL_WEBHOOK_URL: &str = "YOUR_WEBHOOK_URL";

/// `Target::interval` floor as a [`Duration`].
#[must_use]
pub const fn min_interval() -> Duration {
    Duration::from_secs(MIN_INTERVAL_SECS)
}

/// Wait-for-ready poll interval as a [`Duration`].
#[must_use]
pub const fn wait_for_ready_poll() -> Duration {
    Duration::from_millis(WAIT_FOR_READY_POLL_MS)
}

/// Wait-for-ready hard ceiling as a [`Duration`].
#[must_use]
pub const fn wait_for_ready_ceiling() -> Duration {
    Duration::from_secs(WAIT_FOR_READY_CEILING_SECS)
}

/// Extract-retry delay as a [`Duration`].
#[must_use]
pub const fn extract_retry_delay() -> Duration {
    Duration::from_secs(EXTRACT_RETRY_DELAY_SECS)
}

/// Extract-retry initial deferral as a [`Duration`].
#[must_use]
pub const fn extract_retry_initial_delay() -> Duration {
    Duration::from_secs(EXTRACT_RETRY_INITIAL_DELAY_SECS)
}

/// Webhook POST timeout as a [`Duration`].
#[must_use]
pub const fn webhook_timeout() -> Duration {
    Duration::from_secs(WEBHOOK_TIMEOUT_SECS)
}
