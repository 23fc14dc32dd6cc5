//! Configuration: CLI flags, the TOML file, validated target construction,
//! and the persisted Config Store façade.
//!
//! **Precedence.** Every binary-level setting (webhook URL, default
//! interval, change detection, failure threshold, store path) resolves as
//! **CLI flag > TOML file > built-in default**; see [`resolved::ResolvedConfig`].
//! Boolean CLI flags are OR-semantics: once a flag enables a behavior it
//! cannot be disabled again from a lower-precedence source. This mirrors
//! how target-level fields are validated in [`validate`], independent of
//! where the engine embedding this crate chooses to source them from.
//!
//! Per-target fields (`selector`, `interval`, `webhook_override`, ...) are
//! not sourced from the CLI or TOML file at all — they arrive through
//! [`crate::api::Engine::start_target`] from whatever UI or agent is
//! driving the engine. Only the *defaults* applied when a caller omits a
//! field come from this module's resolved configuration.

pub mod cli;
pub mod defaults;
pub mod error;
pub mod resolved;
pub mod store;
pub mod toml;
pub mod validate;

pub use cli::{Cli, Command};
pub use error::{ConfigError, StoreError};
pub use resolved::ResolvedConfig;
pub use store::{ConfigStore, FileConfigStore, LoadResult, StoreDocument};
pub use toml::write_default_config;
pub use validate::{validate_new_target, NewTargetConfig};
