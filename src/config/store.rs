//! The Config Store façade (spec §6): persisted global settings, target
//! records, saved profiles, and the activity-log snapshot.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::activity_log::LogEntry;
use crate::model::{GlobalConfig, Target, TargetId};

use super::error::StoreError;

const STORE_FILE_VERSION: u32 = 1;

/// The full persisted document (spec §6 schema).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreDocument {
    /// Default webhook URL and monitoring defaults.
    pub global: GlobalConfig,
    /// Target records, keyed by `TargetId` serialized as a string.
    pub targets: BTreeMap<String, Target>,
    /// Saved configuration presets. Opaque pass-through for the UI.
    pub profiles: BTreeMap<String, serde_json::Value>,
    /// Up to [`crate::config::defaults::LOG_SNAPSHOT_SIZE`] log entries,
    /// oldest first.
    pub activity_log_snapshot: Vec<LogEntry>,
}

impl StoreDocument {
    /// Inserts or overwrites a target record, keyed by its id.
    pub fn put_target(&mut self, target: Target) {
        self.targets.insert(target.id.to_string(), target);
    }

    /// Removes a target record, returning `true` if one was present.
    pub fn remove_target(&mut self, target_id: TargetId) -> bool {
        self.targets.remove(&target_id.to_string()).is_some()
    }

    /// Every target currently persisted with `enabled = true`.
    #[must_use]
    pub fn enabled_targets(&self) -> Vec<&Target> {
        self.targets.values().filter(|t| t.enabled).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OnDiskDocument {
    version: u32,
    #[serde(flatten)]
    document: StoreDocument,
}

/// Outcome of [`ConfigStore::load`].
///
/// Mirrors the tri-state result the teacher's state store uses: loaded,
/// absent (first run), or present-but-unreadable (treated as absent so the
/// engine can continue with a fresh document).
#[derive(Debug, Clone)]
pub enum LoadResult {
    /// Successfully loaded a previously saved document.
    Loaded(StoreDocument),
    /// No store file exists yet.
    NotFound,
    /// The store file exists but could not be parsed.
    Corrupted {
        /// Reason for corruption, for logging.
        reason: String,
    },
}

impl LoadResult {
    /// Returns the loaded document, or an empty one for `NotFound`/`Corrupted`.
    #[must_use]
    pub fn into_document(self) -> StoreDocument {
        match self {
            Self::Loaded(document) => document,
            Self::NotFound | Self::Corrupted { .. } => StoreDocument::default(),
        }
    }
}

/// Abstraction for persisting the engine's settings between runs.
///
/// Implementations should use atomic writes (write-to-temp-then-rename) so
/// readers never observe a partially written document (spec §5).
pub trait ConfigStore: Send + Sync {
    /// Loads the persisted document.
    fn load(&self) -> LoadResult;

    /// Persists the full document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the document cannot be written.
    fn save(
        &self,
        document: &StoreDocument,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// File-based [`ConfigStore`] backed by a single JSON document, written
/// atomically (write to `{path}.tmp`, then rename).
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Creates a store rooted at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path this store reads from and writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_blocking(path: &Path, document: &OnDiskDocument) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(document).map_err(StoreError::Serialize)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }

        let temp_path = PathBuf::from(format!("{}.tmp", path.display()));
        std::fs::write(&temp_path, content).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::rename(&temp_path, path).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> LoadResult {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return LoadResult::NotFound,
            Err(e) => {
                return LoadResult::Corrupted {
                    reason: format!("failed to read file: {e}"),
                };
            }
        };

        match serde_json::from_str::<OnDiskDocument>(&content) {
            Ok(on_disk) if on_disk.version == STORE_FILE_VERSION => {
                LoadResult::Loaded(on_disk.document)
            }
            Ok(on_disk) => LoadResult::Corrupted {
                reason: format!(
                    "incompatible version: expected {STORE_FILE_VERSION}, got {}",
                    on_disk.version
                ),
            },
            Err(e) => LoadResult::Corrupted {
                reason: format!("invalid JSON: {e}"),
            },
        }
    }

    async fn save(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let path = self.path.clone();
        let on_disk = OnDiskDocument {
            version: STORE_FILE_VERSION,
            document: document.clone(),
        };
        tokio::task::spawn_blocking(move || Self::save_blocking(&path, &on_disk))
            .await
            .expect("spawn_blocking task panicked")
    }
}
