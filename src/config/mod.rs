//! Typed, debounced, crash-tolerant settings store.
//!
//! The store keeps an `appSettings` section of string keys and string values
//! in a YAML file under the per-user roaming config directory. Reads coerce
//! the stored text to the type of the caller's default and heal corrupt
//! entries in place. Writes are coalesced: every [`SettingsStore::set_value`]
//! re-arms one debounce deadline and a background thread persists all
//! modified entries once the deadline passes.
//!
//! A companion process may share the file, so every disk access goes through
//! the lock file in [`lock`].

pub mod app_config;
pub mod lock;
pub mod value;

pub use app_config::{AppConfig, DrawingButton};
pub use value::{ConfigValue, ValueParseError};

use crate::metrics::Metrics;
use anyhow::{Context, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, ErrorKind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::broadcast;

/// Directory name used under the per-user data directories.
pub const APP_DIR_NAME: &str = "GestureCore";

/// File name of the settings document.
pub const SETTINGS_FILE_NAME: &str = "settings.yaml";

/// Change notifications fired to every subscriber.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigChange {
    /// A debounced save completed (successfully or via the reload fallback).
    Saved,
    /// The in-memory entries were replaced from disk.
    Reloaded,
}

/// Errors raised by the storage layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Timed out waiting for settings lock on {0}")]
    LockTimeout(Utf8PathBuf),

    #[error("Settings I/O failed for {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Settings file {path} is malformed: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Failed to encode settings: {0}")]
    Encode(#[from] serde_yaml_ng::Error),

    #[error("Failed to start settings saver thread: {0}")]
    Spawn(#[source] io::Error),
}

impl StoreError {
    /// Errors coming from the persisted file itself. A save failing with one
    /// of these falls back to reloading the file.
    pub fn is_storage_error(&self) -> bool {
        matches!(self, StoreError::Io { .. } | StoreError::Parse { .. })
    }

    fn io(path: &Utf8Path, source: io::Error) -> Self {
        if source.kind() == ErrorKind::TimedOut {
            StoreError::LockTimeout(path.to_path_buf())
        } else {
            StoreError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Tuning knobs for the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreOptions {
    /// Delay between the last `set_value` and the physical write.
    pub debounce_ms: u64,
    /// Upper bound on waiting for the cross-process lock file.
    pub lock_timeout_ms: u64,
    /// Poll interval while waiting for the lock file.
    pub lock_poll_ms: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            lock_timeout_ms: 5_000,
            lock_poll_ms: 10,
        }
    }
}

impl StoreOptions {
    /// Defaults overridden by `GESTURE_CORE_DEBOUNCE_MS`,
    /// `GESTURE_CORE_LOCK_TIMEOUT_MS` and `GESTURE_CORE_LOCK_POLL_MS`.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = StoreOptions::default();
        config::Config::builder()
            .set_default("debounce_ms", defaults.debounce_ms as i64)?
            .set_default("lock_timeout_ms", defaults.lock_timeout_ms as i64)?
            .set_default("lock_poll_ms", defaults.lock_poll_ms as i64)?
            .add_source(config::Environment::with_prefix("GESTURE_CORE").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn lock_poll(&self) -> Duration {
        Duration::from_millis(self.lock_poll_ms.max(1))
    }
}

/// Where the settings document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Primary document in the roaming config directory.
    pub config_file: Utf8PathBuf,
    /// Optional mirror in the local data directory, read when the primary is
    /// missing and refreshed after each save.
    pub local_mirror: Option<Utf8PathBuf>,
}

impl ConfigPaths {
    /// Settings file inside `dir`, without a mirror.
    pub fn in_dir<P: AsRef<Utf8Path>>(dir: P) -> Self {
        Self {
            config_file: dir.as_ref().join(SETTINGS_FILE_NAME),
            local_mirror: None,
        }
    }

    /// Mirror the settings file into `dir`.
    pub fn with_mirror_dir<P: AsRef<Utf8Path>>(mut self, dir: P) -> Self {
        self.local_mirror = Some(dir.as_ref().join(SETTINGS_FILE_NAME));
        self
    }

    /// Per-user locations: roaming config dir with a local data dir mirror.
    pub fn user_default() -> anyhow::Result<Self> {
        Ok(Self::in_dir(application_data_dir()?).with_mirror_dir(local_application_data_dir()?))
    }

    /// Directory holding the primary settings file.
    pub fn application_data_dir(&self) -> &Utf8Path {
        self.config_file.parent().unwrap_or(Utf8Path::new("."))
    }
}

/// `<roaming config dir>/GestureCore`.
pub fn application_data_dir() -> anyhow::Result<Utf8PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| anyhow!("No per-user config directory"))?;
    let base = Utf8PathBuf::try_from(base).context("Config directory is not valid UTF-8")?;
    Ok(base.join(APP_DIR_NAME))
}

/// `<local data dir>/GestureCore`.
pub fn local_application_data_dir() -> anyhow::Result<Utf8PathBuf> {
    let base = dirs::data_local_dir().ok_or_else(|| anyhow!("No per-user local data directory"))?;
    let base = Utf8PathBuf::try_from(base).context("Local data directory is not valid UTF-8")?;
    Ok(base.join(APP_DIR_NAME))
}

/// On-disk document. Sections other than `appSettings` belong to other
/// writers and are carried through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(rename = "appSettings", default, deserialize_with = "deserialize_scalars")]
    app_settings: IndexMap<String, String>,

    #[serde(flatten)]
    other: IndexMap<String, serde_yaml_ng::Value>,
}

/// Hand-edited files may carry unquoted numbers or booleans; keep them as
/// their textual form so typed reads decide what they mean.
fn deserialize_scalars<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;
    use serde_yaml_ng::Value;

    let raw: Option<IndexMap<String, Value>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                other => {
                    return Err(D::Error::custom(format!(
                        "setting {key} must be a scalar, found {other:?}"
                    )));
                }
            };
            Ok((key, text))
        })
        .collect()
}

struct StoreState {
    entries: IndexMap<String, String>,
    /// Sections of the last loaded document other than `appSettings`.
    foreign: IndexMap<String, serde_yaml_ng::Value>,
    /// Keys changed in memory and not yet confirmed on disk.
    modified: IndexSet<String>,
    /// When the pending save should run. `None` means nothing scheduled.
    deadline: Option<Instant>,
    shutdown: bool,
}

struct StoreShared {
    paths: ConfigPaths,
    options: StoreOptions,
    state: Mutex<StoreState>,
    wake: Condvar,
    /// Serializes disk work (saves, reloads) within this process.
    io: Mutex<()>,
    changes: broadcast::Sender<ConfigChange>,
    metrics: Arc<Metrics>,
}

/// Stops the saver thread once the last store handle goes away, writing any
/// pending changes first.
struct SaverHandle {
    shared: Arc<StoreShared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for SaverHandle {
    fn drop(&mut self) {
        {
            let mut state = self.shared.lock_state();
            state.shutdown = true;
        }
        self.shared.wake.notify_all();

        let handle = self
            .thread
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("Settings saver thread panicked during shutdown");
            }
        }
    }
}

/// Shared, typed key/value settings store.
///
/// Cloning is cheap and every clone sees the same entries. All access to the
/// entry map, the modified set and the debounce deadline happens under one
/// mutex, so a mutation and the scheduling of its save are a single step.
#[derive(Clone)]
pub struct SettingsStore {
    shared: Arc<StoreShared>,
    _saver: Arc<SaverHandle>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("paths", &self.shared.paths)
            .field("options", &self.shared.options)
            .finish_non_exhaustive()
    }
}

impl SettingsStore {
    /// Open the store at the per-user default locations with options from
    /// the environment.
    pub fn open_default() -> anyhow::Result<Self> {
        let paths = ConfigPaths::user_default()?;
        let options = StoreOptions::from_env().context("Invalid settings store options")?;
        Ok(Self::open(paths, options)?)
    }

    pub fn open(paths: ConfigPaths, options: StoreOptions) -> Result<Self, StoreError> {
        Self::open_with_metrics(paths, options, Arc::new(Metrics::new()))
    }

    /// Open the store, load the current document and start the saver thread.
    pub fn open_with_metrics(
        paths: ConfigPaths,
        options: StoreOptions,
        metrics: Arc<Metrics>,
    ) -> Result<Self, StoreError> {
        let data_dir = paths.application_data_dir().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|e| StoreError::io(&data_dir, e))?;

        let document = load_document(&paths, &options)?;
        tracing::info!(
            "Loaded {} settings from {}",
            document.app_settings.len(),
            paths.config_file
        );

        let (changes, _) = broadcast::channel(64);
        let shared = Arc::new(StoreShared {
            paths,
            options,
            state: Mutex::new(StoreState {
                entries: document.app_settings,
                foreign: document.other,
                modified: IndexSet::new(),
                deadline: None,
                shutdown: false,
            }),
            wake: Condvar::new(),
            io: Mutex::new(()),
            changes,
            metrics,
        });

        let worker = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("settings-saver".to_string())
            .spawn(move || run_saver(worker))
            .map_err(StoreError::Spawn)?;

        let saver = Arc::new(SaverHandle {
            shared: Arc::clone(&shared),
            thread: Mutex::new(Some(handle)),
        });

        Ok(Self {
            shared,
            _saver: saver,
        })
    }

    /// Read `key` as the type of `default`.
    ///
    /// Missing keys yield `default`. A stored value that does not parse is
    /// overwritten with `default` (and a save is scheduled) before `default`
    /// is returned; the caller never sees the corruption.
    pub fn get_value<T: ConfigValue>(&self, key: &str, default: T) -> T {
        let mut state = self.shared.lock_state();
        let parsed = match state.entries.get(key) {
            None => return default,
            Some(raw) => T::from_config_str(raw),
        };

        match parsed {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Resetting corrupt setting {}: {}", key, e);
                self.shared.metrics.record_self_heal();
                self.shared
                    .upsert_locked(&mut state, key, default.to_config_string());
                default
            }
        }
    }

    /// Insert or replace `key` and schedule a debounced save.
    pub fn set_value<T: ConfigValue>(&self, key: &str, value: T) {
        let mut state = self.shared.lock_state();
        self.shared
            .upsert_locked(&mut state, key, value.to_config_string());
    }

    /// Raw stored text for `key`, if any.
    pub fn raw_value(&self, key: &str) -> Option<String> {
        self.shared.lock_state().entries.get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.shared.lock_state().entries.contains_key(key)
    }

    /// Keys in file order.
    pub fn keys(&self) -> Vec<String> {
        self.shared.lock_state().entries.keys().cloned().collect()
    }

    /// Re-read the document from disk and notify subscribers.
    ///
    /// Best effort: on failure the error is logged and the in-memory entries
    /// stay as they were. Changes still waiting for their save are kept on
    /// top of the reloaded entries.
    pub fn reload(&self) {
        let _io = self.shared.lock_io();
        self.shared.reload_locked();
    }

    /// Run any pending save now instead of waiting for the debounce.
    pub fn flush(&self) {
        let pending = {
            let mut state = self.shared.lock_state();
            state.deadline.take().is_some() || !state.modified.is_empty()
        };
        if pending {
            self.shared.save_now();
        }
    }

    /// Whether a debounced save is scheduled.
    pub fn has_pending_save(&self) -> bool {
        self.shared.lock_state().deadline.is_some()
    }

    /// Subscribe to [`ConfigChange`] notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChange> {
        self.shared.changes.subscribe()
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.shared.paths
    }

    pub fn options(&self) -> &StoreOptions {
        &self.shared.options
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.shared.metrics
    }
}

impl StoreShared {
    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_io(&self) -> MutexGuard<'_, ()> {
        self.io.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn upsert_locked(&self, state: &mut StoreState, key: &str, raw: String) {
        // Existing keys keep their position in the file
        state.entries.insert(key.to_string(), raw);
        state.modified.insert(key.to_string());

        let rearmed = state.deadline.is_some();
        state.deadline = Some(Instant::now() + self.options.debounce());
        if rearmed {
            tracing::debug!("Coalescing setting {} into pending save", key);
        }
        self.wake.notify_all();
    }

    fn notify(&self, change: ConfigChange) {
        // No subscribers is fine
        let _ = self.changes.send(change);
    }

    fn reload_locked(&self) -> bool {
        match load_document(&self.paths, &self.options) {
            Ok(document) => {
                {
                    let mut state = self.lock_state();
                    let mut entries = document.app_settings;
                    for key in &state.modified {
                        if let Some(pending) = state.entries.get(key) {
                            entries.insert(key.clone(), pending.clone());
                        }
                    }
                    state.entries = entries;
                    state.foreign = document.other;
                }
                self.metrics.record_reload();
                tracing::info!("Reloaded settings from {}", self.paths.config_file);
                self.notify(ConfigChange::Reloaded);
                true
            }
            Err(e) => {
                self.metrics.record_reload_failure();
                tracing::error!("Failed to reload settings: {}", e);
                false
            }
        }
    }

    /// Persist every modified entry, then normalize from disk.
    fn save_now(&self) {
        let _io = self.lock_io();

        let (snapshot, foreign, keys) = {
            let state = self.lock_state();
            if state.modified.is_empty() {
                return;
            }
            (
                state.entries.clone(),
                state.foreign.clone(),
                state.modified.clone(),
            )
        };

        match self.write_modified(&snapshot, &foreign, &keys) {
            Ok(document) => {
                self.metrics.record_save();
                tracing::info!(
                    "Saved {} modified settings to {}",
                    keys.len(),
                    self.paths.config_file
                );

                let mut state = self.lock_state();
                for key in &keys {
                    // Keys changed again since the snapshot stay pending
                    if state.entries.get(key) == snapshot.get(key) {
                        state.modified.shift_remove(key);
                    }
                }
                for (key, value) in document.app_settings {
                    if !state.modified.contains(&key) {
                        state.entries.insert(key, value);
                    }
                }
                state.foreign = document.other;
            }
            Err(e) if e.is_storage_error() => {
                self.metrics.record_save_failure();
                tracing::error!("Failed to save settings, reloading: {}", e);
                self.reload_locked();
            }
            Err(e) => {
                self.metrics.record_save_failure();
                tracing::error!("Failed to save settings, dropping write: {}", e);
            }
        }

        self.notify(ConfigChange::Saved);
    }

    fn write_modified(
        &self,
        snapshot: &IndexMap<String, String>,
        foreign: &IndexMap<String, serde_yaml_ng::Value>,
        keys: &IndexSet<String>,
    ) -> Result<SettingsDocument, StoreError> {
        let path = &self.paths.config_file;
        let _guard = lock::acquire(path, self.options.lock_timeout(), self.options.lock_poll())
            .map_err(|e| StoreError::io(path, e))?;

        let document = match read_document(path)? {
            Some(mut on_disk) => {
                for key in keys {
                    if let Some(value) = snapshot.get(key) {
                        on_disk.app_settings.insert(key.clone(), value.clone());
                    }
                }
                on_disk
            }
            // Primary missing: rebuild from what was loaded, mirror included
            None => SettingsDocument {
                app_settings: snapshot.clone(),
                other: foreign.clone(),
            },
        };

        let yaml = serde_yaml_ng::to_string(&document)?;
        write_atomically(path, &yaml)?;

        if let Some(mirror) = &self.paths.local_mirror {
            if let Err(e) = write_atomically(mirror, &yaml) {
                tracing::warn!("Failed to mirror settings to {}: {}", mirror, e);
            }
        }

        // Read back what actually landed on disk
        Ok(read_document(path)?.unwrap_or(document))
    }
}

fn run_saver(shared: Arc<StoreShared>) {
    let mut state = shared.lock_state();
    loop {
        match state.deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline || state.shutdown {
                    state.deadline = None;
                    drop(state);
                    shared.save_now();
                    state = shared.lock_state();
                    continue;
                }
                state = shared
                    .wake
                    .wait_timeout(state, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            }
            None if state.shutdown => {
                // Keys left over from a failed save get one last attempt
                if !state.modified.is_empty() {
                    drop(state);
                    shared.save_now();
                }
                break;
            }
            None => {
                state = shared.wake.wait(state).unwrap_or_else(PoisonError::into_inner);
            }
        }
    }
    tracing::debug!("Settings saver thread stopped");
}

fn load_document(paths: &ConfigPaths, options: &StoreOptions) -> Result<SettingsDocument, StoreError> {
    let primary = &paths.config_file;
    let _guard = lock::acquire(primary, options.lock_timeout(), options.lock_poll())
        .map_err(|e| StoreError::io(primary, e))?;

    if let Some(document) = read_document(primary)? {
        return Ok(document);
    }

    if let Some(mirror) = &paths.local_mirror {
        if let Some(document) = read_document(mirror)? {
            tracing::info!("Using local settings mirror: {}", mirror);
            return Ok(document);
        }
    }

    tracing::warn!("Settings file not found at {}, using defaults", primary);
    Ok(SettingsDocument::default())
}

fn read_document(path: &Utf8Path) -> Result<Option<SettingsDocument>, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    if contents.trim().is_empty() {
        return Ok(Some(SettingsDocument::default()));
    }

    serde_yaml_ng::from_str(&contents)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn write_atomically(path: &Utf8Path, contents: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let tmp = path.with_extension("yaml.tmp");
    fs::write(&tmp, contents).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}
