//! In-memory snapshot of the hotkey map.
//!
//! The cache always holds exactly one published [`AppConfig`].  Readers take
//! an `Arc` to the current snapshot and use it for as long as they like; a
//! reload builds a complete new value and swaps it in with one atomic store,
//! so a reader sees either the old or the new config in full, never a mix.
//!
//! # Reload semantics
//!
//! | Event                      | Effect                                    |
//! |----------------------------|-------------------------------------------|
//! | file created or changed    | parse; on success publish, on failure keep the previous snapshot |
//! | file deleted               | publish the empty default config          |
//!
//! Reloading the same file twice publishes equal snapshots.
//!
//! # Why `ArcSwap`? (for beginners)
//!
//! The hotkey pipeline reads the config on every key press while the file
//! watcher replaces it in the background.  `arc_swap::ArcSwap` lets readers
//! load the current `Arc` without taking a lock, so a slow reload can never
//! stall a key press.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use hotkey_core::{AppConfig, ConfigError};
use tracing::{info, warn};

/// Something that happened to the cached config, reported to a
/// [`ConfigEventSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    /// A new snapshot was published from `path`.
    Reloaded { path: PathBuf, mappings: usize },
    /// The file could not be loaded; the previous snapshot stays active.
    ReloadFailed { path: PathBuf, reason: String },
    /// The file was removed and the empty default config is active.
    Cleared,
}

/// Receives config lifecycle events.
pub trait ConfigEventSink: Send + Sync {
    fn record(&self, event: &ConfigEvent);
}

/// Default sink: writes each event to the `tracing` log.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ConfigEventSink for TracingSink {
    fn record(&self, event: &ConfigEvent) {
        match event {
            ConfigEvent::Reloaded { path, mappings } => {
                info!(path = %path.display(), mappings, "hotkey config loaded")
            }
            ConfigEvent::ReloadFailed { path, reason } => {
                warn!(path = %path.display(), "hotkey config not loaded, keeping previous: {reason}")
            }
            ConfigEvent::Cleared => info!("hotkey config removed; all keys unassigned"),
        }
    }
}

/// Holds the current config snapshot.
pub struct ConfigCache {
    current: ArcSwap<AppConfig>,
    sink: Arc<dyn ConfigEventSink>,
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigCache {
    /// Creates a cache holding the default (empty) config, reporting to the log.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    /// Creates a cache that reports events to `sink`.
    pub fn with_sink(sink: Arc<dyn ConfigEventSink>) -> Self {
        Self {
            current: ArcSwap::from_pointee(AppConfig::default()),
            sink,
        }
    }

    /// Returns the current snapshot.
    pub fn get(&self) -> Arc<AppConfig> {
        self.current.load_full()
    }

    /// Loads `path` and publishes it.
    ///
    /// # Errors
    ///
    /// Returns the load error; the previously published snapshot is left in
    /// place.  A missing file is [`ConfigError::NotFound`].
    pub fn reload(&self, path: &Path) -> Result<(), ConfigError> {
        match read_config(path) {
            Ok(config) => {
                let mappings = config.mappings.len();
                self.current.store(Arc::new(config));
                self.sink.record(&ConfigEvent::Reloaded {
                    path: path.to_path_buf(),
                    mappings,
                });
                Ok(())
            }
            Err(e) => {
                self.sink.record(&ConfigEvent::ReloadFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Publishes the empty default config.
    pub fn clear(&self) {
        self.current.store(Arc::new(AppConfig::default()));
        self.sink.record(&ConfigEvent::Cleared);
    }

    /// Start-up load.  A missing file is expected on first run and only
    /// logged; the default snapshot stays published until the file appears.
    pub fn load_initial(&self, path: &Path) {
        match read_config(path) {
            Err(ConfigError::NotFound(_)) => {
                info!(path = %path.display(), "hotkey config not found; awaiting creation");
            }
            _ => {
                let _ = self.reload(path);
            }
        }
    }
}

/// Reads and parses the config file at `path`.
///
/// A leading UTF-8 byte-order mark, as written by some Windows editors, is
/// ignored.
///
/// # Errors
///
/// [`ConfigError::NotFound`] if the file does not exist,
/// [`ConfigError::Io`] for other read failures and
/// [`ConfigError::Parse`] for malformed JSON.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => AppConfig::from_json_str(content.trim_start_matches('\u{feff}')),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ConfigError::NotFound(path.to_path_buf()))
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path` unless a file already exists there.
///
/// Creates the parent directory if needed.  Returns `true` if the file was
/// written.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn write_config_if_absent(path: &Path, config: &AppConfig) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = config.to_json_pretty()?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use hotkey_core::{config::defaults::starter_config, MappingAction};
    use std::sync::Mutex;
    use uuid::Uuid;

    const MIC_DOC: &str = r#"{
        "Theme": "Light",
        "Mappings": [
            { "KeyCode": 62, "Description": "Mic", "Action": "special",
              "Payload": "toggle_mic_mute", "ShowPopup": true }
        ]
    }"#;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("hotkey-service-test-{}", Uuid::new_v4()))
            .join("hotkey_map.json")
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ConfigEvent>>,
    }

    impl ConfigEventSink for RecordingSink {
        fn record(&self, event: &ConfigEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_new_cache_holds_empty_default() {
        let cache = ConfigCache::new();
        assert_eq!(*cache.get(), AppConfig::default());
    }

    #[test]
    fn test_reload_publishes_parsed_config() {
        // Arrange
        let path = temp_path();
        write(&path, MIC_DOC);
        let cache = ConfigCache::new();

        // Act
        cache.reload(&path).expect("reload");

        // Assert
        let cfg = cache.get();
        assert_eq!(cfg.mappings.len(), 1);
        assert_eq!(cfg.theme, hotkey_core::Theme::Light);
    }

    #[test]
    fn test_reload_twice_is_idempotent() {
        let path = temp_path();
        write(&path, MIC_DOC);
        let cache = ConfigCache::new();

        cache.reload(&path).expect("first");
        let first = cache.get();
        cache.reload(&path).expect("second");

        assert_eq!(*first, *cache.get());
    }

    #[test]
    fn test_malformed_file_keeps_last_known_good() {
        // Arrange
        let path = temp_path();
        write(&path, MIC_DOC);
        let sink = Arc::new(RecordingSink::default());
        let cache = ConfigCache::with_sink(sink.clone());
        cache.reload(&path).expect("initial");

        // Act: the GUI is halfway through writing the file.
        write(&path, r#"{ "Mappings": [ { "KeyCode": "#);
        let result = cache.reload(&path);

        // Assert
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        assert_eq!(cache.get().mappings.len(), 1);
        let events = sink.events.lock().unwrap();
        assert!(matches!(events.last(), Some(ConfigEvent::ReloadFailed { .. })));
    }

    #[test]
    fn test_missing_file_on_reload_keeps_last_known_good() {
        let path = temp_path();
        write(&path, MIC_DOC);
        let cache = ConfigCache::new();
        cache.reload(&path).expect("initial");
        std::fs::remove_file(&path).unwrap();

        let result = cache.reload(&path);

        assert!(matches!(result, Err(ConfigError::NotFound(_))));
        assert_eq!(cache.get().mappings.len(), 1);
    }

    #[test]
    fn test_clear_publishes_empty_config() {
        let path = temp_path();
        write(&path, MIC_DOC);
        let cache = ConfigCache::new();
        cache.reload(&path).expect("reload");

        cache.clear();

        assert!(cache.get().find_mapping(62).is_none());
    }

    #[test]
    fn test_old_snapshot_survives_reload() {
        let path = temp_path();
        write(&path, MIC_DOC);
        let cache = ConfigCache::new();
        let before = cache.get();

        cache.reload(&path).expect("reload");

        assert!(before.mappings.is_empty());
        assert_eq!(cache.get().mappings.len(), 1);
    }

    #[test]
    fn test_load_initial_missing_file_does_not_report_failure() {
        let sink = Arc::new(RecordingSink::default());
        let cache = ConfigCache::with_sink(sink.clone());

        cache.load_initial(&temp_path());

        assert!(sink.events.lock().unwrap().is_empty());
        assert_eq!(*cache.get(), AppConfig::default());
    }

    #[test]
    fn test_read_config_ignores_byte_order_mark() {
        let path = temp_path();
        write(&path, &format!("\u{feff}{MIC_DOC}"));

        let cfg = read_config(&path).expect("read");

        assert!(matches!(
            cfg.find_mapping(62).map(|m| &m.action),
            Some(MappingAction::Special(_))
        ));
    }

    #[test]
    fn test_write_config_if_absent_writes_once() {
        let path = temp_path();

        let first = write_config_if_absent(&path, &starter_config()).expect("write");
        let second = write_config_if_absent(&path, &AppConfig::default()).expect("skip");

        assert!(first);
        assert!(!second);
        assert_eq!(read_config(&path).expect("read"), starter_config());
    }
}
