//! Hot reload of the hotkey map.
//!
//! Watches the parent directory of the config file rather than the file
//! itself, so that editor-style atomic saves (write a temp file, rename it
//! over the original) and delete-then-recreate sequences are all observed.
//!
//! Save bursts are coalesced: after the first event for the config file the
//! watcher waits [`SETTLE_DELAY`] and then acts on the last change seen.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{EventKind, ModifyKind};
use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::config_cache::ConfigCache;

/// How long to wait for a save burst to finish before reloading.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// A change to the config file, as far as the cache is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    Created,
    Changed,
    Deleted,
}

/// Applies one file change to the cache.
///
/// Created and changed files are reloaded (a failed reload keeps the
/// previous snapshot); a deleted file clears the cache.
pub fn apply_file_change(cache: &ConfigCache, path: &Path, change: FileChange) {
    debug!(?change, path = %path.display(), "config file change");
    match change {
        FileChange::Created | FileChange::Changed => {
            // Failures are already reported through the cache's event sink.
            let _ = cache.reload(path);
        }
        FileChange::Deleted => cache.clear(),
    }
}

/// Maps a raw watcher event to a change of the file at `path`.
///
/// Returns `None` for events about other files and for access-only events.
pub fn classify(event: &notify::Event, path: &Path) -> Option<FileChange> {
    let file_name = path.file_name()?;
    if !event.paths.iter().any(|p| p.file_name() == Some(file_name)) {
        return None;
    }

    match event.kind {
        EventKind::Create(_) => Some(FileChange::Created),
        // A rename touches two names; which side we are on decides the outcome.
        EventKind::Modify(ModifyKind::Name(_)) => Some(if path.exists() {
            FileChange::Changed
        } else {
            FileChange::Deleted
        }),
        EventKind::Modify(_) => Some(FileChange::Changed),
        EventKind::Remove(_) => Some(FileChange::Deleted),
        _ => None,
    }
}

/// Watches `path` and keeps `cache` current until `cancel` fires.
///
/// Watcher set-up failures are logged; the service keeps running on the
/// snapshot it already has.
pub async fn watch_config(path: PathBuf, cache: Arc<ConfigCache>, cancel: CancellationToken) {
    let (watch_tx, mut watch_rx) = mpsc::channel::<notify::Event>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = watch_tx.blocking_send(event);
            }
        },
        NotifyConfig::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("failed to create config file watcher: {e}");
            return;
        }
    };

    let Some(watch_dir) = path.parent().map(Path::to_path_buf) else {
        error!(path = %path.display(), "config path has no parent directory");
        return;
    };

    // The directory must exist to be watched, even before the GUI first saves.
    if let Err(e) = std::fs::create_dir_all(&watch_dir) {
        error!(dir = %watch_dir.display(), "failed to create config directory: {e}");
        return;
    }

    if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
        error!(dir = %watch_dir.display(), "failed to watch config directory: {e}");
        return;
    }
    info!(path = %path.display(), "watching hotkey config");

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            next = watch_rx.recv() => match next {
                Some(event) => event,
                None => break,
            },
        };

        let Some(mut change) = classify(&event, &path) else {
            continue;
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(SETTLE_DELAY) => {}
        }
        while let Ok(next) = watch_rx.try_recv() {
            if let Some(later) = classify(&next, &path) {
                change = later;
            }
        }

        apply_file_change(&cache, &path, change);
    }

    debug!("config watcher stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
