//! Recording executor for unit and integration tests.
//!
//! `MockExecutor` implements all three executor traits and records each call
//! as a short string in a `Mutex<Vec<String>>`, in call order:
//!
//! | call                               | recorded as              |
//! |------------------------------------|--------------------------|
//! | `launch("notepad")`                | `launch:notepad`         |
//! | `send_chord({control,shift}, "t")` | `sendkeys:control,shift+t` |
//! | `show_icon("gear", Light)`         | `show_icon:gear:light`   |
//!
//! # Failure modes
//!
//! - `should_fail = true` makes every call record itself and then return an
//!   error.
//! - `should_panic = true` makes every call record itself and then panic,
//!   which is how the dispatcher's panic containment is exercised.

use std::collections::BTreeSet;
use std::io;
use std::sync::Mutex;

use hotkey_core::config::modifiers_csv;
use hotkey_core::{Modifier, Theme};

use crate::application::dispatch::{AppLauncher, ExecutionError, KeystrokeInjector, Notifier};

/// An executor that records calls instead of touching the desktop.
#[derive(Debug, Default)]
pub struct MockExecutor {
    /// Every call, in order.
    pub calls: Mutex<Vec<String>>,
    /// When `true`, every call returns an error after recording.
    pub should_fail: bool,
    /// When `true`, every call panics after recording.
    pub should_panic: bool,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            should_panic: true,
            ..Self::default()
        }
    }

    /// Snapshot of the recorded calls.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: String, error: impl FnOnce() -> ExecutionError) -> Result<(), ExecutionError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call.clone());
        if self.should_panic {
            panic!("mock executor panic on {call}");
        }
        if self.should_fail {
            return Err(error());
        }
        Ok(())
    }
}

impl AppLauncher for MockExecutor {
    fn launch(&self, target: &str) -> Result<(), ExecutionError> {
        self.record(format!("launch:{target}"), || ExecutionError::Launch {
            target: target.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "mock launch failure"),
        })
    }
}

impl KeystrokeInjector for MockExecutor {
    fn send_chord(&self, modifiers: &BTreeSet<Modifier>, key: &str) -> Result<(), ExecutionError> {
        self.record(
            format!("sendkeys:{}+{key}", modifiers_csv(modifiers)),
            || ExecutionError::Injection("mock injection failure".to_string()),
        )
    }
}

impl Notifier for MockExecutor {
    fn show_icon(&self, icon: &str, theme: Theme) -> Result<(), ExecutionError> {
        self.record(format!("show_icon:{icon}:{}", theme.as_str()), || {
            ExecutionError::Notification("mock notification failure".to_string())
        })
    }
}
