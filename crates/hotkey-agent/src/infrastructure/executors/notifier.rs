//! On-screen notification.
//!
//! The agent has no window of its own; the icon request is written to the
//! log where a tray companion or a log viewer can pick it up.

use hotkey_core::Theme;
use tracing::info;

use crate::application::dispatch::{ExecutionError, Notifier};

/// Notifier that records each icon request as a log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_icon(&self, icon: &str, theme: Theme) -> Result<(), ExecutionError> {
        info!(icon, theme = theme.as_str(), "show icon");
        Ok(())
    }
}
