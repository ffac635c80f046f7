//! Command dispatch: one parsed [`Command`] in, one executor call out.
//!
//! The dispatcher owns the three executors behind traits so the listener can
//! be tested without starting programs or injecting keys.  Every failure an
//! executor can produce (an error return or a panic) is turned into an
//! [`ExecutionError`] here, so nothing escapes into the read loop.

use std::collections::BTreeSet;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use hotkey_core::{Command, Modifier, Theme};
use thiserror::Error;
use tracing::debug;

/// Errors produced while carrying out a command.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The program could not be started.
    #[error("failed to launch {target:?}: {source}")]
    Launch {
        target: String,
        #[source]
        source: io::Error,
    },

    /// The key name has no virtual-key code.
    #[error("unknown key name: {0:?}")]
    UnknownKey(String),

    /// The OS refused or only partly accepted the injected input.
    #[error("keystroke injection failed: {0}")]
    Injection(String),

    /// The on-screen icon could not be shown.
    #[error("notification failed: {0}")]
    Notification(String),

    /// The executor panicked.
    #[error("{verb} executor panicked")]
    Panicked { verb: &'static str },
}

// ── Executor traits ───────────────────────────────────────────────────────────

/// Starts programs in the user session.
pub trait AppLauncher: Send + Sync {
    fn launch(&self, target: &str) -> Result<(), ExecutionError>;
}

/// Injects key chords into the focused window.
pub trait KeystrokeInjector: Send + Sync {
    fn send_chord(&self, modifiers: &BTreeSet<Modifier>, key: &str) -> Result<(), ExecutionError>;
}

/// Shows a transient on-screen icon.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn show_icon(&self, icon: &str, theme: Theme) -> Result<(), ExecutionError>;
}

// ── CommandDispatcher ─────────────────────────────────────────────────────────

/// Routes commands to executors.
pub struct CommandDispatcher {
    launcher: Arc<dyn AppLauncher>,
    keys: Arc<dyn KeystrokeInjector>,
    notifier: Arc<dyn Notifier>,
}

impl CommandDispatcher {
    pub fn new(
        launcher: Arc<dyn AppLauncher>,
        keys: Arc<dyn KeystrokeInjector>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            launcher,
            keys,
            notifier,
        }
    }

    /// Executes one command.
    ///
    /// # Errors
    ///
    /// Returns the executor's error, or [`ExecutionError::Panicked`] if the
    /// executor panicked.
    pub fn dispatch(&self, command: &Command) -> Result<(), ExecutionError> {
        let verb = command.verb();
        debug!(verb, "dispatching command");

        let outcome = catch_unwind(AssertUnwindSafe(|| match command {
            Command::Launch { target } => self.launcher.launch(target),
            Command::SendKeys { modifiers, key } => self.keys.send_chord(modifiers, key),
            Command::ShowIcon { icon, theme } => self.notifier.show_icon(icon, *theme),
        }));

        outcome.unwrap_or(Err(ExecutionError::Panicked { verb }))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::executors::mock::MockExecutor;

    fn dispatcher_with(executor: &Arc<MockExecutor>, notifier: Arc<dyn Notifier>) -> CommandDispatcher {
        CommandDispatcher::new(
            Arc::clone(executor) as Arc<dyn AppLauncher>,
            Arc::clone(executor) as Arc<dyn KeystrokeInjector>,
            notifier,
        )
    }

    #[test]
    fn test_dispatch_routes_each_verb_to_its_executor() {
        // Arrange
        let executor = Arc::new(MockExecutor::new());
        let dispatcher = dispatcher_with(&executor, Arc::clone(&executor) as Arc<dyn Notifier>);

        // Act
        dispatcher.dispatch(&Command::launch("notepad")).unwrap();
        dispatcher
            .dispatch(&Command::send_keys([Modifier::Control, Modifier::Shift], "t"))
            .unwrap();
        dispatcher
            .dispatch(&Command::show_icon("gear", Theme::Light))
            .unwrap();

        // Assert
        assert_eq!(
            executor.calls(),
            vec![
                "launch:notepad".to_string(),
                "sendkeys:control,shift+t".to_string(),
                "show_icon:gear:light".to_string(),
            ]
        );
    }

    #[test]
    fn test_dispatch_passes_icon_and_theme_to_notifier() {
        // Arrange
        let executor = Arc::new(MockExecutor::new());
        let mut notifier = MockNotifier::new();
        notifier
            .expect_show_icon()
            .withf(|icon, theme| icon == "microphone_mute" && *theme == Theme::Dark)
            .times(1)
            .returning(|_, _| Ok(()));
        let dispatcher = dispatcher_with(&executor, Arc::new(notifier));

        // Act / Assert
        dispatcher
            .dispatch(&Command::show_icon("microphone_mute", Theme::Dark))
            .unwrap();
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn test_dispatch_returns_executor_error() {
        let executor = Arc::new(MockExecutor::failing());
        let dispatcher = dispatcher_with(&executor, Arc::clone(&executor) as Arc<dyn Notifier>);

        let result = dispatcher.dispatch(&Command::launch("notepad"));

        assert!(matches!(result, Err(ExecutionError::Launch { ref target, .. }) if target == "notepad"));
    }

    #[test]
    fn test_dispatch_contains_executor_panic() {
        // Arrange
        let executor = Arc::new(MockExecutor::panicking());
        let dispatcher = dispatcher_with(&executor, Arc::clone(&executor) as Arc<dyn Notifier>);

        // Act
        let result = dispatcher.dispatch(&Command::send_keys(Vec::<Modifier>::new(), "f5"));

        // Assert
        assert!(matches!(
            result,
            Err(ExecutionError::Panicked { verb: "sendkeys" })
        ));
    }
}
