//! Sources of vendor hotkey keycodes.
//!
//! A [`KeyEventSource`] pushes each keycode it observes into an `mpsc`
//! channel consumed by the hotkey pipeline.  Sources run on their own task
//! or thread and stop when the cancellation token fires.
//!
//! - **`windows`** – Firmware events from the vendor WMI class.
//! - **`stdin`** – One decimal or `0x`-prefixed keycode per line; useful for
//!   development on machines without the vendor firmware.
//! - **`mock`** – Injects keycodes from tests.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub mod mock;
pub mod stdin;

#[cfg(target_os = "windows")]
pub mod windows;

pub use mock::MockEventSource;
pub use stdin::StdinEventSource;

#[cfg(target_os = "windows")]
pub use self::windows::WmiEventSource;

/// Error type for event source start-up.
#[derive(Debug, Error)]
pub enum EventSourceError {
    /// The hardware event subscription could not be created.
    #[error("failed to subscribe to hotkey events: {0}")]
    Subscribe(String),

    /// An I/O error occurred while starting the source.
    #[error("event source I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Delivers keycodes to the hotkey pipeline.
pub trait KeyEventSource: Send {
    /// Starts delivering keycodes on `tx` until `cancel` fires or the
    /// receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`EventSourceError`] if the source cannot be started.
    fn start(
        self: Box<Self>,
        tx: mpsc::Sender<u32>,
        cancel: CancellationToken,
    ) -> Result<(), EventSourceError>;
}

/// Parses a keycode typed by hand: decimal, or hexadecimal with `0x`.
pub fn parse_key_code(text: &str) -> Option<u32> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

// ── Wait failure recovery ─────────────────────────────────────────────────────

/// Pause after a failed wait for the next hardware event.
pub const WAIT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Consecutive failed waits after which the subscription is rebuilt.
pub const RESUBSCRIBE_AFTER: u32 = 5;

/// Step used by [`pause_unless_cancelled`] to notice cancellation.
const PAUSE_STEP: Duration = Duration::from_millis(100);

/// What a blocking source does after a failed wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitRecovery {
    /// Pause, then wait on the same subscription.
    Retry(Duration),
    /// Pause, then drop the subscription and subscribe again.
    Resubscribe(Duration),
}

impl WaitRecovery {
    /// How long to pause before acting.
    pub fn delay(self) -> Duration {
        match self {
            Self::Retry(delay) | Self::Resubscribe(delay) => delay,
        }
    }
}

/// Counts consecutive failed waits on a hardware subscription.
#[derive(Debug, Default)]
pub struct WaitFailures {
    consecutive: u32,
}

impl WaitFailures {
    /// Records a failed wait and decides how to recover from it.
    pub fn record(&mut self) -> WaitRecovery {
        self.consecutive = self.consecutive.saturating_add(1);
        if self.consecutive >= RESUBSCRIBE_AFTER {
            self.consecutive = 0;
            WaitRecovery::Resubscribe(WAIT_RETRY_DELAY)
        } else {
            WaitRecovery::Retry(WAIT_RETRY_DELAY)
        }
    }

    /// Clears the count after a wait that did not fail.
    pub fn reset(&mut self) {
        self.consecutive = 0;
    }
}

/// Blocks the current thread for `delay`, waking early if `cancel` fires.
///
/// Returns `false` when cancelled.
pub fn pause_unless_cancelled(delay: Duration, cancel: &CancellationToken) -> bool {
    let mut remaining = delay;
    while !remaining.is_zero() {
        if cancel.is_cancelled() {
            return false;
        }
        let step = remaining.min(PAUSE_STEP);
        std::thread::sleep(step);
        remaining -= step;
    }
    !cancel.is_cancelled()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_repeated_wait_failures_trigger_resubscribe() {
        // Arrange
        let mut failures = WaitFailures::default();

        // Act
        let recoveries: Vec<_> = (0..RESUBSCRIBE_AFTER).map(|_| failures.record()).collect();

        // Assert: every failure pauses; only the last one rebuilds.
        let (last, earlier) = recoveries.split_last().unwrap();
        assert!(earlier.iter().all(|r| *r == WaitRecovery::Retry(WAIT_RETRY_DELAY)));
        assert_eq!(*last, WaitRecovery::Resubscribe(WAIT_RETRY_DELAY));
        assert!(recoveries.iter().all(|r| !r.delay().is_zero()));
        assert_eq!(failures.record(), WaitRecovery::Retry(WAIT_RETRY_DELAY));
    }

    #[test]
    fn test_successful_wait_resets_failure_count() {
        let mut failures = WaitFailures::default();
        for _ in 1..RESUBSCRIBE_AFTER {
            failures.record();
        }

        failures.reset();

        assert_eq!(failures.record(), WaitRecovery::Retry(WAIT_RETRY_DELAY));
    }

    #[test]
    fn test_pause_returns_early_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let started = Instant::now();

        assert!(!pause_unless_cancelled(Duration::from_secs(10), &cancel));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_pause_waits_full_delay_when_not_cancelled() {
        let cancel = CancellationToken::new();
        let started = Instant::now();

        assert!(pause_unless_cancelled(Duration::from_millis(150), &cancel));
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[test]
    fn test_parse_key_code_accepts_decimal_and_hex() {
        assert_eq!(parse_key_code("62"), Some(62));
        assert_eq!(parse_key_code(" 0x3E \n"), Some(62));
    }

    #[test]
    fn test_parse_key_code_rejects_garbage() {
        assert_eq!(parse_key_code("mic"), None);
        assert_eq!(parse_key_code(""), None);
        assert_eq!(parse_key_code("-1"), None);
    }
}
