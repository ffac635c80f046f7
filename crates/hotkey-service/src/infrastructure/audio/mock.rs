//! In-memory audio endpoint.
//!
//! Used by tests, and by the service binary on platforms without a WASAPI
//! implementation so the rest of the pipeline can run end to end.
//!
//! Like the real endpoint, [`MockAudioEndpoint`] notifies every subscriber
//! after the mute state changes, whether the change came from
//! [`AudioEndpoint::set_muted`] or from [`MockAudioEndpoint::simulate_external_change`].
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` to make every call return
//! [`AudioError::Platform`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::application::audio_sync::{AudioEndpoint, AudioError, MuteCallback};

/// An audio endpoint that keeps its mute state in memory.
#[derive(Default)]
pub struct MockAudioEndpoint {
    muted: AtomicBool,
    subscribers: Mutex<Vec<MuteCallback>>,
    set_calls: AtomicUsize,
    /// When `true`, every method returns an `AudioError::Platform`.
    pub should_fail: bool,
}

impl MockAudioEndpoint {
    /// Creates an endpoint with the given initial mute state.
    pub fn new(muted: bool) -> Self {
        Self {
            muted: AtomicBool::new(muted),
            ..Self::default()
        }
    }

    /// Number of `set_muted` calls so far.
    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    /// Changes the state as if another application had muted the device.
    pub fn simulate_external_change(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
        self.notify(muted);
    }

    fn notify(&self, muted: bool) {
        // Callbacks run outside the lock so they may call back into the endpoint.
        let subscribers: Vec<MuteCallback> = self
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for on_change in subscribers {
            on_change(muted);
        }
    }

    fn check(&self) -> Result<(), AudioError> {
        if self.should_fail {
            return Err(AudioError::Platform("mock failure".into()));
        }
        Ok(())
    }
}

impl AudioEndpoint for MockAudioEndpoint {
    fn is_muted(&self) -> Result<bool, AudioError> {
        self.check()?;
        Ok(self.muted.load(Ordering::SeqCst))
    }

    fn set_muted(&self, muted: bool) -> Result<(), AudioError> {
        self.check()?;
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.muted.store(muted, Ordering::SeqCst);
        self.notify(muted);
        Ok(())
    }

    fn subscribe(&self, on_change: MuteCallback) -> Result<(), AudioError> {
        self.check()?;
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(on_change);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
