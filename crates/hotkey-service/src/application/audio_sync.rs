//! Audio mute state and mute LED synchronisation.
//!
//! The keyboard has two indicator LEDs, one for microphone mute and one for
//! speaker mute.  They must reflect the OS mute state of the default
//! communications microphone and the default console speaker, no matter what
//! changed it: the hotkey, the taskbar volume flyout, or another application.
//!
//! [`AudioStateSynchronizer`] achieves this by:
//!
//! 1. Reading each endpoint's mute state once at start-up and pushing it to
//!    the LED unconditionally.
//! 2. Subscribing to each endpoint's mute notifications and pushing every
//!    reported state to the LED.
//!
//! Toggling mute from a hotkey goes through the same notification path: the
//! toggle only flips the OS state, and the resulting notification updates
//! the LED.  The LED is therefore written exactly once per change.
//!
//! OS access sits behind the [`AudioEndpoint`] and [`LedController`] traits;
//! the WASAPI and WMI implementations live in `infrastructure`.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::resolve_action::MuteToggle;

/// Callback invoked with the new mute state whenever an endpoint reports a
/// change.  May be called from an OS-owned thread.
pub type MuteCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Error type for audio endpoint access.
#[derive(Debug, Error)]
pub enum AudioError {
    /// There is no default device for this role (e.g. no microphone attached).
    #[error("audio endpoint unavailable: {0}")]
    Unavailable(String),

    /// The platform audio API returned an error.
    #[error("audio platform error: {0}")]
    Platform(String),
}

/// Error type for mute LED control.
#[derive(Debug, Error)]
pub enum LedError {
    /// The vendor LED interface is not present on this machine.
    #[error("mute LED control unavailable: {0}")]
    Unavailable(String),

    /// The vendor LED call failed.
    #[error("mute LED call failed: {0}")]
    Platform(String),
}

/// A default audio device with a mute control.
pub trait AudioEndpoint: Send + Sync {
    /// Returns the current OS mute state.
    fn is_muted(&self) -> Result<bool, AudioError>;

    /// Sets the OS mute state.  Implementations report the change to
    /// subscribers through their normal notification path.
    fn set_muted(&self, muted: bool) -> Result<(), AudioError>;

    /// Registers `on_change` for mute state notifications.  The subscription
    /// lives as long as the endpoint.
    fn subscribe(&self, on_change: MuteCallback) -> Result<(), AudioError>;
}

/// The keyboard's mute indicator LEDs.
#[cfg_attr(test, mockall::automock)]
pub trait LedController: Send + Sync {
    fn set_mic_led(&self, muted: bool) -> Result<(), LedError>;
    fn set_speaker_led(&self, muted: bool) -> Result<(), LedError>;
}

/// Which LED an endpoint drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AudioChannel {
    Microphone,
    Speaker,
}

impl AudioChannel {
    fn label(self) -> &'static str {
        match self {
            AudioChannel::Microphone => "microphone",
            AudioChannel::Speaker => "speaker",
        }
    }
}

/// Keeps the mute LEDs in step with the OS mute state and performs mute
/// toggles on behalf of the action resolver.
pub struct AudioStateSynchronizer {
    microphone: Option<Arc<dyn AudioEndpoint>>,
    speaker: Option<Arc<dyn AudioEndpoint>>,
    led: Arc<dyn LedController>,
}

impl AudioStateSynchronizer {
    /// Creates a synchronizer.  `None` for an endpoint means the machine has
    /// no such default device; toggles for it fail with
    /// [`AudioError::Unavailable`].
    pub fn new(
        microphone: Option<Arc<dyn AudioEndpoint>>,
        speaker: Option<Arc<dyn AudioEndpoint>>,
        led: Arc<dyn LedController>,
    ) -> Self {
        Self {
            microphone,
            speaker,
            led,
        }
    }

    /// Performs the initial LED sync and subscribes to mute notifications.
    ///
    /// Failures are logged and never fatal; a missing device simply leaves
    /// its LED untouched.
    pub fn start(&self) {
        self.attach(AudioChannel::Microphone, self.microphone.as_ref());
        self.attach(AudioChannel::Speaker, self.speaker.as_ref());
    }

    fn attach(&self, channel: AudioChannel, endpoint: Option<&Arc<dyn AudioEndpoint>>) {
        let Some(endpoint) = endpoint else {
            info!(device = channel.label(), "no default device; LED sync disabled");
            return;
        };

        match endpoint.is_muted() {
            Ok(muted) => push_led(self.led.as_ref(), channel, muted),
            Err(e) => warn!(device = channel.label(), "initial mute state unavailable: {e}"),
        }

        let led = Arc::clone(&self.led);
        let on_change: MuteCallback = Arc::new(move |muted| push_led(led.as_ref(), channel, muted));
        if let Err(e) = endpoint.subscribe(on_change) {
            warn!(device = channel.label(), "could not subscribe to mute notifications: {e}");
        }
    }

    /// Flips the microphone mute state and returns the new state.
    pub fn toggle_mic(&self) -> Result<bool, AudioError> {
        toggle(AudioChannel::Microphone, self.microphone.as_ref())
    }

    /// Flips the speaker mute state and returns the new state.
    pub fn toggle_speaker(&self) -> Result<bool, AudioError> {
        toggle(AudioChannel::Speaker, self.speaker.as_ref())
    }
}

impl MuteToggle for AudioStateSynchronizer {
    fn toggle_mic(&self) -> Result<bool, AudioError> {
        AudioStateSynchronizer::toggle_mic(self)
    }

    fn toggle_speaker(&self) -> Result<bool, AudioError> {
        AudioStateSynchronizer::toggle_speaker(self)
    }
}

fn toggle(
    channel: AudioChannel,
    endpoint: Option<&Arc<dyn AudioEndpoint>>,
) -> Result<bool, AudioError> {
    let endpoint = endpoint
        .ok_or_else(|| AudioError::Unavailable(format!("no default {}", channel.label())))?;
    let muted = !endpoint.is_muted()?;
    endpoint.set_muted(muted)?;
    debug!(device = channel.label(), muted, "mute toggled");
    Ok(muted)
}

fn push_led(led: &dyn LedController, channel: AudioChannel, muted: bool) {
    let result = match channel {
        AudioChannel::Microphone => led.set_mic_led(muted),
        AudioChannel::Speaker => led.set_speaker_led(muted),
    };
    match result {
        Ok(()) => debug!(device = channel.label(), muted, "mute LED updated"),
        Err(e) => debug!(device = channel.label(), "mute LED update skipped: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::audio::mock::MockAudioEndpoint;
    use mockall::predicate::eq;

    fn endpoint(muted: bool) -> Arc<MockAudioEndpoint> {
        Arc::new(MockAudioEndpoint::new(muted))
    }

    #[test]
    fn test_start_pushes_current_state_to_both_leds() {
        // Arrange
        let mut led = MockLedController::new();
        led.expect_set_mic_led().with(eq(true)).times(1).returning(|_| Ok(()));
        led.expect_set_speaker_led().with(eq(false)).times(1).returning(|_| Ok(()));
        let sync = AudioStateSynchronizer::new(
            Some(endpoint(true)),
            Some(endpoint(false)),
            Arc::new(led),
        );

        // Act
        sync.start();

        // Assert: mock expectations are verified on drop.
    }

    #[test]
    fn test_toggle_mic_updates_led_once_through_notification() {
        // Arrange: mic starts unmuted.
        let mut led = MockLedController::new();
        led.expect_set_mic_led().with(eq(false)).times(1).returning(|_| Ok(()));
        led.expect_set_mic_led().with(eq(true)).times(1).returning(|_| Ok(()));
        let mic = endpoint(false);
        let sync = AudioStateSynchronizer::new(Some(mic.clone()), None, Arc::new(led));
        sync.start();

        // Act
        let muted = sync.toggle_mic().expect("toggle");

        // Assert
        assert!(muted);
        assert!(mic.is_muted().expect("state"));
        assert_eq!(mic.set_calls(), 1);
    }

    #[test]
    fn test_external_mute_change_reaches_speaker_led() {
        // Arrange
        let mut led = MockLedController::new();
        led.expect_set_speaker_led().with(eq(false)).times(1).returning(|_| Ok(()));
        led.expect_set_speaker_led().with(eq(true)).times(1).returning(|_| Ok(()));
        let speaker = endpoint(false);
        let sync = AudioStateSynchronizer::new(None, Some(speaker.clone()), Arc::new(led));
        sync.start();

        // Act: the user mutes from the taskbar, not via the hotkey.
        speaker.simulate_external_change(true);
    }

    #[test]
    fn test_toggle_without_device_reports_unavailable() {
        let led = MockLedController::new();
        let sync = AudioStateSynchronizer::new(None, None, Arc::new(led));

        let result = sync.toggle_speaker();

        assert!(matches!(result, Err(AudioError::Unavailable(_))));
    }

    #[test]
    fn test_led_failure_does_not_fail_toggle() {
        let mut led = MockLedController::new();
        led.expect_set_mic_led()
            .returning(|_| Err(LedError::Unavailable("no vendor interface".into())));
        let sync = AudioStateSynchronizer::new(Some(endpoint(false)), None, Arc::new(led));
        sync.start();

        assert!(sync.toggle_mic().expect("toggle"));
        assert!(!sync.toggle_mic().expect("toggle"));
    }

    #[test]
    fn test_endpoint_failure_propagates_from_toggle() {
        let led = MockLedController::new();
        let mut failing = MockAudioEndpoint::new(false);
        failing.should_fail = true;
        let sync = AudioStateSynchronizer::new(Some(Arc::new(failing)), None, Arc::new(led));

        assert!(matches!(sync.toggle_mic(), Err(AudioError::Platform(_))));
    }
}
