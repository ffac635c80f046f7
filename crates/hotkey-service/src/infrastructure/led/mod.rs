//! Mute LED controllers.
//!
//! On Windows the LEDs are driven through the vendor `SetFeature` WMI
//! method; each (LED, state) pair has its own feature code.  Elsewhere the
//! [`LoggingLedController`] records the requested state in the log.

use tracing::info;

use crate::application::audio_sync::{LedController, LedError};

#[cfg(target_os = "windows")]
pub mod windows;

/// Feature code that lights the microphone mute LED.
pub const MIC_LED_ON: u32 = 1;
/// Feature code that turns the microphone mute LED off.
pub const MIC_LED_OFF: u32 = 2;
/// Feature code that lights the speaker mute LED.
pub const SPEAKER_LED_ON: u32 = 4;
/// Feature code that turns the speaker mute LED off.
pub const SPEAKER_LED_OFF: u32 = 5;

/// Maps a microphone mute state to its vendor feature code.
pub fn mic_feature_code(muted: bool) -> u32 {
    if muted {
        MIC_LED_ON
    } else {
        MIC_LED_OFF
    }
}

/// Maps a speaker mute state to its vendor feature code.
pub fn speaker_feature_code(muted: bool) -> u32 {
    if muted {
        SPEAKER_LED_ON
    } else {
        SPEAKER_LED_OFF
    }
}

/// LED controller for machines without the vendor interface.
#[derive(Debug, Default)]
pub struct LoggingLedController;

impl LedController for LoggingLedController {
    fn set_mic_led(&self, muted: bool) -> Result<(), LedError> {
        info!(muted, feature = mic_feature_code(muted), "microphone mute LED");
        Ok(())
    }

    fn set_speaker_led(&self, muted: bool) -> Result<(), LedError> {
        info!(muted, feature = speaker_feature_code(muted), "speaker mute LED");
        Ok(())
    }
}
