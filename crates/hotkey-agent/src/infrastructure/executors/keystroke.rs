//! Keystroke injection.
//!
//! Both injectors turn the chord into a keystroke sequence first, so an
//! unknown key name fails the same way on every platform.  On Windows the
//! sequence goes to `SendInput` in a single call; elsewhere it is only
//! logged.

use std::collections::BTreeSet;

use hotkey_core::Modifier;
use tracing::{debug, info};

use crate::application::dispatch::{ExecutionError, KeystrokeInjector};
use crate::application::keymap::chord_sequence;

/// Validates chords and logs them without touching the keyboard.
///
/// Used where there is no injection backend, and handy for checking a hotkey
/// map on a machine where keys should not actually be pressed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunInjector;

impl KeystrokeInjector for DryRunInjector {
    fn send_chord(&self, modifiers: &BTreeSet<Modifier>, key: &str) -> Result<(), ExecutionError> {
        let strokes = chord_sequence(modifiers, key)?;
        info!(
            key,
            modifiers = modifiers.len(),
            strokes = strokes.len(),
            "sendkeys (dry run)"
        );
        for stroke in &strokes {
            debug!(vk = stroke.vk, key_up = stroke.key_up, "stroke");
        }
        Ok(())
    }
}

#[cfg(target_os = "windows")]
pub use self::windows::SendInputInjector;

#[cfg(target_os = "windows")]
mod windows {
    use super::*;
    use crate::application::keymap::KeyStroke;

    use ::windows::Win32::UI::Input::KeyboardAndMouse::{
        SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
        VIRTUAL_KEY,
    };

    /// Injects chords with `SendInput`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct SendInputInjector;

    impl SendInputInjector {
        pub fn new() -> Self {
            Self
        }
    }

    fn to_input(stroke: &KeyStroke) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(stroke.vk),
                    wScan: 0,
                    dwFlags: if stroke.key_up {
                        KEYEVENTF_KEYUP
                    } else {
                        KEYBD_EVENT_FLAGS(0)
                    },
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    impl KeystrokeInjector for SendInputInjector {
        fn send_chord(
            &self,
            modifiers: &BTreeSet<Modifier>,
            key: &str,
        ) -> Result<(), ExecutionError> {
            let inputs: Vec<INPUT> = chord_sequence(modifiers, key)?.iter().map(to_input).collect();

            // SAFETY: every element is a fully initialised keyboard INPUT.
            let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
            if sent as usize != inputs.len() {
                return Err(ExecutionError::Injection(format!(
                    "SendInput accepted {sent} of {} events: {}",
                    inputs.len(),
                    ::windows::core::Error::from_win32()
                )));
            }

            debug!(key, events = inputs.len(), "chord injected");
            Ok(())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_accepts_known_chord() {
        let injector = DryRunInjector;
        let result = injector.send_chord(&[Modifier::Control, Modifier::Alt].into(), "Delete");
        assert!(result.is_ok());
    }

    #[test]
    fn test_dry_run_rejects_unknown_key() {
        let injector = DryRunInjector;
        let result = injector.send_chord(&BTreeSet::new(), "mystery");
        assert!(matches!(result, Err(ExecutionError::UnknownKey(_))));
    }
}
