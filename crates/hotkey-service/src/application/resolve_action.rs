//! Resolve-action use case: keycode plus config snapshot to wire command.
//!
//! # Resolution table
//!
//! | Mapping action             | Result                                          |
//! |----------------------------|-------------------------------------------------|
//! | no mapping / `Unassigned`  | nothing                                         |
//! | `Launch(target)`           | `launch::<target>` (nothing if target is empty) |
//! | `SendKeys(combo)`          | `sendkeys::<mods>::<key>` (nothing if key is empty) |
//! | `toggle_mic_mute`          | toggle mic; `show_icon::microphone_(un)mute::<theme>` if popup |
//! | `toggle_speaker_mute`      | toggle speaker; `show_icon::speaker_(un)mute::<theme>` if popup |
//! | any other special id       | `show_icon::<id>::<theme>` if popup             |
//!
//! The two audio toggles take effect whether or not a popup is shown.  The
//! icon reflects the state *after* the toggle.  When the toggle fails (no
//! such device, audio service error) the unmuted icon is used.

use std::sync::Arc;

use hotkey_core::{AppConfig, Command, MappingAction, SpecialAction, Theme};
use tracing::{debug, warn};

use super::audio_sync::AudioError;

/// Mute toggling needed by the resolver.
pub trait MuteToggle: Send + Sync {
    /// Flips the microphone mute state and returns the new state.
    fn toggle_mic(&self) -> Result<bool, AudioError>;
    /// Flips the speaker mute state and returns the new state.
    fn toggle_speaker(&self) -> Result<bool, AudioError>;
}

/// Resolves keycodes to commands.
pub struct ActionResolver {
    audio: Arc<dyn MuteToggle>,
}

impl ActionResolver {
    pub fn new(audio: Arc<dyn MuteToggle>) -> Self {
        Self { audio }
    }

    /// Determines what `key_code` should do under `config`.
    ///
    /// Returns `None` when nothing should be sent.  Audio special actions
    /// toggle mute as a side effect even when they return `None`.
    pub fn resolve(&self, config: &AppConfig, key_code: u32) -> Option<Command> {
        let Some(mapping) = config.find_mapping(key_code) else {
            debug!(key_code, "no mapping for keycode");
            return None;
        };

        let command = match &mapping.action {
            MappingAction::Unassigned => None,
            MappingAction::Launch(target) => {
                if target.trim().is_empty() {
                    debug!(key_code, "launch mapping has an empty target");
                    None
                } else {
                    Some(Command::launch(target.clone()))
                }
            }
            MappingAction::SendKeys(combo) => {
                if combo.key.trim().is_empty() {
                    debug!(key_code, "sendkeys mapping has no key");
                    None
                } else {
                    Some(Command::SendKeys {
                        modifiers: combo.modifiers.clone(),
                        key: combo.key.clone(),
                    })
                }
            }
            MappingAction::Special(special) => {
                self.resolve_special(special, mapping.show_popup, config.theme)
            }
        }?;

        // Payloads are validated on load; this catches anything built in code.
        match command.encode_line() {
            Ok(_) => Some(command),
            Err(e) => {
                warn!(key_code, "dropping command that cannot be framed: {e}");
                None
            }
        }
    }

    fn resolve_special(
        &self,
        special: &SpecialAction,
        show_popup: bool,
        theme: Theme,
    ) -> Option<Command> {
        let icon = match special {
            SpecialAction::ToggleMicMute => {
                let muted = toggled_state("microphone", self.audio.toggle_mic());
                let icon = if muted { "microphone_mute" } else { "microphone_unmute" };
                icon.to_string()
            }
            SpecialAction::ToggleSpeakerMute => {
                let muted = toggled_state("speaker", self.audio.toggle_speaker());
                let icon = if muted { "speaker_mute" } else { "speaker_unmute" };
                icon.to_string()
            }
            SpecialAction::Other(id) if id.trim().is_empty() => return None,
            SpecialAction::Other(id) => id.clone(),
        };

        show_popup.then(|| Command::show_icon(icon, theme))
    }
}

fn toggled_state(device: &str, result: Result<bool, AudioError>) -> bool {
    result.unwrap_or_else(|e| {
        warn!(device, "mute toggle failed: {e}");
        false
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
