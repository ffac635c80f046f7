//! Hotkey configuration model.
//!
//! The configuration file is produced by the editing GUI and looks like:
//!
//! ```json
//! {
//!   "Theme": "Dark",
//!   "Mappings": [
//!     { "KeyCode": 1,  "Description": "Star", "Action": "launch",   "Payload": "notepad", "ShowPopup": false },
//!     { "KeyCode": 62, "Description": "Mic",  "Action": "special",  "Payload": "toggle_mic_mute", "ShowPopup": true },
//!     { "KeyCode": 70, "Description": "Copy", "Action": "sendkeys", "Payload": { "Modifiers": ["control"], "Key": "c" } }
//!   ]
//! }
//! ```
//!
//! camelCase keys (`theme`, `mappings`, `keyCode`, ...) are accepted as well.
//!
//! # Payload validation
//!
//! `Payload` is either a string or an object depending on `Action`.  The raw
//! JSON shape lives in [`schema`]; it is converted into the tagged union
//! [`MappingAction`] while the file is parsed.  A mapping whose payload does
//! not fit its action, or that could not be carried on the wire, is
//! downgraded to [`MappingAction::Unassigned`] with a warning instead of
//! failing the whole file.
//!
//! # Duplicate key codes
//!
//! Key codes are expected to be unique.  When they are not, the first mapping
//! in file order wins (see [`AppConfig::find_mapping`]).

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub mod defaults;
mod schema;

/// Error type for configuration parsing and serialization.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file does not exist (yet).
    #[error("config file not found at {0}")]
    NotFound(PathBuf),

    /// The JSON content could not be parsed.
    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The config could not be serialized to JSON.
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),
}

// ── Theme ─────────────────────────────────────────────────────────────────────

/// Colour theme used by the agent's on-screen notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    /// Lowercase name used on the wire (`"light"` / `"dark"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parses a theme name case-insensitively, falling back to [`Theme::Dark`].
    pub fn parse_lenient(name: &str) -> Theme {
        if name.trim().eq_ignore_ascii_case("light") {
            Theme::Light
        } else {
            Theme::Dark
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Theme {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // The GUI writes capitalised names.
        serializer.serialize_str(match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        })
    }
}

impl<'de> Deserialize<'de> for Theme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(name.map(|n| Theme::parse_lenient(&n)).unwrap_or_default())
    }
}

// ── Modifiers and key combos ──────────────────────────────────────────────────

/// Keyboard modifier held while a key is injected.
///
/// The derived `Ord` defines the fixed order used when a modifier set is
/// serialized: control, alt, shift, win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Control,
    Alt,
    Shift,
    Win,
}

impl Modifier {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Control => "control",
            Modifier::Alt => "alt",
            Modifier::Shift => "shift",
            Modifier::Win => "win",
        }
    }

    /// Parses a modifier name, accepting the `ctrl` and `windows` aliases.
    pub fn from_name(name: &str) -> Option<Modifier> {
        match name.trim().to_ascii_lowercase().as_str() {
            "control" | "ctrl" => Some(Modifier::Control),
            "alt" => Some(Modifier::Alt),
            "shift" => Some(Modifier::Shift),
            "win" | "windows" => Some(Modifier::Win),
            _ => None,
        }
    }
}

/// Joins a modifier set into the comma-separated form used on the wire.
pub fn modifiers_csv(modifiers: &BTreeSet<Modifier>) -> String {
    modifiers
        .iter()
        .map(Modifier::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// Payload of a `sendkeys` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyCombo {
    pub modifiers: BTreeSet<Modifier>,
    pub key: String,
}

impl KeyCombo {
    pub fn new(modifiers: impl IntoIterator<Item = Modifier>, key: impl Into<String>) -> Self {
        Self {
            modifiers: modifiers.into_iter().collect(),
            key: key.into(),
        }
    }

    /// Modifiers as a comma-joined list in the fixed [`Modifier`] order.
    pub fn modifiers_csv(&self) -> String {
        modifiers_csv(&self.modifiers)
    }
}

// ── Special actions ───────────────────────────────────────────────────────────

/// Payload of a `special` mapping.
///
/// Only the two audio toggles carry behaviour on the service side.  Every
/// other identifier (`kb_backlight_high`, `camera_on`, ...) is handled by
/// firmware and is only echoed to the agent as an icon name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpecialAction {
    ToggleMicMute,
    ToggleSpeakerMute,
    Other(String),
}

impl SpecialAction {
    pub fn from_id(id: &str) -> SpecialAction {
        match id {
            "toggle_mic_mute" => SpecialAction::ToggleMicMute,
            "toggle_speaker_mute" => SpecialAction::ToggleSpeakerMute,
            other => SpecialAction::Other(other.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SpecialAction::ToggleMicMute => "toggle_mic_mute",
            SpecialAction::ToggleSpeakerMute => "toggle_speaker_mute",
            SpecialAction::Other(id) => id,
        }
    }
}

// ── Mappings ──────────────────────────────────────────────────────────────────

/// What a hotkey does, with the payload that action needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MappingAction {
    #[default]
    Unassigned,
    /// Command line to launch.  Opaque to the service.
    Launch(String),
    SendKeys(KeyCombo),
    Special(SpecialAction),
}

impl MappingAction {
    /// Action name as written in the config file.
    pub fn name(&self) -> &'static str {
        match self {
            MappingAction::Unassigned => "Unassigned",
            MappingAction::Launch(_) => "launch",
            MappingAction::SendKeys(_) => "sendkeys",
            MappingAction::Special(_) => "special",
        }
    }
}

/// A single keycode → action binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "schema::RawMapping", into = "schema::RawMapping")]
pub struct HotkeyMapping {
    pub key_code: u32,
    pub description: String,
    pub action: MappingAction,
    pub show_popup: bool,
}

/// A named alternative mapping set kept by the editing GUI.
///
/// Profiles are preserved when the config is rewritten but never resolved
/// directly; only [`AppConfig::mappings`] is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserProfile {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
    #[serde(rename = "Config", alias = "config")]
    pub config: AppConfig,
}

/// Top-level hotkey configuration.
///
/// Published by the service as an immutable snapshot; a reload builds a new
/// value rather than editing this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(rename = "Theme", alias = "theme")]
    pub theme: Theme,
    #[serde(rename = "Mappings", alias = "mappings")]
    pub mappings: Vec<HotkeyMapping>,
    #[serde(
        rename = "Profiles",
        alias = "profiles",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub profiles: Vec<UserProfile>,
}

impl AppConfig {
    /// Parses a config document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid JSON or does
    /// not have the expected overall shape.  Individual bad payloads do not
    /// fail the parse; see the module docs.
    pub fn from_json_str(json: &str) -> Result<AppConfig, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the config the way the editing GUI writes it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Returns the first mapping bound to `key_code`.
    pub fn find_mapping(&self, key_code: u32) -> Option<&HotkeyMapping> {
        self.mappings.iter().find(|m| m.key_code == key_code)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
