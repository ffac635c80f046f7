//! # hotkey-core
//!
//! Shared library for the hotkey bridge: the configuration model that maps
//! vendor hotkey codes to actions, and the line protocol that carries those
//! actions from the privileged service to the interactive agent.
//!
//! This crate is used by both `hotkey-service` and `hotkey-agent`.  It has no
//! dependencies on OS APIs, sockets, pipes or file watching.
//!
//! # Architecture overview
//!
//! The system is split into two cooperating processes:
//!
//! - The **service** runs with elevated privileges, observes firmware hotkey
//!   events and decides what each keycode should do.
//! - The **agent** runs inside the interactive user session and performs the
//!   actions that need a desktop (launching programs, injecting keystrokes,
//!   showing an on-screen icon).
//!
//! This crate defines what both sides must agree on:
//!
//! - **`config`** – the JSON hotkey map (`hotkey_map.json`) as a typed,
//!   validated [`AppConfig`].  Payloads are checked once, when the file is
//!   parsed, so the rest of the system only sees well-formed actions.
//!
//! - **`protocol`** – the [`Command`] type and its text encoding: verb and
//!   arguments joined by `::`, one command per line.

pub mod config;
pub mod protocol;

pub use config::{
    AppConfig, ConfigError, HotkeyMapping, KeyCombo, MappingAction, Modifier, SpecialAction,
    Theme, UserProfile,
};
pub use protocol::{default_endpoint, Command, ProtocolError, DELIMITER};
