//! hotkey-service library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the service do?
//!
//! The service runs with elevated privileges, outside the interactive
//! desktop session.  It:
//!
//! 1. Keeps the hotkey map (`hotkey_map.json`) cached in memory and reloads
//!    it whenever the file changes.
//! 2. Receives vendor keycodes from the firmware event source and resolves
//!    each one to a [`Command`](hotkey_core::Command) using the current
//!    config snapshot.
//! 3. Keeps the microphone and speaker mute LEDs in step with the OS mute
//!    state, whether the change came from a hotkey or from anywhere else.
//! 4. Maintains one outbound connection to the agent in the user session and
//!    writes commands to it, reconnecting every few seconds while the agent
//!    is away.

/// Application layer: resolution and audio state logic.
pub mod application;

/// Infrastructure layer: config storage, channel transport and OS adapters.
pub mod infrastructure;
