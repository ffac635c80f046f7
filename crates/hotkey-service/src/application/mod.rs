//! Application layer for the service.
//!
//! Use cases in this layer depend on traits rather than OS APIs, so they can
//! be driven by mock endpoints in tests.
//!
//! # Sub-modules
//!
//! - **`resolve_action`** – Turns a keycode plus a config snapshot into the
//!   command to send, toggling audio mute for the two audio special actions.
//!
//! - **`audio_sync`** – Keeps the hardware mute LEDs consistent with the OS
//!   mute state of the default microphone and speaker.
//!
//! - **`hotkey_pipeline`** – The loop that connects the event source, the
//!   resolver and the channel initiator.

pub mod audio_sync;
pub mod hotkey_pipeline;
pub mod resolve_action;
