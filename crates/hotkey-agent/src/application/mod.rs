//! Application layer for the agent.
//!
//! # Sub-modules
//!
//! - **`dispatch`** – Routes each parsed [`Command`](hotkey_core::Command)
//!   to the executor for its verb and contains executor failures.
//!
//! - **`keymap`** – Maps key names used in the hotkey map to Windows
//!   virtual-key codes and builds the press/release sequence for a chord.

pub mod dispatch;
pub mod keymap;
