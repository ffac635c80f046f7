//! hotkey-agent library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the agent do?
//!
//! The agent runs inside the interactive user session, where programs can be
//! started on the user's desktop and keystrokes reach the focused window.
//! It:
//!
//! 1. Exposes a local endpoint that only the current user and the system
//!    account may open.
//! 2. Accepts one connection at a time from the service and reads one
//!    command per line.
//! 3. Executes each command in arrival order: launch a program, inject a key
//!    chord, or show an on-screen icon.
//!
//! Malformed lines and failing actions are logged and skipped; they never
//! end the session.

/// Application layer: command dispatch and key-name mapping.
pub mod application;

/// Infrastructure layer: the listener endpoint and the OS-facing executors.
pub mod infrastructure;
