//! Infrastructure layer for the agent.
//!
//! # Sub-modules
//!
//! - **`listener`** – The identity-scoped endpoint the service connects to,
//!   and the per-connection read loop that feeds the dispatcher.
//!
//! - **`executors`** – OS-facing implementations of the dispatcher's
//!   executor traits: program launch, keystroke injection and the on-screen
//!   notification, plus a recording mock for tests.

pub mod executors;
pub mod listener;
