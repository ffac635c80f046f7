//! Infrastructure layer for the service.
//!
//! Contains OS-facing adapters and I/O: the config file cache and watcher,
//! the outbound channel to the agent, and the Windows audio, WMI and session
//! APIs.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `hotkey_core`.  Application use cases see it only through traits; the
//! hotkey pipeline is the one place that wires concrete types together.
//!
//! # Sub-modules
//!
//! - **`config_cache`** – The in-memory config snapshot with last-known-good
//!   reload semantics.
//!
//! - **`config_watcher`** – Watches the config file and drives the cache.
//!
//! - **`paths`** – Locates the active user's config file.
//!
//! - **`channel`** – Outbound connection to the agent: connectors for each
//!   platform and the reconnecting [`CommandInitiator`](channel::CommandInitiator).
//!
//! - **`event_source`** – Sources of vendor keycodes: firmware WMI events on
//!   Windows, stdin lines for development, and a mock for tests.
//!
//! - **`audio`** – [`AudioEndpoint`](crate::application::audio_sync::AudioEndpoint)
//!   implementations: WASAPI on Windows, in-memory elsewhere.
//!
//! - **`led`** – [`LedController`](crate::application::audio_sync::LedController)
//!   implementations: the vendor WMI method on Windows, logging elsewhere.

pub mod audio;
pub mod channel;
pub mod config_cache;
pub mod config_watcher;
pub mod event_source;
pub mod led;
pub mod paths;

#[cfg(target_os = "windows")]
pub mod wmi;
