//! Hotkey bridge service: entry point.
//!
//! Runs with elevated privileges.  Receives vendor hotkey events from the
//! firmware, decides what each key should do using the active user's hotkey
//! map, keeps the mute LEDs in step with the audio state, and forwards
//! desktop actions to the agent running in the user's session.
//!
//! # Usage
//!
//! ```text
//! hotkey-service [OPTIONS]
//!
//! Options:
//!   --config <PATH>      Hotkey map to use [default: active user's hotkey_map.json]
//!   --endpoint <NAME>    Agent pipe name or socket path
//!   --log-level <LEVEL>  Log level when RUST_LOG is not set [default: info]
//!   --init-config        Write the built-in profile if no config file exists
//!   --stdin-events       Read keycodes from stdin instead of the firmware
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                  | Description                       |
//! |---------------------------|-----------------------------------|
//! | `HOTKEY_BRIDGE_CONFIG`    | Same as `--config`                |
//! | `HOTKEY_BRIDGE_ENDPOINT`  | Same as `--endpoint`              |
//! | `RUST_LOG`                | Overrides `--log-level`           |
//!
//! # Architecture overview
//!
//! ```text
//! firmware events ──► hotkey pipeline ──► CommandInitiator ──► agent
//!                         │     ▲
//!                 resolve │     │ snapshot
//!                         ▼     │
//!                  ActionResolver   ConfigCache ◄── config watcher
//!                         │
//!                         ▼
//!              AudioStateSynchronizer ──► mute LEDs
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hotkey_core::config::defaults::starter_config;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hotkey_service::application::audio_sync::{AudioEndpoint, AudioStateSynchronizer, LedController};
use hotkey_service::application::hotkey_pipeline::run_hotkey_pipeline;
use hotkey_service::application::resolve_action::ActionResolver;
use hotkey_service::infrastructure::channel::transport::platform_connector;
use hotkey_service::infrastructure::channel::{CommandInitiator, InitiatorConfig};
use hotkey_service::infrastructure::config_cache::{write_config_if_absent, ConfigCache};
use hotkey_service::infrastructure::config_watcher::watch_config;
use hotkey_service::infrastructure::event_source::{KeyEventSource, StdinEventSource};
use hotkey_service::infrastructure::paths::default_config_path;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Hotkey bridge service.
#[derive(Debug, Parser)]
#[command(
    name = "hotkey-service",
    about = "Privileged hotkey bridge service: resolves vendor hotkeys and drives the user-session agent",
    version
)]
struct Cli {
    /// Path of the hotkey map.  Defaults to the active console user's
    /// `hotkey_map.json`.
    #[arg(long, env = "HOTKEY_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Named pipe (Windows) or Unix socket path the agent listens on.
    #[arg(long, env = "HOTKEY_BRIDGE_ENDPOINT", default_value_t = hotkey_core::default_endpoint())]
    endpoint: String,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write the built-in default profile if the config file does not exist.
    #[arg(long)]
    init_config: bool,

    /// Read keycodes from stdin instead of the firmware event source.
    #[arg(long)]
    stdin_events: bool,
}

// ── Platform wiring ───────────────────────────────────────────────────────────

struct AudioDevices {
    microphone: Option<Arc<dyn AudioEndpoint>>,
    speaker: Option<Arc<dyn AudioEndpoint>>,
    led: Arc<dyn LedController>,
}

#[cfg(target_os = "windows")]
fn audio_devices() -> AudioDevices {
    use hotkey_service::infrastructure::audio::windows::WasapiEndpoint;
    use hotkey_service::infrastructure::led::windows::WmiLedController;
    use hotkey_service::infrastructure::led::LoggingLedController;

    fn open(
        label: &str,
        result: Result<WasapiEndpoint, hotkey_service::application::audio_sync::AudioError>,
    ) -> Option<Arc<dyn AudioEndpoint>> {
        match result {
            Ok(endpoint) => Some(Arc::new(endpoint)),
            Err(e) => {
                tracing::warn!(device = label, "audio endpoint not available: {e}");
                None
            }
        }
    }

    let led: Arc<dyn LedController> = match WmiLedController::connect() {
        Ok(led) => Arc::new(led),
        Err(e) => {
            tracing::warn!("vendor LED control not available, logging instead: {e}");
            Arc::new(LoggingLedController)
        }
    };

    AudioDevices {
        microphone: open("microphone", WasapiEndpoint::default_microphone()),
        speaker: open("speaker", WasapiEndpoint::default_speaker()),
        led,
    }
}

#[cfg(not(target_os = "windows"))]
fn audio_devices() -> AudioDevices {
    use hotkey_service::infrastructure::audio::mock::MockAudioEndpoint;
    use hotkey_service::infrastructure::led::LoggingLedController;

    info!("no platform audio backend; using in-memory mute state");
    AudioDevices {
        microphone: Some(Arc::new(MockAudioEndpoint::new(false))),
        speaker: Some(Arc::new(MockAudioEndpoint::new(false))),
        led: Arc::new(LoggingLedController),
    }
}

fn event_source(stdin_events: bool) -> Box<dyn KeyEventSource> {
    #[cfg(target_os = "windows")]
    {
        if !stdin_events {
            return Box::new(hotkey_service::infrastructure::event_source::WmiEventSource);
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        if !stdin_events {
            info!("no firmware event source on this platform; reading keycodes from stdin");
        }
    }

    Box::new(StdinEventSource)
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config_path = cli
        .config
        .clone()
        .or_else(default_config_path)
        .context("could not determine the hotkey config path; pass --config")?;

    info!(
        config = %config_path.display(),
        endpoint = %cli.endpoint,
        "hotkey-service starting"
    );

    if cli.init_config {
        let written = write_config_if_absent(&config_path, &starter_config())
            .with_context(|| format!("failed to write default config to {}", config_path.display()))?;
        if written {
            info!(path = %config_path.display(), "wrote built-in default profile");
        }
    }

    let cancel = CancellationToken::new();

    // ── Config cache and hot reload ───────────────────────────────────────────
    let cache = Arc::new(ConfigCache::new());
    cache.load_initial(&config_path);
    let watcher = tokio::spawn(watch_config(
        config_path.clone(),
        Arc::clone(&cache),
        cancel.clone(),
    ));

    // ── Audio state and LEDs ──────────────────────────────────────────────────
    let devices = audio_devices();
    let audio = Arc::new(AudioStateSynchronizer::new(
        devices.microphone,
        devices.speaker,
        devices.led,
    ));
    audio.start();
    let resolver = Arc::new(ActionResolver::new(audio));

    // ── Channel to the agent ──────────────────────────────────────────────────
    let initiator = Arc::new(CommandInitiator::new(
        platform_connector(&cli.endpoint),
        InitiatorConfig::default(),
    ));
    let channel = tokio::spawn({
        let initiator = Arc::clone(&initiator);
        let cancel = cancel.clone();
        async move { initiator.run(cancel).await }
    });

    // ── Hotkey events ─────────────────────────────────────────────────────────
    let (key_tx, key_rx) = mpsc::channel(64);
    event_source(cli.stdin_events)
        .start(key_tx, cancel.clone())
        .context("failed to start the hotkey event source")?;
    let pipeline = tokio::spawn(run_hotkey_pipeline(
        key_rx,
        cache,
        resolver,
        initiator,
        cancel.clone(),
    ));

    // ── Shutdown ──────────────────────────────────────────────────────────────
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for the shutdown signal")?;
    info!("shutdown requested");
    cancel.cancel();

    let _ = tokio::join!(watcher, channel, pipeline);
    info!("hotkey-service stopped");
    Ok(())
}
