//! Hotkey bridge agent: entry point.
//!
//! Runs in the interactive user session.  Listens on a local endpoint that
//! only this user and the system account can open, and carries out the
//! commands the service sends: launch a program, press a key chord, or show
//! an on-screen icon.
//!
//! # Usage
//!
//! ```text
//! hotkey-agent [OPTIONS]
//!
//! Options:
//!   --endpoint <NAME>    Pipe name (Windows) or socket path to listen on
//!   --log-level <LEVEL>  Log level when RUST_LOG is not set [default: info]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                  | Description                       |
//! |---------------------------|-----------------------------------|
//! | `HOTKEY_BRIDGE_ENDPOINT`  | Same as `--endpoint`              |
//! | `RUST_LOG`                | Overrides `--log-level`           |
//!
//! # Architecture overview
//!
//! ```text
//! service ──► endpoint (DACL / 0600) ──► CommandListener ──► serve_session
//!                                                               │
//!                                                               ▼
//!                                                      CommandDispatcher
//!                                                   ┌───────┼────────┐
//!                                                   ▼       ▼        ▼
//!                                            ShellLauncher  keys   LogNotifier
//! ```

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hotkey_agent::application::dispatch::{CommandDispatcher, KeystrokeInjector};
use hotkey_agent::infrastructure::executors::{LogNotifier, ShellLauncher};
use hotkey_agent::infrastructure::listener::{CommandListener, ListenerConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Hotkey bridge agent.
#[derive(Debug, Parser)]
#[command(
    name = "hotkey-agent",
    about = "User-session hotkey bridge agent: performs desktop actions sent by the service",
    version
)]
struct Cli {
    /// Named pipe (Windows) or Unix socket path to listen on.
    #[arg(long, env = "HOTKEY_BRIDGE_ENDPOINT", default_value_t = hotkey_core::default_endpoint())]
    endpoint: String,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

// ── Platform wiring ───────────────────────────────────────────────────────────

#[cfg(target_os = "windows")]
fn keystroke_injector() -> Arc<dyn KeystrokeInjector> {
    Arc::new(hotkey_agent::infrastructure::executors::SendInputInjector::new())
}

#[cfg(not(target_os = "windows"))]
fn keystroke_injector() -> Arc<dyn KeystrokeInjector> {
    info!("no keystroke injection backend on this platform; chords are logged only");
    Arc::new(hotkey_agent::infrastructure::executors::DryRunInjector)
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

    info!(endpoint = %cli.endpoint, "hotkey-agent starting");

    let dispatcher = Arc::new(CommandDispatcher::new(
        Arc::new(ShellLauncher::new()),
        keystroke_injector(),
        Arc::new(LogNotifier),
    ));

    #[cfg(windows)]
    let acceptor = hotkey_agent::infrastructure::listener::NamedPipeAcceptor::new(&cli.endpoint)
        .context("failed to prepare the agent pipe")?;
    #[cfg(unix)]
    let acceptor = hotkey_agent::infrastructure::listener::UnixSocketAcceptor::bind(&cli.endpoint)
        .with_context(|| format!("failed to bind {}", cli.endpoint))?;

    let cancel = CancellationToken::new();
    let listener = tokio::spawn(
        CommandListener::new(acceptor, dispatcher, ListenerConfig::default()).run(cancel.clone()),
    );

    // ── Shutdown ──────────────────────────────────────────────────────────────
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for the shutdown signal")?;
    info!("shutdown requested");
    cancel.cancel();

    let _ = listener.await;
    info!("hotkey-agent stopped");
    Ok(())
}
