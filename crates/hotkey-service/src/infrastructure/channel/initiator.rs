//! The reconnecting command initiator.
//!
//! # Connection lifecycle
//!
//! ```text
//!            ┌────────────── cancel ──────────────┐
//!            ▼                                    │
//! Disconnected ──► Connecting ──► Connected ──────┤
//!      ▲               │              │           │
//!      │   fail/timeout│   write fail │           ▼
//!      └── wait 5 s ◄──┴──────────────┘        Stopped
//! ```
//!
//! - Each connect attempt is bounded by `connect_timeout`.
//! - After a failed attempt or a lost session the loop waits
//!   `reconnect_interval` before the next attempt.
//! - A lost session is only noticed when a write fails; the pipe carries no
//!   traffic back from the agent.
//! - Cancellation ends the loop at any point, including mid-attempt and
//!   mid-backoff, and drops the live session.
//!
//! Every established session gets a fresh UUID that appears in its log lines.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use hotkey_core::{Command, ProtocolError};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::{watch, Mutex, Notify};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::transport::{BoxedWriter, Connector};

/// Errors reported by [`CommandInitiator::send`].
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No agent is connected; the command was dropped.
    #[error("no agent connected")]
    NotConnected,

    /// The write failed; the command was dropped and the session closed.
    #[error("write to agent failed: {0}")]
    Write(#[source] io::Error),

    /// The write did not complete in time; treated like a failed write.
    #[error("write to agent timed out after {0:?}")]
    WriteTimeout(Duration),

    /// The channel shut down while the write was in flight.
    #[error("command channel stopped")]
    Cancelled,

    /// The command could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Observable state of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    /// The run loop has ended after cancellation.
    Stopped,
}

/// Timing parameters for the initiator.
#[derive(Debug, Clone)]
pub struct InitiatorConfig {
    /// Upper bound for one connection attempt.
    pub connect_timeout: Duration,
    /// Wait between a failed attempt (or lost session) and the next attempt.
    pub reconnect_interval: Duration,
    /// Upper bound for writing one command.
    pub write_timeout: Duration,
}

impl Default for InitiatorConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            reconnect_interval: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
        }
    }
}

struct Session {
    id: Uuid,
    writer: BoxedWriter,
}

/// Owns the single outbound connection to the agent.
pub struct CommandInitiator {
    connector: Arc<dyn Connector>,
    config: InitiatorConfig,
    session: Mutex<Option<Session>>,
    session_lost: Notify,
    /// Fired when `run` ends; aborts any write still in flight.
    stopped: CancellationToken,
    state_tx: watch::Sender<ChannelState>,
}

impl CommandInitiator {
    pub fn new(connector: Arc<dyn Connector>, config: InitiatorConfig) -> Self {
        let (state_tx, _) = watch::channel(ChannelState::Disconnected);
        Self {
            connector,
            config,
            session: Mutex::new(None),
            session_lost: Notify::new(),
            stopped: CancellationToken::new(),
            state_tx,
        }
    }

    /// Current channel state.
    pub fn state(&self) -> ChannelState {
        *self.state_tx.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn subscribe_state(&self) -> watch::Receiver<ChannelState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, state: ChannelState) {
        self.state_tx.send_replace(state);
    }

    /// Runs the connect/reconnect loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let endpoint = self.connector.endpoint().to_string();
        info!(%endpoint, "command channel starting");

        while !cancel.is_cancelled() {
            self.set_state(ChannelState::Connecting);

            let attempt = tokio::select! {
                _ = cancel.cancelled() => break,
                r = time::timeout(self.config.connect_timeout, self.connector.connect()) => r,
            };

            match attempt {
                Ok(Ok(writer)) => {
                    let id = Uuid::new_v4();
                    *self.session.lock().await = Some(Session { id, writer });
                    self.set_state(ChannelState::Connected);
                    info!(session_id = %id, %endpoint, "connected to agent");

                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.session_lost.notified() => {
                            info!(session_id = %id, "agent connection lost");
                        }
                    }
                }
                Ok(Err(e)) => {
                    debug!(%endpoint, "could not connect to agent: {e}");
                }
                Err(_) => {
                    debug!(%endpoint, timeout = ?self.config.connect_timeout, "connect attempt timed out");
                }
            }

            self.close_session().await;
            self.set_state(ChannelState::Disconnected);
            debug!(%endpoint, "reconnecting in {:?}", self.config.reconnect_interval);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = time::sleep(self.config.reconnect_interval) => {}
            }
        }

        self.stopped.cancel();
        self.close_session().await;
        self.set_state(ChannelState::Stopped);
        info!(%endpoint, "command channel stopped");
    }

    /// Writes one command to the agent.
    ///
    /// Fire-and-forget: the command is dropped if no agent is connected, and
    /// a failed write closes the session so the run loop reconnects.  A write
    /// still pending when `run` stops is abandoned at once.
    ///
    /// # Errors
    ///
    /// [`ChannelError::NotConnected`] when there is no session,
    /// [`ChannelError::Write`] / [`ChannelError::WriteTimeout`] when the
    /// write fails, [`ChannelError::Cancelled`] when the channel stops
    /// mid-write, and [`ChannelError::Protocol`] when the command cannot be
    /// encoded.
    pub async fn send(&self, command: &Command) -> Result<(), ChannelError> {
        let line = command.encode_line()?;

        let mut guard = self.session.lock().await;
        let Some(session) = guard.as_mut() else {
            debug!(verb = command.verb(), "no agent connected; command dropped");
            return Err(ChannelError::NotConnected);
        };

        let write = async {
            session.writer.write_all(line.as_bytes()).await?;
            session.writer.flush().await
        };
        let outcome = tokio::select! {
            _ = self.stopped.cancelled() => None,
            r = time::timeout(self.config.write_timeout, write) => Some(r),
        };
        let error = match outcome {
            Some(Ok(Ok(()))) => {
                debug!(session_id = %session.id, verb = command.verb(), "command sent");
                return Ok(());
            }
            Some(Ok(Err(e))) => ChannelError::Write(e),
            Some(Err(_)) => ChannelError::WriteTimeout(self.config.write_timeout),
            None => ChannelError::Cancelled,
        };

        warn!(session_id = %session.id, verb = command.verb(), "{error}; command dropped");
        *guard = None;
        drop(guard);
        self.session_lost.notify_one();
        Err(error)
    }

    async fn close_session(&self) {
        if let Some(mut session) = self.session.lock().await.take() {
            let _ = session.writer.shutdown().await;
            debug!(session_id = %session.id, "session closed");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
