//! The command listener: endpoint, accept loop and per-connection sessions.
//!
//! # Accept loop
//!
//! ```text
//!        ┌──────────────────────────────────────────────┐
//!        ▼                                              │
//!   accept() ──► serve_session() ──► peer closed ───────┤
//!        │              │                               │
//!        │ error        │ read error                    │
//!        ▼              ▼                               │
//!   wait 5 s ───────────┴───────────────────────────────┘
//! ```
//!
//! - Exactly one connection is served at a time.
//! - A peer that fails the identity check is dropped and the loop goes
//!   straight back to accepting.
//! - Any other accept failure, and any read error inside a session, waits
//!   `retry_delay` before the endpoint is used again.
//! - Cancellation ends the loop at any point, including mid-accept,
//!   mid-read and mid-wait.
//!
//! # Endpoints
//!
//! | platform | acceptor               | access policy                        |
//! |----------|------------------------|--------------------------------------|
//! | Windows  | `NamedPipeAcceptor`    | DACL: SYSTEM and the current user    |
//! | Unix     | `UnixSocketAcceptor`   | mode `0600`, peer uid = owner or root |

pub mod mock;
pub mod session;

#[cfg(windows)]
pub mod named_pipe;
#[cfg(windows)]
mod security;
#[cfg(unix)]
pub mod unix_socket;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::dispatch::CommandDispatcher;

pub use session::{serve_session, SessionEnd, SessionStats};

#[cfg(windows)]
pub use named_pipe::NamedPipeAcceptor;
#[cfg(unix)]
pub use unix_socket::UnixSocketAcceptor;

/// The read side of an accepted connection.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Errors raised while creating the endpoint or accepting a connection.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The endpoint could not be created.
    #[error("failed to create endpoint {endpoint}: {source}")]
    Create {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Waiting for a connection failed.
    #[error("accept failed: {0}")]
    Accept(#[from] io::Error),

    /// The connecting process is not allowed to send commands.
    #[error("peer rejected: {0}")]
    PeerRejected(String),

    /// The access policy for the endpoint could not be built.
    #[error("endpoint security: {0}")]
    Security(String),
}

/// Produces one connection at a time.
#[async_trait]
pub trait Acceptor: Send {
    /// Waits for the next authorised connection.
    async fn accept(&mut self) -> Result<BoxedReader, EndpointError>;

    /// Endpoint address, for log lines.
    fn describe(&self) -> &str;
}

/// Timing parameters for the listener.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Wait after an accept failure or a read error.
    pub retry_delay: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Accepts connections from the service and feeds their lines to the
/// dispatcher.
pub struct CommandListener<A: Acceptor> {
    acceptor: A,
    dispatcher: Arc<CommandDispatcher>,
    config: ListenerConfig,
}

impl<A: Acceptor> CommandListener<A> {
    pub fn new(acceptor: A, dispatcher: Arc<CommandDispatcher>, config: ListenerConfig) -> Self {
        Self {
            acceptor,
            dispatcher,
            config,
        }
    }

    /// Runs the accept loop until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let endpoint = self.acceptor.describe().to_string();
        info!(%endpoint, "command listener starting");

        while !cancel.is_cancelled() {
            let accepted = tokio::select! {
                _ = cancel.cancelled() => break,
                r = self.acceptor.accept() => r,
            };

            let retry = match accepted {
                Ok(reader) => {
                    let session_id = Uuid::new_v4();
                    info!(session_id = %session_id, %endpoint, "service connected");

                    let (end, stats) =
                        serve_session(reader, &self.dispatcher, &cancel, session_id).await;
                    info!(
                        session_id = %session_id,
                        ?end,
                        dispatched = stats.dispatched,
                        rejected = stats.rejected,
                        failed = stats.failed,
                        "session ended"
                    );
                    end == SessionEnd::ReadError
                }
                Err(EndpointError::PeerRejected(reason)) => {
                    warn!(%endpoint, "connection refused: {reason}");
                    false
                }
                Err(e) => {
                    error!(%endpoint, "listener error: {e}");
                    true
                }
            };

            if retry {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = time::sleep(self.config.retry_delay) => {}
                }
            }
        }

        info!(%endpoint, "command listener stopped");
    }
}
