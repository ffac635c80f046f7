//! One connection's read loop.
//!
//! Lines are read as raw bytes and decoded lossily, so a stray invalid UTF-8
//! byte costs one line rather than the connection.  Each line is parsed and
//! dispatched before the next one is read.  A line longer than
//! [`MAX_LINE_BYTES`] is dropped up to its newline and counted as rejected.

use std::io;

use hotkey_core::Command;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::BoxedReader;
use crate::application::dispatch::CommandDispatcher;

/// Longest line the agent will buffer, newline excluded.
pub const MAX_LINE_BYTES: usize = 4096;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The service closed its end.
    PeerClosed,
    /// The listener was cancelled.
    Cancelled,
    /// Reading from the connection failed.
    ReadError,
}

/// Per-session line counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Lines that parsed and executed successfully.
    pub dispatched: usize,
    /// Lines that did not parse.
    pub rejected: usize,
    /// Lines that parsed but whose executor failed.
    pub failed: usize,
}

/// Reads and executes commands until the connection ends.
pub async fn serve_session(
    reader: BoxedReader,
    dispatcher: &CommandDispatcher,
    cancel: &CancellationToken,
    session_id: Uuid,
) -> (SessionEnd, SessionStats) {
    let mut reader = BufReader::new(reader);
    let mut stats = SessionStats::default();
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        let mut limited = (&mut reader).take(MAX_LINE_BYTES as u64 + 1);
        let read = tokio::select! {
            _ = cancel.cancelled() => return (SessionEnd::Cancelled, stats),
            r = limited.read_until(b'\n', &mut buf) => r,
        };

        match read {
            Ok(0) => return (SessionEnd::PeerClosed, stats),
            Ok(_) => {}
            Err(e) => {
                warn!(session_id = %session_id, "read failed: {e}");
                return (SessionEnd::ReadError, stats);
            }
        }

        if buf.len() > MAX_LINE_BYTES && buf.last() != Some(&b'\n') {
            let skipped = tokio::select! {
                _ = cancel.cancelled() => return (SessionEnd::Cancelled, stats),
                r = skip_past_newline(&mut reader) => r,
            };
            if let Err(e) = skipped {
                warn!(session_id = %session_id, "read failed: {e}");
                return (SessionEnd::ReadError, stats);
            }
            warn!(session_id = %session_id, limit = MAX_LINE_BYTES, "dropping oversized line");
            stats.rejected += 1;
            continue;
        }

        let line = String::from_utf8_lossy(&buf);
        if line.trim().is_empty() {
            continue;
        }

        let command = match Command::parse_line(&line) {
            Ok(command) => command,
            Err(e) => {
                warn!(session_id = %session_id, line = %line.trim_end(), "ignoring line: {e}");
                stats.rejected += 1;
                continue;
            }
        };

        match dispatcher.dispatch(&command) {
            Ok(()) => {
                debug!(session_id = %session_id, verb = command.verb(), "command executed");
                stats.dispatched += 1;
            }
            Err(e) => {
                warn!(session_id = %session_id, verb = command.verb(), "command failed: {e}");
                stats.failed += 1;
            }
        }
    }
}

/// Consumes input up to and including the next newline, or to end of stream.
async fn skip_past_newline<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<()> {
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(index) => {
                reader.consume(index + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
