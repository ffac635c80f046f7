//! Keycodes typed on standard input.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{parse_key_code, EventSourceError, KeyEventSource};

/// Reads one keycode per line from stdin.
#[derive(Debug, Default)]
pub struct StdinEventSource;

impl KeyEventSource for StdinEventSource {
    fn start(
        self: Box<Self>,
        tx: mpsc::Sender<u32>,
        cancel: CancellationToken,
    ) -> Result<(), EventSourceError> {
        info!("reading hotkey codes from stdin");
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = tokio::select! {
                    _ = cancel.cancelled() => break,
                    line = lines.next_line() => line,
                };
                match line {
                    Ok(Some(text)) if text.trim().is_empty() => {}
                    Ok(Some(text)) => match parse_key_code(&text) {
                        Some(code) => {
                            if tx.send(code).await.is_err() {
                                break;
                            }
                        }
                        None => warn!(input = %text.trim(), "not a keycode"),
                    },
                    Ok(None) => {
                        debug!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        warn!("stdin read failed: {e}");
                        break;
                    }
                }
            }
        });
        Ok(())
    }
}
