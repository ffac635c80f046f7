//! Mock event source for tests.
//!
//! `start` hands the channel to a shared slot; tests then call
//! [`MockEventSource::inject`] on a clone to deliver keycodes.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{EventSourceError, KeyEventSource};

/// A cloneable handle that injects keycodes once started.
#[derive(Debug, Clone, Default)]
pub struct MockEventSource {
    tx: Arc<Mutex<Option<mpsc::Sender<u32>>>>,
    /// When `true`, `start` fails with `EventSourceError::Subscribe`.
    pub should_fail: bool,
}

impl MockEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `key_code` as if the hardware had reported it.  Returns
    /// `false` if the source was never started or the pipeline has gone.
    pub async fn inject(&self, key_code: u32) -> bool {
        let tx = self.tx.lock().unwrap_or_else(|e| e.into_inner()).clone();
        match tx {
            Some(tx) => tx.send(key_code).await.is_ok(),
            None => false,
        }
    }
}

impl KeyEventSource for MockEventSource {
    fn start(
        self: Box<Self>,
        tx: mpsc::Sender<u32>,
        cancel: CancellationToken,
    ) -> Result<(), EventSourceError> {
        if self.should_fail {
            return Err(EventSourceError::Subscribe("mock failure".into()));
        }
        *self.tx.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);

        // Release the sender on cancellation so the pipeline sees end of input.
        let slot = Arc::clone(&self.tx);
        tokio::spawn(async move {
            cancel.cancelled().await;
            slot.lock().unwrap_or_else(|e| e.into_inner()).take();
        });
        Ok(())
    }
}
