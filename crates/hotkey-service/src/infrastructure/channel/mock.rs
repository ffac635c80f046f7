//! Scripted connector for testing the initiator without a real endpoint.
//!
//! Each call to `connect` records the (tokio) time of the attempt and plays
//! the next queued [`MockOutcome`].  When the queue is empty the attempt is
//! refused, which is what a missing agent looks like.

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::DuplexStream;
use tokio::time::Instant;

use super::transport::{BoxedWriter, Connector};

/// What a single connection attempt does.
#[derive(Debug)]
pub enum MockOutcome {
    /// Fails immediately with `ConnectionRefused`.
    Refuse,
    /// Never completes; only the initiator's timeout ends it.
    Hang,
    /// Succeeds; the test keeps the other end of the duplex.
    Accept(DuplexStream),
}

/// A connector driven by a queue of outcomes.
#[derive(Debug, Default)]
pub struct MockConnector {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    attempts: Mutex<Vec<Instant>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the outcome of a future attempt.
    pub fn push(&self, outcome: MockOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    /// Times of all attempts so far.
    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> io::Result<BoxedWriter> {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Instant::now());
        let outcome = self
            .outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(MockOutcome::Refuse);

        match outcome {
            MockOutcome::Refuse => Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "mock endpoint not listening",
            )),
            MockOutcome::Hang => std::future::pending().await,
            MockOutcome::Accept(stream) => Ok(Box::new(stream)),
        }
    }

    fn endpoint(&self) -> &str {
        "mock"
    }
}
