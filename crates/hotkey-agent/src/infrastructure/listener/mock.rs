//! Scripted acceptor for testing the listener without a real endpoint.
//!
//! Each call to `accept` records the (tokio) time and plays the next queued
//! outcome.  With nothing queued, `accept` waits forever, like an endpoint
//! nobody connects to.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use super::{Acceptor, BoxedReader, EndpointError};

/// What a single accept call does.
pub enum MockAccept {
    /// A connection whose read side is the given reader.
    Connect(BoxedReader),
    /// The peer failed the identity check.
    Reject,
    /// The endpoint failed.
    Fail,
}

/// Shared handle for queueing outcomes and inspecting accept times.
#[derive(Clone, Default)]
pub struct MockAcceptorHandle {
    outcomes: Arc<Mutex<VecDeque<MockAccept>>>,
    accepts: Arc<Mutex<Vec<Instant>>>,
}

impl MockAcceptorHandle {
    pub fn push(&self, outcome: MockAccept) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    /// Times of all accept calls so far.
    pub fn accepts(&self) -> Vec<Instant> {
        self.accepts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// An acceptor driven by a queue of outcomes.
#[derive(Default)]
pub struct MockAcceptor {
    handle: MockAcceptorHandle,
}

impl MockAcceptor {
    pub fn new() -> (Self, MockAcceptorHandle) {
        let handle = MockAcceptorHandle::default();
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }
}

#[async_trait]
impl Acceptor for MockAcceptor {
    async fn accept(&mut self) -> Result<BoxedReader, EndpointError> {
        self.handle
            .accepts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Instant::now());
        let next = self
            .handle
            .outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some(MockAccept::Connect(reader)) => Ok(reader),
            Some(MockAccept::Reject) => Err(EndpointError::PeerRejected("mock peer".to_string())),
            Some(MockAccept::Fail) => Err(EndpointError::Accept(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock endpoint failure",
            ))),
            None => std::future::pending().await,
        }
    }

    fn describe(&self) -> &str {
        "mock"
    }
}
