//! Connectors: how the initiator reaches the agent's endpoint.
//!
//! A [`Connector`] makes one connection attempt and returns the write side of
//! the new connection.  The initiator bounds every attempt with its connect
//! timeout, so a connector may wait for the endpoint to appear.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

/// The write side of an established connection.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Opens connections to the agent's endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Makes one connection attempt.
    async fn connect(&self) -> io::Result<BoxedWriter>;

    /// Endpoint address, for log lines.
    fn endpoint(&self) -> &str;
}

/// Connects to a Unix domain socket.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct UnixSocketConnector {
    path: String,
}

#[cfg(unix)]
impl UnixSocketConnector {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(unix)]
#[async_trait]
impl Connector for UnixSocketConnector {
    async fn connect(&self) -> io::Result<BoxedWriter> {
        let stream = tokio::net::UnixStream::connect(&self.path).await?;
        Ok(Box::new(stream))
    }

    fn endpoint(&self) -> &str {
        &self.path
    }
}

/// Connects to a named pipe, write-only.
///
/// While the pipe does not exist or all its instances are busy, the attempt
/// polls until it succeeds; the caller's timeout ends the attempt.
#[cfg(windows)]
#[derive(Debug, Clone)]
pub struct NamedPipeConnector {
    name: String,
}

#[cfg(windows)]
impl NamedPipeConnector {
    /// Poll interval while the pipe is absent or busy.
    const RETRY_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);

    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[cfg(windows)]
#[async_trait]
impl Connector for NamedPipeConnector {
    async fn connect(&self) -> io::Result<BoxedWriter> {
        use tokio::net::windows::named_pipe::ClientOptions;
        use windows::Win32::Foundation::ERROR_PIPE_BUSY;

        loop {
            match ClientOptions::new().read(false).write(true).open(&self.name) {
                Ok(client) => return Ok(Box::new(client)),
                Err(e) if e.raw_os_error() == Some(ERROR_PIPE_BUSY.0 as i32) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
            tokio::time::sleep(Self::RETRY_INTERVAL).await;
        }
    }

    fn endpoint(&self) -> &str {
        &self.name
    }
}

/// Returns the connector for this platform.
pub fn platform_connector(endpoint: &str) -> Arc<dyn Connector> {
    #[cfg(windows)]
    {
        Arc::new(NamedPipeConnector::new(endpoint))
    }

    #[cfg(unix)]
    {
        Arc::new(UnixSocketConnector::new(endpoint))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_unix_connector_reaches_listening_socket() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("hotkey-conn-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("agent.sock");
        let listener = tokio::net::UnixListener::bind(&path).unwrap();
        let connector = UnixSocketConnector::new(path.to_string_lossy());

        // Act
        let mut writer = connector.connect().await.expect("connect");
        writer.write_all(b"launch::notepad\n").await.unwrap();
        drop(writer);

        // Assert
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = String::new();
        stream.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "launch::notepad\n");
    }

    #[tokio::test]
    async fn test_unix_connector_fails_without_listener() {
        let path = std::env::temp_dir().join(format!("hotkey-missing-{}.sock", Uuid::new_v4()));
        let connector = UnixSocketConnector::new(path.to_string_lossy());

        assert!(connector.connect().await.is_err());
    }
}
