//! Unix domain socket endpoint.
//!
//! The socket file is created with mode `0600`, and every accepted peer is
//! checked with `SO_PEERCRED`: only the socket's owner (the agent's own
//! user) and root may send commands.  The file is removed when the acceptor
//! is dropped.

use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::net::UnixListener;
use tracing::{debug, info};

use super::{Acceptor, BoxedReader, EndpointError};

/// Accepts connections on a Unix socket.
#[derive(Debug)]
pub struct UnixSocketAcceptor {
    listener: UnixListener,
    path: PathBuf,
    endpoint: String,
    owner_uid: u32,
}

impl UnixSocketAcceptor {
    /// Binds the socket, replacing a stale file left by an earlier run.
    ///
    /// # Errors
    ///
    /// [`EndpointError::Create`] if the socket cannot be bound or its
    /// permissions cannot be restricted.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self, EndpointError> {
        let path = path.as_ref().to_path_buf();
        let endpoint = path.display().to_string();
        let create_error = |source| EndpointError::Create {
            endpoint: endpoint.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(create_error)?;
        }
        let _ = fs::remove_file(&path);

        let listener = UnixListener::bind(&path).map_err(create_error)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).map_err(create_error)?;
        let owner_uid = fs::metadata(&path).map_err(create_error)?.uid();

        info!(path = %endpoint, owner_uid, "listening on unix socket");
        Ok(Self {
            listener,
            path,
            endpoint,
            owner_uid,
        })
    }

    fn peer_allowed(&self, uid: u32) -> bool {
        uid == self.owner_uid || uid == 0
    }
}

#[async_trait]
impl Acceptor for UnixSocketAcceptor {
    async fn accept(&mut self) -> Result<BoxedReader, EndpointError> {
        let (stream, _) = self.listener.accept().await?;
        let uid = stream.peer_cred()?.uid();

        if !self.peer_allowed(uid) {
            return Err(EndpointError::PeerRejected(format!(
                "uid {uid} is neither the agent's user nor root"
            )));
        }

        debug!(uid, "peer accepted");
        let (read, _write) = stream.into_split();
        Ok(Box::new(read))
    }

    fn describe(&self) -> &str {
        &self.endpoint
    }
}

impl Drop for UnixSocketAcceptor {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use uuid::Uuid;

    fn socket_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("hotkey-agent-test-{}", Uuid::new_v4()))
            .join("agent.sock")
    }

    #[tokio::test]
    async fn test_bind_restricts_socket_to_owner() {
        let path = socket_path();
        let _acceptor = UnixSocketAcceptor::bind(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_bind_replaces_stale_socket_file() {
        let path = socket_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"stale").unwrap();

        assert!(UnixSocketAcceptor::bind(&path).is_ok());
    }

    #[tokio::test]
    async fn test_accepts_same_user_and_reads_bytes() {
        // Arrange
        let path = socket_path();
        let mut acceptor = UnixSocketAcceptor::bind(&path).unwrap();

        // Act
        let client = tokio::spawn({
            let path = path.clone();
            async move {
                let mut stream = tokio::net::UnixStream::connect(path).await.unwrap();
                stream.write_all(b"launch::calc\n").await.unwrap();
            }
        });
        let mut reader = acceptor.accept().await.unwrap();
        client.await.unwrap();

        // Assert
        let mut received = String::new();
        reader.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "launch::calc\n");
    }

    #[tokio::test]
    async fn test_peer_check_allows_owner_and_root_only() {
        let acceptor = UnixSocketAcceptor::bind(socket_path()).unwrap();
        let owner = acceptor.owner_uid;

        assert!(acceptor.peer_allowed(owner));
        assert!(acceptor.peer_allowed(0));
        assert!(!acceptor.peer_allowed(owner.wrapping_add(1).max(1)));
    }

    #[tokio::test]
    async fn test_describe_reports_socket_path() {
        let path = socket_path();
        let acceptor = UnixSocketAcceptor::bind(&path).unwrap();

        assert_eq!(acceptor.describe(), path.display().to_string());
    }

    #[tokio::test]
    async fn test_drop_removes_socket_file() {
        let path = socket_path();
        drop(UnixSocketAcceptor::bind(&path).unwrap());
        assert!(!path.exists());
    }
}
