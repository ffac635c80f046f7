//! Named pipe endpoint.
//!
//! Each `accept` creates a fresh single-instance, inbound-only pipe with the
//! DACL from [`PipeSecurity`] and waits for the service to connect.  Remote
//! clients are rejected by the pipe itself.  The instance is closed when the
//! session's reader is dropped, so the next `accept` can create the pipe
//! again under the same name.

use std::ffi::c_void;

use async_trait::async_trait;
use tokio::net::windows::named_pipe::{PipeMode, ServerOptions};
use tracing::debug;

use super::security::PipeSecurity;
use super::{Acceptor, BoxedReader, EndpointError};

/// Accepts connections on a named pipe.
pub struct NamedPipeAcceptor {
    name: String,
    security: PipeSecurity,
}

impl NamedPipeAcceptor {
    /// Prepares the access policy.  The pipe itself is created per accept.
    ///
    /// # Errors
    ///
    /// [`EndpointError::Security`] if the current user's SID cannot be read.
    pub fn new(name: impl Into<String>) -> Result<Self, EndpointError> {
        Ok(Self {
            name: name.into(),
            security: PipeSecurity::for_current_user()?,
        })
    }
}

#[async_trait]
impl Acceptor for NamedPipeAcceptor {
    async fn accept(&mut self) -> Result<BoxedReader, EndpointError> {
        let mut attributes = self.security.attributes();

        // SAFETY: `attributes` and the descriptor it points to outlive the call.
        let server = unsafe {
            ServerOptions::new()
                .first_pipe_instance(true)
                .max_instances(1)
                .access_inbound(true)
                .access_outbound(false)
                .reject_remote_clients(true)
                .pipe_mode(PipeMode::Byte)
                .create_with_security_attributes_raw(
                    &self.name,
                    &mut attributes as *mut _ as *mut c_void,
                )
        }
        .map_err(|source| EndpointError::Create {
            endpoint: self.name.clone(),
            source,
        })?;

        debug!(pipe = %self.name, "waiting for service");
        server.connect().await?;
        Ok(Box::new(server))
    }

    fn describe(&self) -> &str {
        &self.name
    }
}
