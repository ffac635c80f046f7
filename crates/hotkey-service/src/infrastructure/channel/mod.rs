//! Outbound command channel to the agent.
//!
//! The service is the initiating side.  It dials the agent's local endpoint
//! (a named pipe on Windows, a Unix domain socket elsewhere), keeps at most
//! one live connection, and writes one encoded command per line.  Delivery
//! is at-most-once: a command written while no agent is connected, or on a
//! connection that turns out to be dead, is dropped.
//!
//! # Sub-modules
//!
//! - **`transport`** – The [`Connector`] seam and the platform connectors.
//! - **`initiator`** – [`CommandInitiator`], the reconnect loop and send path.
//! - **`mock`** – A scripted connector for tests.

pub mod initiator;
pub mod mock;
pub mod transport;

pub use initiator::{ChannelError, ChannelState, CommandInitiator, InitiatorConfig};
pub use transport::{BoxedWriter, Connector};
