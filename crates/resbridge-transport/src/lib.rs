//! Loopback TCP transport for the resbridge protocol.
//!
//! This is the lowest layer of resbridge. It connects to the visualization
//! server on a loopback address and exposes the connected stream through the
//! [`Socket`] trait: a `Read + Write` stream that additionally reports how many
//! bytes are buffered, can wait for readiness with a timeout, and can tell how
//! many written bytes the peer has not yet consumed.
//!
//! Everything above this crate is written against [`Socket`], so tests can
//! substitute a scripted [`MemorySocket`] for [`TcpSocket`].

pub mod endpoint;
pub mod error;
pub mod memory;
pub mod tcp;
pub mod traits;

pub use endpoint::{Endpoint, DEFAULT_HOST, DEFAULT_PORT};
pub use error::{Result, TransportError};
pub use memory::{Inbound, MemorySocket};
pub use tcp::TcpSocket;
pub use traits::{Readiness, Socket, SocketState};
