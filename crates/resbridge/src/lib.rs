//! Bulk binary client for reservoir-model socket servers.
//!
//! resbridge moves large numeric arrays between a host program and a
//! loopback reservoir visualization server: one request line, a fixed header
//! tuple, then a payload transferred in bounded chunks.
//!
//! # Crate Structure
//!
//! - [`transport`]: Loopback TCP sockets and the in-memory test socket
//! - [`wire`]: Request encoding, header reading and chunked block transfer
//! - [`query`]: Typed queries, command descriptors and reshaped results

/// Re-export transport types.
pub mod transport {
    pub use resbridge_transport::*;
}

/// Re-export wire types.
pub mod wire {
    pub use resbridge_wire::*;
}

/// Re-export query types.
pub mod query {
    pub use resbridge_query::*;
}

pub use resbridge_query::{
    Array, CaseId, Client, ClientConfig, ErrorKind, PorosityModel, Query, QueryError, TimeSteps,
    Upload,
};
