use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::error::{Result, TransportError};

/// Default server host. The protocol carries no authentication, so only
/// loopback addresses are accepted.
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Well-known default server port.
pub const DEFAULT_PORT: u16 = 40001;

/// Loopback address of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    addr: SocketAddr,
}

impl Endpoint {
    /// Build an endpoint, rejecting anything that is not loopback.
    pub fn new(host: IpAddr, port: u16) -> Result<Self> {
        if !host.is_loopback() {
            return Err(TransportError::NotLoopback(host.to_string()));
        }
        Ok(Self {
            addr: SocketAddr::new(host, port),
        })
    }

    /// Parse `host` as an IP literal or `localhost`.
    pub fn parse(host: &str, port: u16) -> Result<Self> {
        let host = host.trim();
        let ip = if host.eq_ignore_ascii_case("localhost") {
            DEFAULT_HOST
        } else {
            host.parse::<IpAddr>()
                .map_err(|_| TransportError::InvalidHost(host.to_string()))?
        };
        Self::new(ip, port)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(DEFAULT_HOST, DEFAULT_PORT),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_loopback_well_known_port() {
        let endpoint = Endpoint::default();
        assert!(endpoint.addr().ip().is_loopback());
        assert_eq!(endpoint.port(), DEFAULT_PORT);
    }

    #[test]
    fn parse_accepts_localhost_and_literals() {
        assert_eq!(
            Endpoint::parse("localhost", 4000).unwrap().addr(),
            "127.0.0.1:4000".parse().unwrap()
        );
        assert_eq!(
            Endpoint::parse("::1", 4000).unwrap().addr(),
            "[::1]:4000".parse().unwrap()
        );
    }

    #[test]
    fn rejects_non_loopback_host() {
        let err = Endpoint::parse("10.0.0.7", 40001).unwrap_err();
        assert!(matches!(err, TransportError::NotLoopback(_)));
    }

    #[test]
    fn rejects_hostnames() {
        let err = Endpoint::parse("example.org", 40001).unwrap_err();
        assert!(matches!(err, TransportError::InvalidHost(_)));
    }
}
