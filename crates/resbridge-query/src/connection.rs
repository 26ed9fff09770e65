use resbridge_transport::{Socket, TcpSocket};
use resbridge_wire::WireConfig;
use tracing::warn;

use crate::config::ClientConfig;
use crate::error::{QueryError, Result};
use crate::state::{Exchange, ExchangeState};

/// A socket dedicated to exactly one exchange.
///
/// Created per call and dropped afterwards; never pooled or reused.
#[derive(Debug)]
pub struct Connection<S> {
    pub(crate) socket: S,
    pub(crate) wire: WireConfig,
    pub(crate) exchange: Exchange,
}

impl Connection<TcpSocket> {
    /// Connect to the configured server for one `command` exchange.
    pub fn open(config: &ClientConfig, command: &'static str) -> Result<Self> {
        let mut exchange = Exchange::new(command);
        let endpoint = match config.validate() {
            Ok(endpoint) => endpoint,
            Err(err) => {
                exchange.fail(err.kind());
                return Err(err);
            }
        };
        exchange.advance(ExchangeState::Connecting)?;

        let socket = TcpSocket::connect(&endpoint, config.connect_timeout)
            .and_then(|socket| {
                socket.set_write_timeout(Some(config.chunk_timeout))?;
                Ok(socket)
            })
            .map_err(QueryError::from);
        match socket {
            Ok(socket) => Ok(Self {
                socket,
                wire: config.wire(),
                exchange,
            }),
            Err(err) => {
                exchange.fail(err.kind());
                warn!(command, %endpoint, error = %err, "connect failed");
                Err(err)
            }
        }
    }
}

impl<S: Socket> Connection<S> {
    /// Use an already connected socket, such as a scripted one in tests.
    pub fn from_socket(socket: S, wire: WireConfig, command: &'static str) -> Self {
        let mut exchange = Exchange::new(command);
        // Idle -> Connecting is always legal on a fresh exchange.
        let _ = exchange.advance(ExchangeState::Connecting);
        Self {
            socket,
            wire,
            exchange,
        }
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    pub fn socket(&self) -> &S {
        &self.socket
    }

    pub fn wire_config(&self) -> &WireConfig {
        &self.wire
    }

    pub fn into_socket(self) -> S {
        self.socket
    }
}
