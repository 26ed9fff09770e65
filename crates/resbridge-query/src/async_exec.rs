//! Async entry points for tokio hosts.
//!
//! Exchanges stay blocking; they run on the blocking pool and observe a
//! [`CancellationToken`] at every poll.

use resbridge_wire::{Cancellation, TransferStats};
use tokio_util::sync::CancellationToken;

use crate::array::Array;
use crate::client::Client;
use crate::error::{QueryError, Result};
use crate::executor::Response;
use crate::query::{Query, Upload};

/// A [`CancellationToken`] as an exchange cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct TokenCancel(pub CancellationToken);

impl Cancellation for TokenCancel {
    fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

impl Client {
    /// [`Client::run`] on the blocking pool.
    pub async fn run_async(&self, query: Query, token: CancellationToken) -> Result<Response> {
        let client = self.clone();
        let cancel = TokenCancel(token);
        tokio::task::spawn_blocking(move || client.run(&query, &cancel))
            .await
            .map_err(|err| QueryError::Join(err.to_string()))?
    }

    /// [`Client::upload`] on the blocking pool.
    pub async fn upload_async(
        &self,
        upload: Upload,
        values: Array<f64>,
        token: CancellationToken,
    ) -> Result<TransferStats> {
        let client = self.clone();
        let cancel = TokenCancel(token);
        tokio::task::spawn_blocking(move || client.upload(&upload, &values, &cancel))
            .await
            .map_err(|err| QueryError::Join(err.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ErrorKind;
    use crate::query::CaseId;

    #[test]
    fn token_drives_cancellation() {
        let cancel = TokenCancel::default();
        assert!(cancel.checkpoint().is_ok());
        cancel.0.cancel();
        assert!(cancel.checkpoint().is_err());
    }

    #[tokio::test]
    async fn cancelled_token_stops_a_silent_exchange() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            std::thread::sleep(Duration::from_millis(500));
            drop(stream);
        });

        let client = Client::new(ClientConfig {
            port,
            poll_interval: Duration::from_millis(10),
            ..ClientConfig::default()
        })
        .unwrap();
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = client
            .run_async(Query::MainGridDimensions { case: CaseId::CURRENT }, token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        server.join().unwrap();
    }
}
