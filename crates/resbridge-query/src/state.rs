use std::fmt;

use tracing::debug;

use crate::error::{ErrorKind, QueryError, Result};

/// Lifecycle of one request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Connecting,
    AwaitingHeader,
    TransferringPayload,
    Complete,
    Failed(ErrorKind),
}

impl ExchangeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExchangeState::Complete | ExchangeState::Failed(_))
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeState::Idle => f.write_str("idle"),
            ExchangeState::Connecting => f.write_str("connecting"),
            ExchangeState::AwaitingHeader => f.write_str("awaiting header"),
            ExchangeState::TransferringPayload => f.write_str("transferring payload"),
            ExchangeState::Complete => f.write_str("complete"),
            ExchangeState::Failed(kind) => write!(f, "failed ({kind})"),
        }
    }
}

/// State of an exchange plus every state it passed through.
#[derive(Debug, Clone)]
pub struct Exchange {
    command: &'static str,
    history: Vec<ExchangeState>,
}

impl Exchange {
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            history: vec![ExchangeState::Idle],
        }
    }

    pub fn command(&self) -> &'static str {
        self.command
    }

    pub fn state(&self) -> ExchangeState {
        self.history
            .last()
            .copied()
            .unwrap_or(ExchangeState::Idle)
    }

    pub fn history(&self) -> &[ExchangeState] {
        &self.history
    }

    /// Move to `next` if the transition is legal.
    ///
    /// Uploads skip the header wait: `Connecting → TransferringPayload`.
    pub fn advance(&mut self, next: ExchangeState) -> Result<()> {
        use ExchangeState::*;

        let from = self.state();
        let legal = match (from, next) {
            (Idle, Connecting) => true,
            (Connecting, AwaitingHeader | TransferringPayload) => true,
            (AwaitingHeader, TransferringPayload | Complete) => true,
            (TransferringPayload, Complete) => true,
            (from, Failed(_)) => !from.is_terminal(),
            _ => false,
        };
        if !legal {
            return Err(QueryError::InvalidState {
                from: from.to_string(),
                to: next.to_string(),
            });
        }
        debug!(command = self.command, %from, to = %next, "exchange transition");
        self.history.push(next);
        Ok(())
    }

    /// Record a failure; terminal exchanges are left untouched.
    pub fn fail(&mut self, kind: ErrorKind) {
        if !self.state().is_terminal() {
            let _ = self.advance(ExchangeState::Failed(kind));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::ExchangeState::*;

    #[test]
    fn download_path() {
        let mut exchange = Exchange::new("GetCases");
        for next in [Connecting, AwaitingHeader, TransferringPayload, Complete] {
            exchange.advance(next).unwrap();
        }
        assert_eq!(
            exchange.history(),
            &[Idle, Connecting, AwaitingHeader, TransferringPayload, Complete]
        );
    }

    #[test]
    fn empty_header_completes_directly() {
        let mut exchange = Exchange::new("GetActiveCellProperty");
        exchange.advance(Connecting).unwrap();
        exchange.advance(AwaitingHeader).unwrap();
        exchange.advance(Complete).unwrap();
        assert!(exchange.state().is_terminal());
    }

    #[test]
    fn cancellation_from_any_live_state() {
        for live in [Idle, Connecting, AwaitingHeader, TransferringPayload] {
            let mut exchange = Exchange::new("GetGridProperty");
            exchange.history.push(live);
            exchange.fail(ErrorKind::Cancelled);
            assert_eq!(exchange.state(), Failed(ErrorKind::Cancelled));
        }
    }

    #[test]
    fn terminal_states_are_final() {
        let mut exchange = Exchange::new("GetCases");
        exchange.advance(Connecting).unwrap();
        exchange.fail(ErrorKind::Connection);
        exchange.fail(ErrorKind::Timeout);
        assert_eq!(exchange.state(), Failed(ErrorKind::Connection));
        assert!(matches!(
            exchange.advance(AwaitingHeader),
            Err(QueryError::InvalidState { .. })
        ));
    }

    #[test]
    fn skipping_states_is_illegal() {
        let mut exchange = Exchange::new("GetCases");
        assert!(exchange.advance(AwaitingHeader).is_err());
        assert!(exchange.advance(Complete).is_err());
        assert_eq!(exchange.history(), &[Idle]);
    }
}
