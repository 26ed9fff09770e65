//! Host-facing success flag plus diagnostic messages.
//!
//! Numeric hosts want a value they can always index into and a flag telling
//! them whether it is meaningful; they never see a Rust error.

use std::error::Error as _;

use serde::Serialize;
use tracing::warn;

use crate::error::{ErrorKind, Result};

/// Sink for human-readable diagnostics.
pub trait Diagnostics {
    fn report(&mut self, message: &str);
}

/// Forwards diagnostics to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&mut self, message: &str) {
        warn!("{message}");
    }
}

impl Diagnostics for Vec<String> {
    fn report(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub success: bool,
    pub kind: Option<ErrorKind>,
    pub messages: Vec<String>,
}

impl TransferOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            kind: None,
            messages: Vec::new(),
        }
    }

    /// Convert a result into `(value, outcome)`.
    ///
    /// Failures yield `T::default()`, an empty array or list, and every
    /// message in the error's source chain is reported to `sink`.
    pub fn capture<T: Default>(
        command: &str,
        result: Result<T>,
        sink: &mut dyn Diagnostics,
    ) -> (T, Self) {
        match result {
            Ok(value) => (value, Self::ok()),
            Err(err) => {
                let mut messages = vec![format!("{command}: {err}")];
                let mut source = err.source();
                while let Some(cause) = source {
                    messages.push(format!("caused by: {cause}"));
                    source = cause.source();
                }
                for message in &messages {
                    sink.report(message);
                }
                let outcome = Self {
                    success: false,
                    kind: Some(err.kind()),
                    messages,
                };
                (T::default(), outcome)
            }
        }
    }
}
