//! Typed queries against a reservoir-model socket server.
//!
//! This is the "just works" layer: pick a [`Query`], hand it to a
//! [`Client`] and get back a column-major [`Array`] or typed records.
//! Every exchange runs on its own connection through one generic
//! executor driven by a declarative [`CommandSpec`].

#[cfg(feature = "async")]
pub mod async_exec;
pub mod array;
pub mod client;
pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod outcome;
pub mod query;
pub mod records;
pub mod reshape;
pub mod state;

pub use array::Array;
#[cfg(feature = "async")]
pub use async_exec::TokenCancel;
pub use client::Client;
pub use command::{ByteCountScope, CommandSpec, PayloadLayout, ResponseShape, ZeroCountPolicy};
pub use config::{ClientConfig, HOST_ENV, PORT_ENV};
pub use connection::Connection;
pub use error::{ErrorKind, QueryError, Result};
pub use executor::{execute, execute_upload, Body, Response};
pub use outcome::{Diagnostics, TracingDiagnostics, TransferOutcome};
pub use query::{CaseId, PorosityModel, Query, TimeSteps, Upload};
pub use records::{CaseInfo, GridDimensions, NncConnection, PropertyInfo, TimeStepDate};
pub use resbridge_wire::{CancelFn, Cancellation, NeverCancel, TransferStats};
pub use state::{Exchange, ExchangeState};
