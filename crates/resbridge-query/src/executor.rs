//! The one generic exchange driver.
//!
//! `execute` sends a request, reads the header the descriptor names, applies
//! the zero-count policy and fills the payload column by column. Commands
//! differ only in their [`CommandSpec`]; reshaping happens afterwards in the
//! client adapters.

use resbridge_transport::Socket;
use resbridge_wire::{
    confirm_delivery, read_catalog, read_header, send_request, transfer, write_header, Block,
    Cancellation, CatalogLayout, ElementKind, Record, Request, TransferStats,
};
use tracing::{debug, warn};

use crate::command::{CommandSpec, ResponseShape, ZeroCountPolicy};
use crate::connection::Connection;
use crate::error::{QueryError, Result};
use crate::state::ExchangeState;

/// Everything the server returned for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub command: &'static str,
    pub header: Vec<u64>,
    pub body: Body,
    pub stats: TransferStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// The header was the whole answer.
    None,
    /// Raw little-endian payload bytes, in server order.
    Payload(Vec<u8>),
    Records(Vec<Record>),
}

impl Response {
    pub fn payload(&self) -> &[u8] {
        match &self.body {
            Body::Payload(bytes) => bytes,
            _ => &[],
        }
    }

    pub fn records(&self) -> &[Record] {
        match &self.body {
            Body::Records(records) => records,
            _ => &[],
        }
    }
}

/// Run one read-direction exchange on a fresh connection.
pub fn execute<S, C>(
    connection: &mut Connection<S>,
    spec: &'static CommandSpec,
    request: &Request,
    cancel: &C,
) -> Result<Response>
where
    S: Socket,
    C: Cancellation + ?Sized,
{
    let result = run_download(connection, spec, request, cancel);
    finish(connection, spec, &result);
    result
}

/// Run one upload: request, client header, payload, delivery confirmation.
pub fn execute_upload<S, C>(
    connection: &mut Connection<S>,
    spec: &'static CommandSpec,
    request: &Request,
    header: &[u64],
    payload: &[u8],
    cancel: &C,
) -> Result<TransferStats>
where
    S: Socket,
    C: Cancellation + ?Sized,
{
    let result = run_upload(connection, spec, request, header, payload, cancel);
    finish(connection, spec, &result);
    result
}

fn finish<S, T>(connection: &mut Connection<S>, spec: &CommandSpec, result: &Result<T>) {
    if let Err(err) = result {
        connection.exchange.fail(err.kind());
        warn!(command = spec.name, kind = %err.kind(), error = %err, "exchange failed");
    }
}

fn run_download<S, C>(
    connection: &mut Connection<S>,
    spec: &'static CommandSpec,
    request: &Request,
    cancel: &C,
) -> Result<Response>
where
    S: Socket,
    C: Cancellation + ?Sized,
{
    let answer = Answer::of(spec)?;
    let Connection {
        socket,
        wire,
        exchange,
    } = connection;
    if exchange.state() != ExchangeState::Connecting {
        return Err(QueryError::InvalidState {
            from: exchange.state().to_string(),
            to: ExchangeState::AwaitingHeader.to_string(),
        });
    }

    cancel.checkpoint()?;
    send_request(socket, request, wire)?;
    exchange.advance(ExchangeState::AwaitingHeader)?;

    let mut response = Response {
        command: spec.name,
        header: Vec::new(),
        body: Body::None,
        stats: TransferStats::default(),
    };

    match answer {
        Answer::HeaderOnly { fields } => {
            response.header = read_header(socket, fields, wire, cancel)?;
        }
        Answer::Catalog(layout) => {
            let records = read_catalog(socket, &layout, wire, cancel)?;
            if records.is_empty() {
                zero_count(spec)?;
            }
            response.body = Body::Records(records);
        }
        Answer::Block { fields, element } => {
            response.header = read_header(socket, fields, wire, cancel)?;
            let Some(layout) = spec.payload_layout(&response.header)? else {
                return Err(QueryError::shape(spec.name, "block command without payload"));
            };
            if layout.total == 0 {
                zero_count(spec)?;
                response.body = Body::Payload(Vec::new());
            } else {
                let mut body = Vec::new();
                body.try_reserve_exact(layout.total).map_err(|_| {
                    QueryError::shape(
                        spec.name,
                        format!("cannot allocate {} payload bytes", layout.total),
                    )
                })?;
                body.resize(layout.total, 0);
                exchange.advance(ExchangeState::TransferringPayload)?;

                for column in body.chunks_mut(layout.column_len()) {
                    let stats = transfer(socket, Block::Receive(column), element, wire, cancel)?;
                    response.stats.bytes += stats.bytes;
                    response.stats.chunks += stats.chunks;
                    response.stats.last_chunk = stats.last_chunk;
                }
                if response.stats.bytes != layout.total {
                    return Err(QueryError::shape(
                        spec.name,
                        format!(
                            "transferred {} of {} declared bytes",
                            response.stats.bytes, layout.total
                        ),
                    ));
                }
                response.body = Body::Payload(body);
            }
        }
    }

    exchange.advance(ExchangeState::Complete)?;
    debug!(
        command = spec.name,
        header = ?response.header,
        bytes = response.stats.bytes,
        chunks = response.stats.chunks,
        "exchange complete"
    );
    Ok(response)
}

fn run_upload<S, C>(
    connection: &mut Connection<S>,
    spec: &'static CommandSpec,
    request: &Request,
    header: &[u64],
    payload: &[u8],
    cancel: &C,
) -> Result<TransferStats>
where
    S: Socket,
    C: Cancellation + ?Sized,
{
    let ResponseShape::Upload { fields, element } = spec.shape else {
        return Err(QueryError::InvalidArgument(format!(
            "{} is not an upload command",
            spec.name
        )));
    };
    if header.len() != fields {
        return Err(QueryError::shape(
            spec.name,
            format!("upload header needs {fields} fields, got {}", header.len()),
        ));
    }
    if payload.len() % element.size() != 0 {
        return Err(QueryError::shape(
            spec.name,
            format!("{} bytes is not a whole number of elements", payload.len()),
        ));
    }
    if payload.is_empty() {
        zero_count(spec)?;
    }

    let Connection {
        socket,
        wire,
        exchange,
    } = connection;
    if exchange.state() != ExchangeState::Connecting {
        return Err(QueryError::InvalidState {
            from: exchange.state().to_string(),
            to: ExchangeState::TransferringPayload.to_string(),
        });
    }

    cancel.checkpoint()?;
    send_request(socket, request, wire)?;
    write_header(socket, header, wire)?;
    exchange.advance(ExchangeState::TransferringPayload)?;
    let stats = transfer(socket, Block::Send(payload), element, wire, cancel)?;
    confirm_delivery(socket, wire.chunk_timeout, cancel)?;
    exchange.advance(ExchangeState::Complete)?;
    debug!(
        command = spec.name,
        bytes = stats.bytes,
        chunks = stats.chunks,
        "upload delivered"
    );
    Ok(stats)
}

fn zero_count(spec: &'static CommandSpec) -> Result<()> {
    match spec.zero_count {
        ZeroCountPolicy::Empty => Ok(()),
        ZeroCountPolicy::Fail(reason) => Err(QueryError::NoData {
            command: spec.name,
            reason,
        }),
    }
}

/// The read side of a descriptor. Upload commands have none.
enum Answer {
    HeaderOnly { fields: usize },
    Catalog(CatalogLayout),
    Block { fields: usize, element: ElementKind },
}

impl Answer {
    fn of(spec: &CommandSpec) -> Result<Self> {
        match spec.shape {
            ResponseShape::HeaderOnly { fields } => Ok(Answer::HeaderOnly { fields }),
            ResponseShape::Catalog(layout) => Ok(Answer::Catalog(layout)),
            ResponseShape::Block {
                fields, element, ..
            } => Ok(Answer::Block { fields, element }),
            ResponseShape::Upload { .. } => Err(QueryError::InvalidArgument(format!(
                "{} is an upload command",
                spec.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use bytes::{BufMut, BytesMut};
    use resbridge_transport::MemorySocket;
    use resbridge_wire::{f64s_to_le, put_header, put_text, NeverCancel, WireConfig};

    use super::*;
    use crate::command::{
        GET_ACTIVE_CELL_CENTERS, GET_ACTIVE_CELL_PROPERTY, GET_GRID_PROPERTY,
        GET_MAIN_GRID_DIMENSIONS, GET_PROPERTY_NAMES, SET_ACTIVE_CELL_PROPERTY,
    };
    use crate::error::ErrorKind;
    use crate::state::ExchangeState::*;

    fn connection(socket: MemorySocket, command: &'static str) -> Connection<MemorySocket> {
        Connection::from_socket(socket, WireConfig::default(), command)
    }

    fn header(fields: &[u64]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        put_header(&mut buf, fields);
        buf.to_vec()
    }

    #[test]
    fn active_cell_property_transfers_one_block_per_time_step() {
        let values: Vec<f64> = (0..2000).map(f64::from).collect();
        let mut socket = MemorySocket::new();
        socket.preload(&header(&[2, 16_000])).preload(&f64s_to_le(&values));
        let mut conn = connection(socket, GET_ACTIVE_CELL_PROPERTY.name);

        let request = Request::new("GetActiveCellProperty").arg(-1).arg("PORO");
        let response = execute(&mut conn, &GET_ACTIVE_CELL_PROPERTY, &request, &NeverCancel)
            .unwrap();

        assert_eq!(response.header, vec![2, 16_000]);
        assert_eq!(response.payload().len(), 16_000);
        assert_eq!(response.stats.chunks, 2);
        assert_eq!(response.stats.last_chunk, 8_000);
        assert_eq!(&response.payload()[8_000..8_008], &1000f64.to_le_bytes());
        assert_eq!(
            conn.exchange().history(),
            &[Idle, Connecting, AwaitingHeader, TransferringPayload, Complete]
        );
    }

    #[test]
    fn grid_property_byte_count_is_per_time_step() {
        let mut socket = MemorySocket::new();
        socket
            .preload(&header(&[10, 10, 5, 3, 4_000]))
            .preload(&vec![0u8; 12_000]);
        let mut conn = connection(socket, GET_GRID_PROPERTY.name);

        let response = execute(
            &mut conn,
            &GET_GRID_PROPERTY,
            &Request::new("GetGridProperty"),
            &NeverCancel,
        )
        .unwrap();
        assert_eq!(response.stats.bytes, 12_000);
    }

    #[test]
    fn zero_count_empty_policy_completes_without_transfer() {
        let mut socket = MemorySocket::new();
        socket.preload(&header(&[0, 0]));
        let mut conn = connection(socket, GET_ACTIVE_CELL_PROPERTY.name);

        let response = execute(
            &mut conn,
            &GET_ACTIVE_CELL_PROPERTY,
            &Request::new("GetActiveCellProperty"),
            &NeverCancel,
        )
        .unwrap();
        assert!(response.payload().is_empty());
        assert_eq!(response.stats, TransferStats::default());
        assert_eq!(
            conn.exchange().history(),
            &[Idle, Connecting, AwaitingHeader, Complete]
        );
    }

    #[test]
    fn zero_count_fail_policy_reports_no_data() {
        let mut socket = MemorySocket::new();
        socket.preload(&header(&[0, 0]));
        let mut conn = connection(socket, GET_ACTIVE_CELL_CENTERS.name);

        let err = execute(
            &mut conn,
            &GET_ACTIVE_CELL_CENTERS,
            &Request::new("GetActiveCellCenters"),
            &NeverCancel,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoData);
        assert_eq!(conn.exchange().state(), Failed(ErrorKind::NoData));
    }

    #[test]
    fn empty_catalog_completes_without_transfer() {
        let mut socket = MemorySocket::new();
        socket.preload(&header(&[8, 0]));
        let mut conn = connection(socket, GET_PROPERTY_NAMES.name);

        let response = execute(
            &mut conn,
            &GET_PROPERTY_NAMES,
            &Request::new("GetPropertyNames"),
            &NeverCancel,
        )
        .unwrap();
        assert!(response.records().is_empty());
        assert_eq!(response.stats.chunks, 0);
        assert_eq!(conn.exchange().state(), Complete);
    }

    #[test]
    fn catalog_records_are_returned() {
        let mut body = BytesMut::new();
        body.put_u64(1);
        put_text(&mut body, "SWAT");
        put_text(&mut body, "DynamicNative");
        let mut socket = MemorySocket::new();
        socket.preload(&header(&[42])).preload(&body);
        let mut conn = connection(socket, GET_PROPERTY_NAMES.name);

        let response = execute(
            &mut conn,
            &GET_PROPERTY_NAMES,
            &Request::new("GetPropertyNames"),
            &NeverCancel,
        )
        .unwrap();
        assert_eq!(response.records()[0].text(0), Some("SWAT"));
    }

    #[test]
    fn header_only_command() {
        let mut socket = MemorySocket::new();
        socket.preload(&header(&[46, 112, 22]));
        let mut conn = connection(socket, GET_MAIN_GRID_DIMENSIONS.name);
        let response = execute(
            &mut conn,
            &GET_MAIN_GRID_DIMENSIONS,
            &Request::new("GetMainGridDimensions"),
            &NeverCancel,
        )
        .unwrap();
        assert_eq!(response.header, vec![46, 112, 22]);
        assert_eq!(response.body, Body::None);
    }

    #[test]
    fn header_timeout_never_allocates_payload() {
        let wire = WireConfig {
            header_timeout: std::time::Duration::from_millis(30),
            poll_interval: std::time::Duration::from_millis(5),
            ..WireConfig::default()
        };
        let mut conn = Connection::from_socket(
            MemorySocket::new(),
            wire,
            GET_ACTIVE_CELL_PROPERTY.name,
        );
        let err = execute(
            &mut conn,
            &GET_ACTIVE_CELL_PROPERTY,
            &Request::new("GetActiveCellProperty"),
            &NeverCancel,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(
            conn.exchange().history(),
            &[Idle, Connecting, AwaitingHeader, Failed(ErrorKind::Timeout)]
        );
    }

    #[test]
    fn cancellation_before_send_writes_nothing() {
        let mut conn = connection(MemorySocket::new(), GET_ACTIVE_CELL_PROPERTY.name);
        let err = execute(
            &mut conn,
            &GET_ACTIVE_CELL_PROPERTY,
            &Request::new("GetActiveCellProperty"),
            &AtomicBool::new(true),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(conn.socket().written().is_empty());
    }

    #[test]
    fn connection_is_single_use() {
        let mut socket = MemorySocket::new();
        socket.preload(&header(&[1, 2, 3]));
        let mut conn = connection(socket, GET_MAIN_GRID_DIMENSIONS.name);
        let request = Request::new("GetMainGridDimensions");
        execute(&mut conn, &GET_MAIN_GRID_DIMENSIONS, &request, &NeverCancel).unwrap();

        let err = execute(&mut conn, &GET_MAIN_GRID_DIMENSIONS, &request, &NeverCancel)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(conn.exchange().state(), Complete);
    }

    #[test]
    fn upload_writes_request_header_and_payload() {
        let values = f64s_to_le(&[1.0, 2.0, 3.0]);
        let mut conn = connection(MemorySocket::new(), SET_ACTIVE_CELL_PROPERTY.name);
        let request = Request::new("SetActiveCellProperty").arg(-1).arg("NEW");

        let stats = execute_upload(
            &mut conn,
            &SET_ACTIVE_CELL_PROPERTY,
            &request,
            &[1, 24],
            &values,
            &NeverCancel,
        )
        .unwrap();
        assert_eq!(stats.bytes, 24);

        let written = conn.socket().written();
        let text_len = request.text().len();
        assert_eq!(&written[8 + text_len..8 + text_len + 16], &header(&[1, 24])[..]);
        assert_eq!(&written[8 + text_len + 16..], &values[..]);
        assert_eq!(
            conn.exchange().history(),
            &[Idle, Connecting, TransferringPayload, Complete]
        );
    }

    #[test]
    fn refused_upload_is_a_rejected_transfer() {
        let values = f64s_to_le(&[0.5; 100]);
        let request = Request::new("SetActiveCellProperty").arg(-1).arg("NEW");
        let prefix = 8 + request.text().len() + 16;
        let socket = MemorySocket::new().refusing_after(prefix + 80);
        let mut conn = connection(socket, SET_ACTIVE_CELL_PROPERTY.name);

        let err = execute_upload(
            &mut conn,
            &SET_ACTIVE_CELL_PROPERTY,
            &request,
            &[1, 800],
            &values,
            &NeverCancel,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RejectedTransfer);
        assert_eq!(
            conn.exchange().state(),
            Failed(ErrorKind::RejectedTransfer)
        );
    }

    #[test]
    fn upload_header_arity_is_checked() {
        let mut conn = connection(MemorySocket::new(), SET_ACTIVE_CELL_PROPERTY.name);
        let err = execute_upload(
            &mut conn,
            &SET_ACTIVE_CELL_PROPERTY,
            &Request::new("SetActiveCellProperty"),
            &[1],
            &[0; 8],
            &NeverCancel,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
        assert!(conn.socket().written().is_empty());
    }

    #[test]
    fn huge_column_count_is_a_shape_error() {
        let mut socket = MemorySocket::new();
        socket.preload(&header(&[1 << 62, 16_000]));
        let mut conn = connection(socket, GET_ACTIVE_CELL_PROPERTY.name);

        let err = execute(
            &mut conn,
            &GET_ACTIVE_CELL_PROPERTY,
            &Request::new("GetActiveCellProperty"),
            &NeverCancel,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
        assert_eq!(conn.exchange().state(), Failed(ErrorKind::Shape));
    }

    #[test]
    fn upload_command_cannot_be_read() {
        let mut conn = connection(MemorySocket::new(), SET_ACTIVE_CELL_PROPERTY.name);
        let err = execute(
            &mut conn,
            &SET_ACTIVE_CELL_PROPERTY,
            &Request::new("SetActiveCellProperty"),
            &NeverCancel,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(conn.socket().written().is_empty());
    }
}
