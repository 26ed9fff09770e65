//! Property tests for chunked block transfer and request framing.

use std::time::Duration;

use bytes::BytesMut;
use proptest::prelude::*;
use resbridge_transport::MemorySocket;
use resbridge_wire::codec::{f64s_from_le, f64s_to_le, put_header, put_text, put_value};
use resbridge_wire::{
    read_catalog, read_header, transfer, Block, CatalogLayout, ElementKind, FieldKind,
    NeverCancel, Request, Value, WireConfig,
};

fn config(max_block_value_count: usize) -> WireConfig {
    WireConfig {
        chunk_timeout: Duration::from_millis(50),
        poll_interval: Duration::from_millis(5),
        max_block_value_count,
        ..WireConfig::default()
    }
}

proptest! {
    #[test]
    fn receive_round_trips_and_obeys_chunk_count(
        values in prop::collection::vec(any::<f64>(), 0..600),
        max_block in 1usize..64,
    ) {
        let bytes = f64s_to_le(&values);
        let mut socket = MemorySocket::new();
        socket.preload(&bytes);

        let mut dst = vec![0u8; bytes.len()];
        let stats = transfer(
            &mut socket,
            Block::Receive(&mut dst),
            ElementKind::F64,
            &config(max_block),
            &NeverCancel,
        ).unwrap();

        let bound = max_block * 8;
        prop_assert_eq!(stats.bytes, bytes.len());
        prop_assert_eq!(stats.chunks, bytes.len().div_ceil(bound));
        if !bytes.is_empty() {
            let tail = bytes.len() % bound;
            prop_assert_eq!(stats.last_chunk, if tail == 0 { bound } else { tail });
        }
        let decoded = f64s_from_le(&dst);
        prop_assert_eq!(decoded.len(), values.len());
        for (a, b) in decoded.iter().zip(&values) {
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn ragged_lengths_obey_chunk_count(
        len in 0usize..4096,
        max_block in 1usize..64,
    ) {
        let data: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
        let mut socket = MemorySocket::new();
        socket.preload(&data);

        let mut dst = vec![0u8; len];
        let stats = transfer(
            &mut socket,
            Block::Receive(&mut dst),
            ElementKind::F64,
            &config(max_block),
            &NeverCancel,
        ).unwrap();

        let bound = max_block * 8;
        prop_assert_eq!(&dst, &data);
        prop_assert_eq!(stats.bytes, len);
        prop_assert_eq!(stats.chunks, len.div_ceil(bound));
        if len > 0 {
            let tail = len % bound;
            prop_assert_eq!(stats.last_chunk, if tail == 0 { bound } else { tail });
        }
    }

    #[test]
    fn send_never_exceeds_the_chunk_bound(
        len in 0usize..2048,
        max_block in 1usize..32,
    ) {
        let data: Vec<u8> = (0..len * 4).map(|i| i as u8).collect();
        let mut socket = MemorySocket::new();
        let stats = transfer(
            &mut socket,
            Block::Send(&data),
            ElementKind::I32,
            &config(max_block),
            &NeverCancel,
        ).unwrap();

        prop_assert_eq!(socket.written(), data.as_slice());
        prop_assert!(socket.write_sizes().iter().all(|n| *n <= max_block * 4));
        prop_assert_eq!(stats.chunks, data.len().div_ceil(max_block * 4));
    }

    #[test]
    fn header_survives_arbitrary_fragmentation(
        fields in prop::collection::vec(any::<u64>(), 1..6),
        split in any::<prop::sample::Index>(),
    ) {
        let mut bytes = BytesMut::new();
        put_header(&mut bytes, &fields);
        let cut = split.index(bytes.len());
        let mut socket = MemorySocket::new();
        socket.push_data(bytes[..cut].to_vec()).push_data(bytes[cut..].to_vec());

        let header = read_header(&mut socket, fields.len(), &WireConfig::default(), &NeverCancel)
            .unwrap();
        prop_assert_eq!(header, fields);
    }

    #[test]
    fn catalog_text_round_trips(
        names in prop::collection::vec("[A-Za-z0-9_\u{e6}\u{f8}\u{e5}]{0,12}", 0..20),
    ) {
        const LAYOUT: CatalogLayout = CatalogLayout {
            counted: true,
            record: &[FieldKind::Text, FieldKind::I32],
        };
        let mut body = BytesMut::new();
        put_value(&mut body, &Value::U64(names.len() as u64));
        for (i, name) in names.iter().enumerate() {
            put_text(&mut body, name);
            put_value(&mut body, &Value::I32(i as i32));
        }
        let mut bytes = BytesMut::new();
        put_header(&mut bytes, &[0]);
        bytes.extend_from_slice(&body);
        let mut socket = MemorySocket::new();
        socket.push_data(bytes.to_vec());

        let records = read_catalog(&mut socket, &LAYOUT, &WireConfig::default(), &NeverCancel)
            .unwrap();
        prop_assert_eq!(records.len(), names.len());
        for (i, (record, name)) in records.iter().zip(&names).enumerate() {
            prop_assert_eq!(record.text(0), Some(name.as_str()));
            prop_assert_eq!(record.i32(1), Some(i as i32));
        }
    }

    #[test]
    fn request_length_prefix_matches_text(
        args in prop::collection::vec("[A-Za-z0-9_\\-]{1,10}", 0..6),
    ) {
        let request = args.iter().fold(Request::new("GetGridProperty"), |r, a| r.arg(a));
        let mut buf = BytesMut::new();
        request.encode(&mut buf).unwrap();

        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&buf[..8]);
        let len = i64::from_be_bytes(prefix) as usize;
        prop_assert_eq!(len, buf.len() - 8);
        let text = request.text();
        prop_assert_eq!(&buf[8..], text.as_bytes());
    }
}
