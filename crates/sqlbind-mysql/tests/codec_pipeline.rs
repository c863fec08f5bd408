//! End-to-end tests: bytes off the wire through framing, classification and
//! column decoding into application records.

use std::sync::Arc;

use bytes::BytesMut;
use serde::{Deserialize, Serialize};

use sqlbind_core::types::column_flags;
use sqlbind_core::{
    Bridge, CollectingSink, ColumnDescriptor, DiagnosticKind, Error, FieldType,
    ProtocolErrorKind, Record, RecordDecoder, RecordEncoder, Result, Value,
};
use sqlbind_mysql::{
    BindBuffer, CodecConfig, ColumnDecoder, PacketFramer, PacketWriter, Response, classify,
    decode_lenenc_int, encode_binary_row, encode_binary_value, encode_lenenc_int, encode_packet,
    parse_binary_row, parse_column_definition,
};

fn protocol_kind(err: &Error) -> Option<ProtocolErrorKind> {
    match err {
        Error::Protocol(p) => Some(p.kind),
        _ => None,
    }
}

#[test]
fn lenenc_roundtrip_at_boundaries() {
    for value in [0, 250, 251, 65_535, 16_777_216, u64::MAX] {
        let encoded = encode_lenenc_int(value).unwrap();
        assert_eq!(decode_lenenc_int(&encoded).unwrap(), (value, encoded.len()));
    }
}

#[test]
fn lenenc_three_byte_range_fails_both_ways() {
    for value in [65_536u64, 1_000_000, 16_777_215] {
        let err = encode_lenenc_int(value).unwrap_err();
        assert_eq!(
            protocol_kind(&err),
            Some(ProtocolErrorKind::UnsupportedLength)
        );
    }

    let err = decode_lenenc_int(&[0xFD, 0x00, 0x00, 0x01]).unwrap_err();
    assert_eq!(
        protocol_kind(&err),
        Some(ProtocolErrorKind::UnsupportedLength)
    );
}

#[test]
fn framing_waits_for_the_whole_packet() {
    let packet = encode_packet(0, b"0123456789").unwrap();
    assert_eq!(packet.len(), 14);

    let framer = PacketFramer::new();
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&packet[..7]);
    assert_eq!(framer.try_frame(&mut buf).unwrap(), None);
    assert_eq!(buf.len(), 7);

    buf.extend_from_slice(&packet[7..]);
    let framed = framer.try_frame(&mut buf).unwrap().unwrap();
    assert_eq!(framed.sequence_id, 0);
    assert_eq!(&framed.payload[..], b"0123456789");
    assert!(buf.is_empty());
}

#[test]
fn classify_ok_and_err() {
    let Response::Ok(ok) = classify(&[0x00, 0x00, 0x00]).unwrap() else {
        panic!("expected OK");
    };
    assert_eq!((ok.affected_rows, ok.last_insert_id), (0, 0));

    let mut err_payload = vec![0xFF];
    err_payload.extend_from_slice(&1146u16.to_le_bytes());
    err_payload.extend_from_slice(b"ERR msg");
    let Response::Err(err) = classify(&err_payload).unwrap() else {
        panic!("expected ERR");
    };
    assert_eq!(err.error_code, 1146);
    assert_eq!(err.error_message, "ERR msg");
}

#[test]
fn tiny_sign_follows_descriptor() {
    let decoder = ColumnDecoder::new();
    let signed = ColumnDescriptor::new("t", FieldType::Tiny);
    let unsigned = ColumnDescriptor::new("t", FieldType::Tiny).unsigned();
    assert_eq!(
        decoder.decode(&unsigned, BindBuffer::new(&[0xFF])).unwrap(),
        Value::UInt(255)
    );
    assert_eq!(
        decoder.decode(&signed, BindBuffer::new(&[0xFF])).unwrap(),
        Value::Int(-1)
    );
}

#[test]
fn zero_date_decodes_as_text() {
    let decoder = ColumnDecoder::new();
    let column = ColumnDescriptor::new("born", FieldType::Date);
    for raw in [&[][..], &[0, 0, 0, 0][..]] {
        assert_eq!(
            decoder.decode(&column, BindBuffer::new(raw)).unwrap(),
            Value::Text("0000-00-00 00:00:00".to_string())
        );
    }
}

#[test]
#[allow(clippy::approx_constant)]
fn decode_inverts_encode() {
    let decoder = ColumnDecoder::new();
    let values = [
        Value::Null,
        Value::Bool(true),
        Value::Int(-1),
        Value::UInt(1),
        Value::Double(3.14),
        Value::Bytes(vec![1, 2, 3]),
        Value::Text("abc".to_string()),
    ];
    for value in values {
        let encoded = encode_binary_value(&value).unwrap();
        let buffer = if value.is_null() {
            BindBuffer::null()
        } else {
            BindBuffer::new(&encoded.bytes)
        };
        let decoded = decoder.decode(&encoded.descriptor("v"), buffer).unwrap();
        assert_eq!(decoded, value);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Status {
    Active,
    Retired,
}

#[derive(Debug, PartialEq)]
struct Hero {
    id: u64,
    name: String,
    status: Status,
    powers: Vec<String>,
    sidekick: Option<String>,
}

impl Record for Hero {
    fn encode_fields(&self, fields: &mut RecordEncoder<'_>) -> Result<()> {
        fields.field("id", &self.id)?;
        fields.field("name", &self.name)?;
        fields.field("status", &self.status)?;
        fields.field("powers", &self.powers)?;
        fields.field("sidekick", &self.sidekick)
    }

    fn decode_fields(fields: &RecordDecoder<'_>) -> Result<Self> {
        Ok(Self {
            id: fields.field("id")?,
            name: fields.field("name")?,
            status: fields.field("status")?,
            powers: fields.field("powers")?,
            sidekick: fields.field("sidekick")?,
        })
    }
}

fn column_definition(name: &str, field_type: FieldType, flags: u16) -> Vec<u8> {
    let mut w = PacketWriter::new();
    for part in ["def", "league", "heroes", "heroes", name, name] {
        w.write_lenenc_string(part).unwrap();
    }
    w.write_lenenc_int(0x0C).unwrap();
    w.write_u16_le(255);
    w.write_u32_le(64);
    w.write_u8(field_type.code());
    w.write_u16_le(flags);
    w.write_u8(0);
    w.write_zeros(2);
    w.into_bytes()
}

#[test]
fn wire_bytes_become_a_record() {
    let definitions = [
        column_definition(
            "id",
            FieldType::LongLong,
            column_flags::NOT_NULL | column_flags::UNSIGNED,
        ),
        column_definition("name", FieldType::VarString, column_flags::NOT_NULL),
        column_definition("status", FieldType::VarString, 0),
        column_definition("powers", FieldType::Json, 0),
        column_definition("sidekick", FieldType::VarString, 0),
    ];
    let row = encode_binary_row(&[
        Value::UInt(42),
        Value::Text("Deadpond".to_string()),
        Value::Text("Active".to_string()),
        Value::Json(serde_json::json!(["regeneration", "puns"])),
        Value::Null,
    ])
    .unwrap();

    let mut wire = BytesMut::new();
    let mut seq = 1u8;
    for payload in definitions.iter().chain(std::iter::once(&row)) {
        wire.extend_from_slice(&encode_packet(seq, payload).unwrap());
        seq = seq.wrapping_add(1);
    }
    wire.extend_from_slice(&encode_packet(seq, &[0xFE, 0x00, 0x00, 0x02, 0x00]).unwrap());

    let framer = PacketFramer::from_config(&CodecConfig::new());
    let mut columns = Vec::new();
    for _ in 0..definitions.len() {
        let packet = framer.try_frame(&mut wire).unwrap().unwrap();
        columns.push(parse_column_definition(&packet.payload).unwrap());
    }
    let columns: Arc<[ColumnDescriptor]> = columns.into();
    assert!(!columns[0].signed);
    assert!(columns[2].nullable);

    let decoder = ColumnDecoder::new();
    let bridge = Bridge::new();
    let mut heroes = Vec::new();
    while let Some(packet) = framer.try_frame(&mut wire).unwrap() {
        // Binary rows also start with 0x00; only terminators are classified.
        if matches!(packet.payload.first(), Some(0xFE | 0xFF)) {
            match classify(&packet.payload).unwrap() {
                Response::Eof(eof) => {
                    assert_eq!(eof.status_flags, 2);
                    break;
                }
                other => panic!("unexpected response {other:?}"),
            }
        }
        let row = parse_binary_row(&packet.payload, &columns, &decoder).unwrap();
        heroes.push(bridge.decode_record::<Hero>(&row).unwrap());
    }

    assert!(wire.is_empty());
    assert_eq!(
        heroes,
        vec![Hero {
            id: 42,
            name: "Deadpond".to_string(),
            status: Status::Active,
            powers: vec!["regeneration".to_string(), "puns".to_string()],
            sidekick: None,
        }]
    );
}

#[test]
fn record_encoded_for_the_wire_comes_back() {
    let bridge = Bridge::new();
    let hero = Hero {
        id: 7,
        name: "Rusty-Man".to_string(),
        status: Status::Retired,
        powers: vec!["borrow checking".to_string()],
        sidekick: Some("Ferris".to_string()),
    };

    let mapping = bridge.encode_record(&hero).unwrap();
    assert_eq!(
        mapping.get("powers"),
        Some(&Value::Text("[\"borrow checking\"]".to_string()))
    );

    let values: Vec<Value> = mapping.iter().map(|(_, v)| v.clone()).collect();
    let columns: Arc<[ColumnDescriptor]> = values
        .iter()
        .zip(mapping.names())
        .map(|(value, name)| encode_binary_value(value).unwrap().descriptor(name))
        .collect();
    let payload = encode_binary_row(&values).unwrap();

    let row = parse_binary_row(&payload, &columns, &ColumnDecoder::new()).unwrap();
    let back: Hero = bridge.decode_record(&row).unwrap();
    assert_eq!(back, hero);
}

#[test]
fn malformed_json_cell_is_reported_not_fatal() {
    let sink = Arc::new(CollectingSink::new());
    let decoder = ColumnDecoder::new().with_sink(sink.clone());
    let columns: Arc<[ColumnDescriptor]> =
        vec![ColumnDescriptor::new("payload", FieldType::Json)].into();

    let mut w = PacketWriter::new();
    w.write_u8(0x00);
    w.write_u8(0x00);
    w.write_lenenc_string("{not json").unwrap();
    let row = parse_binary_row(w.as_bytes(), &columns, &decoder).unwrap();

    assert_eq!(row.get_by_name("payload"), Some(&Value::Null));
    let diagnostics = sink.drain();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::JsonFallbackFailure);
}

#[test]
fn server_error_is_recoverable() {
    let mut payload = vec![0xFF];
    payload.extend_from_slice(&1062u16.to_le_bytes());
    payload.extend_from_slice(b"#23000Duplicate entry '1' for key 'PRIMARY'");
    let Response::Err(err) = classify(&payload).unwrap() else {
        panic!("expected ERR");
    };
    assert!(err.is_duplicate_key());

    let err = err.into_error();
    assert!(!err.is_fatal_for_connection());
    assert_eq!(err.sqlstate(), Some("23000"));
}
