//! Binary-protocol result rows.
//!
//! Row layout:
//! - 0x00 header
//! - NULL bitmap of `(columns + 7 + 2) / 8` bytes, column `i` at bit `i + 2`
//! - non-NULL values in column order, fixed-width types raw, everything else
//!   length-encoded
//!
//! The 0x00 header is the same byte that marks an OK packet, so while rows are
//! being read only 0xFE and 0xFF packets should go through
//! [`classify`](crate::protocol::classify).

use std::sync::Arc;

use sqlbind_core::error::{ProtocolError, ProtocolErrorKind};
use sqlbind_core::{ColumnDescriptor, Error, Result, Row, Value};

use crate::decode::{BindBuffer, ColumnDecoder};
use crate::encode::encode_binary_value;
use crate::protocol::{PacketReader, PacketWriter};

const ROW_HEADER: u8 = 0x00;
const NULL_BITMAP_OFFSET: usize = 2;

fn null_bitmap_len(columns: usize) -> usize {
    (columns + 7 + NULL_BITMAP_OFFSET) / 8
}

/// Parse one binary result row.
pub fn parse_binary_row(
    payload: &[u8],
    columns: &Arc<[ColumnDescriptor]>,
    decoder: &ColumnDecoder,
) -> Result<Row> {
    let mut reader = PacketReader::new(payload);

    let header = reader.read_u8()?;
    if header != ROW_HEADER {
        return Err(Error::Protocol(ProtocolError::new(
            ProtocolErrorKind::MalformedLength,
            format!("binary row starts with 0x{header:02X}, expected 0x00"),
        )));
    }
    let bitmap = reader.read_bytes(null_bitmap_len(columns.len()))?;

    let mut values = Vec::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        let bit = i + NULL_BITMAP_OFFSET;
        let buffer = if bitmap[bit / 8] & (1 << (bit % 8)) != 0 {
            BindBuffer::null()
        } else {
            let raw = match column.field_type.fixed_width() {
                Some(width) => reader.read_bytes(width),
                None => reader.read_lenenc_bytes(),
            }
            .map_err(|e| e.with_field(&column.name))?;
            BindBuffer::new(raw)
        };
        values.push(decoder.decode(column, buffer)?);
    }

    if !reader.is_empty() {
        tracing::debug!(
            trailing = reader.remaining(),
            columns = columns.len(),
            "ignoring trailing bytes after binary row"
        );
    }

    Ok(Row::new(Arc::clone(columns), values))
}

/// Build a binary result row from values, one per column.
///
/// Each value is laid out with the wire type [`encode_binary_value`] picks for
/// it, so the columns used to parse the row back must agree with those types.
pub fn encode_binary_row(values: &[Value]) -> Result<Vec<u8>> {
    let mut writer = PacketWriter::new();
    writer.write_u8(ROW_HEADER);

    let mut bitmap = vec![0u8; null_bitmap_len(values.len())];
    for (i, value) in values.iter().enumerate() {
        if value.is_null() {
            let bit = i + NULL_BITMAP_OFFSET;
            bitmap[bit / 8] |= 1 << (bit % 8);
        }
    }
    writer.write_bytes(&bitmap);

    for value in values.iter().filter(|v| !v.is_null()) {
        encode_binary_value(value)?.write_to(&mut writer)?;
    }
    Ok(writer.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlbind_core::FieldType;

    fn columns() -> Arc<[ColumnDescriptor]> {
        vec![
            ColumnDescriptor::new("id", FieldType::LongLong).table("users"),
            ColumnDescriptor::new("name", FieldType::VarString).table("users"),
            ColumnDescriptor::new("score", FieldType::Double).table("users"),
        ]
        .into()
    }

    #[test]
    fn test_parse_row_with_nulls() {
        let values = vec![Value::Int(7), Value::Null, Value::Double(1.5)];
        let payload = encode_binary_row(&values).unwrap();
        assert_eq!(&payload[..2], &[0x00, 0b0000_1000]);

        let row = parse_binary_row(&payload, &columns(), &ColumnDecoder::new()).unwrap();
        assert_eq!(row.get_by_name("id"), Some(&Value::Int(7)));
        assert_eq!(row.get_by_name("name"), Some(&Value::Null));
        assert_eq!(row.get_qualified("users", "score"), Some(&Value::Double(1.5)));
    }

    #[test]
    fn test_bitmap_spans_bytes() {
        assert_eq!(null_bitmap_len(1), 1);
        assert_eq!(null_bitmap_len(6), 1);
        assert_eq!(null_bitmap_len(7), 2);
    }

    #[test]
    fn test_truncated_value_names_column() {
        let payload = encode_binary_row(&[
            Value::Int(7),
            Value::Text("alice".to_string()),
            Value::Double(1.5),
        ])
        .unwrap();
        let err = parse_binary_row(
            &payload[..payload.len() - 3],
            &columns(),
            &ColumnDecoder::new(),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("score"));
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_rejects_non_row_header() {
        let err = parse_binary_row(&[0xFE, 0x00], &columns(), &ColumnDecoder::new()).unwrap_err();
        assert!(err.is_fatal_for_connection());
    }
}
