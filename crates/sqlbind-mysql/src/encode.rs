//! Binary-protocol encoding of single values.
//!
//! The produced bytes are the cell contents a [`ColumnDecoder`] reads back,
//! so `decode(encode(v))` restores `v` for every representable value.
//!
//! [`ColumnDecoder`]: crate::decode::ColumnDecoder

use chrono::{Datelike, Timelike};
use sqlbind_core::error::{EncodeError, EncodeErrorKind};
use sqlbind_core::{ColumnDescriptor, Error, FieldType, Result, Value};

use crate::protocol::PacketWriter;

/// One value in binary-protocol form.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedValue {
    pub field_type: FieldType,
    pub unsigned: bool,
    /// Cell bytes without any length prefix
    pub bytes: Vec<u8>,
}

impl EncodedValue {
    /// A descriptor that decodes these bytes back to the original value.
    pub fn descriptor(&self, name: impl Into<String>) -> ColumnDescriptor {
        let column = ColumnDescriptor::new(name, self.field_type);
        if self.unsigned {
            column.unsigned()
        } else {
            column
        }
    }

    /// Append the cell to a row or parameter block, length-prefixed unless the
    /// type has a fixed width.
    pub fn write_to(&self, writer: &mut PacketWriter) -> Result<()> {
        if self.field_type.fixed_width().is_some() {
            writer.write_bytes(&self.bytes);
            Ok(())
        } else {
            writer.write_lenenc_bytes(&self.bytes)
        }
    }
}

/// Encode a value for the binary protocol.
pub fn encode_binary_value(value: &Value) -> Result<EncodedValue> {
    let (field_type, unsigned, bytes) = match value {
        Value::Null => (FieldType::Null, false, Vec::new()),
        Value::Bool(b) => (FieldType::Bit, true, vec![u8::from(*b)]),
        Value::Int(i) => (FieldType::LongLong, false, i.to_le_bytes().to_vec()),
        Value::UInt(u) => (FieldType::LongLong, true, u.to_le_bytes().to_vec()),
        Value::Double(f) => (FieldType::Double, false, f.to_le_bytes().to_vec()),
        Value::Bytes(b) => (FieldType::Blob, false, b.clone()),
        Value::Text(s) => (FieldType::VarString, false, s.as_bytes().to_vec()),
        Value::Date(d) => (FieldType::DateTime, false, encode_datetime(d)?),
        Value::Json(j) => (FieldType::Json, false, j.to_string().into_bytes()),
    };
    Ok(EncodedValue {
        field_type,
        unsigned,
        bytes,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn encode_datetime(d: &chrono::NaiveDateTime) -> Result<Vec<u8>> {
    let year = u16::try_from(d.year()).map_err(|_| {
        Error::Encode(EncodeError {
            kind: EncodeErrorKind::Unsupported,
            field: None,
            message: format!("year {} is outside the DATETIME range", d.year()),
        })
    })?;
    let micros = d.nanosecond() / 1000;

    let mut writer = PacketWriter::with_capacity(11);
    writer.write_u16_le(year);
    writer.write_u8(d.month() as u8);
    writer.write_u8(d.day() as u8);
    writer.write_u8(d.hour() as u8);
    writer.write_u8(d.minute() as u8);
    writer.write_u8(d.second() as u8);
    if micros > 0 {
        writer.write_u32_le(micros);
    }
    Ok(writer.into_bytes())
}
