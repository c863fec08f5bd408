//! Column value decoding for the binary result-set protocol.
//!
//! A [`ColumnDecoder`] turns one bind buffer plus its [`ColumnDescriptor`]
//! into a [`Value`]. Corrupt buffers are fatal errors; cells the codec cannot
//! represent (unknown wire types, unparseable JSON) decode as `Null` and are
//! reported to the decoder's [`DiagnosticSink`].

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDateTime, Timelike};
use sqlbind_core::convert::DATETIME_FORMAT;
use sqlbind_core::error::{ProtocolError, ProtocolErrorKind};
use sqlbind_core::{
    ColumnDescriptor, Diagnostic, DiagnosticKind, DiagnosticSink, Error, FieldType, Result,
    TracingSink, Value,
};

use crate::config::CodecConfig;
use crate::protocol::PacketReader;

/// Converts string column bytes into text.
pub trait TextDecoder: Send + Sync {
    fn decode_text(&self, bytes: &[u8], charset: u16) -> String;
}

/// Lossy UTF-8 for every character set.
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8Text;

impl TextDecoder for Utf8Text {
    fn decode_text(&self, bytes: &[u8], _charset: u16) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// The bytes bound to one cell.
///
/// `length` is the declared length; it may be shorter than `bytes` but never
/// longer.
#[derive(Debug, Clone, Copy)]
pub struct BindBuffer<'a> {
    bytes: &'a [u8],
    length: usize,
    is_null: bool,
}

impl<'a> BindBuffer<'a> {
    /// A NULL cell.
    pub const fn null() -> Self {
        Self {
            bytes: &[],
            length: 0,
            is_null: true,
        }
    }

    /// A cell whose declared length is the whole slice.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_length(bytes, bytes.len())
    }

    pub fn with_length(bytes: &'a [u8], length: usize) -> Self {
        Self {
            bytes,
            length,
            is_null: false,
        }
    }

    pub fn is_null(&self) -> bool {
        self.is_null
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// The declared bytes.
    fn declared(&self) -> Result<&'a [u8]> {
        self.bytes.get(..self.length).ok_or_else(|| {
            malformed(format!(
                "declared length {} exceeds the {} bytes bound",
                self.length,
                self.bytes.len()
            ))
        })
    }

    /// The declared region, which must be exactly `width` bytes.
    fn fixed(&self, width: usize, type_name: &str) -> Result<&'a [u8]> {
        let declared = self.declared()?;
        if declared.len() != width {
            return Err(malformed(format!(
                "expected {width} bytes for {type_name}, got {}",
                declared.len()
            )));
        }
        Ok(declared)
    }
}

fn malformed(message: String) -> Error {
    Error::Protocol(ProtocolError::new(ProtocolErrorKind::MalformedLength, message))
}

/// Decodes binary-protocol cells into [`Value`]s.
///
/// Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct ColumnDecoder {
    json_enabled: bool,
    sink: Arc<dyn DiagnosticSink>,
    text: Arc<dyn TextDecoder>,
}

impl fmt::Debug for ColumnDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDecoder")
            .field("json_enabled", &self.json_enabled)
            .finish_non_exhaustive()
    }
}

impl Default for ColumnDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnDecoder {
    /// JSON enabled, diagnostics to `tracing`, UTF-8 text.
    pub fn new() -> Self {
        Self {
            json_enabled: true,
            sink: Arc::new(TracingSink),
            text: Arc::new(Utf8Text),
        }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::new().json_enabled(config.json_enabled)
    }

    pub fn json_enabled(mut self, enabled: bool) -> Self {
        self.json_enabled = enabled;
        self
    }

    /// Route diagnostics somewhere other than `tracing`.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_text_decoder(mut self, text: Arc<dyn TextDecoder>) -> Self {
        self.text = text;
        self
    }

    /// Decode one cell.
    ///
    /// Errors name the column they occurred in.
    pub fn decode(&self, column: &ColumnDescriptor, buffer: BindBuffer<'_>) -> Result<Value> {
        if buffer.is_null() {
            return Ok(Value::Null);
        }
        self.decode_present(column, buffer)
            .map_err(|e| e.with_field(&column.name))
    }

    fn decode_present(&self, column: &ColumnDescriptor, buffer: BindBuffer<'_>) -> Result<Value> {
        let field_type = column.field_type;
        match field_type {
            FieldType::Null => Ok(Value::Null),
            t if t.is_integer() => decode_integer(column, buffer),
            FieldType::Bit => {
                let raw = buffer.declared()?;
                match raw {
                    [] => Err(malformed("BIT value with no bytes".to_string())),
                    [bit] => Ok(Value::Bool(*bit != 0)),
                    wide => Ok(Value::Bytes(wide.to_vec())),
                }
            }
            FieldType::Float => {
                let mut le = [0u8; 4];
                le.copy_from_slice(buffer.fixed(4, field_type.name())?);
                Ok(Value::Double(f64::from(f32::from_le_bytes(le))))
            }
            FieldType::Double => {
                let mut le = [0u8; 8];
                le.copy_from_slice(buffer.fixed(8, field_type.name())?);
                Ok(Value::Double(f64::from_le_bytes(le)))
            }
            _ if column.is_binary() => Ok(Value::Bytes(buffer.declared()?.to_vec())),
            t if t.is_string() => Ok(Value::Text(
                self.text.decode_text(buffer.declared()?, column.charset),
            )),
            t if t.is_datetime() => decode_datetime(buffer.declared()?),
            t if t.is_time() => decode_time(buffer.declared()?).map(Value::Text),
            FieldType::Json => self.decode_json(column, buffer.declared()?),
            other => {
                self.sink.report(Diagnostic {
                    kind: DiagnosticKind::UnsupportedColumnType,
                    column: column.name.clone(),
                    message: format!("no decoder for type code 0x{:02X}", other.code()),
                });
                Ok(Value::Null)
            }
        }
    }

    fn decode_json(&self, column: &ColumnDescriptor, raw: &[u8]) -> Result<Value> {
        if !self.json_enabled {
            return Ok(Value::Text(self.text.decode_text(raw, column.charset)));
        }
        match serde_json::from_slice(raw) {
            Ok(json) => Ok(Value::Json(json)),
            Err(e) => {
                self.sink.report(Diagnostic {
                    kind: DiagnosticKind::JsonFallbackFailure,
                    column: column.name.clone(),
                    message: e.to_string(),
                });
                Ok(Value::Null)
            }
        }
    }
}

/// Fixed-width little-endian integers, sign- or zero-extended to 64 bits.
#[allow(clippy::cast_possible_truncation)]
fn decode_integer(column: &ColumnDescriptor, buffer: BindBuffer<'_>) -> Result<Value> {
    let field_type = column.field_type;
    let width = field_type.fixed_width().unwrap_or(8);
    let raw = buffer.fixed(width, field_type.name())?;

    let mut le = [0u8; 8];
    le[..width].copy_from_slice(raw);
    let bits = u64::from_le_bytes(le);

    if column.signed {
        let shift = 64 - 8 * width as u32;
        Ok(Value::Int(((bits << shift) as i64) >> shift))
    } else {
        Ok(Value::UInt(bits))
    }
}

/// DATE/DATETIME/TIMESTAMP record: length 0, 4 (date), 7 (+time) or 11
/// (+microseconds).
fn decode_datetime(raw: &[u8]) -> Result<Value> {
    let mut reader = PacketReader::new(raw);
    let (mut year, mut month, mut day) = (0u16, 0u8, 0u8);
    let (mut hour, mut minute, mut second, mut micros) = (0u8, 0u8, 0u8, 0u32);

    match raw.len() {
        0 => {}
        4 | 7 | 11 => {
            year = reader.read_u16_le()?;
            month = reader.read_u8()?;
            day = reader.read_u8()?;
            if raw.len() >= 7 {
                hour = reader.read_u8()?;
                minute = reader.read_u8()?;
                second = reader.read_u8()?;
            }
            if raw.len() == 11 {
                micros = reader.read_u32_le()?;
            }
        }
        other => {
            return Err(malformed(format!(
                "datetime record of {other} bytes (expected 0, 4, 7 or 11)"
            )));
        }
    }

    let formatted =
        format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}");
    let Ok(parsed) = NaiveDateTime::parse_from_str(&formatted, DATETIME_FORMAT) else {
        // Zero dates and other out-of-calendar values keep their wire text.
        return Ok(Value::Text(formatted));
    };
    if micros == 0 {
        return Ok(Value::Date(parsed));
    }
    if micros >= 1_000_000 {
        return Err(malformed(format!(
            "datetime microseconds {micros} out of range"
        )));
    }
    Ok(parsed
        .with_nanosecond(micros * 1000)
        .map_or(Value::Text(formatted), Value::Date))
}

/// TIME record: length 0, 8 (sign, days, h, m, s) or 12 (+microseconds).
fn decode_time(raw: &[u8]) -> Result<String> {
    match raw.len() {
        0 => Ok("00:00:00".to_string()),
        8 | 12 => {
            let mut reader = PacketReader::new(raw);
            let is_negative = reader.read_u8()? != 0;
            let days = reader.read_u32_le()?;
            let hours = reader.read_u8()?;
            let minutes = reader.read_u8()?;
            let seconds = reader.read_u8()?;
            let total_hours = u64::from(days) * 24 + u64::from(hours);
            let sign = if is_negative { "-" } else { "" };
            Ok(format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}"))
        }
        other => Err(malformed(format!(
            "time record of {other} bytes (expected 0, 8 or 12)"
        ))),
    }
}
