//! Classification of server response packets.
//!
//! The leading byte of a payload decides its kind:
//! - `0x00`: OK
//! - `0xFF`: ERR
//! - `0xFE` with exactly 5 bytes: EOF; with any other length it is an OK
//!   packet (servers with CLIENT_DEPRECATE_EOF end result sets this way)
//! - anything else: row or result-set data

use sqlbind_core::error::{ProtocolError, ServerError};
use sqlbind_core::{Error, Result};

use crate::protocol::PacketReader;

const OK_MARKER: u8 = 0x00;
const EOF_MARKER: u8 = 0xFE;
const ERR_MARKER: u8 = 0xFF;
const EOF_PACKET_LEN: usize = 5;

/// A classified server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok(OkPacket),
    Err(ErrPacket),
    Eof(EofPacket),
    /// Row or result-set data, left to the caller
    Other,
}

/// Parsed OK packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OkPacket {
    /// Number of affected rows
    pub affected_rows: u64,
    /// Last insert ID
    pub last_insert_id: u64,
    /// Server status flags
    pub status_flags: u16,
    /// Number of warnings
    pub warnings: u16,
    /// Info string (if any)
    pub info: String,
}

/// Parsed Error packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrPacket {
    /// Error code
    pub error_code: u16,
    /// SQL state (5 characters), absent on pre-4.1 servers
    pub sql_state: Option<String>,
    /// Error message
    pub error_message: String,
}

impl ErrPacket {
    /// Check if this is a unique constraint violation.
    pub fn is_duplicate_key(&self) -> bool {
        // ER_DUP_ENTRY
        self.error_code == 1062
    }

    /// Check if this is a foreign key constraint violation.
    pub fn is_foreign_key_violation(&self) -> bool {
        self.error_code == 1451 || self.error_code == 1452
    }

    /// Convert into the recoverable server error.
    pub fn into_error(self) -> Error {
        Error::Server(ServerError {
            code: self.error_code,
            sql_state: self.sql_state,
            message: self.error_message,
        })
    }
}

/// Parsed EOF packet (deprecated in newer MySQL versions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EofPacket {
    /// Number of warnings
    pub warnings: u16,
    /// Server status flags
    pub status_flags: u16,
}

/// Classify a packet payload by its leading byte.
pub fn classify(payload: &[u8]) -> Result<Response> {
    let Some(&first) = payload.first() else {
        return Err(ProtocolError::insufficient(1, 0).into());
    };
    match first {
        OK_MARKER => parse_ok(payload).map(Response::Ok),
        EOF_MARKER if payload.len() == EOF_PACKET_LEN => parse_eof(payload).map(Response::Eof),
        EOF_MARKER => parse_ok(payload).map(Response::Ok),
        ERR_MARKER => parse_err(payload).map(Response::Err),
        _ => Ok(Response::Other),
    }
}

/// OK packet layout after the marker:
/// - affected_rows: lenenc int
/// - last_insert_id: lenenc int
/// - status_flags: 2 bytes (optional)
/// - warnings: 2 bytes (optional)
/// - info: rest of packet (optional)
fn parse_ok(payload: &[u8]) -> Result<OkPacket> {
    let mut reader = PacketReader::new(payload);
    reader.skip(1)?;

    let affected_rows = reader.read_lenenc_int()?;
    let last_insert_id = reader.read_lenenc_int()?;
    let status_flags = if reader.remaining() >= 2 {
        reader.read_u16_le()?
    } else {
        0
    };
    let warnings = if reader.remaining() >= 2 {
        reader.read_u16_le()?
    } else {
        0
    };
    let info = reader.read_rest_string();

    Ok(OkPacket {
        affected_rows,
        last_insert_id,
        status_flags,
        warnings,
        info,
    })
}

/// ERR packet layout after the marker:
/// - error_code: 2 bytes
/// - optional '#' marker followed by a 5-byte SQL state
/// - error_message: rest of packet
fn parse_err(payload: &[u8]) -> Result<ErrPacket> {
    let mut reader = PacketReader::new(payload);
    reader.skip(1)?;

    let error_code = reader.read_u16_le()?;
    let sql_state = if reader.peek() == Some(b'#') {
        reader.skip(1)?;
        Some(reader.read_string(5)?)
    } else {
        None
    };
    let error_message = reader.read_rest_string();

    Ok(ErrPacket {
        error_code,
        sql_state,
        error_message,
    })
}

fn parse_eof(payload: &[u8]) -> Result<EofPacket> {
    let mut reader = PacketReader::new(payload);
    reader.skip(1)?;

    let warnings = reader.read_u16_le()?;
    let status_flags = reader.read_u16_le()?;
    Ok(EofPacket {
        warnings,
        status_flags,
    })
}
