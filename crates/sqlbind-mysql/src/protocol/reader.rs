//! MySQL packet reading utilities.
//!
//! Every read is bounds-checked: a short buffer fails with
//! [`ProtocolErrorKind::Insufficient`] and the reader never looks past the end
//! of its slice.

use sqlbind_core::error::{ProtocolError, ProtocolErrorKind};
use sqlbind_core::{Error, Result};

/// A cursor over one packet payload.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    /// Create a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get remaining bytes in the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if we've reached the end of the data.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Peek at the next byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Read a fixed number of bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if available < len {
            return Err(ProtocolError::insufficient(len, available).into());
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_array::<1>().map(|[b]| b)
    }

    /// Read a u16 (little-endian).
    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Read a u32 (little-endian).
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read a u64 (little-endian).
    pub fn read_u64_le(&mut self) -> Result<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Read a length-encoded integer.
    ///
    /// - 0x00-0xFA: 1-byte value
    /// - 0xFC: 2-byte value follows
    /// - 0xFD: 3-byte value follows (not supported)
    /// - 0xFE: 8-byte value follows
    /// - 0xFB, 0xFF: NULL and ERR markers, not integers
    pub fn read_lenenc_int(&mut self) -> Result<u64> {
        let first = self.read_u8()?;
        match first {
            0x00..=0xFA => Ok(u64::from(first)),
            0xFC => self.read_u16_le().map(u64::from),
            0xFD => Err(ProtocolError::new(
                ProtocolErrorKind::UnsupportedLength,
                "3-byte length-encoded integers are not supported",
            )
            .into()),
            0xFE => self.read_u64_le(),
            0xFB | 0xFF => Err(ProtocolError::new(
                ProtocolErrorKind::MalformedLength,
                format!("marker 0x{first:02X} is not a length-encoded integer"),
            )
            .into()),
        }
    }

    /// Read a length-encoded byte slice.
    pub fn read_lenenc_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_lenenc_int()?;
        let len = usize::try_from(len).map_err(|_| {
            Error::Protocol(ProtocolError::new(
                ProtocolErrorKind::MalformedLength,
                format!("length {len} does not fit in memory"),
            ))
        })?;
        self.read_bytes(len)
    }

    /// Read a length-encoded string.
    pub fn read_lenenc_string(&mut self) -> Result<String> {
        self.read_lenenc_bytes()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a fixed-length string.
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read remaining data as a string.
    pub fn read_rest_string(&mut self) -> String {
        String::from_utf8_lossy(self.read_rest()).into_owned()
    }

    /// Read remaining bytes.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos.min(self.data.len())..];
        self.pos = self.data.len();
        rest
    }

    /// Skip a number of bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }
}

/// Decode one length-encoded integer from the front of `buf`.
///
/// Returns the value and the number of bytes it occupied.
pub fn decode_lenenc_int(buf: &[u8]) -> Result<(u64, usize)> {
    let mut reader = PacketReader::new(buf);
    let value = reader.read_lenenc_int()?;
    Ok((value, reader.position()))
}
