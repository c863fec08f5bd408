//! MySQL packet writing utilities.
//!
//! This module provides utilities for writing MySQL protocol data types
//! including length-encoded integers and strings.

#![allow(clippy::cast_possible_truncation)]

use sqlbind_core::Result;
use sqlbind_core::error::{ProtocolError, ProtocolErrorKind};

/// A writer for MySQL protocol data.
#[derive(Debug, Default)]
pub struct PacketWriter {
    buffer: Vec<u8>,
}

impl PacketWriter {
    /// Create a new writer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new writer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get the buffer as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Write a u16 (little-endian).
    pub fn write_u16_le(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a u32 (little-endian).
    pub fn write_u32_le(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a u64 (little-endian).
    pub fn write_u64_le(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a length-encoded integer.
    ///
    /// - below 251: 1-byte value
    /// - 0xFC + 2 bytes: values below 2^16
    /// - values below 2^24 would need the 3-byte form, which is refused
    /// - 0xFE + 8 bytes: everything else
    ///
    /// Nothing is written when the value is refused.
    pub fn write_lenenc_int(&mut self, value: u64) -> Result<()> {
        if value < 251 {
            self.write_u8(value as u8);
        } else if value < 0x1_0000 {
            self.write_u8(0xFC);
            self.write_u16_le(value as u16);
        } else if value < 0x0100_0000 {
            return Err(ProtocolError::new(
                ProtocolErrorKind::UnsupportedLength,
                format!("{value} needs a 3-byte length-encoded integer, which is not supported"),
            )
            .into());
        } else {
            self.write_u8(0xFE);
            self.write_u64_le(value);
        }
        Ok(())
    }

    /// Write a length-encoded byte slice.
    pub fn write_lenenc_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.write_lenenc_int(data.len() as u64)?;
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Write a length-encoded string.
    pub fn write_lenenc_string(&mut self, s: &str) -> Result<()> {
        self.write_lenenc_bytes(s.as_bytes())
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Write zeros (padding).
    pub fn write_zeros(&mut self, count: usize) {
        self.buffer.resize(self.buffer.len() + count, 0);
    }
}

/// Encode one length-encoded integer on its own.
pub fn encode_lenenc_int(value: u64) -> Result<Vec<u8>> {
    let mut writer = PacketWriter::with_capacity(9);
    writer.write_lenenc_int(value)?;
    Ok(writer.into_bytes())
}
