//! MySQL wire protocol primitives.
//!
//! MySQL packets have a 4-byte header:
//! - 3 bytes: payload length (little-endian)
//! - 1 byte: sequence number
//!
//! Maximum packet payload is 2^24 - 1 (16MB - 1). A packet of exactly that
//! length announces a continuation; this codec handles single packets only
//! and reports such a header as oversized.

pub mod column;
pub mod framer;
pub mod reader;
pub mod response;
pub mod writer;

pub use column::parse_column_definition;
pub use framer::{PacketFramer, RawPacket, encode_packet};
pub use reader::{PacketReader, decode_lenenc_int};
pub use response::{EofPacket, ErrPacket, OkPacket, Response, classify};
pub use writer::{PacketWriter, encode_lenenc_int};

/// Maximum payload size for a single MySQL packet (2^24 - 1 bytes).
pub const MAX_PACKET_SIZE: usize = 0xFF_FF_FF;

/// Largest payload this codec frames without continuation packets.
pub const MAX_PAYLOAD_LEN: usize = MAX_PACKET_SIZE - 1;

/// A MySQL packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Payload length (3 bytes, max 16MB - 1)
    pub payload_length: u32,
    /// Sequence number (wraps at 255)
    pub sequence_id: u8,
}

impl PacketHeader {
    /// Total header size in bytes.
    pub const SIZE: usize = 4;

    /// Parse a packet header from 4 bytes.
    ///
    /// The header is read as one little-endian `u32`; the low 24 bits are the
    /// length and the high byte is the sequence id.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_bytes(bytes: &[u8; 4]) -> Self {
        let word = u32::from_le_bytes(*bytes);
        Self {
            payload_length: word & 0x00FF_FFFF,
            sequence_id: (word >> 24) as u8,
        }
    }

    /// Encode the header to 4 bytes.
    pub fn to_bytes(&self) -> [u8; 4] {
        ((self.payload_length & 0x00FF_FFFF) | (u32::from(self.sequence_id) << 24)).to_le_bytes()
    }
}
