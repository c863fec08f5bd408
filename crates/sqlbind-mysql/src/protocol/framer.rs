//! Incremental packet framing over a growing byte buffer.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use sqlbind_core::Result;
use sqlbind_core::error::{ProtocolError, ProtocolErrorKind};

use crate::config::CodecConfig;
use crate::protocol::{MAX_PACKET_SIZE, MAX_PAYLOAD_LEN, PacketHeader};

/// One complete packet lifted off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub sequence_id: u8,
    pub payload: Bytes,
}

/// Splits a byte stream into packets.
///
/// The framer keeps no state between calls; partial packets stay in the
/// caller's buffer until more bytes arrive.
#[derive(Debug, Clone, Copy)]
pub struct PacketFramer {
    max_payload_len: usize,
}

impl Default for PacketFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketFramer {
    pub fn new() -> Self {
        Self {
            max_payload_len: MAX_PAYLOAD_LEN,
        }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self {
            max_payload_len: config.max_payload_len.min(MAX_PAYLOAD_LEN),
        }
    }

    pub fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }

    /// Take one packet off the front of `buf`.
    ///
    /// Returns `Ok(None)` while the header or payload is incomplete; nothing is
    /// consumed in that case. On success exactly `4 + len` bytes are consumed
    /// and any following bytes stay in `buf`.
    pub fn try_frame(&self, buf: &mut BytesMut) -> Result<Option<RawPacket>> {
        let Some(header) = buf.first_chunk::<{ PacketHeader::SIZE }>() else {
            return Ok(None);
        };
        let header = PacketHeader::from_bytes(header);
        let len = header.payload_length as usize;

        if len >= MAX_PACKET_SIZE || len > self.max_payload_len {
            return Err(ProtocolError::new(
                ProtocolErrorKind::Oversized {
                    length: len,
                    max: self.max_payload_len,
                },
                format!(
                    "packet of {len} bytes exceeds the single-packet limit of {}",
                    self.max_payload_len
                ),
            )
            .into());
        }

        if buf.len() < PacketHeader::SIZE + len {
            return Ok(None);
        }

        buf.advance(PacketHeader::SIZE);
        let payload = buf.split_to(len).freeze();
        tracing::trace!(
            sequence_id = header.sequence_id,
            len,
            buffered = buf.len(),
            "framed packet"
        );
        Ok(Some(RawPacket {
            sequence_id: header.sequence_id,
            payload,
        }))
    }

    /// Append a framed packet to `dst`.
    pub fn encode(&self, sequence_id: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
        if payload.len() > self.max_payload_len {
            return Err(ProtocolError::new(
                ProtocolErrorKind::Oversized {
                    length: payload.len(),
                    max: self.max_payload_len,
                },
                format!(
                    "payload of {} bytes does not fit in a single packet",
                    payload.len()
                ),
            )
            .into());
        }
        #[allow(clippy::cast_possible_truncation)]
        let header = PacketHeader {
            payload_length: payload.len() as u32,
            sequence_id,
        };
        dst.reserve(PacketHeader::SIZE + payload.len());
        dst.put_slice(&header.to_bytes());
        dst.put_slice(payload);
        Ok(())
    }
}

/// Build a single framed packet with the default size limit.
pub fn encode_packet(sequence_id: u8, payload: &[u8]) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(PacketHeader::SIZE + payload.len());
    PacketFramer::new().encode(sequence_id, payload, &mut dst)?;
    Ok(dst.freeze())
}
