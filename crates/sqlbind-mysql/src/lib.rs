//! MySQL wire-value codec for sqlbind.
//!
//! This crate implements the byte-level half of the MySQL client protocol
//! that sits between a socket and application values:
//!
//! - Length-encoded integers and strings
//! - Packet framing over an incrementally filled buffer
//! - OK / ERR / EOF response classification
//! - Binary-protocol column decoding into [`Value`]s
//! - Binary-protocol value encoding and row parsing
//!
//! Everything is synchronous and performs no I/O; the caller owns the socket
//! and feeds bytes in.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use sqlbind_mysql::{PacketFramer, Response, classify};
//!
//! let mut buf = BytesMut::from(&[0x07, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00][..]);
//! let packet = PacketFramer::new().try_frame(&mut buf)?.expect("complete packet");
//! match classify(&packet.payload)? {
//!     Response::Ok(ok) => assert_eq!(ok.affected_rows, 1),
//!     other => panic!("unexpected {other:?}"),
//! }
//! # Ok::<(), sqlbind_core::Error>(())
//! ```
//!
//! [`Value`]: sqlbind_core::Value

pub mod config;
pub mod decode;
pub mod encode;
pub mod protocol;
pub mod row;

pub use config::CodecConfig;
pub use decode::{BindBuffer, ColumnDecoder, TextDecoder, Utf8Text};
pub use encode::{EncodedValue, encode_binary_value};
pub use protocol::{
    EofPacket, ErrPacket, OkPacket, PacketFramer, PacketHeader, PacketReader, PacketWriter,
    RawPacket, Response, classify, decode_lenenc_int, encode_lenenc_int, encode_packet,
    parse_column_definition,
};
pub use row::{encode_binary_row, parse_binary_row};
