//! Core types for sqlbind.
//!
//! This crate provides the database-neutral half of the codec:
//!
//! - `Value`, the dynamically-typed column value
//! - `ColumnDescriptor` and `Row` for decoded result sets
//! - the `Error` taxonomy shared with the wire crate
//! - `Bridge`, which maps values to and from application records with a
//!   native-converter registry and a JSON fallback
//! - `DiagnosticSink` for lenient, non-fatal decode events

pub mod bridge;
pub mod convert;
pub mod diagnostic;
pub mod error;
mod flat;
pub mod record;
pub mod registry;
pub mod row;
pub mod types;
pub mod value;

pub use bridge::{Bridge, BridgeOptions, Expression};
pub use convert::NativeValue;
pub use diagnostic::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
pub use error::{
    EncodeError, EncodeErrorKind, Error, FieldNotFoundError, ProtocolError, ProtocolErrorKind,
    Result, ServerError, TypeError,
};
pub use record::{Record, RecordDecoder, RecordEncoder, RecordMapping};
pub use registry::{ConverterRegistry, RegistryBuilder, SqlExpression};
pub use row::{FieldSource, Row};
pub use types::{ColumnDescriptor, FieldType};
pub use value::Value;
