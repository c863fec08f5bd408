//! Error types for codec and bridge operations.

use std::fmt;

/// The primary error type for all sqlbind operations.
///
/// "Need more data" is deliberately absent: the framer reports it as
/// `Ok(None)` so the caller's I/O loop can retry without matching on errors.
#[derive(Debug)]
pub enum Error {
    /// Wire-level corruption or unsupported encodings (fatal for the connection)
    Protocol(ProtocolError),
    /// A decoded ERR packet (the query failed, the connection is fine)
    Server(ServerError),
    /// A record field was not present in the row or mapping
    FieldNotFound(FieldNotFoundError),
    /// A value could not be converted into the requested shape
    Type(TypeError),
    /// A record or expression could not be encoded
    Encode(EncodeError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct ProtocolError {
    pub kind: ProtocolErrorKind,
    /// Column being decoded when the error occurred, if any
    pub column: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    /// The buffer ended before a complete item could be read
    Insufficient { needed: usize, available: usize },
    /// A length field or length-encoded integer is corrupt
    MalformedLength,
    /// A valid but unsupported length encoding (3-byte lenenc integers)
    UnsupportedLength,
    /// A payload exceeds the single-packet limit
    Oversized { length: usize, max: usize },
}

#[derive(Debug, Clone)]
pub struct ServerError {
    pub code: u16,
    pub sql_state: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct FieldNotFoundError {
    pub field: String,
    pub table: Option<String>,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    /// Field or column name, filled in by whoever knows it
    pub field: Option<String>,
}

#[derive(Debug)]
pub struct EncodeError {
    pub kind: EncodeErrorKind,
    pub field: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// A composite value needed JSON and the fallback is disabled
    Refused,
    /// The value has no representation at all (e.g. i128 out of range, non-struct record)
    Unsupported,
    /// The JSON serializer itself failed
    Serialize,
}

impl ProtocolError {
    pub fn new(kind: ProtocolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            column: None,
            message: message.into(),
        }
    }

    pub fn insufficient(needed: usize, available: usize) -> Self {
        Self::new(
            ProtocolErrorKind::Insufficient { needed, available },
            format!("need {needed} bytes, only {available} available"),
        )
    }

    /// Attach the column being decoded.
    pub fn in_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

impl TypeError {
    pub fn new(expected: &'static str, actual: impl Into<String>) -> Self {
        Self {
            expected,
            actual: actual.into(),
            field: None,
        }
    }
}

impl Error {
    /// Does this error leave the byte stream in an untrustworthy state?
    pub fn is_fatal_for_connection(&self) -> bool {
        match self {
            Error::Protocol(p) => !matches!(p.kind, ProtocolErrorKind::Insufficient { .. }),
            _ => false,
        }
    }

    /// The field or column this error is about, if known.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Protocol(e) => e.column.as_deref(),
            Error::FieldNotFound(e) => Some(&e.field),
            Error::Type(e) => e.field.as_deref(),
            Error::Encode(e) => e.field.as_deref(),
            Error::Server(_) | Error::Custom(_) => None,
        }
    }

    /// Attach a field or column name to errors that lack one.
    #[must_use]
    pub fn with_field(self, name: &str) -> Self {
        match self {
            Error::Protocol(e) if e.column.is_none() => Error::Protocol(e.in_column(name)),
            Error::Type(mut e) if e.field.is_none() => {
                e.field = Some(name.to_string());
                Error::Type(e)
            }
            Error::Encode(mut e) if e.field.is_none() => {
                e.field = Some(name.to_string());
                Error::Encode(e)
            }
            e => e,
        }
    }

    /// Get SQLSTATE if available (e.g., "23000" for integrity violations)
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Server(s) => s.sql_state.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
            Error::Server(e) => write!(f, "Server error: {}", e),
            Error::FieldNotFound(e) => write!(f, "Field not found: {}", e),
            Error::Type(e) => {
                if let Some(field) = &e.field {
                    write!(
                        f,
                        "Type error in field '{}': expected {}, found {}",
                        field, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Encode(e) => write!(f, "Encode error: {}", e),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(f, "{} (column '{}')", self.message, col)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(state) = &self.sql_state {
            write!(f, "{} (code {}, SQLSTATE {})", self.message, self.code, state)
        } else {
            write!(f, "{} (code {})", self.message, self.code)
        }
    }
}

impl fmt::Display for FieldNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "'{}.{}'", table, self.field),
            None => write!(f, "'{}'", self.field),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = &self.field {
            write!(
                f,
                "expected {} for field '{}', found {}",
                self.expected, field, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "field '{}': {}", field, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        Error::Protocol(err)
    }
}

impl From<ServerError> for Error {
    fn from(err: ServerError) -> Self {
        Error::Server(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        Error::Encode(err)
    }
}

impl From<FieldNotFoundError> for Error {
    fn from(err: FieldNotFoundError) -> Self {
        Error::FieldNotFound(err)
    }
}

/// Result type alias for sqlbind operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_fatality() {
        let short = Error::Protocol(ProtocolError::insufficient(4, 2));
        assert!(!short.is_fatal_for_connection());

        let corrupt = Error::Protocol(ProtocolError::new(
            ProtocolErrorKind::MalformedLength,
            "bad marker",
        ));
        assert!(corrupt.is_fatal_for_connection());

        let server = Error::Server(ServerError {
            code: 1062,
            sql_state: Some("23000".to_string()),
            message: "Duplicate entry".to_string(),
        });
        assert!(!server.is_fatal_for_connection());
        assert_eq!(server.sqlstate(), Some("23000"));
    }

    #[test]
    fn with_field_fills_only_missing_names() {
        let err = Error::Type(TypeError::new("i64", "TEXT")).with_field("age");
        assert_eq!(err.field(), Some("age"));
        assert_eq!(
            err.to_string(),
            "Type error in field 'age': expected i64, found TEXT"
        );

        let err = err.with_field("other");
        assert_eq!(err.field(), Some("age"));
    }

    #[test]
    fn protocol_error_names_column() {
        let err = ProtocolError::insufficient(8, 3).in_column("total");
        assert_eq!(
            err.to_string(),
            "need 8 bytes, only 3 available (column 'total')"
        );
    }
}
