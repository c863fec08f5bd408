//! Bidirectional bridge between [`Value`]s and application types.
//!
//! Encoding follows a two-phase policy: a registered native converter is used
//! exclusively when present; otherwise the value is flattened into a single
//! column value, and if it turns out to be composite the whole value is
//! serialized as JSON text instead. Decoding mirrors it: native converter
//! first, otherwise the stored value is read back as JSON.
//!
//! Any text the non-native path stores is a JSON document, so a string that
//! itself looks like JSON (`"null"`, `"\"x\""`) reads back unchanged.

use crate::Result;
use crate::error::{EncodeError, EncodeErrorKind, Error, TypeError};
use crate::flat::{FlatError, to_flat_value};
use crate::record::{Record, RecordDecoder, RecordEncoder, RecordMapping};
use crate::registry::ConverterRegistry;
use crate::row::FieldSource;
use crate::value::Value;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A query parameter: a literal value or a raw SQL fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Raw(String),
}

/// Bridge behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Serialize composite values as JSON text instead of refusing them.
    pub json_fallback: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            json_fallback: true,
        }
    }
}

/// Maps records and single values to and from [`Value`]s.
///
/// Cloning is cheap; the registry is shared.
#[derive(Debug, Clone)]
pub struct Bridge {
    registry: Arc<ConverterRegistry>,
    options: BridgeOptions,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    /// A bridge with the builtin scalar converters and JSON fallback enabled.
    pub fn new() -> Self {
        Self::with_registry(ConverterRegistry::with_builtins().build())
    }

    /// A bridge over a caller-built registry.
    pub fn with_registry(registry: ConverterRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            options: BridgeOptions::default(),
        }
    }

    /// Replace the bridge options.
    pub fn options(mut self, options: BridgeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Encode one value: native converter, else flat, else JSON text.
    pub fn encode_value<F: Serialize + 'static>(&self, value: &F) -> Result<Value> {
        if let Some(native) = self.registry.encode(value) {
            return native;
        }

        match to_flat_value(value) {
            Ok(Value::Text(_)) => json_text(value, "string"),
            Ok(flat) => Ok(flat),
            Err(FlatError::NeedsJson(shape)) => self.encode_json(value, shape),
            Err(FlatError::Unsupported(message)) => Err(Error::Encode(EncodeError {
                kind: EncodeErrorKind::Unsupported,
                field: None,
                message,
            })),
        }
    }

    fn encode_json<F: Serialize>(&self, value: &F, shape: &'static str) -> Result<Value> {
        if !self.options.json_fallback {
            return Err(Error::Encode(EncodeError {
                kind: EncodeErrorKind::Refused,
                field: None,
                message: format!("{} needs JSON encoding but JSON fallback is disabled", shape),
            }));
        }
        tracing::debug!(shape, "encoding composite value as JSON text");
        json_text(value, shape)
    }

    /// Decode one value: native converter, else JSON.
    pub fn decode_value<F: DeserializeOwned + 'static>(&self, value: &Value) -> Result<F> {
        if let Some(native) = self.registry.decode::<F>(value) {
            return native;
        }
        decode_json(value)
    }

    /// Map a record to its field-level normal form.
    ///
    /// Fails as a whole if any field fails; a partial mapping is never returned.
    pub fn encode_record<T: Record>(&self, record: &T) -> Result<RecordMapping> {
        let mut encoder = RecordEncoder::new(self);
        record.encode_fields(&mut encoder)?;
        Ok(encoder.finish())
    }

    /// Rebuild a record from a row or mapping.
    pub fn decode_record<T: Record>(&self, source: &dyn FieldSource) -> Result<T> {
        T::decode_fields(&RecordDecoder::new(self, source))
    }

    /// Encode a query parameter, letting types with the expression
    /// capability emit raw SQL.
    pub fn encode_expression<F: Serialize + 'static>(&self, value: &F) -> Result<Expression> {
        if let Some(sql) = self.registry.expression(value) {
            return Ok(Expression::Raw(sql));
        }
        self.encode_value(value).map(Expression::Literal)
    }
}

fn json_text<F: Serialize>(value: &F, shape: &str) -> Result<Value> {
    serde_json::to_string(value).map(Value::Text).map_err(|e| {
        Error::Encode(EncodeError {
            kind: EncodeErrorKind::Serialize,
            field: None,
            message: format!("JSON serialization of {} failed: {}", shape, e),
        })
    })
}

fn json_mismatch<F>(actual: impl Into<String>) -> Error {
    Error::Type(TypeError::new(std::any::type_name::<F>(), actual))
}

/// Read a stored value back through JSON.
///
/// Text is parsed as a JSON document. Text that is not JSON at all, such as
/// an ENUM column written by the server, is read as a JSON string instead;
/// valid JSON of the wrong shape is a mismatch.
fn decode_json<F: DeserializeOwned>(value: &Value) -> Result<F> {
    match value {
        Value::Text(text) => match serde_json::from_str::<F>(text) {
            Ok(decoded) => Ok(decoded),
            Err(parse_err) if parse_err.is_syntax() || parse_err.is_eof() => {
                serde_json::from_value(serde_json::Value::String(text.clone()))
                    .map_err(|_| json_mismatch::<F>(format!("TEXT ({})", parse_err)))
            }
            Err(parse_err) => Err(json_mismatch::<F>(format!("TEXT ({})", parse_err))),
        },
        Value::Json(json) => serde_json::from_value(json.clone())
            .map_err(|e| json_mismatch::<F>(format!("JSON ({})", e))),
        Value::Bytes(_) => Err(json_mismatch::<F>("BLOB")),
        other => {
            let json = other
                .to_json()
                .ok_or_else(|| json_mismatch::<F>(other.type_name()))?;
            serde_json::from_value(json).map_err(|_| json_mismatch::<F>(other.type_name()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SqlExpression;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    enum Role {
        Admin,
        Member,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Address {
        city: String,
        zip: Option<String>,
    }

    #[derive(Serialize)]
    struct CurrentTimestamp;

    impl SqlExpression for CurrentTimestamp {
        fn sql_expression(&self) -> String {
            "CURRENT_TIMESTAMP".to_string()
        }
    }

    #[test]
    fn native_values_pass_through() {
        let bridge = Bridge::new();
        assert_eq!(bridge.encode_value(&42i32).unwrap(), Value::Int(42));
        assert_eq!(
            bridge.encode_value(&vec![1u8, 2, 3]).unwrap(),
            Value::Bytes(vec![1, 2, 3])
        );
        assert_eq!(bridge.decode_value::<u8>(&Value::UInt(7)).unwrap(), 7);
    }

    #[test]
    fn composites_become_json_text() {
        let bridge = Bridge::new();
        let value = bridge.encode_value(&vec![vec![1, 2], vec![3]]).unwrap();
        assert_eq!(value, Value::Text("[[1,2],[3]]".to_string()));
        let back: Vec<Vec<i32>> = bridge.decode_value(&value).unwrap();
        assert_eq!(back, vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn nested_struct_round_trips() {
        let bridge = Bridge::new();
        let address = Address {
            city: "Lisbon".to_string(),
            zip: None,
        };
        let value = bridge.encode_value(&address).unwrap();
        let back: Address = bridge.decode_value(&value).unwrap();
        assert_eq!(back, address);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Nick(String);

    #[test]
    fn unit_variants_round_trip_as_json_strings() {
        let bridge = Bridge::new();
        let value = bridge.encode_value(&Role::Admin).unwrap();
        assert_eq!(value, Value::Text("\"Admin\"".to_string()));
        assert_eq!(bridge.decode_value::<Role>(&value).unwrap(), Role::Admin);
        assert!(bridge.decode_value::<Role>(&Value::Text("Guest".to_string())).is_err());
    }

    #[test]
    fn server_enum_text_decodes_into_unit_variant() {
        let bridge = Bridge::new();
        assert_eq!(
            bridge
                .decode_value::<Role>(&Value::Text("Member".to_string()))
                .unwrap(),
            Role::Member
        );
    }

    #[test]
    fn string_newtype_holding_json_survives() {
        let bridge = Bridge::new();
        let quoted = Nick("\"quoted\"".to_string());
        let value = bridge.encode_value(&quoted).unwrap();
        assert_eq!(bridge.decode_value::<Nick>(&value).unwrap(), quoted);

        let alias = Some(Nick("null".to_string()));
        let value = bridge.encode_value(&alias).unwrap();
        assert_eq!(value, Value::Text("\"null\"".to_string()));
        assert_eq!(bridge.decode_value::<Option<Nick>>(&value).unwrap(), alias);

        let none: Option<Nick> = None;
        assert_eq!(bridge.encode_value(&none).unwrap(), Value::Null);
        assert_eq!(bridge.decode_value::<Option<Nick>>(&Value::Null).unwrap(), None);
    }

    #[test]
    fn json_of_the_wrong_shape_is_a_mismatch() {
        let bridge = Bridge::new();
        let err = bridge
            .decode_value::<Nick>(&Value::Text("[1]".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn json_column_decodes_into_struct() {
        let bridge = Bridge::new();
        let value = Value::Json(serde_json::json!({"city": "Oslo", "zip": "0150"}));
        let back: Address = bridge.decode_value(&value).unwrap();
        assert_eq!(back.zip.as_deref(), Some("0150"));
    }

    #[test]
    fn null_only_decodes_into_optional_types() {
        let bridge = Bridge::new();
        assert_eq!(
            bridge.decode_value::<Option<Vec<i32>>>(&Value::Null).unwrap(),
            None
        );
        let err = bridge.decode_value::<Vec<i32>>(&Value::Null).unwrap_err();
        match err {
            Error::Type(te) => assert_eq!(te.actual, "NULL"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bytes_never_decode_through_json() {
        let bridge = Bridge::new();
        assert!(
            bridge
                .decode_value::<Vec<i32>>(&Value::Bytes(vec![1]))
                .is_err()
        );
    }

    #[test]
    fn disabled_fallback_refuses_composites() {
        let bridge = Bridge::new().options(BridgeOptions {
            json_fallback: false,
        });
        let err = bridge.encode_value(&vec![1, 2]).unwrap_err();
        assert!(matches!(
            err,
            Error::Encode(EncodeError {
                kind: EncodeErrorKind::Refused,
                ..
            })
        ));
        assert_eq!(bridge.encode_value(&5i64).unwrap(), Value::Int(5));
    }

    #[test]
    fn expressions_prefer_raw_capability() {
        let registry = ConverterRegistry::with_builtins()
            .expression::<CurrentTimestamp>()
            .build();
        let bridge = Bridge::with_registry(registry);
        assert_eq!(
            bridge.encode_expression(&CurrentTimestamp).unwrap(),
            Expression::Raw("CURRENT_TIMESTAMP".to_string())
        );
        assert_eq!(
            bridge.encode_expression(&"abc".to_string()).unwrap(),
            Expression::Literal(Value::Text("abc".to_string()))
        );
        assert_eq!(
            bridge.encode_expression(&vec!["a", "b"]).unwrap(),
            Expression::Literal(Value::Text("[\"a\",\"b\"]".to_string()))
        );
    }
}
