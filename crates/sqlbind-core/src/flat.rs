//! Single-value serde serializer.
//!
//! Serializes a scalar-shaped value straight into a [`Value`]. Anything
//! composite (sequences, maps, structs, data-carrying enum variants) is
//! refused with [`FlatError::NeedsJson`] so the caller can fall back to a
//! whole-value JSON encoding one level up.

use crate::value::Value;
use serde::Serialize;
use serde::ser::{self, Impossible};
use std::fmt;

#[derive(Debug)]
pub(crate) enum FlatError {
    /// The value is composite; the payload names its shape
    NeedsJson(&'static str),
    /// The value cannot be represented at all
    Unsupported(String),
}

impl fmt::Display for FlatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlatError::NeedsJson(shape) => write!(f, "{} has no single-column form", shape),
            FlatError::Unsupported(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FlatError {}

impl ser::Error for FlatError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        FlatError::Unsupported(msg.to_string())
    }
}

/// Serialize `value` as one column value, or report why it can't be.
pub(crate) fn to_flat_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, FlatError> {
    value.serialize(FlatSerializer)
}

struct FlatSerializer;

impl ser::Serializer for FlatSerializer {
    type Ok = Value;
    type Error = FlatError;

    type SerializeSeq = Impossible<Value, FlatError>;
    type SerializeTuple = Impossible<Value, FlatError>;
    type SerializeTupleStruct = Impossible<Value, FlatError>;
    type SerializeTupleVariant = Impossible<Value, FlatError>;
    type SerializeMap = Impossible<Value, FlatError>;
    type SerializeStruct = Impossible<Value, FlatError>;
    type SerializeStructVariant = Impossible<Value, FlatError>;

    fn serialize_bool(self, v: bool) -> Result<Value, FlatError> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, FlatError> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, FlatError> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, FlatError> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, FlatError> {
        Ok(Value::Int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, FlatError> {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| FlatError::Unsupported(format!("i128 value {} exceeds 64 bits", v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, FlatError> {
        Ok(Value::UInt(u64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, FlatError> {
        Ok(Value::UInt(u64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, FlatError> {
        Ok(Value::UInt(u64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, FlatError> {
        Ok(Value::UInt(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, FlatError> {
        u64::try_from(v)
            .map(Value::UInt)
            .map_err(|_| FlatError::Unsupported(format!("u128 value {} exceeds 64 bits", v)))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, FlatError> {
        Ok(Value::Double(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, FlatError> {
        Ok(Value::Double(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, FlatError> {
        Ok(Value::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, FlatError> {
        Ok(Value::Text(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, FlatError> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value, FlatError> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value, FlatError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, FlatError> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, FlatError> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, FlatError> {
        Ok(Value::Text(variant.to_string()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, FlatError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Value, FlatError> {
        Err(FlatError::NeedsJson("enum variant with data"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, FlatError> {
        Err(FlatError::NeedsJson("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, FlatError> {
        Err(FlatError::NeedsJson("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, FlatError> {
        Err(FlatError::NeedsJson("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, FlatError> {
        Err(FlatError::NeedsJson("enum variant with data"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, FlatError> {
        Err(FlatError::NeedsJson("map"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, FlatError> {
        Err(FlatError::NeedsJson("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, FlatError> {
        Err(FlatError::NeedsJson("enum variant with data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct UserId(u32);

    #[derive(Serialize)]
    enum Status {
        Active,
        Suspended { reason: String },
    }

    #[test]
    fn scalars_flatten() {
        assert_eq!(to_flat_value(&-3i16).unwrap(), Value::Int(-3));
        assert_eq!(to_flat_value(&3u8).unwrap(), Value::UInt(3));
        assert_eq!(to_flat_value(&1.5f32).unwrap(), Value::Double(1.5));
        assert_eq!(to_flat_value("abc").unwrap(), Value::Text("abc".to_string()));
        assert_eq!(to_flat_value(&'x').unwrap(), Value::Text("x".to_string()));
        assert_eq!(to_flat_value(&None::<i32>).unwrap(), Value::Null);
        assert_eq!(to_flat_value(&Some(9i64)).unwrap(), Value::Int(9));
    }

    #[test]
    fn newtypes_and_unit_variants_flatten() {
        assert_eq!(to_flat_value(&UserId(12)).unwrap(), Value::UInt(12));
        assert_eq!(
            to_flat_value(&Status::Active).unwrap(),
            Value::Text("Active".to_string())
        );
    }

    #[test]
    fn composites_need_json() {
        assert!(matches!(
            to_flat_value(&vec![1, 2, 3]),
            Err(FlatError::NeedsJson("sequence"))
        ));
        assert!(matches!(
            to_flat_value(&BTreeMap::from([("a", 1)])),
            Err(FlatError::NeedsJson("map"))
        ));
        assert!(matches!(
            to_flat_value(&Status::Suspended {
                reason: "spam".to_string()
            }),
            Err(FlatError::NeedsJson(_))
        ));
        assert!(matches!(
            to_flat_value(&(1, 2)),
            Err(FlatError::NeedsJson("tuple"))
        ));
    }

    #[test]
    fn wide_integers_are_checked() {
        assert_eq!(to_flat_value(&5i128).unwrap(), Value::Int(5));
        assert!(matches!(
            to_flat_value(&u128::MAX),
            Err(FlatError::Unsupported(_))
        ));
    }
}
