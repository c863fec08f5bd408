//! Native conversions between Rust types and [`Value`].
//!
//! A type implementing [`NativeValue`] has an exact, lossless column
//! representation. The bridge prefers these conversions over the JSON
//! fallback whenever one is registered for a field's type.

#![allow(clippy::cast_possible_truncation)]

use crate::Result;
use crate::error::{Error, TypeError};
use crate::value::Value;
use chrono::NaiveDateTime;

/// Format used for DATETIME text on both sides of the wire.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Exact conversion to and from a single column value.
pub trait NativeValue: Sized {
    /// Convert into a column value.
    fn to_value(&self) -> Result<Value>;

    /// Convert from a column value, returning a type error on mismatch.
    fn from_value(value: &Value) -> Result<Self>;
}

fn mismatch(expected: &'static str, value: &Value) -> Error {
    Error::Type(TypeError::new(expected, value.type_name()))
}

fn out_of_range(expected: &'static str, shown: impl std::fmt::Display) -> Error {
    Error::Type(TypeError::new(
        expected,
        format!("value {} out of range", shown),
    ))
}

impl NativeValue for bool {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

macro_rules! native_signed {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl NativeValue for $ty {
            fn to_value(&self) -> Result<Value> {
                Ok(Value::Int(i64::from(*self)))
            }

            fn from_value(value: &Value) -> Result<Self> {
                match value {
                    Value::Int(_) | Value::UInt(_) | Value::Bool(_) => {
                        let wide = value
                            .as_i64()
                            .ok_or_else(|| out_of_range($name, format!("{:?}", value)))?;
                        <$ty>::try_from(wide).map_err(|_| out_of_range($name, wide))
                    }
                    _ => Err(mismatch($name, value)),
                }
            }
        }
    )*};
}

macro_rules! native_unsigned {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl NativeValue for $ty {
            fn to_value(&self) -> Result<Value> {
                Ok(Value::UInt(u64::from(*self)))
            }

            fn from_value(value: &Value) -> Result<Self> {
                match value {
                    Value::Int(_) | Value::UInt(_) | Value::Bool(_) => {
                        let wide = value
                            .as_u64()
                            .ok_or_else(|| out_of_range($name, format!("{:?}", value)))?;
                        <$ty>::try_from(wide).map_err(|_| out_of_range($name, wide))
                    }
                    _ => Err(mismatch($name, value)),
                }
            }
        }
    )*};
}

native_signed!(i8 => "i8", i16 => "i16", i32 => "i32", i64 => "i64");
native_unsigned!(u8 => "u8", u16 => "u16", u32 => "u32", u64 => "u64");

impl NativeValue for f32 {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Double(f64::from(*self)))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Double(v) => Ok(*v as f32),
            Value::Int(v) => Ok(*v as f32),
            Value::UInt(v) => Ok(*v as f32),
            _ => Err(mismatch("f32", value)),
        }
    }
}

impl NativeValue for f64 {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Double(*self))
    }

    fn from_value(value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| mismatch("f64", value))
    }
}

impl NativeValue for String {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Text(self.clone()))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            _ => Err(mismatch("String", value)),
        }
    }
}

impl NativeValue for Vec<u8> {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Bytes(self.clone()))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.as_bytes().to_vec()),
            _ => Err(mismatch("Vec<u8>", value)),
        }
    }
}

impl NativeValue for NaiveDateTime {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Date(*self))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Date(d) => Ok(*d),
            // Zero dates stay textual on decode and fail here
            Value::Text(s) => NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).map_err(|e| {
                Error::Type(TypeError::new(
                    "DATETIME",
                    format!("unparseable date '{}': {}", s, e),
                ))
            }),
            _ => Err(mismatch("DATETIME", value)),
        }
    }
}

impl NativeValue for serde_json::Value {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Json(self.clone()))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            Value::Text(s) => serde_json::from_str(s).map_err(|e| {
                Error::Type(TypeError::new("valid JSON", format!("invalid JSON: {}", e)))
            }),
            other => other.to_json().ok_or_else(|| mismatch("JSON", other)),
        }
    }
}

impl NativeValue for Value {
    fn to_value(&self) -> Result<Value> {
        Ok(self.clone())
    }

    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl<T: NativeValue> NativeValue for Option<T> {
    fn to_value(&self) -> Result<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}
