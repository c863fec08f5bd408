//! Capability registry keyed by type identity.
//!
//! The bridge never probes values at runtime to discover what they can do.
//! Instead, capabilities are registered per `TypeId` up front, and the
//! registry is frozen when the bridge is built.

use crate::Result;
use crate::convert::NativeValue;
use crate::error::Error;
use crate::value::Value;
use chrono::NaiveDateTime;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Types that can render themselves as a raw query fragment
/// (a function call, an identifier reference) instead of a literal.
pub trait SqlExpression {
    fn sql_expression(&self) -> String;
}

type EncodeFn = fn(&dyn Any) -> Option<Result<Value>>;
type DecodeFn = fn(&Value) -> Result<Box<dyn Any>>;
type ExpressionFn = fn(&dyn Any) -> Option<String>;

#[derive(Clone, Copy)]
struct NativeConverter {
    type_name: &'static str,
    encode: EncodeFn,
    decode: DecodeFn,
}

fn encode_native<T: NativeValue + 'static>(value: &dyn Any) -> Option<Result<Value>> {
    value.downcast_ref::<T>().map(T::to_value)
}

fn decode_native<T: NativeValue + 'static>(value: &Value) -> Result<Box<dyn Any>> {
    T::from_value(value).map(|v| Box::new(v) as Box<dyn Any>)
}

fn render_expression<T: SqlExpression + 'static>(value: &dyn Any) -> Option<String> {
    value.downcast_ref::<T>().map(T::sql_expression)
}

/// Immutable set of native converters and expression capabilities.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    native: HashMap<TypeId, NativeConverter>,
    expressions: HashMap<TypeId, ExpressionFn>,
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.native.values().map(|c| c.type_name).collect();
        names.sort_unstable();
        f.debug_struct("ConverterRegistry")
            .field("native", &names)
            .field("expressions", &self.expressions.len())
            .finish()
    }
}

impl ConverterRegistry {
    /// Start an empty registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Start a registry that already knows every scalar in [`crate::convert`]
    /// and its `Option` form.
    pub fn with_builtins() -> RegistryBuilder {
        RegistryBuilder::default()
            .native::<bool>()
            .native::<i8>()
            .native::<i16>()
            .native::<i32>()
            .native::<i64>()
            .native::<u8>()
            .native::<u16>()
            .native::<u32>()
            .native::<u64>()
            .native::<f32>()
            .native::<f64>()
            .native::<String>()
            .native::<Vec<u8>>()
            .native::<NaiveDateTime>()
            .native::<serde_json::Value>()
            .native::<Value>()
            .native::<Option<bool>>()
            .native::<Option<i8>>()
            .native::<Option<i16>>()
            .native::<Option<i32>>()
            .native::<Option<i64>>()
            .native::<Option<u8>>()
            .native::<Option<u16>>()
            .native::<Option<u32>>()
            .native::<Option<u64>>()
            .native::<Option<f32>>()
            .native::<Option<f64>>()
            .native::<Option<String>>()
            .native::<Option<Vec<u8>>>()
            .native::<Option<NaiveDateTime>>()
            .native::<Option<serde_json::Value>>()
    }

    /// Does `T` have a native converter?
    pub fn has_native<T: 'static>(&self) -> bool {
        self.native.contains_key(&TypeId::of::<T>())
    }

    /// Encode through `T`'s native converter, if one is registered.
    pub fn encode<T: 'static>(&self, value: &T) -> Option<Result<Value>> {
        let converter = self.native.get(&TypeId::of::<T>())?;
        (converter.encode)(value)
    }

    /// Decode through `T`'s native converter, if one is registered.
    pub fn decode<T: 'static>(&self, value: &Value) -> Option<Result<T>> {
        let converter = self.native.get(&TypeId::of::<T>())?;
        Some((converter.decode)(value).and_then(|boxed| {
            boxed.downcast::<T>().map(|b| *b).map_err(|_| {
                Error::Custom(format!(
                    "converter for {} produced a different type",
                    converter.type_name
                ))
            })
        }))
    }

    /// Render `value` as a raw expression, if `T` has that capability.
    pub fn expression<T: 'static>(&self, value: &T) -> Option<String> {
        let render = self.expressions.get(&TypeId::of::<T>())?;
        render(value)
    }
}

/// Collects capabilities before freezing them into a [`ConverterRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    registry: ConverterRegistry,
}

impl RegistryBuilder {
    /// Register `T`'s native converter. Re-registering replaces the old one.
    pub fn native<T: NativeValue + 'static>(mut self) -> Self {
        self.registry.native.insert(
            TypeId::of::<T>(),
            NativeConverter {
                type_name: std::any::type_name::<T>(),
                encode: encode_native::<T>,
                decode: decode_native::<T>,
            },
        );
        self
    }

    /// Register `T` as able to render raw query expressions.
    pub fn expression<T: SqlExpression + 'static>(mut self) -> Self {
        self.registry
            .expressions
            .insert(TypeId::of::<T>(), render_expression::<T>);
        self
    }

    pub fn build(self) -> ConverterRegistry {
        self.registry
    }
}
