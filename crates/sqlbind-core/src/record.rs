//! Application records and their field-level normal form.
//!
//! A [`Record`] describes how a struct maps to named fields. The heavy
//! lifting (native conversion, JSON fallback) is done by the
//! [`Bridge`](crate::bridge::Bridge) behind [`RecordEncoder`] and
//! [`RecordDecoder`].
//!
//! # Example
//!
//! ```
//! use sqlbind_core::{Bridge, Record, RecordDecoder, RecordEncoder, Result};
//!
//! struct Hero {
//!     id: i64,
//!     name: String,
//!     tags: Vec<String>,
//! }
//!
//! impl Record for Hero {
//!     fn encode_fields(&self, fields: &mut RecordEncoder<'_>) -> Result<()> {
//!         fields.field("id", &self.id)?;
//!         fields.field("name", &self.name)?;
//!         fields.field("tags", &self.tags)
//!     }
//!
//!     fn decode_fields(fields: &RecordDecoder<'_>) -> Result<Self> {
//!         Ok(Self {
//!             id: fields.field("id")?,
//!             name: fields.field("name")?,
//!             tags: fields.field("tags")?,
//!         })
//!     }
//! }
//!
//! let bridge = Bridge::new();
//! let hero = Hero { id: 1, name: "Deadpond".into(), tags: vec!["red".into()] };
//! let mapping = bridge.encode_record(&hero)?;
//! let back: Hero = bridge.decode_record(&mapping)?;
//! assert_eq!(back.tags, vec!["red".to_string()]);
//! # Ok::<(), sqlbind_core::Error>(())
//! ```

use crate::Result;
use crate::bridge::Bridge;
use crate::error::{Error, FieldNotFoundError};
use crate::row::FieldSource;
use crate::value::Value;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Types that can be mapped to and from named column values.
pub trait Record: Sized {
    /// Emit every field through the encoder.
    fn encode_fields(&self, fields: &mut RecordEncoder<'_>) -> Result<()>;

    /// Rebuild the record from resolved fields.
    fn decode_fields(fields: &RecordDecoder<'_>) -> Result<Self>;
}

/// Ordered `field name -> value` mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMapping {
    fields: Vec<(String, Value)>,
}

impl RecordMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Set a field, replacing any earlier value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn into_vec(self) -> Vec<(String, Value)> {
        self.fields
    }
}

impl FieldSource for RecordMapping {
    fn lookup(&self, table: Option<&str>, name: &str) -> Option<&Value> {
        match table {
            // Mappings have no table metadata; a qualified key is stored literally.
            Some(table) => self.get(&format!("{}.{}", table, name)),
            None => self.get(name),
        }
    }
}

impl FromIterator<(String, Value)> for RecordMapping {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (name, value) in iter {
            mapping.insert(name, value);
        }
        mapping
    }
}

impl IntoIterator for RecordMapping {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Collects encoded fields for one record.
pub struct RecordEncoder<'a> {
    bridge: &'a Bridge,
    mapping: RecordMapping,
}

impl<'a> RecordEncoder<'a> {
    pub(crate) fn new(bridge: &'a Bridge) -> Self {
        Self {
            bridge,
            mapping: RecordMapping::new(),
        }
    }

    /// Encode one field with the native → flat → JSON policy.
    pub fn field<F: Serialize + 'static>(&mut self, name: &str, value: &F) -> Result<()> {
        let encoded = self
            .bridge
            .encode_value(value)
            .map_err(|e| e.with_field(name))?;
        self.mapping.insert(name, encoded);
        Ok(())
    }

    /// Store an already-built value under `name`.
    pub fn value(&mut self, name: &str, value: Value) {
        self.mapping.insert(name, value);
    }

    pub(crate) fn finish(self) -> RecordMapping {
        self.mapping
    }
}

/// Resolves fields for one record from a row or mapping.
pub struct RecordDecoder<'a> {
    bridge: &'a Bridge,
    source: &'a dyn FieldSource,
}

impl<'a> RecordDecoder<'a> {
    pub(crate) fn new(bridge: &'a Bridge, source: &'a dyn FieldSource) -> Self {
        Self { bridge, source }
    }

    /// Decode the field stored under a bare name.
    pub fn field<F: DeserializeOwned + 'static>(&self, name: &str) -> Result<F> {
        self.resolve(None, name)
    }

    /// Decode the field stored under `table.name`.
    pub fn qualified_field<F: DeserializeOwned + 'static>(
        &self,
        table: &str,
        name: &str,
    ) -> Result<F> {
        self.resolve(Some(table), name)
    }

    /// The raw value of a field, if present.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.source.lookup(None, name)
    }

    fn resolve<F: DeserializeOwned + 'static>(&self, table: Option<&str>, name: &str) -> Result<F> {
        let value = self.source.lookup(table, name).ok_or_else(|| {
            Error::FieldNotFound(FieldNotFoundError {
                field: name.to_string(),
                table: table.map(str::to_string),
            })
        })?;
        self.bridge
            .decode_value(value)
            .map_err(|e| e.with_field(name))
    }
}
