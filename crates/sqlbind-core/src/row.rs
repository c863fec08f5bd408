//! Database row representation.

use crate::Result;
use crate::convert::NativeValue;
use crate::error::{Error, FieldNotFoundError};
use crate::types::ColumnDescriptor;
use crate::value::Value;
use std::sync::Arc;

/// Anything the bridge can resolve record fields from.
pub trait FieldSource {
    /// Look up a value by `(table?, name)`.
    ///
    /// With a table, only a column from that table matches. Without one,
    /// the first column with that name wins.
    fn lookup(&self, table: Option<&str>, name: &str) -> Option<&Value>;
}

/// A single row returned from a query.
///
/// Column metadata is shared via `Arc` by every row of one result set.
#[derive(Debug, Clone)]
pub struct Row {
    /// Column values in order
    values: Vec<Value>,
    /// Shared column metadata
    columns: Arc<[ColumnDescriptor]>,
}

impl Row {
    /// Create a row from shared column metadata and its values.
    ///
    /// Surplus columns or values are ignored by lookups; the parser always
    /// produces matching lengths.
    pub fn new(columns: Arc<[ColumnDescriptor]>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Get the shared column metadata.
    pub fn columns(&self) -> Arc<[ColumnDescriptor]> {
        Arc::clone(&self.columns)
    }

    /// Get the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if this row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by bare column name (first match).
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.lookup(None, name)
    }

    /// Get a value by table-qualified column name.
    pub fn get_qualified(&self, table: &str, name: &str) -> Option<&Value> {
        self.lookup(Some(table), name)
    }

    /// Get a typed value by column name.
    pub fn get_named<T: NativeValue>(&self, name: &str) -> Result<T> {
        let value = self.get_by_name(name).ok_or_else(|| {
            Error::FieldNotFound(FieldNotFoundError {
                field: name.to_string(),
                table: None,
            })
        })?;
        T::from_value(value).map_err(|e| e.with_field(name))
    }

    /// Iterate over (descriptor, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&ColumnDescriptor, &Value)> {
        self.columns.iter().zip(self.values.iter())
    }

    /// Consume the row, returning its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl FieldSource for Row {
    fn lookup(&self, table: Option<&str>, name: &str) -> Option<&Value> {
        self.iter()
            .find(|(col, _)| col.matches(table, name))
            .map(|(_, value)| value)
    }
}
