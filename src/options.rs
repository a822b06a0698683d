//! Value specifiers: how a per-row channel array is derived from the data.
//!
//! A [`ChannelValue`] is decided once at configuration time (field lookup, constant,
//! literal array, or per-row accessor); [`valueof`] materializes it against a dataset and
//! [`labelof`] derives a human-readable label from it.

use std::fmt;
use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{DataSet, Value};

/// Per-row accessor: `(row, row index) -> value`.
pub type RowAccessor = Arc<dyn Fn(&[Value], usize) -> Value>;

/// How to derive a per-row value array from the data.
#[derive(Clone)]
pub enum ChannelValue {
    /// Named column looked up in the dataset schema.
    Field(String),
    /// The same constant for every row.
    Constant(Value),
    /// Literal per-row values, used as given.
    Values(Vec<Value>),
    /// A per-row accessor function.
    Accessor(RowAccessor),
}

impl ChannelValue {
    /// Wrap a closure as an accessor specifier.
    pub fn accessor(f: impl Fn(&[Value], usize) -> Value + 'static) -> Self {
        ChannelValue::Accessor(Arc::new(f))
    }
}

impl fmt::Debug for ChannelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelValue::Field(name) => f.debug_tuple("Field").field(name).finish(),
            ChannelValue::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            ChannelValue::Values(vs) => f.debug_tuple("Values").field(&vs.len()).finish(),
            ChannelValue::Accessor(_) => f.write_str("Accessor(..)"),
        }
    }
}

impl From<&str> for ChannelValue {
    fn from(name: &str) -> Self {
        ChannelValue::Field(name.to_string())
    }
}

impl From<String> for ChannelValue {
    fn from(name: String) -> Self {
        ChannelValue::Field(name)
    }
}

impl From<Value> for ChannelValue {
    fn from(v: Value) -> Self {
        ChannelValue::Constant(v)
    }
}

impl From<Vec<Value>> for ChannelValue {
    fn from(vs: Vec<Value>) -> Self {
        ChannelValue::Values(vs)
    }
}

/// Derive the per-row value array for `value` over `data`.
///
/// A [`ChannelValue::Field`] naming a column absent from the schema is a fatal
/// [`PipelineError::UnknownColumn`].
pub fn valueof(data: &DataSet, value: &ChannelValue) -> PipelineResult<Vec<Value>> {
    match value {
        ChannelValue::Field(name) => {
            let idx = data
                .schema
                .index_of(name)
                .ok_or_else(|| PipelineError::UnknownColumn { name: name.clone() })?;
            Ok(data
                .rows
                .iter()
                .map(|row| row.get(idx).cloned().unwrap_or(Value::Null))
                .collect())
        }
        ChannelValue::Constant(v) => Ok(vec![v.clone(); data.row_count()]),
        ChannelValue::Values(vs) => Ok(vs.clone()),
        ChannelValue::Accessor(f) => Ok(data
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| f(row.as_slice(), i))
            .collect()),
    }
}

/// Derive a human-readable label from a value specifier.
///
/// Only field lookups carry a usable name; other specifiers have no label.
pub fn labelof(value: &ChannelValue) -> Option<String> {
    match value {
        ChannelValue::Field(name) => Some(name.clone()),
        _ => None,
    }
}
