//! The reducer registry: aggregating a group of secondary values into one scalar.
//!
//! Domain inference ranks primary-domain keys by reducing each group's secondary
//! subsequence; reducers receive the group's row indices plus the full secondary array.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::order::{ascending_defined, is_defined};
use crate::types::{DataSet, Value};

/// Built-in reduction operations over a group of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReduceOp {
    /// Count all group members (including nulls).
    Count,
    /// Sum numeric values, ignoring nulls and non-numbers.
    Sum,
    /// Smallest defined value (any orderable type).
    Min,
    /// Largest defined value (any orderable type).
    Max,
    /// Arithmetic mean of numeric values, ignoring nulls and non-numbers.
    Mean,
    /// The group's first value, in row order.
    First,
    /// The group's last value, in row order.
    Last,
}

impl ReduceOp {
    /// Resolve a reducer by name, case-insensitively. Unknown names are fatal.
    pub fn from_name(name: &str) -> PipelineResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "sum" => Ok(Self::Sum),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "mean" => Ok(Self::Mean),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            _ => Err(PipelineError::UnknownReducer {
                name: name.to_string(),
            }),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
            Self::First => "first",
            Self::Last => "last",
        }
    }

    /// Reduce one group, given its row indices and the full secondary value array.
    ///
    /// `Sum`/`Mean` yield `Null` when the group has no numeric values; `Min`/`Max` yield
    /// `Null` when it has no defined values.
    pub fn reduce(&self, indices: &[usize], values: &[Value]) -> Value {
        match self {
            Self::Count => Value::Int64(indices.len() as i64),
            Self::Sum | Self::Mean => {
                let mut sum = 0.0;
                let mut count = 0usize;
                let mut all_int = true;
                for &i in indices {
                    match &values[i] {
                        Value::Int64(v) => {
                            sum += *v as f64;
                            count += 1;
                        }
                        Value::Float64(v) if !v.is_nan() => {
                            sum += v;
                            count += 1;
                            all_int = false;
                        }
                        _ => {}
                    }
                }
                if count == 0 {
                    Value::Null
                } else if matches!(self, Self::Mean) {
                    Value::Float64(sum / count as f64)
                } else if all_int {
                    Value::Int64(sum as i64)
                } else {
                    Value::Float64(sum)
                }
            }
            Self::Min => indices
                .iter()
                .map(|&i| &values[i])
                .filter(|v| is_defined(v))
                .min_by(|a, b| ascending_defined(a, b))
                .cloned()
                .unwrap_or(Value::Null),
            Self::Max => indices
                .iter()
                .map(|&i| &values[i])
                .filter(|v| is_defined(v))
                .max_by(|a, b| ascending_defined(a, b))
                .cloned()
                .unwrap_or(Value::Null),
            Self::First => indices
                .first()
                .map(|&i| values[i].clone())
                .unwrap_or(Value::Null),
            Self::Last => indices
                .last()
                .map(|&i| values[i].clone())
                .unwrap_or(Value::Null),
        }
    }
}

/// Custom reducer over a group's (indices, secondary values).
pub type ValueReducerFn = Arc<dyn Fn(&[usize], &[Value]) -> Value>;

/// Custom reducer over a group's (indices, raw data rows), for the `data` payload.
pub type RowReducerFn = Arc<dyn Fn(&[usize], &DataSet) -> Value>;

/// How (and whether) a domain-sort entry reduces its secondary values.
#[derive(Clone, Default)]
pub enum ReduceSpec {
    /// Reduce with [`ReduceOp::Max`]. The default.
    #[default]
    Auto,
    /// Skip domain ordering for this entry entirely.
    Disabled,
    /// A built-in reducer.
    Op(ReduceOp),
    /// A custom reducer over secondary values.
    Value(ValueReducerFn),
    /// A custom reducer over raw data rows.
    Rows(RowReducerFn),
}

impl ReduceSpec {
    /// Resolve a built-in reducer spec by name; unknown names are fatal.
    pub fn from_name(name: &str) -> PipelineResult<Self> {
        Ok(Self::Op(ReduceOp::from_name(name)?))
    }

    /// Wrap a closure as a custom value reducer.
    pub fn value_reducer(f: impl Fn(&[usize], &[Value]) -> Value + 'static) -> Self {
        Self::Value(Arc::new(f))
    }

    /// Wrap a closure as a custom raw-row reducer.
    pub fn row_reducer(f: impl Fn(&[usize], &DataSet) -> Value + 'static) -> Self {
        Self::Rows(Arc::new(f))
    }
}

impl From<ReduceOp> for ReduceSpec {
    fn from(op: ReduceOp) -> Self {
        Self::Op(op)
    }
}

impl fmt::Debug for ReduceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("Auto"),
            Self::Disabled => f.write_str("Disabled"),
            Self::Op(op) => f.debug_tuple("Op").field(op).finish(),
            Self::Value(_) => f.write_str("Value(..)"),
            Self::Rows(_) => f.write_str("Rows(..)"),
        }
    }
}

/// A reducer resolved from a [`ReduceSpec`], ready to apply per group.
#[derive(Clone)]
pub(crate) enum Reducer {
    Op(ReduceOp),
    Value(ValueReducerFn),
    Rows(RowReducerFn),
}

impl Reducer {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Reducer::Op(op) => op.name(),
            Reducer::Value(_) => "custom",
            Reducer::Rows(_) => "custom-rows",
        }
    }
}

/// Resolve a reduce spec into an applicable reducer, or `None` when disabled.
pub(crate) fn maybe_reduce(spec: &ReduceSpec) -> Option<Reducer> {
    match spec {
        ReduceSpec::Disabled => None,
        ReduceSpec::Auto => Some(Reducer::Op(ReduceOp::Max)),
        ReduceSpec::Op(op) => Some(Reducer::Op(*op)),
        ReduceSpec::Value(f) => Some(Reducer::Value(f.clone())),
        ReduceSpec::Rows(f) => Some(Reducer::Rows(f.clone())),
    }
}
