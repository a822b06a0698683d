//! Row-selection and reordering transforms.
//!
//! Transforms remap (data, facets) before channels are derived; initializers remap after
//! channels exist. [`basic`] and [`initializer`] fold shorthand options into one canonical
//! stage, and the primitives ([`filter()`], [`sort()`], [`reverse()`], [`shuffle()`])
//! build on that composition algebra.
//!
//! ## Example: filter and sort shorthand
//!
//! ```rust
//! use rust_plot_pipeline::transforms::{basic, MarkOptions, Sort};
//! use rust_plot_pipeline::types::{DataSet, DataType, Field, Schema, Value};
//!
//! # fn main() -> Result<(), rust_plot_pipeline::PipelineError> {
//! let schema = Schema::new(vec![
//!     Field::new("fruit", DataType::Utf8),
//!     Field::new("units", DataType::Int64),
//! ]);
//! let data = DataSet::new(
//!     schema,
//!     vec![
//!         vec![Value::Utf8("fig".into()), Value::Int64(9)],
//!         vec![Value::Utf8("apple".into()), Value::Int64(3)],
//!         vec![Value::Utf8("pear".into()), Value::Int64(0)],
//!     ],
//! );
//!
//! // Keep rows with nonzero units, then order them by units.
//! let options = MarkOptions {
//!     filter: Some("units".into()),
//!     sort: Some(Sort::by_value("units")),
//!     ..Default::default()
//! };
//! let options = basic(options, None)?;
//!
//! let transform = options.transform.expect("compiled stage");
//! let facets = data.single_facet();
//! let (_data, facets) = transform(data, facets)?;
//! assert_eq!(facets, vec![vec![1, 0]]);
//! # Ok(())
//! # }
//! ```

pub mod basic;
pub mod filter;
pub mod reduce;
pub mod sort;

pub use basic::{
    basic, compose_initializer, compose_transform, initializer, transform_as_initializer,
    InitializerFn, InitializerUpdate, MarkOptions, TransformFn,
};
pub use filter::filter;
pub use reduce::{ReduceOp, ReduceSpec, RowReducerFn, ValueReducerFn};
pub use sort::{reverse, shuffle, sort, RowComparator, Sort, SortOrder, ValueComparator};
