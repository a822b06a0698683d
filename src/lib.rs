//! `rust-plot-pipeline` is a small library for preparing plot mark data: it turns raw
//! tabular rows into typed, scale-bound channels, applies composable row-selection and
//! reordering transforms, and lazily infers sorted/limited domains for scales when the
//! caller does not configure one explicitly.
//!
//! Data is held in an in-memory [`types::DataSet`] described by a [`types::Schema`]; the
//! transform layer never copies rows, it remaps ordered row-index sequences
//! ([`types::Facet`]s). Everything is built per mark build and discarded afterward; the
//! pipeline renders nothing and reads no files.
//!
//! ## Quick example: filter, sort, and an inferred domain
//!
//! ```rust
//! use indexmap::IndexMap;
//! use rust_plot_pipeline::channel::ChannelDescriptor;
//! use rust_plot_pipeline::domain::{DomainSort, ScaleSort};
//! use rust_plot_pipeline::pipeline::{MarkPipeline, PipelineOptions};
//! use rust_plot_pipeline::scales::ScaleSet;
//! use rust_plot_pipeline::transforms::{MarkOptions, Sort};
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
//!         vec![Value::Utf8("apple".into()), Value::Int64(3)],
//!         vec![Value::Utf8("fig".into()), Value::Int64(9)],
//!         vec![Value::Utf8("pear".into()), Value::Int64(0)],
//!     ],
//! );
//!
//! let mut descriptors = IndexMap::new();
//! descriptors.insert("x".to_string(), ChannelDescriptor::new("units").with_scale("x"));
//! descriptors.insert("y".to_string(), ChannelDescriptor::new("fruit").with_scale("y"));
//!
//! // Drop zero-unit rows; order the y domain by x, largest first.
//! let mark = MarkOptions {
//!     filter: Some("units".into()),
//!     sort: Some(Sort::Domain(
//!         DomainSort::new().scale("y", ScaleSort::by("x").reverse(true)),
//!     )),
//!     ..Default::default()
//! };
//!
//! let facets = data.single_facet();
//! let pipeline = MarkPipeline::new(PipelineOptions::default());
//! let prepared = pipeline.run(data, facets, mark, &descriptors, None, &ScaleSet::new())?;
//!
//! assert_eq!(prepared.facets, vec![vec![0, 1]]);
//! let domain = (prepared.domains["y"])();
//! assert_eq!(domain[0], Value::Utf8("fig".into()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: schema + in-memory dataset types, facets, frame dimensions
//! - [`options`]: value specifiers ([`options::ChannelValue`], `valueof`, `labelof`)
//! - [`order`]: null-aware comparators used throughout sorting
//! - [`channel`]: channel derivation and scale application
//! - [`scales`]: the scale registry boundary
//! - [`transforms`]: the transform/initializer composition algebra and primitives
//! - [`domain`]: lazy domain inference for scales
//! - [`pipeline`]: the end-to-end mark preparation flow
//! - [`observability`]: build-event observer hooks
//! - [`error`]: error types used across the pipeline

pub mod channel;
pub mod domain;
pub mod error;
pub mod observability;
pub mod options;
pub mod order;
pub mod pipeline;
pub mod scales;
pub mod transforms;
pub mod types;

pub use error::{PipelineError, PipelineResult};
