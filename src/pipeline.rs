//! Mark preparation: the end-to-end control flow over one mark's data.
//!
//! A [`MarkPipeline`] applies the composed transform to (data, facets), derives channels
//! from descriptors, runs the composed initializer and merges its updates, and finally
//! attaches deferred domain thunks when the options carry a domain-sort directive.
//!
//! ## Example: prepare a mark and read an inferred domain
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
//!         vec![Value::Utf8("apple".into()), Value::Int64(4)],
//!     ],
//! );
//!
//! let mut descriptors = IndexMap::new();
//! descriptors.insert("x".to_string(), ChannelDescriptor::new("units").with_scale("x"));
//! descriptors.insert("y".to_string(), ChannelDescriptor::new("fruit").with_scale("y"));
//!
//! // Order the y domain by the per-fruit maximum of x, largest first.
//! let mark = MarkOptions {
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
//! let domain = (prepared.domains["y"])();
//! assert_eq!(
//!     domain,
//!     vec![Value::Utf8("fig".into()), Value::Utf8("apple".into())]
//! );
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;

use crate::channel::{derive_channels, ChannelDescriptor, ChannelMap};
use crate::domain::{channel_domain, DomainFn};
use crate::error::PipelineResult;
use crate::observability::{BuildEvent, BuildObserver};
use crate::scales::ScaleSet;
use crate::transforms::{basic, initializer, MarkOptions, Sort};
use crate::types::{DataSet, Dimensions, Facet};

/// Configuration for a [`MarkPipeline`].
#[derive(Clone, Default)]
pub struct PipelineOptions {
    /// Frame dimensions handed to initializer stages.
    pub dimensions: Dimensions,
    /// Optional observer for build events.
    pub observer: Option<Arc<dyn BuildObserver>>,
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("dimensions", &self.dimensions)
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

/// The prepared state of one mark, ready for scale construction and geometry.
pub struct PreparedMark {
    /// The (possibly transform-replaced) data.
    pub data: DataSet,
    /// The final facet index sequences.
    pub facets: Vec<Facet>,
    /// The derived channels, including initializer updates.
    pub channels: ChannelMap,
    /// Deferred domain thunks keyed by channel name. The caller invokes one only when no
    /// explicitly configured scale domain takes precedence.
    pub domains: IndexMap<String, DomainFn>,
}

impl fmt::Debug for PreparedMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedMark")
            .field("rows", &self.data.row_count())
            .field("facets", &self.facets.len())
            .field("channels", &self.channels.len())
            .field("domains", &self.domains.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Runs the channel/transform/domain pipeline for one mark build.
///
/// Each build owns its data, facets, and channels exclusively; the pipeline holds no
/// state between runs beyond its configuration.
#[derive(Debug, Default)]
pub struct MarkPipeline {
    options: PipelineOptions,
}

impl MarkPipeline {
    /// Create a pipeline with the given options.
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Prepare one mark.
    ///
    /// Shorthand in `mark` is compiled first (through [`initializer`] when an initializer
    /// stage is present, else [`basic`]), so callers may pass either raw shorthand or
    /// already-composed options.
    pub fn run(
        &self,
        data: DataSet,
        facets: Vec<Facet>,
        mark: MarkOptions,
        descriptors: &IndexMap<String, ChannelDescriptor>,
        facet_channels: Option<&ChannelMap>,
        scales: &ScaleSet,
    ) -> PipelineResult<PreparedMark> {
        let start = Instant::now();
        self.emit(BuildEvent::BuildStarted {
            rows: data.row_count(),
            facets: facets.len(),
        });

        // Recorded off the raw options: composing for the initializer path consumes the
        // sort shorthand, and a domain directive must survive it.
        let domain_directive = match &mark.sort {
            Some(Sort::Domain(directive)) => Some(directive.clone()),
            _ => None,
        };
        let mark = if mark.initializer.is_some() {
            initializer(mark, None)?
        } else {
            basic(mark, None)?
        };

        let (mut data, mut facets) = match &mark.transform {
            Some(transform) => {
                let (data, facets) = transform(data, facets)?;
                self.emit(BuildEvent::TransformApplied {
                    facets: facets.len(),
                    indices: facets.iter().map(Vec::len).sum(),
                });
                (data, facets)
            }
            None => (data, facets),
        };

        let mut channels = derive_channels(descriptors, &data)?;
        self.emit(BuildEvent::ChannelsDerived {
            channels: channels.len(),
        });

        if let Some(init) = &mark.initializer {
            let update = init(&data, &facets, &channels, scales, &self.options.dimensions)?;
            let channels_updated = update.channels.as_ref().map(|c| c.len()).unwrap_or(0);
            if let Some(d) = update.data {
                data = d;
            }
            if let Some(f) = update.facets {
                facets = f;
            }
            if let Some(updated) = update.channels {
                for (name, channel) in updated {
                    channels.insert(name, channel);
                }
            }
            self.emit(BuildEvent::InitializerApplied { channels_updated });
        }

        let domains = match &domain_directive {
            Some(directive) => {
                let domains = channel_domain(&channels, facet_channels, &data, directive)?;
                for name in domains.keys() {
                    self.emit(BuildEvent::DomainDeferred {
                        channel: name.clone(),
                    });
                }
                domains
            }
            None => IndexMap::new(),
        };

        self.emit(BuildEvent::BuildFinished {
            elapsed: start.elapsed(),
        });
        Ok(PreparedMark {
            data,
            facets,
            channels,
            domains,
        })
    }

    fn emit(&self, event: BuildEvent) {
        if let Some(observer) = &self.options.observer {
            observer.on_event(&event);
        }
    }
}
