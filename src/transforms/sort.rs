//! Row ordering: sort, reverse, and shuffle primitives.
//!
//! Ordering is always applied within each facet independently; facets never exchange rows.
//! All three primitives consume the options' `sort` shorthand so an already-applied
//! ordering cannot be applied twice downstream.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, RngCore, SeedableRng};

use crate::domain::DomainSort;
use crate::error::{PipelineError, PipelineResult};
use crate::options::{valueof, ChannelValue};
use crate::order::{ascending_defined, descending_defined};
use crate::types::{Facet, Value};

use super::basic::{apply, initializer, InitializerUpdate, MarkOptions};
use super::basic::{InitializerFn, TransformFn};

/// Whole-row comparator used by [`Sort::ByRow`].
pub type RowComparator = Arc<dyn Fn(&[Value], &[Value]) -> Ordering>;

/// Custom value comparator usable as a [`SortOrder`].
pub type ValueComparator = Arc<dyn Fn(&Value, &Value) -> Ordering>;

/// Direction (or custom comparator) for value- and channel-mode sorts.
#[derive(Clone, Default)]
pub enum SortOrder {
    /// Ascending, undefined values last. The default.
    #[default]
    Ascending,
    /// Descending, undefined values still last.
    Descending,
    /// A caller-supplied comparator.
    Comparator(ValueComparator),
}

impl SortOrder {
    /// Parse an order token, case-insensitively. Any token other than
    /// `ascending`/`descending` is a fatal configuration error.
    pub fn from_token(token: &str) -> PipelineResult<Self> {
        match token.to_ascii_lowercase().as_str() {
            "ascending" => Ok(Self::Ascending),
            "descending" => Ok(Self::Descending),
            _ => Err(PipelineError::InvalidOrder {
                token: token.to_string(),
            }),
        }
    }

    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match self {
            SortOrder::Ascending => ascending_defined(a, b),
            SortOrder::Descending => descending_defined(a, b),
            SortOrder::Comparator(f) => f(a, b),
        }
    }
}

impl fmt::Debug for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => f.write_str("Ascending"),
            SortOrder::Descending => f.write_str("Descending"),
            SortOrder::Comparator(_) => f.write_str("Comparator(..)"),
        }
    }
}

/// How rows are ordered, decided once at configuration time.
#[derive(Clone)]
pub enum Sort {
    /// Derive a per-row key array and order rows by comparing keys.
    ByValue {
        /// Key derivation.
        value: ChannelValue,
        /// Key order.
        order: SortOrder,
    },
    /// Compare two whole rows directly.
    ByRow(RowComparator),
    /// Order rows by an already-derived channel's values; only valid in initializer
    /// position, because the named channel does not exist until initializers run.
    ByChannel {
        /// Channel name to sort by.
        channel: String,
        /// Key order.
        order: SortOrder,
    },
    /// Not a row ordering at all: a scale-domain ordering directive, deferred to
    /// domain inference and never compiled into a stage.
    Domain(DomainSort),
}

impl Sort {
    /// Ascending value-mode sort.
    pub fn by_value(value: impl Into<ChannelValue>) -> Self {
        Sort::ByValue {
            value: value.into(),
            order: SortOrder::Ascending,
        }
    }

    /// Value-mode sort with an explicit order.
    pub fn by_value_with(value: impl Into<ChannelValue>, order: SortOrder) -> Self {
        Sort::ByValue {
            value: value.into(),
            order,
        }
    }

    /// Whole-row comparator sort.
    pub fn by_row(compare: impl Fn(&[Value], &[Value]) -> Ordering + 'static) -> Self {
        Sort::ByRow(Arc::new(compare))
    }

    /// Ascending channel-mode sort.
    pub fn by_channel(channel: impl Into<String>) -> Self {
        Sort::ByChannel {
            channel: channel.into(),
            order: SortOrder::Ascending,
        }
    }

    /// Channel-mode sort with an explicit order.
    pub fn by_channel_with(channel: impl Into<String>, order: SortOrder) -> Self {
        Sort::ByChannel {
            channel: channel.into(),
            order,
        }
    }

    /// Whether this is a domain-sort directive rather than a row ordering.
    pub fn is_domain(&self) -> bool {
        matches!(self, Sort::Domain(_))
    }
}

impl fmt::Debug for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::ByValue { value, order } => f
                .debug_struct("ByValue")
                .field("value", value)
                .field("order", order)
                .finish(),
            Sort::ByRow(_) => f.write_str("ByRow(..)"),
            Sort::ByChannel { channel, order } => f
                .debug_struct("ByChannel")
                .field("channel", channel)
                .field("order", order)
                .finish(),
            Sort::Domain(d) => f.debug_tuple("Domain").field(d).finish(),
        }
    }
}

fn sorted_facets<F>(facets: &[Facet], mut compare: F) -> Vec<Facet>
where
    F: FnMut(usize, usize) -> Ordering,
{
    facets
        .iter()
        .map(|facet| {
            let mut out = facet.clone();
            out.sort_by(|&i, &j| compare(i, j));
            out
        })
        .collect()
}

/// Compile a row ordering into a transform stage.
///
/// Channel-mode sorts cannot run here: the named channel does not exist yet.
pub(crate) fn sort_transform(sort: &Sort) -> PipelineResult<TransformFn> {
    match sort {
        Sort::ByRow(compare) => {
            let compare = compare.clone();
            Ok(Arc::new(move |data, facets| {
                let facets = sorted_facets(&facets, |i, j| compare(&data.rows[i], &data.rows[j]));
                Ok((data, facets))
            }))
        }
        Sort::ByValue { value, order } => {
            let value = value.clone();
            let order = order.clone();
            Ok(Arc::new(move |data, facets| {
                let v = valueof(&data, &value)?;
                let facets = sorted_facets(&facets, |i, j| order.compare(&v[i], &v[j]));
                Ok((data, facets))
            }))
        }
        Sort::ByChannel { .. } => Err(PipelineError::ChannelSortRequiresInitializer),
        Sort::Domain(_) => unreachable!("domain sort is deferred to domain inference"),
    }
}

/// Compile a row ordering into an initializer stage.
///
/// A channel-mode sort whose channel is absent from the live channel map is a silent
/// no-op (empty update), not an error.
pub(crate) fn sort_initializer(sort: &Sort) -> PipelineResult<InitializerFn> {
    match sort {
        Sort::ByChannel { channel, order } => {
            let channel = channel.clone();
            let order = order.clone();
            Ok(Arc::new(move |_data, facets, channels, _scales, _dimensions| {
                let Some(ch) = channels.get(channel.as_str()) else {
                    return Ok(InitializerUpdate::default());
                };
                let v = &ch.value;
                let facets = sorted_facets(facets, |i, j| order.compare(&v[i], &v[j]));
                Ok(InitializerUpdate {
                    facets: Some(facets),
                    ..Default::default()
                })
            }))
        }
        Sort::Domain(_) => unreachable!("domain sort is deferred to domain inference"),
        other => Ok(super::basic::transform_as_initializer(sort_transform(other)?)),
    }
}

pub(crate) fn reverse_transform() -> TransformFn {
    Arc::new(|data, facets| {
        let facets = facets
            .iter()
            .map(|facet| facet.iter().rev().copied().collect())
            .collect();
        Ok((data, facets))
    })
}

fn shuffle_transform(seed: Option<u64>) -> TransformFn {
    Arc::new(move |data, facets| {
        let mut seeded;
        let mut ambient;
        let rng: &mut dyn RngCore = match seed {
            Some(seed) => {
                seeded = StdRng::seed_from_u64(seed);
                &mut seeded
            }
            None => {
                ambient = thread_rng();
                &mut ambient
            }
        };
        let facets = facets
            .iter()
            .map(|facet| {
                let mut out = facet.clone();
                out.shuffle(&mut *rng);
                out
            })
            .collect();
        Ok((data, facets))
    })
}

/// Sort rows within each facet.
///
/// Value- and row-comparator sorts compile into the transform pipeline; channel-mode
/// sorts compile into the initializer pipeline. A domain-sort directive is not compiled
/// at all: it is stored on the returned options for domain inference to consume. All
/// compiled modes consume the `sort` shorthand.
pub fn sort(value: Sort, options: MarkOptions) -> PipelineResult<MarkOptions> {
    match value {
        Sort::Domain(_) => {
            let mut out = options;
            out.sort = Some(value);
            Ok(out)
        }
        Sort::ByChannel { .. } => {
            let stage = sort_initializer(&value)?;
            let mut out = initializer(options, Some(stage))?;
            out.sort = None;
            Ok(out)
        }
        _ => {
            let stage = sort_transform(&value)?;
            let mut out = apply(options, stage)?;
            out.sort = None;
            Ok(out)
        }
    }
}

/// Reverse row order within each facet. Consumes the `sort` shorthand.
pub fn reverse(options: MarkOptions) -> PipelineResult<MarkOptions> {
    let mut out = apply(options, reverse_transform())?;
    out.sort = None;
    Ok(out)
}

/// Randomly permute rows within each facet. Consumes the `sort` shorthand.
///
/// With a seed the permutation is deterministic; without one it draws from the thread's
/// random source (the pipeline's only non-determinism).
pub fn shuffle(seed: Option<u64>, options: MarkOptions) -> PipelineResult<MarkOptions> {
    let mut out = apply(options, shuffle_transform(seed))?;
    out.sort = None;
    Ok(out)
}
