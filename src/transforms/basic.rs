//! The transform/initializer composition algebra.
//!
//! User options carry `filter`/`sort`/`reverse` shorthand and optional explicit
//! [`TransformFn`]/[`InitializerFn`] stages. [`basic`] and [`initializer`] fold the shorthand
//! into one canonical stage (filter, then sort, then reverse), append a caller-supplied
//! stage, and return the remaining options with the shorthand consumed.
//!
//! Transforms run during data preparation, before channels are derived; initializers run
//! after, and may read or replace channels. Appending a transform once an initializer is in
//! play is therefore rejected, and vice versa.

use std::fmt;
use std::sync::Arc;

use crate::channel::ChannelMap;
use crate::error::{PipelineError, PipelineResult};
use crate::options::ChannelValue;
use crate::scales::ScaleSet;
use crate::types::{DataSet, Dimensions, Facet};

use super::filter::filter_transform;
use super::sort::{reverse_transform, sort_initializer, sort_transform, Sort};

/// A transform stage: remaps (data, facets) before channels are derived.
pub type TransformFn = Arc<dyn Fn(DataSet, Vec<Facet>) -> PipelineResult<(DataSet, Vec<Facet>)>>;

/// An initializer stage: runs after channels exist and returns a partial update.
pub type InitializerFn = Arc<
    dyn Fn(
        &DataSet,
        &[Facet],
        &ChannelMap,
        &ScaleSet,
        &Dimensions,
    ) -> PipelineResult<InitializerUpdate>,
>;

/// Partial output of an initializer stage; absent fields default to the stage's inputs.
#[derive(Default)]
pub struct InitializerUpdate {
    /// Replacement data, if the stage produced any.
    pub data: Option<DataSet>,
    /// Replacement facets, if the stage produced any.
    pub facets: Option<Vec<Facet>>,
    /// Channels derived or replaced by the stage, merged over the inputs by the caller.
    pub channels: Option<ChannelMap>,
}

impl fmt::Debug for InitializerUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializerUpdate")
            .field("data_set", &self.data.is_some())
            .field("facets_set", &self.facets.is_some())
            .field(
                "channels",
                &self.channels.as_ref().map(|c| c.len()).unwrap_or(0),
            )
            .finish()
    }
}

/// The options consumed by the composer: shorthand plus explicit stages.
///
/// Other mark options (channel descriptors, domain-sort directives once compiled, etc.)
/// travel outside this struct; the composer only concerns itself with row selection and
/// ordering.
#[derive(Clone, Default)]
pub struct MarkOptions {
    /// Shorthand row filter: rows whose derived value is truthy are kept.
    pub filter: Option<ChannelValue>,
    /// Shorthand row ordering, or a domain-sort directive deferred to domain inference.
    pub sort: Option<Sort>,
    /// Shorthand per-facet reversal, applied after filter and sort.
    pub reverse: bool,
    /// Explicit transform stage; when present, the shorthand above is ignored.
    pub transform: Option<TransformFn>,
    /// Explicit initializer stage; when present, [`initializer`] ignores the shorthand.
    pub initializer: Option<InitializerFn>,
}

impl fmt::Debug for MarkOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkOptions")
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .field("reverse", &self.reverse)
            .field("transform_set", &self.transform.is_some())
            .field("initializer_set", &self.initializer.is_some())
            .finish()
    }
}

/// Compose two transform stages: `a` first, its output fed to `b`.
///
/// An absent stage leaves the other unchanged; two absent stages compose to nothing.
pub fn compose_transform(t1: Option<TransformFn>, t2: Option<TransformFn>) -> Option<TransformFn> {
    match (t1, t2) {
        (None, t2) => t2,
        (t1, None) => t1,
        (Some(a), Some(b)) => Some(Arc::new(move |data, facets| {
            let (data, facets) = a(data, facets)?;
            b(data, facets)
        })),
    }
}

/// Compose two initializer stages: `a` first, with `a`'s channel updates visible to `b`
/// and `b`'s channel outputs winning key collisions in the merged result.
pub fn compose_initializer(
    i1: Option<InitializerFn>,
    i2: Option<InitializerFn>,
) -> Option<InitializerFn> {
    match (i1, i2) {
        (None, i2) => i2,
        (i1, None) => i1,
        (Some(a), Some(b)) => Some(Arc::new(move |data, facets, channels, scales, dimensions| {
            let u1 = a(data, facets, channels, scales, dimensions)?;
            let d1: &DataSet = u1.data.as_ref().unwrap_or(data);
            let f1: &[Facet] = u1.facets.as_deref().unwrap_or(facets);
            let merged_storage;
            let c_in: &ChannelMap = match &u1.channels {
                Some(c1) => {
                    let mut merged = channels.clone();
                    for (name, ch) in c1 {
                        merged.insert(name.clone(), ch.clone());
                    }
                    merged_storage = merged;
                    &merged_storage
                }
                None => channels,
            };
            let u2 = b(d1, f1, c_in, scales, dimensions)?;
            let channels_out = match (u1.channels, u2.channels) {
                (None, c2) => c2,
                (c1, None) => c1,
                (Some(mut c1), Some(c2)) => {
                    for (name, ch) in c2 {
                        c1.insert(name, ch);
                    }
                    Some(c1)
                }
            };
            Ok(InitializerUpdate {
                data: u2.data.or(u1.data),
                facets: u2.facets.or(u1.facets),
                channels: channels_out,
            })
        })),
    }
}

/// Adapt a transform stage so it can run in initializer position.
///
/// The stage ignores channels, scales, and dimensions, and reports its (data, facets)
/// output as a full replacement.
pub fn transform_as_initializer(t: TransformFn) -> InitializerFn {
    Arc::new(move |data, facets, _channels, _scales, _dimensions| {
        let (data, facets) = t(data.clone(), facets.to_vec())?;
        Ok(InitializerUpdate {
            data: Some(data),
            facets: Some(facets),
            channels: None,
        })
    })
}

/// Fold the options' shorthand into a single transform stage and append `t2`.
///
/// Shorthand compiles in strict order filter → sort → reverse, unless an explicit
/// `transform` already exists (which overrides the shorthand entirely). A domain-sort
/// `sort` is never compiled here; it is passed through for domain inference. Appending a
/// non-null `t2` while the options carry an initializer is a configuration error, because
/// the appended transform would run on data the initializer has not yet seen.
pub fn basic(options: MarkOptions, t2: Option<TransformFn>) -> PipelineResult<MarkOptions> {
    let MarkOptions {
        filter,
        sort,
        reverse,
        transform,
        initializer,
    } = options;
    let mut t1 = transform;
    if t1.is_none() {
        if let Some(f) = filter {
            t1 = Some(filter_transform(f));
        }
        if let Some(s) = &sort {
            if !s.is_domain() {
                t1 = compose_transform(t1, Some(sort_transform(s)?));
            }
        }
        if reverse {
            t1 = compose_transform(t1, Some(reverse_transform()));
        }
    }
    if t2.is_some() && initializer.is_some() {
        return Err(PipelineError::TransformAfterInitializer);
    }
    // Only a domain sort survives as an option; compiled sorts must not leak through.
    let sort = sort.filter(Sort::is_domain);
    Ok(MarkOptions {
        filter: None,
        sort,
        reverse: false,
        transform: compose_transform(t1, t2),
        initializer: None,
    })
}

/// Fold the options' shorthand into a single initializer stage and append `i2`.
///
/// Appending a non-null `i2` while the options carry an explicit `transform` is a
/// configuration error (the transform/initializer layering guard).
pub fn initializer(options: MarkOptions, i2: Option<InitializerFn>) -> PipelineResult<MarkOptions> {
    let MarkOptions {
        filter,
        sort,
        reverse,
        transform,
        initializer: i1,
    } = options;
    if i2.is_some() && transform.is_some() {
        return Err(PipelineError::TransformAfterInitializer);
    }
    let mut i1 = i1;
    if i1.is_none() {
        if let Some(f) = filter {
            i1 = Some(transform_as_initializer(filter_transform(f)));
        }
        if let Some(s) = &sort {
            if !s.is_domain() {
                i1 = compose_initializer(i1, Some(sort_initializer(s)?));
            }
        }
        if reverse {
            i1 = compose_initializer(i1, Some(transform_as_initializer(reverse_transform())));
        }
    }
    Ok(MarkOptions {
        filter: None,
        sort: None,
        reverse: false,
        transform,
        initializer: compose_initializer(i1, i2),
    })
}

/// Route a primitive transform through [`initializer`] when one is already in play,
/// otherwise through [`basic`].
pub(crate) fn apply(options: MarkOptions, t: TransformFn) -> PipelineResult<MarkOptions> {
    if options.initializer.is_some() {
        initializer(options, Some(transform_as_initializer(t)))
    } else {
        basic(options, Some(t))
    }
}
