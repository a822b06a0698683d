//! Domain inference: lazily computed, sorted/limited scale domains.
//!
//! For each recognized scale key in a [`DomainSort`], this module resolves the bound
//! channel and builds a deferred domain thunk. Channels stay immutable: the thunks are
//! returned as a separate name → closure mapping, and the caller invokes one only when no
//! explicitly configured scale domain takes precedence. Nothing is grouped, reduced, or
//! sorted until a thunk runs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::channel::{Channel, ChannelMap};
use crate::error::{PipelineError, PipelineResult};
use crate::order::{ascending_defined, compare_values, descending_defined};
use crate::scales::is_scale_key;
use crate::transforms::reduce::{maybe_reduce, ReduceOp, ReduceSpec, Reducer};
use crate::types::{DataSet, Value};

/// Deferred domain computation for one channel.
pub type DomainFn = Box<dyn Fn() -> Vec<Value>>;

/// Truncation window over the (possibly reduced) domain, resolved to `[lo, hi)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limit {
    /// The first `n` entries (`[0, n)`).
    Head(usize),
    /// The last `n` entries.
    Tail(usize),
    /// An explicit `[lo, hi)` window, used verbatim (clamped to the domain length).
    Range(usize, usize),
}

impl Limit {
    fn window(&self, len: usize) -> (usize, usize) {
        match *self {
            Limit::Head(n) => (0, n.min(len)),
            Limit::Tail(n) => (len.saturating_sub(n), len),
            Limit::Range(lo, hi) => {
                let lo = lo.min(len);
                (lo, hi.min(len).max(lo))
            }
        }
    }
}

/// The secondary payload a domain-sort entry reduces over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainValue {
    /// The raw data rows themselves.
    Data,
    /// Element-wise |x2 − x1| over the `x1`/`x2` channel pair.
    Width,
    /// Element-wise |y2 − y1| over the `y1`/`y2` channel pair.
    Height,
    /// Another channel's values (`x`/`y` fall back to `x2`/`y2` when absent).
    Channel(String),
}

impl From<&str> for DomainValue {
    fn from(name: &str) -> Self {
        match name {
            "data" => DomainValue::Data,
            "width" => DomainValue::Width,
            "height" => DomainValue::Height,
            _ => DomainValue::Channel(name.to_string()),
        }
    }
}

/// Per-scale domain-sort directive.
///
/// Without a `value`, the domain is the channel's own values (intrinsic mode); with one,
/// the domain is the reduced, ranked set of distinct channel values (reduced mode).
#[derive(Debug, Clone, Default)]
pub struct ScaleSort {
    /// Secondary payload for reduced mode; absent means intrinsic mode.
    pub value: Option<DomainValue>,
    /// Sort direction; defaults to the plot-wide setting, else descending for
    /// `width`/`height` payloads and ascending otherwise.
    pub reverse: Option<bool>,
    /// Reducer; defaults to the plot-wide setting, else max.
    pub reduce: Option<ReduceSpec>,
    /// Truncation window; defaults to the plot-wide setting, else the full range.
    pub limit: Option<Limit>,
}

impl ScaleSort {
    /// Reduced-mode shorthand: sort this scale's domain by a secondary payload.
    pub fn by(value: impl Into<DomainValue>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Intrinsic-mode shorthand: the channel's own values, optionally windowed later.
    pub fn intrinsic() -> Self {
        Self::default()
    }

    /// Set the sort direction.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = Some(reverse);
        self
    }

    /// Set the reducer.
    pub fn reduce(mut self, reduce: impl Into<ReduceSpec>) -> Self {
        self.reduce = Some(reduce.into());
        self
    }

    /// Set the truncation window.
    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl From<&str> for ScaleSort {
    fn from(value: &str) -> Self {
        Self::by(value)
    }
}

/// The domain-sort options consumed by [`channel_domain`]: per-scale entries plus
/// plot-wide defaults. Entry keys that do not name a recognized scale are ignored.
#[derive(Debug, Clone, Default)]
pub struct DomainSort {
    /// Per-scale directives, keyed by scale name.
    pub entries: IndexMap<String, ScaleSort>,
    /// Plot-wide default sort direction.
    pub reverse: Option<bool>,
    /// Plot-wide default reducer (max when unset).
    pub reduce: Option<ReduceSpec>,
    /// Plot-wide default truncation window.
    pub limit: Option<Limit>,
}

impl DomainSort {
    /// Empty directive set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a per-scale directive.
    pub fn scale(mut self, key: impl Into<String>, sort: impl Into<ScaleSort>) -> Self {
        self.entries.insert(key.into(), sort.into());
        self
    }
}

enum Secondary {
    Values(Vec<Value>),
    Rows(DataSet),
}

/// Build deferred domain thunks for every scale directive in `options`.
///
/// The channel bound to each scale is resolved from the mark's `channels` first, then
/// from `facet_channels`; a scale with no bound channel is fatal. Thunks are keyed by the
/// resolved channel's name and capture everything they need, so invoking one later is
/// infallible and has no effect on the channels themselves.
pub fn channel_domain(
    channels: &ChannelMap,
    facet_channels: Option<&ChannelMap>,
    data: &DataSet,
    options: &DomainSort,
) -> PipelineResult<IndexMap<String, DomainFn>> {
    let mut out: IndexMap<String, DomainFn> = IndexMap::new();
    for (key, spec) in &options.entries {
        if !is_scale_key(key) {
            continue;
        }
        let y = spec.value.clone();
        let reverse = spec.reverse.or(options.reverse).unwrap_or(matches!(
            y,
            Some(DomainValue::Width) | Some(DomainValue::Height)
        ));
        let reduce_spec = spec
            .reduce
            .clone()
            .or_else(|| options.reduce.clone())
            .unwrap_or_default();
        let Some(reducer) = maybe_reduce(&reduce_spec) else {
            continue;
        };
        let limit = spec.limit.or(options.limit);
        let (name, x) = find_scale_channel(channels, key)
            .or_else(|| facet_channels.and_then(|fc| find_scale_channel(fc, key)))
            .ok_or_else(|| PipelineError::MissingScaleChannel { scale: key.clone() })?;
        let xv = x.value.clone();

        let thunk: DomainFn = match y {
            None => Box::new(move || {
                let mut domain = xv.clone();
                if reverse {
                    domain.reverse();
                }
                let (lo, hi) = resolve_window(limit, domain.len());
                domain[lo..hi].to_vec()
            }),
            Some(y) => {
                let payload = match &y {
                    DomainValue::Data => Secondary::Rows(data.clone()),
                    DomainValue::Height => Secondary::Values(difference(channels, "y1", "y2")?),
                    DomainValue::Width => Secondary::Values(difference(channels, "x1", "x2")?),
                    DomainValue::Channel(n) => {
                        let alias = match n.as_str() {
                            "y" => Some("y2"),
                            "x" => Some("x2"),
                            _ => None,
                        };
                        Secondary::Values(channel_values(channels, n, alias)?.to_vec())
                    }
                };
                validate_reducer(&reducer, &payload)?;
                Box::new(move || {
                    let groups = group_by_value(&xv);
                    let mut pairs: Vec<(Value, Value)> = groups
                        .into_iter()
                        .map(|(key, indices)| {
                            let reduced = reduce_group(&reducer, &indices, &payload);
                            (key, reduced)
                        })
                        .collect();
                    pairs.sort_by(|(ak, av), (bk, bv)| {
                        let by_reduced = if reverse {
                            descending_defined(av, bv)
                        } else {
                            ascending_defined(av, bv)
                        };
                        by_reduced.then_with(|| compare_values(ak, bk))
                    });
                    let (lo, hi) = resolve_window(limit, pairs.len());
                    pairs[lo..hi].iter().map(|(k, _)| k.clone()).collect()
                })
            }
        };
        out.insert(name.to_string(), thunk);
    }
    Ok(out)
}

fn resolve_window(limit: Option<Limit>, len: usize) -> (usize, usize) {
    match limit {
        Some(limit) => limit.window(len),
        None => (0, len),
    }
}

fn find_scale_channel<'a>(channels: &'a ChannelMap, scale: &str) -> Option<(&'a str, &'a Channel)> {
    channels
        .iter()
        .find(|(_, channel)| channel.scale.as_deref() == Some(scale))
        .map(|(name, channel)| (name.as_str(), channel))
}

fn channel_values<'a>(
    channels: &'a ChannelMap,
    name: &str,
    alias: Option<&str>,
) -> PipelineResult<&'a [Value]> {
    channels
        .get(name)
        .or_else(|| alias.and_then(|a| channels.get(a)))
        .map(|channel| channel.value.as_slice())
        .ok_or_else(|| PipelineError::MissingChannel {
            name: name.to_string(),
        })
}

fn difference(channels: &ChannelMap, k1: &str, k2: &str) -> PipelineResult<Vec<Value>> {
    let x1 = channel_values(channels, k1, None)?;
    let x2 = channel_values(channels, k2, None)?;
    Ok(x1
        .iter()
        .zip(x2.iter())
        .map(|(a, b)| match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => Value::Float64((b - a).abs()),
            _ => Value::Null,
        })
        .collect())
}

/// Partition row indices into groups of equal primary value.
///
/// Groups come out key-ordered with each group's indices in ascending row order; the
/// caller's reduced-value sort determines the final domain order.
fn group_by_value(xv: &[Value]) -> Vec<(Value, Vec<usize>)> {
    let mut order: Vec<usize> = (0..xv.len()).collect();
    order.sort_by(|&i, &j| compare_values(&xv[i], &xv[j]));
    let mut groups: Vec<(Value, Vec<usize>)> = Vec::new();
    for i in order {
        match groups.last_mut() {
            Some((key, indices)) if compare_values(key, &xv[i]) == Ordering::Equal => {
                indices.push(i);
            }
            _ => groups.push((xv[i].clone(), vec![i])),
        }
    }
    groups
}

fn validate_reducer(reducer: &Reducer, payload: &Secondary) -> PipelineResult<()> {
    let compatible = match payload {
        Secondary::Values(_) => !matches!(reducer, Reducer::Rows(_)),
        Secondary::Rows(_) => {
            matches!(reducer, Reducer::Rows(_) | Reducer::Op(ReduceOp::Count))
        }
    };
    if compatible {
        Ok(())
    } else {
        Err(PipelineError::ReducerPayloadMismatch {
            reducer: reducer.name().to_string(),
            payload: match payload {
                Secondary::Values(_) => "values".to_string(),
                Secondary::Rows(_) => "data".to_string(),
            },
        })
    }
}

fn reduce_group(reducer: &Reducer, indices: &[usize], payload: &Secondary) -> Value {
    match (reducer, payload) {
        (Reducer::Op(op), Secondary::Values(values)) => op.reduce(indices, values),
        (Reducer::Value(f), Secondary::Values(values)) => f(indices, values),
        (Reducer::Op(ReduceOp::Count), Secondary::Rows(_)) => Value::Int64(indices.len() as i64),
        (Reducer::Rows(f), Secondary::Rows(data)) => f(indices, data),
        // Incompatible pairs are rejected by validate_reducer before any thunk is built.
        _ => unreachable!("reducer/payload mismatch survived validation"),
    }
}

#[cfg(test)]
mod tests {
    use super::{channel_domain, DomainSort, Limit, ScaleSort};
    use crate::channel::{derive_channels, ChannelDescriptor};
    use crate::transforms::reduce::{ReduceOp, ReduceSpec};
    use crate::types::{DataSet, DataType, Field, Schema, Value};
    use indexmap::IndexMap;

    fn dataset(xs: &[&str], ys: &[i64]) -> DataSet {
        let schema = Schema::new(vec![
            Field::new("cat", DataType::Utf8),
            Field::new("n", DataType::Int64),
        ]);
        let rows = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| vec![Value::Utf8(x.to_string()), Value::Int64(*y)])
            .collect();
        DataSet::new(schema, rows)
    }

    fn channels_for(ds: &DataSet) -> crate::channel::ChannelMap {
        let mut descriptors = IndexMap::new();
        descriptors.insert("x".to_string(), ChannelDescriptor::new("cat").with_scale("x"));
        descriptors.insert("y".to_string(), ChannelDescriptor::new("n").with_scale("y"));
        derive_channels(&descriptors, ds).unwrap()
    }

    #[test]
    fn intrinsic_domain_applies_reverse_and_window() {
        let schema = Schema::new(vec![Field::new("v", DataType::Int64)]);
        let ds = DataSet::new(
            schema,
            vec![
                vec![Value::Int64(3)],
                vec![Value::Int64(1)],
                vec![Value::Int64(2)],
            ],
        );
        let mut descriptors = IndexMap::new();
        descriptors.insert("x".to_string(), ChannelDescriptor::new("v").with_scale("x"));
        let channels = derive_channels(&descriptors, &ds).unwrap();

        let options = DomainSort::new()
            .scale("x", ScaleSort::intrinsic().reverse(false).limit(Limit::Head(2)));
        let domains = channel_domain(&channels, None, &ds, &options).unwrap();
        assert_eq!(domains["x"](), vec![Value::Int64(3), Value::Int64(1)]);

        let options = DomainSort::new()
            .scale("x", ScaleSort::intrinsic().reverse(false).limit(Limit::Tail(1)));
        let domains = channel_domain(&channels, None, &ds, &options).unwrap();
        assert_eq!(domains["x"](), vec![Value::Int64(2)]);

        let options = DomainSort::new().scale("x", ScaleSort::intrinsic().reverse(true));
        let domains = channel_domain(&channels, None, &ds, &options).unwrap();
        assert_eq!(
            domains["x"](),
            vec![Value::Int64(2), Value::Int64(1), Value::Int64(3)]
        );
    }

    #[test]
    fn reduced_domain_groups_reduces_and_ranks() {
        let ds = dataset(&["a", "a", "b"], &[1, 5, 2]);
        let channels = channels_for(&ds);
        let options = DomainSort::new().scale(
            "x",
            ScaleSort::by("y")
                .reduce(ReduceOp::Max)
                .reverse(false),
        );
        let domains = channel_domain(&channels, None, &ds, &options).unwrap();
        // max(a) = 5, max(b) = 2; ascending by reduced value.
        assert_eq!(
            domains["x"](),
            vec![Value::Utf8("b".to_string()), Value::Utf8("a".to_string())]
        );
    }

    #[test]
    fn reduced_domain_breaks_ties_by_ascending_key() {
        let ds = dataset(&["b", "a", "c"], &[2, 2, 1]);
        let channels = channels_for(&ds);
        let options = DomainSort::new().scale("x", ScaleSort::by("y").reverse(false));
        let domains = channel_domain(&channels, None, &ds, &options).unwrap();
        assert_eq!(
            domains["x"](),
            vec![
                Value::Utf8("c".to_string()),
                Value::Utf8("a".to_string()),
                Value::Utf8("b".to_string()),
            ]
        );
        // Descending by reduced value still breaks ties ascending by key.
        let options = DomainSort::new().scale("x", ScaleSort::by("y").reverse(true));
        let domains = channel_domain(&channels, None, &ds, &options).unwrap();
        assert_eq!(
            domains["x"](),
            vec![
                Value::Utf8("a".to_string()),
                Value::Utf8("b".to_string()),
                Value::Utf8("c".to_string()),
            ]
        );
    }

    #[test]
    fn missing_scale_channel_is_fatal() {
        let ds = dataset(&["a"], &[1]);
        let channels = channels_for(&ds);
        let options = DomainSort::new().scale("color", ScaleSort::intrinsic());
        let err = match channel_domain(&channels, None, &ds, &options) {
            Err(e) => e,
            Ok(_) => panic!("expected channel_domain to return an error"),
        };
        assert!(err.to_string().contains("missing channel for scale: color"));
    }

    #[test]
    fn unrecognized_keys_and_disabled_reducers_are_skipped() {
        let ds = dataset(&["a"], &[1]);
        let channels = channels_for(&ds);
        let options = DomainSort::new()
            .scale("title", ScaleSort::intrinsic())
            .scale("x", ScaleSort::by("y").reduce(ReduceSpec::Disabled));
        let domains = channel_domain(&channels, None, &ds, &options).unwrap();
        assert!(domains.is_empty());
    }

    #[test]
    fn width_and_height_payloads_default_to_descending() {
        let schema = Schema::new(vec![
            Field::new("cat", DataType::Utf8),
            Field::new("lo", DataType::Int64),
            Field::new("hi", DataType::Int64),
        ]);
        let ds = DataSet::new(
            schema,
            vec![
                vec![Value::Utf8("a".to_string()), Value::Int64(0), Value::Int64(1)],
                vec![Value::Utf8("b".to_string()), Value::Int64(0), Value::Int64(5)],
            ],
        );
        let mut descriptors = IndexMap::new();
        descriptors.insert("y".to_string(), ChannelDescriptor::new("cat").with_scale("y"));
        descriptors.insert("x1".to_string(), ChannelDescriptor::new("lo"));
        descriptors.insert("x2".to_string(), ChannelDescriptor::new("hi"));
        let channels = derive_channels(&descriptors, &ds).unwrap();

        let options = DomainSort::new().scale("y", ScaleSort::by("width"));
        let domains = channel_domain(&channels, None, &ds, &options).unwrap();
        // Widths are 1 and 5; lengths sort descending by default.
        assert_eq!(
            domains["y"](),
            vec![Value::Utf8("b".to_string()), Value::Utf8("a".to_string())]
        );
    }

    #[test]
    fn width_payload_with_missing_pair_channel_is_fatal() {
        let ds = dataset(&["a"], &[1]);
        let channels = channels_for(&ds);
        let options = DomainSort::new().scale("x", ScaleSort::by("width"));
        let err = match channel_domain(&channels, None, &ds, &options) {
            Err(e) => e,
            Ok(_) => panic!("expected channel_domain to return an error"),
        };
        assert!(err.to_string().contains("missing channel: x1"));
    }

    #[test]
    fn bare_x_and_y_payloads_fall_back_to_x2_y2() {
        let schema = Schema::new(vec![
            Field::new("cat", DataType::Utf8),
            Field::new("end", DataType::Int64),
        ]);
        let ds = DataSet::new(
            schema,
            vec![
                vec![Value::Utf8("a".to_string()), Value::Int64(4)],
                vec![Value::Utf8("b".to_string()), Value::Int64(2)],
            ],
        );
        let mut descriptors = IndexMap::new();
        descriptors.insert("x".to_string(), ChannelDescriptor::new("cat").with_scale("x"));
        descriptors.insert("y2".to_string(), ChannelDescriptor::new("end"));
        let channels = derive_channels(&descriptors, &ds).unwrap();

        let options = DomainSort::new().scale("x", ScaleSort::by("y").reverse(false));
        let domains = channel_domain(&channels, None, &ds, &options).unwrap();
        assert_eq!(
            domains["x"](),
            vec![Value::Utf8("b".to_string()), Value::Utf8("a".to_string())]
        );
    }

    #[test]
    fn data_payload_supports_count_and_row_reducers() {
        let ds = dataset(&["a", "a", "b"], &[1, 5, 2]);
        let channels = channels_for(&ds);

        let options = DomainSort::new().scale(
            "x",
            ScaleSort::by("data")
                .reduce(ReduceOp::Count)
                .reverse(true),
        );
        let domains = channel_domain(&channels, None, &ds, &options).unwrap();
        assert_eq!(
            domains["x"](),
            vec![Value::Utf8("a".to_string()), Value::Utf8("b".to_string())]
        );

        // A numeric reducer cannot consume raw rows.
        let options = DomainSort::new()
            .scale("x", ScaleSort::by("data").reduce(ReduceOp::Sum));
        let err = match channel_domain(&channels, None, &ds, &options) {
            Err(e) => e,
            Ok(_) => panic!("expected channel_domain to return an error"),
        };
        assert!(err.to_string().contains("incompatible with the 'data' payload"));
    }

    #[test]
    fn facet_channels_are_a_fallback_for_missing_scales() {
        let ds = dataset(&["a", "b"], &[1, 2]);
        let mut mark_descriptors = IndexMap::new();
        mark_descriptors.insert("y".to_string(), ChannelDescriptor::new("n").with_scale("y"));
        let mark_channels = derive_channels(&mark_descriptors, &ds).unwrap();

        let mut facet_descriptors = IndexMap::new();
        facet_descriptors.insert(
            "fx".to_string(),
            ChannelDescriptor::new("cat").with_scale("fx"),
        );
        let facet_channels = derive_channels(&facet_descriptors, &ds).unwrap();

        let options = DomainSort::new().scale("fx", ScaleSort::intrinsic());
        let domains =
            channel_domain(&mark_channels, Some(&facet_channels), &ds, &options).unwrap();
        assert_eq!(
            domains["fx"](),
            vec![Value::Utf8("a".to_string()), Value::Utf8("b".to_string())]
        );
    }

    #[test]
    fn duplicates_are_preserved_in_intrinsic_mode_and_deduplicated_in_reduced_mode() {
        let ds = dataset(&["a", "a", "b"], &[1, 5, 2]);
        let channels = channels_for(&ds);

        let options = DomainSort::new().scale("x", ScaleSort::intrinsic());
        let domains = channel_domain(&channels, None, &ds, &options).unwrap();
        assert_eq!(domains["x"]().len(), 3);

        let options = DomainSort::new().scale("x", ScaleSort::by("y"));
        let domains = channel_domain(&channels, None, &ds, &options).unwrap();
        assert_eq!(domains["x"]().len(), 2);
    }
}
