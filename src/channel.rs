//! Channel construction: from value specifiers to typed, scale-bound per-row arrays.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::PipelineResult;
use crate::options::{labelof, valueof, ChannelValue};
use crate::scales::ScaleSet;
use crate::types::{DataSet, DataType, Value};

/// Optional per-value predicate metadata carried by a channel.
///
/// This is a passthrough for downstream consumers (e.g. the default defined-values filter
/// applied at render time); the channel builder never applies it.
pub type ChannelFilter = Arc<dyn Fn(&Value) -> bool>;

/// Configuration for deriving one channel.
#[derive(Clone)]
pub struct ChannelDescriptor {
    /// Name of the scale this channel feeds, if any.
    pub scale: Option<String>,
    /// Optional hinted value type.
    pub data_type: Option<DataType>,
    /// How the per-row values are derived.
    pub value: ChannelValue,
    /// Optional predicate metadata, passed through unapplied.
    pub filter: Option<ChannelFilter>,
    /// Optional rendering hint, opaque to the pipeline.
    pub hint: Option<serde_json::Value>,
}

impl ChannelDescriptor {
    /// Descriptor with just a value specifier.
    pub fn new(value: impl Into<ChannelValue>) -> Self {
        Self {
            scale: None,
            data_type: None,
            value: value.into(),
            filter: None,
            hint: None,
        }
    }

    /// Bind the channel to a scale.
    pub fn with_scale(mut self, scale: impl Into<String>) -> Self {
        self.scale = Some(scale.into());
        self
    }
}

impl fmt::Debug for ChannelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelDescriptor")
            .field("scale", &self.scale)
            .field("data_type", &self.data_type)
            .field("value", &self.value)
            .field("filter_set", &self.filter.is_some())
            .field("hint", &self.hint)
            .finish()
    }
}

/// A named derived array bound to zero-or-one scale.
///
/// `value.len()` always equals the row count of the data it was derived from. Channels are
/// built unsorted and unfiltered; reordering belongs to the transform layer and domains are
/// delivered separately by [`crate::domain::channel_domain`].
#[derive(Clone)]
pub struct Channel {
    /// Name of the scale this channel feeds, if any.
    pub scale: Option<String>,
    /// Optional hinted value type.
    pub data_type: Option<DataType>,
    /// The per-row derived values.
    pub value: Vec<Value>,
    /// Human-readable name derived from the value specifier, if any.
    pub label: Option<String>,
    /// Predicate metadata passed through from the descriptor.
    pub filter: Option<ChannelFilter>,
    /// Rendering hint passed through from the descriptor.
    pub hint: Option<serde_json::Value>,
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("scale", &self.scale)
            .field("data_type", &self.data_type)
            .field("len", &self.value.len())
            .field("label", &self.label)
            .field("filter_set", &self.filter.is_some())
            .field("hint", &self.hint)
            .finish()
    }
}

/// Named channel set for one mark.
pub type ChannelMap = IndexMap<String, Channel>;

/// Derive a single channel from its descriptor.
pub fn derive_channel(data: &DataSet, descriptor: &ChannelDescriptor) -> PipelineResult<Channel> {
    Ok(Channel {
        scale: descriptor.scale.clone(),
        data_type: descriptor.data_type.clone(),
        value: valueof(data, &descriptor.value)?,
        label: labelof(&descriptor.value),
        filter: descriptor.filter.clone(),
        hint: descriptor.hint.clone(),
    })
}

/// Derive every channel of a name → descriptor mapping, preserving names.
pub fn derive_channels(
    descriptors: &IndexMap<String, ChannelDescriptor>,
    data: &DataSet,
) -> PipelineResult<ChannelMap> {
    let mut out = ChannelMap::with_capacity(descriptors.len());
    for (name, descriptor) in descriptors {
        out.insert(name.clone(), derive_channel(data, descriptor)?);
    }
    Ok(out)
}

/// Map every channel's raw values through its bound scale, where one is live.
///
/// This is the one point where raw data values become visual values. A channel whose scale
/// name is absent from `scales` (or that has no scale at all) passes its raw values through
/// unchanged.
pub fn scaled_values(channels: &ChannelMap, scales: &ScaleSet) -> IndexMap<String, Vec<Value>> {
    channels
        .iter()
        .map(|(name, channel)| {
            let scale = channel.scale.as_deref().and_then(|s| scales.get(s));
            let values = match scale {
                Some(scale) => channel.value.iter().map(|v| scale.apply(v)).collect(),
                None => channel.value.clone(),
            };
            (name.clone(), values)
        })
        .collect()
}
