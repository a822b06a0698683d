//! Row filtering by derived truthiness.

use std::sync::Arc;

use crate::error::PipelineResult;
use crate::options::{valueof, ChannelValue};
use crate::types::Value;

use super::basic::{apply, MarkOptions, TransformFn};

/// Keep only rows whose derived value is truthy, per facet, preserving relative order.
pub fn filter(value: impl Into<ChannelValue>, options: MarkOptions) -> PipelineResult<MarkOptions> {
    apply(options, filter_transform(value.into()))
}

pub(crate) fn filter_transform(value: ChannelValue) -> TransformFn {
    Arc::new(move |data, facets| {
        let v = valueof(&data, &value)?;
        let facets = facets
            .iter()
            .map(|facet| {
                facet
                    .iter()
                    .copied()
                    .filter(|&i| v.get(i).is_some_and(Value::is_truthy))
                    .collect()
            })
            .collect();
        Ok((data, facets))
    })
}
