//! Scale registry boundary.
//!
//! Scale construction itself lives outside this crate; the pipeline only needs two things
//! from it: the set of option keys that are scale directives, and an element-wise mapping
//! from raw values to visual values for [`crate::channel::scaled_values`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::types::Value;

/// Option keys recognized as scale directives.
const SCALE_KEYS: &[&str] = &[
    "x", "y", "fx", "fy", "r", "color", "opacity", "symbol", "length",
];

/// Whether an option key names a recognized scale.
///
/// Keys outside this set are generic mark options and are ignored by domain inference.
pub fn is_scale_key(name: &str) -> bool {
    SCALE_KEYS.contains(&name)
}

/// An opaque element-wise mapping from raw data values to visual-space values.
#[derive(Clone)]
pub struct Scale {
    apply: Arc<dyn Fn(&Value) -> Value>,
}

impl Scale {
    /// Create a scale from a mapping function.
    pub fn new(apply: impl Fn(&Value) -> Value + 'static) -> Self {
        Self {
            apply: Arc::new(apply),
        }
    }

    /// Map one raw value into visual space.
    pub fn apply(&self, v: &Value) -> Value {
        (self.apply)(v)
    }
}

impl fmt::Debug for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Scale(..)")
    }
}

/// The live scale mapping for a plot build, keyed by scale name.
pub type ScaleSet = IndexMap<String, Scale>;
