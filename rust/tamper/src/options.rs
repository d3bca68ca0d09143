use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Caller-supplied configuration of a [`pack`](crate::pack) call.
///
/// Deserializable from JSON, e.g. `{"precision": {"price": 2}, "parallel": true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackOptions {
    /// Decimal digits kept for floating-point attributes, by attribute name.
    /// Attributes without an entry keep 0 digits; integer attributes always do.
    pub precision: HashMap<String, u32>,

    /// Encode attributes on the rayon thread pool instead of the calling thread.
    /// The document is identical either way.
    pub parallel: bool,
}

impl PackOptions {
    pub fn new() -> PackOptions {
        PackOptions::default()
    }

    pub fn with_precision(mut self, attr_name: impl Into<String>, digits: u32) -> PackOptions {
        self.precision.insert(attr_name.into(), digits);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> PackOptions {
        self.parallel = parallel;
        self
    }

    pub fn precision_for(&self, attr_name: &str) -> u32 {
        self.precision.get(attr_name).copied().unwrap_or(0)
    }
}
