//! Named feature vectors and the fixed feature layout.

pub mod layout;
pub mod stats;
mod pipeline;

pub use layout::{feature_layout, layout_fingerprint, LayoutInfo, FEATURE_VERSION};
pub use pipeline::{DerivedFeatures, FeaturePipeline};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feature name → finite value. Ordered by name so serialization and
/// iteration never depend on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: BTreeMap<String, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, replacing NaN/Infinity with the 0.0 fallback.
    pub fn set(&mut self, name: &str, value: f64) {
        self.set_or(name, value, 0.0);
    }

    /// Store `value`, replacing NaN/Infinity with `fallback`.
    pub fn set_or(&mut self, name: &str, value: f64, fallback: f64) {
        let v = if value.is_finite() {
            value
        } else {
            tracing::warn!(feature = name, value, fallback, "non-finite feature replaced");
            fallback
        };
        self.values.insert(name.to_string(), v);
    }

    pub fn set_count(&mut self, name: &str, count: usize) {
        self.values.insert(name.to_string(), count as f64);
    }

    pub fn set_flag(&mut self, name: &str, flag: bool) {
        self.values.insert(name.to_string(), if flag { 1.0 } else { 0.0 });
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Move every entry of `other` into `self`.
    pub fn merge(&mut self, other: FeatureVector) {
        self.values.extend(other.values);
    }

    /// Values in [`feature_layout`] order, one row of a tabular feature matrix.
    /// Absent names (only possible for foreign vectors) read as 0.0.
    pub fn to_row(&self) -> Vec<f64> {
        feature_layout()
            .iter()
            .map(|name| self.get(name).unwrap_or(0.0))
            .collect()
    }
}
