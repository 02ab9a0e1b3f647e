//! Leaf analyzers. Each is a pure function of one slice of a [`RawSample`]
//! and always emits its full, fixed key set.

pub mod api;
pub mod category;
pub mod entropy;
pub mod resource;
pub mod structural;

pub use api::ApiBehavioralProfiler;
pub use category::{ApiCategory, CategoryRule, CategoryTable, SymbolPattern};
pub use entropy::EntropyRelationshipAnalyzer;
pub use resource::ResourceUtilizationProfiler;
pub use structural::StructuralCohesionAnalyzer;

use crate::features::FeatureVector;
use crate::sample::RawSample;
use serde::{Deserialize, Serialize};

pub trait FeatureAnalyzer: Send + Sync {
    fn dimension(&self) -> Dimension;

    fn analyze(&self, sample: &RawSample) -> FeatureVector;

    fn keys(&self) -> &'static [&'static str] {
        self.dimension().keys()
    }
}

/// The four independently analyzed aspects of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Structural,
    Entropy,
    Api,
    Resource,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Structural,
        Dimension::Entropy,
        Dimension::Api,
        Dimension::Resource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Structural => "structural",
            Dimension::Entropy => "entropy",
            Dimension::Api => "api",
            Dimension::Resource => "resource",
        }
    }

    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Dimension::Structural => structural::KEYS,
            Dimension::Entropy => entropy::KEYS,
            Dimension::Api => api::KEYS,
            Dimension::Resource => resource::KEYS,
        }
    }
}
