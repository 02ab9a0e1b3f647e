//! Cross-section entropy relationships.
//!
//! `entropy_max_adjacent_delta` is the only order-sensitive feature in the
//! crate: it looks at neighbouring sections in file order, which is what
//! exposes a single encrypted section wedged between plain ones.
//!
//! Sections with negative sizes are rejected here as well as by the
//! structural analyzer, and count toward `entropy_invalid_section_count`.

use super::{Dimension, FeatureAnalyzer};
use crate::config::EntropyConfig;
use crate::features::{stats, FeatureVector};
use crate::sample::{RawSample, Section, MAX_ENTROPY};
use serde::{Deserialize, Serialize};

pub const KEYS: &[&str] = &[
    "entropy_mean",
    "entropy_variance",
    "entropy_min",
    "entropy_max",
    "entropy_range",
    "entropy_mean_to_max_ratio",
    "entropy_high_section_count",
    "entropy_high_section_ratio",
    "entropy_max_adjacent_delta",
    "entropy_undefined_section_count",
    "entropy_invalid_section_count",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntropyStats {
    /// Sections with a usable entropy value
    pub valid_count: usize,
    pub mean: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub high_count: usize,
    pub max_adjacent_delta: f64,
    /// `None` or NaN from the parser
    pub undefined_count: usize,
    /// Outside [0, 8], or the section itself is malformed
    pub invalid_count: usize,
}

impl EntropyStats {
    pub fn from_sections(sections: &[Section], high_threshold: f64) -> Self {
        let mut s = EntropyStats::default();
        let mut values: Vec<f64> = Vec::with_capacity(sections.len());

        for sec in sections {
            if !sec.is_well_formed() {
                s.invalid_count += 1;
                tracing::debug!(section = %sec.name, "entropy of malformed section rejected");
                continue;
            }
            match sec.entropy {
                None => s.undefined_count += 1,
                Some(e) if e.is_nan() => s.undefined_count += 1,
                Some(e) if !(0.0..=MAX_ENTROPY).contains(&e) => {
                    s.invalid_count += 1;
                    tracing::debug!(section = %sec.name, entropy = e, "entropy out of range");
                }
                Some(e) => values.push(e),
            }
        }

        s.valid_count = values.len();
        s.mean = stats::mean(&values);
        s.variance = stats::variance(&values);
        if let Some((lo, hi)) = stats::min_max(&values) {
            s.min = lo;
            s.max = hi;
        }
        s.high_count = values.iter().filter(|e| **e > high_threshold).count();
        s.max_adjacent_delta = values
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0, f64::max);
        s
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn mean_to_max_ratio(&self) -> f64 {
        stats::ratio(self.mean, self.max)
    }

    pub fn high_ratio(&self) -> f64 {
        stats::ratio(self.high_count as f64, self.valid_count as f64)
    }

    pub fn to_features(&self) -> FeatureVector {
        let mut fv = FeatureVector::new();
        fv.set("entropy_mean", self.mean);
        fv.set("entropy_variance", self.variance);
        fv.set("entropy_min", self.min);
        fv.set("entropy_max", self.max);
        fv.set("entropy_range", self.range());
        fv.set("entropy_mean_to_max_ratio", self.mean_to_max_ratio());
        fv.set_count("entropy_high_section_count", self.high_count);
        fv.set("entropy_high_section_ratio", self.high_ratio());
        fv.set("entropy_max_adjacent_delta", self.max_adjacent_delta);
        fv.set_count("entropy_undefined_section_count", self.undefined_count);
        fv.set_count("entropy_invalid_section_count", self.invalid_count);
        fv
    }
}

pub struct EntropyRelationshipAnalyzer {
    config: EntropyConfig,
}

impl EntropyRelationshipAnalyzer {
    pub fn new(config: EntropyConfig) -> Self {
        Self { config }
    }

    pub fn stats(&self, sample: &RawSample) -> EntropyStats {
        EntropyStats::from_sections(&sample.sections, self.config.high_entropy_threshold)
    }
}

impl FeatureAnalyzer for EntropyRelationshipAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Entropy
    }

    fn analyze(&self, sample: &RawSample) -> FeatureVector {
        self.stats(sample).to_features()
    }
}
