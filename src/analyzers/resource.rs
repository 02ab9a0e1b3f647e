//! Resource table density, size dispersion and type diversity.

use super::{Dimension, FeatureAnalyzer};
use crate::features::{stats, FeatureVector};
use crate::sample::RawSample;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const KEYS: &[&str] = &[
    "resource_count",
    "resource_malformed_count",
    "resource_total_size",
    "resource_density",
    "resource_size_mean",
    "resource_size_variance",
    "resource_size_cv",
    "resource_size_spread",
    "resource_type_count",
    "resource_type_entropy",
    "resource_complexity",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceStats {
    pub count: usize,
    /// Negative size; excluded from everything else
    pub malformed_count: usize,
    pub total_size: u64,
    /// Sum of section raw sizes for the whole file
    pub file_raw_size: u64,
    pub size_mean: f64,
    pub size_variance: f64,
    pub size_cv: f64,
    pub size_spread: f64,
    pub type_count: usize,
    pub type_entropy: f64,
}

impl ResourceStats {
    pub fn from_sample(sample: &RawSample) -> Self {
        let mut s = ResourceStats {
            file_raw_size: sample.total_raw_size(),
            ..Default::default()
        };
        let mut sizes: Vec<f64> = Vec::with_capacity(sample.resources.len());
        let mut types: BTreeMap<&str, usize> = BTreeMap::new();

        for res in &sample.resources {
            if res.size < 0 {
                s.malformed_count += 1;
                tracing::debug!(kind = %res.kind, size = res.size, "malformed resource rejected");
                continue;
            }
            sizes.push(res.size as f64);
            *types.entry(res.kind.as_str()).or_insert(0) += 1;
        }

        s.total_size = stats::saturating_total(
            sample.resources.iter().filter(|res| res.size >= 0).map(|res| res.size),
        );
        s.count = sizes.len();
        s.size_mean = stats::mean(&sizes);
        s.size_variance = stats::variance(&sizes);
        s.size_cv = stats::coefficient_of_variation(&sizes);
        if sizes.len() >= 2 {
            if let Some((lo, hi)) = stats::min_max(&sizes) {
                s.size_spread = stats::ratio(hi - lo, s.size_mean);
            }
        }
        s.type_count = types.len();
        s.type_entropy = stats::shannon_entropy_bits(&types);
        s
    }

    /// Resource bytes per on-disk section byte.
    pub fn density(&self) -> f64 {
        stats::ratio(self.total_size as f64, self.file_raw_size as f64)
    }

    /// Grows with volume (log-damped) and with type diversity.
    pub fn complexity(&self) -> f64 {
        (1.0 + self.count as f64).log2() * self.type_count as f64
    }

    pub fn to_features(&self) -> FeatureVector {
        let mut fv = FeatureVector::new();
        fv.set_count("resource_count", self.count);
        fv.set_count("resource_malformed_count", self.malformed_count);
        fv.set("resource_total_size", self.total_size as f64);
        fv.set("resource_density", self.density());
        fv.set("resource_size_mean", self.size_mean);
        fv.set("resource_size_variance", self.size_variance);
        fv.set("resource_size_cv", self.size_cv);
        fv.set("resource_size_spread", self.size_spread);
        fv.set_count("resource_type_count", self.type_count);
        fv.set("resource_type_entropy", self.type_entropy);
        fv.set("resource_complexity", self.complexity());
        fv
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceUtilizationProfiler;

impl ResourceUtilizationProfiler {
    pub fn new() -> Self {
        Self
    }

    pub fn stats(&self, sample: &RawSample) -> ResourceStats {
        ResourceStats::from_sample(sample)
    }
}

impl FeatureAnalyzer for ResourceUtilizationProfiler {
    fn dimension(&self) -> Dimension {
        Dimension::Resource
    }

    fn analyze(&self, sample: &RawSample) -> FeatureVector {
        self.stats(sample).to_features()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{ResourceEntry, Section};

    fn sample(resources: Vec<ResourceEntry>, raw: i64) -> RawSample {
        RawSample {
            sections: vec![Section::new(".rsrc", raw, raw, Some(4.0))],
            resources,
            ..Default::default()
        }
    }

    #[test]
    fn no_resources() {
        let fv = ResourceUtilizationProfiler::new().analyze(&sample(vec![], 4096));
        assert_eq!(fv.keys().count(), KEYS.len());
        for (name, v) in fv.iter() {
            assert_eq!(v, 0.0, "{name}");
        }
    }

    #[test]
    fn single_resource_has_no_dispersion() {
        let fv = ResourceUtilizationProfiler::new()
            .analyze(&sample(vec![ResourceEntry::new(1024, "RT_ICON")], 4096));
        assert_eq!(fv.get("resource_count"), Some(1.0));
        assert_eq!(fv.get("resource_density"), Some(0.25));
        assert_eq!(fv.get("resource_size_variance"), Some(0.0));
        assert_eq!(fv.get("resource_size_cv"), Some(0.0));
        assert_eq!(fv.get("resource_size_spread"), Some(0.0));
        assert_eq!(fv.get("resource_type_count"), Some(1.0));
        assert_eq!(fv.get("resource_complexity"), Some(1.0));
    }

    #[test]
    fn zero_sized_resources_do_not_divide_by_zero_mean() {
        let fv = ResourceUtilizationProfiler::new().analyze(&sample(
            vec![ResourceEntry::new(0, "RT_STRING"), ResourceEntry::new(0, "RT_STRING")],
            0,
        ));
        assert_eq!(fv.get("resource_size_cv"), Some(0.0));
        assert_eq!(fv.get("resource_size_spread"), Some(0.0));
        assert_eq!(fv.get("resource_density"), Some(0.0));
    }

    #[test]
    fn dispersion_and_diversity() {
        let fv = ResourceUtilizationProfiler::new().analyze(&sample(
            vec![
                ResourceEntry::new(100, "RT_ICON"),
                ResourceEntry::new(300, "RT_RCDATA"),
                ResourceEntry::new(-5, "RT_RCDATA"),
            ],
            800,
        ));
        assert_eq!(fv.get("resource_count"), Some(2.0));
        assert_eq!(fv.get("resource_malformed_count"), Some(1.0));
        assert_eq!(fv.get("resource_density"), Some(0.5));
        assert_eq!(fv.get("resource_size_mean"), Some(200.0));
        assert_eq!(fv.get("resource_size_variance"), Some(10000.0));
        assert_eq!(fv.get("resource_size_cv"), Some(0.5));
        assert_eq!(fv.get("resource_size_spread"), Some(1.0));
        assert_eq!(fv.get("resource_type_count"), Some(2.0));
        assert_eq!(fv.get("resource_type_entropy"), Some(1.0));
        assert!((fv.get("resource_complexity").unwrap() - 2.0 * 3f64.log2()).abs() < 1e-12);
    }

    #[test]
    fn huge_resources_saturate_total() {
        let fv = ResourceUtilizationProfiler::new().analyze(&sample(
            (0..3).map(|_| ResourceEntry::new(i64::MAX, "RT_RCDATA")).collect(),
            4096,
        ));
        assert_eq!(fv.get("resource_count"), Some(3.0));
        assert_eq!(fv.get("resource_total_size"), Some(u64::MAX as f64));
        assert_eq!(fv.get("resource_size_variance"), Some(0.0));
        for (name, v) in fv.iter() {
            assert!(v.is_finite(), "{name}");
        }
    }
}
