//! Section size ratios and virtual/raw mapping cohesion.

use super::{Dimension, FeatureAnalyzer};
use crate::config::StructuralConfig;
use crate::features::{stats, FeatureVector};
use crate::sample::{RawSample, Section};
use serde::{Deserialize, Serialize};

pub const KEYS: &[&str] = &[
    "struct_section_count",
    "struct_malformed_section_count",
    "struct_total_raw_size",
    "struct_total_virtual_size",
    "struct_size_ratio",
    "struct_vr_ratio_mean",
    "struct_vr_ratio_variance",
    "struct_inflated_section_count",
    "struct_inflated_section_ratio",
    "struct_virtual_to_raw_ratio",
    "struct_zero_raw_size_section_count",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralStats {
    pub section_count: usize,
    /// Negative raw or virtual size; excluded from everything else
    pub malformed_section_count: usize,
    pub total_raw_size: u64,
    pub total_virtual_size: u64,
    /// Largest / smallest non-zero raw size
    pub size_ratio: f64,
    /// virtual/raw over sections with raw_size > 0
    pub vr_ratio_mean: f64,
    pub vr_ratio_variance: f64,
    pub inflated_section_count: usize,
    pub zero_raw_size_section_count: usize,
}

impl StructuralStats {
    pub fn from_sections(sections: &[Section], inflation_multiple: f64) -> Self {
        let mut s = StructuralStats::default();
        let mut vr_ratios: Vec<f64> = Vec::new();
        let mut raw_sizes: Vec<f64> = Vec::new();

        for sec in sections {
            if !sec.is_well_formed() {
                s.malformed_section_count += 1;
                tracing::debug!(
                    section = %sec.name,
                    raw_size = sec.raw_size,
                    virtual_size = sec.virtual_size,
                    "malformed section rejected"
                );
                continue;
            }
            s.section_count += 1;

            if sec.raw_size == 0 {
                s.zero_raw_size_section_count += 1;
                continue;
            }
            let raw = sec.raw_size as f64;
            let virt = sec.virtual_size as f64;
            raw_sizes.push(raw);
            vr_ratios.push(virt / raw);
            if virt > inflation_multiple * raw {
                s.inflated_section_count += 1;
            }
        }

        let well_formed = || sections.iter().filter(|sec| sec.is_well_formed());
        s.total_raw_size = stats::saturating_total(well_formed().map(|sec| sec.raw_size));
        s.total_virtual_size = stats::saturating_total(well_formed().map(|sec| sec.virtual_size));
        s.size_ratio = stats::min_max(&raw_sizes)
            .map(|(lo, hi)| stats::ratio(hi, lo))
            .unwrap_or(0.0);
        s.vr_ratio_mean = stats::mean(&vr_ratios);
        s.vr_ratio_variance = stats::variance(&vr_ratios);
        s
    }

    pub fn inflated_section_ratio(&self) -> f64 {
        stats::ratio(self.inflated_section_count as f64, self.section_count as f64)
    }

    /// Whole-file total virtual / total raw; 0.0 when nothing is on disk.
    pub fn virtual_to_raw_ratio(&self) -> f64 {
        stats::ratio(self.total_virtual_size as f64, self.total_raw_size as f64)
    }

    pub fn to_features(&self) -> FeatureVector {
        let mut fv = FeatureVector::new();
        fv.set_count("struct_section_count", self.section_count);
        fv.set_count("struct_malformed_section_count", self.malformed_section_count);
        fv.set("struct_total_raw_size", self.total_raw_size as f64);
        fv.set("struct_total_virtual_size", self.total_virtual_size as f64);
        fv.set("struct_size_ratio", self.size_ratio);
        fv.set("struct_vr_ratio_mean", self.vr_ratio_mean);
        fv.set("struct_vr_ratio_variance", self.vr_ratio_variance);
        fv.set_count("struct_inflated_section_count", self.inflated_section_count);
        fv.set("struct_inflated_section_ratio", self.inflated_section_ratio());
        fv.set("struct_virtual_to_raw_ratio", self.virtual_to_raw_ratio());
        fv.set_count("struct_zero_raw_size_section_count", self.zero_raw_size_section_count);
        fv
    }
}

pub struct StructuralCohesionAnalyzer {
    config: StructuralConfig,
}

impl StructuralCohesionAnalyzer {
    pub fn new(config: StructuralConfig) -> Self {
        Self { config }
    }

    pub fn stats(&self, sample: &RawSample) -> StructuralStats {
        StructuralStats::from_sections(&sample.sections, self.config.inflation_multiple)
    }
}

impl FeatureAnalyzer for StructuralCohesionAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Structural
    }

    fn analyze(&self, sample: &RawSample) -> FeatureVector {
        self.stats(sample).to_features()
    }
}
