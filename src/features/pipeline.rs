//! Derivation pipeline: sample → four leaf analyzers (parallel) → synthesizer → vector.

use super::{layout, FeatureVector};
use crate::analyzers::{
    ApiBehavioralProfiler, CategoryTable, EntropyRelationshipAnalyzer, FeatureAnalyzer,
    ResourceUtilizationProfiler, StructuralCohesionAnalyzer,
};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::sample::RawSample;
use crate::synthesis::{ComplexitySynthesizer, DimensionVectors, SynthesisOutcome};
use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One sample's features plus the layout they were produced under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatures {
    pub sample_id: String,
    pub layout_version: u8,
    pub layout_fingerprint: String,
    pub ts: i64,
    pub features: FeatureVector,
}

pub struct FeaturePipeline {
    structural: StructuralCohesionAnalyzer,
    entropy: EntropyRelationshipAnalyzer,
    api: ApiBehavioralProfiler,
    resource: ResourceUtilizationProfiler,
    synthesizer: ComplexitySynthesizer,
}

impl FeaturePipeline {
    /// Build with the process-wide built-in category table.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Self::with_category_table(config, CategoryTable::shared())
    }

    pub fn with_category_table(config: &PipelineConfig, table: Arc<CategoryTable>) -> Result<Self> {
        config.validate()?;
        let synthesizer = ComplexitySynthesizer::new(config.synthesis.clone())?;
        tracing::info!(
            layout_version = layout::FEATURE_VERSION,
            features = layout::feature_layout().len(),
            category_rules = table.rules().len(),
            "feature pipeline ready"
        );
        Ok(Self {
            structural: StructuralCohesionAnalyzer::new(config.structural.clone()),
            entropy: EntropyRelationshipAnalyzer::new(config.entropy.clone()),
            api: ApiBehavioralProfiler::new(config.api.clone(), table),
            resource: ResourceUtilizationProfiler::new(),
            synthesizer,
        })
    }

    pub fn analyzers(&self) -> [&dyn FeatureAnalyzer; 4] {
        [&self.structural, &self.entropy, &self.api, &self.resource]
    }

    pub fn synthesizer(&self) -> &ComplexitySynthesizer {
        &self.synthesizer
    }

    /// Run the four leaf analyzers concurrently; returns after all have joined.
    pub fn analyze_parts(&self, sample: &RawSample) -> DimensionVectors {
        let ((structural, entropy), (api, resource)) = rayon::join(
            || {
                rayon::join(
                    || self.structural.analyze(sample),
                    || self.entropy.analyze(sample),
                )
            },
            || rayon::join(|| self.api.analyze(sample), || self.resource.analyze(sample)),
        );
        DimensionVectors {
            structural,
            entropy,
            api,
            resource,
        }
    }

    pub fn analyze_parts_sequential(&self, sample: &RawSample) -> DimensionVectors {
        DimensionVectors {
            structural: self.structural.analyze(sample),
            entropy: self.entropy.analyze(sample),
            api: self.api.analyze(sample),
            resource: self.resource.analyze(sample),
        }
    }

    /// Full merged feature vector for one sample.
    pub fn derive(&self, sample: &RawSample) -> FeatureVector {
        let parts = self.analyze_parts(sample);
        self.synthesizer.synthesize(parts)
    }

    /// Same result as [`derive`](Self::derive) without spawning work.
    pub fn derive_sequential(&self, sample: &RawSample) -> FeatureVector {
        let parts = self.analyze_parts_sequential(sample);
        self.synthesizer.synthesize(parts)
    }

    /// Typed composite result, for callers that want flags rather than columns.
    pub fn evaluate(&self, sample: &RawSample) -> SynthesisOutcome {
        self.synthesizer.evaluate(&self.analyze_parts(sample))
    }

    pub fn derive_report(&self, sample: &RawSample) -> DerivedFeatures {
        let features = self.derive(sample);
        tracing::debug!(
            sample_id = sample.id_or_empty(),
            composite = features.get("synth_composite_score").unwrap_or(0.0),
            "features derived"
        );
        DerivedFeatures {
            sample_id: sample.id_or_empty().to_string(),
            layout_version: layout::FEATURE_VERSION,
            layout_fingerprint: layout::layout_fingerprint(),
            ts: Utc::now().timestamp_millis(),
            features,
        }
    }

    /// Derive many samples in parallel; output order matches input order.
    pub fn derive_batch(&self, samples: &[RawSample]) -> Vec<FeatureVector> {
        samples.par_iter().map(|s| self.derive(s)).collect()
    }
}
