//! Combines the four analyzer vectors into normalized dimension scores, a
//! weighted composite, and the dimension-agreement / evasion signals.

use super::KEYS;
use crate::analyzers::Dimension;
use crate::config::SynthesisConfig;
use crate::error::Result;
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

/// Output of the four leaf analyzers for one sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionVectors {
    pub structural: FeatureVector,
    pub entropy: FeatureVector,
    pub api: FeatureVector,
    pub resource: FeatureVector,
}

impl DimensionVectors {
    pub fn get(&self, dimension: Dimension) -> &FeatureVector {
        match dimension {
            Dimension::Structural => &self.structural,
            Dimension::Entropy => &self.entropy,
            Dimension::Api => &self.api,
            Dimension::Resource => &self.resource,
        }
    }

    fn value(&self, dimension: Dimension, name: &str) -> f64 {
        self.get(dimension).get(name).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub score: f64,
    pub anomalous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOutcome {
    /// In [`Dimension::ALL`] order
    pub dimensions: [DimensionScore; 4],
    pub composite_score: f64,
    pub overall_complexity: f64,
    /// Composite over threshold while no single dimension is
    pub combined_anomaly: bool,
}

impl SynthesisOutcome {
    pub fn anomalous_dimension_count(&self) -> usize {
        self.dimensions.iter().filter(|d| d.anomalous).count()
    }

    pub fn dimension(&self, dimension: Dimension) -> &DimensionScore {
        &self.dimensions[dimension as usize]
    }

    pub fn to_features(&self) -> FeatureVector {
        let mut fv = FeatureVector::new();
        for d in &self.dimensions {
            let dim = d.dimension.as_str();
            fv.set(&format!("synth_{dim}_score"), d.score);
            fv.set_flag(&format!("synth_{dim}_anomalous"), d.anomalous);
        }
        fv.set("synth_composite_score", self.composite_score);
        fv.set("synth_overall_complexity", self.overall_complexity);
        let count = self.anomalous_dimension_count();
        fv.set_count("synth_anomalous_dimension_count", count);
        fv.set(
            "synth_dimension_agreement",
            count as f64 / Dimension::ALL.len() as f64,
        );
        fv.set_flag("synth_combined_anomaly", self.combined_anomaly);
        debug_assert_eq!(fv.len(), KEYS.len());
        fv
    }
}

pub struct ComplexitySynthesizer {
    config: SynthesisConfig,
}

impl ComplexitySynthesizer {
    /// Rejects invalid weights, thresholds or normalization parameters.
    pub fn new(config: SynthesisConfig) -> Result<Self> {
        config.validate()?;
        let lowest = Dimension::ALL
            .iter()
            .map(|d| config.dimension(*d).anomaly_threshold)
            .fold(f64::INFINITY, f64::min);
        if config.composite_threshold >= lowest {
            tracing::warn!(
                composite_threshold = config.composite_threshold,
                lowest_dimension_threshold = lowest,
                "composite threshold not below every dimension threshold; combined anomaly cannot fire"
            );
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Weighted mean of the dimension's normalized features, in [0, 1].
    pub fn dimension_score(&self, dimension: Dimension, parts: &DimensionVectors) -> f64 {
        let dc = self.config.dimension(dimension);
        let (num, den) = dc.features.iter().fold((0.0, 0.0), |(num, den), f| {
            let n = f.normalization.apply(parts.value(dimension, &f.name));
            (num + f.weight * n, den + f.weight)
        });
        if den > 0.0 {
            (num / den).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn evaluate(&self, parts: &DimensionVectors) -> SynthesisOutcome {
        let dimensions = Dimension::ALL.map(|dimension| {
            let score = self.dimension_score(dimension, parts);
            DimensionScore {
                dimension,
                score,
                anomalous: score >= self.config.dimension(dimension).anomaly_threshold,
            }
        });
        let composite_score = dimensions
            .iter()
            .map(|d| self.config.dimension(d.dimension).weight * d.score)
            .sum::<f64>()
            .clamp(0.0, 1.0);
        let combined_anomaly = dimensions.iter().all(|d| !d.anomalous)
            && composite_score >= self.config.composite_threshold;

        SynthesisOutcome {
            dimensions,
            composite_score,
            overall_complexity: overall_complexity(parts),
            combined_anomaly,
        }
    }

    /// Merge the four vectors and append the `synth_*` features.
    pub fn synthesize(&self, parts: DimensionVectors) -> FeatureVector {
        let outcome = self.evaluate(&parts);
        if outcome.combined_anomaly {
            tracing::debug!(
                composite = outcome.composite_score,
                "combined anomaly without any individually anomalous dimension"
            );
        }
        let mut out = FeatureVector::new();
        out.merge(parts.structural);
        out.merge(parts.entropy);
        out.merge(parts.api);
        out.merge(parts.resource);
        out.merge(outcome.to_features());
        out
    }
}

/// Coarse size/entropy/import complexity blend:
/// mean of ln(1+raw)/20, mean entropy/8, ln(1+imports)/10, max entropy × libraries/100.
fn overall_complexity(parts: &DimensionVectors) -> f64 {
    let raw = parts.value(Dimension::Structural, "struct_total_raw_size").max(0.0);
    let mean_entropy = parts.value(Dimension::Entropy, "entropy_mean");
    let max_entropy = parts.value(Dimension::Entropy, "entropy_max");
    let imports = parts.value(Dimension::Api, "api_import_count").max(0.0);
    let libraries = parts.value(Dimension::Api, "api_unique_library_count");

    let size = raw.ln_1p() / 20.0;
    let entropy = mean_entropy / 8.0;
    let import = imports.ln_1p() / 10.0;
    let section = max_entropy * libraries / 100.0;
    (size + entropy + import + section) / 4.0
}
