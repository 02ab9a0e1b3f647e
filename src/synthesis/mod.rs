//! Composite scoring over the normalized analyzer outputs.

mod engine;
mod normalize;

pub use engine::{ComplexitySynthesizer, DimensionScore, DimensionVectors, SynthesisOutcome};

pub const KEYS: &[&str] = &[
    "synth_structural_score",
    "synth_structural_anomalous",
    "synth_entropy_score",
    "synth_entropy_anomalous",
    "synth_api_score",
    "synth_api_anomalous",
    "synth_resource_score",
    "synth_resource_anomalous",
    "synth_composite_score",
    "synth_overall_complexity",
    "synth_anomalous_dimension_count",
    "synth_dimension_agreement",
    "synth_combined_anomaly",
];
