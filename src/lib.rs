//! DADM PE features — relational feature derivation from static PE attributes.
//!
//! Modular structure:
//! - [`sample`] — Raw per-file input handed over by the PE parser
//! - [`analyzers`] — Structural, entropy, API and resource analyzers; API category table
//! - [`synthesis`] — Normalized dimension scores, composite score, evasion flag
//! - [`features`] — Named feature vectors, layout, derivation pipeline
//! - [`config`] — Analyzer and synthesis parameters
//! - [`logging`] — Structured JSON logging

pub mod analyzers;
pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod sample;
pub mod synthesis;

pub use analyzers::{ApiCategory, CategoryTable, Dimension, FeatureAnalyzer};
pub use config::PipelineConfig;
pub use error::ConfigError;
pub use features::{DerivedFeatures, FeaturePipeline, FeatureVector, LayoutInfo};
pub use logging::StructuredLogger;
pub use sample::{ExportEntry, ImportEntry, RawSample, ResourceEntry, Section};
pub use synthesis::{ComplexitySynthesizer, SynthesisOutcome};
