//! Configuration errors. Bad sample data is never an error; it is absorbed by
//! per-feature fallbacks and diagnostic counters.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{name} must be {expected}, got {value}")]
    InvalidParameter {
        name: String,
        value: f64,
        expected: &'static str,
    },

    #[error("dimension weights sum to {total}, expected 1.0")]
    WeightTotal { total: f64 },

    #[error("dimension {dimension} has no positive feature weight")]
    EmptyDimension { dimension: &'static str },

    #[error("feature {feature} is not produced by the {dimension} analyzer")]
    UnknownFeature {
        dimension: &'static str,
        feature: String,
    },

    #[error("invalid normalization for {feature}: {reason}")]
    Normalization { feature: String, reason: String },
}

impl ConfigError {
    pub fn invalid(name: impl Into<String>, value: f64, expected: &'static str) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value,
            expected,
        }
    }

    pub fn normalization(feature: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Normalization {
            feature: feature.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
