//! Pipeline configuration. Every numeric parameter is a fixed constant chosen
//! at calibration time; nothing here is fit per sample.

use crate::analyzers::Dimension;
use crate::error::{ConfigError, Result};
use crate::sample::MAX_ENTROPY;
use serde::{Deserialize, Serialize};
use std::path::Path;

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub structural: StructuralConfig,
    pub entropy: EntropyConfig,
    pub api: ApiConfig,
    /// Normalization, weights and thresholds for the composite scores
    pub synthesis: SynthesisConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralConfig {
    /// virtual_size above this multiple of raw_size flags an inflated section
    pub inflation_multiple: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntropyConfig {
    /// Entropy strictly above this counts as high (compressed/encrypted)
    pub high_entropy_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Import/export ratio reported when the file exports nothing. Must be
    /// positive; keep it above any real ratio so it stays distinguishable.
    pub no_exports_sentinel: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub structural: DimensionConfig,
    pub entropy: DimensionConfig,
    pub api: DimensionConfig,
    pub resource: DimensionConfig,
    /// Composite score at or above this is anomalous in combination
    pub composite_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionConfig {
    /// Share of the composite score; the four weights sum to 1.0
    pub weight: f64,
    /// Dimension score at or above this flags the dimension on its own
    pub anomaly_threshold: f64,
    pub features: Vec<WeightedFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedFeature {
    pub name: String,
    pub weight: f64,
    pub normalization: Normalization,
}

/// Maps a raw feature into [0, 1]. See `synthesis::normalize`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Normalization {
    MinMax { min: f64, max: f64 },
    LogMinMax { min: f64, max: f64 },
    ZScore { mean: f64, std_dev: f64, clip: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for StructuralConfig {
    fn default() -> Self {
        Self {
            inflation_multiple: 5.0,
        }
    }
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self {
            high_entropy_threshold: 7.0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            no_exports_sentinel: 1.0e6,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

fn feature(name: &str, weight: f64, normalization: Normalization) -> WeightedFeature {
    WeightedFeature {
        name: name.to_string(),
        weight,
        normalization,
    }
}

fn min_max(min: f64, max: f64) -> Normalization {
    Normalization::MinMax { min, max }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            structural: DimensionConfig {
                weight: 0.25,
                anomaly_threshold: 0.6,
                features: vec![
                    feature(
                        "struct_vr_ratio_mean",
                        0.3,
                        Normalization::LogMinMax { min: 0.0, max: 64.0 },
                    ),
                    feature(
                        "struct_vr_ratio_variance",
                        0.2,
                        Normalization::LogMinMax { min: 0.0, max: 100.0 },
                    ),
                    feature("struct_inflated_section_ratio", 0.3, min_max(0.0, 1.0)),
                    feature("struct_zero_raw_size_section_count", 0.2, min_max(0.0, 4.0)),
                ],
            },
            entropy: DimensionConfig {
                weight: 0.3,
                anomaly_threshold: 0.6,
                features: vec![
                    feature("entropy_mean", 0.3, min_max(4.0, 8.0)),
                    feature("entropy_high_section_ratio", 0.4, min_max(0.0, 1.0)),
                    feature("entropy_max_adjacent_delta", 0.3, min_max(0.0, 8.0)),
                ],
            },
            api: DimensionConfig {
                weight: 0.25,
                anomaly_threshold: 0.6,
                features: vec![
                    feature("api_process_ratio", 0.3, min_max(0.0, 0.5)),
                    feature("api_network_ratio", 0.2, min_max(0.0, 0.5)),
                    feature("api_registry_ratio", 0.1, min_max(0.0, 0.3)),
                    feature("api_injection_coverage", 0.4, min_max(0.0, 1.0)),
                ],
            },
            resource: DimensionConfig {
                weight: 0.2,
                anomaly_threshold: 0.6,
                features: vec![
                    feature("resource_density", 0.5, min_max(0.0, 0.8)),
                    feature("resource_size_cv", 0.3, min_max(0.0, 3.0)),
                    feature(
                        "resource_count",
                        0.2,
                        Normalization::ZScore {
                            mean: 20.0,
                            std_dev: 15.0,
                            clip: 3.0,
                        },
                    ),
                ],
            },
            composite_threshold: 0.45,
        }
    }
}

fn check_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, value, "finite"))
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, value, "within [0, 1]"))
    }
}

impl Normalization {
    pub fn validate(&self, feature: &str) -> Result<()> {
        let finite = |vals: &[f64]| vals.iter().all(|v| v.is_finite());
        match *self {
            Normalization::MinMax { min, max } | Normalization::LogMinMax { min, max } => {
                if !finite(&[min, max]) {
                    return Err(ConfigError::normalization(feature, "bounds must be finite"));
                }
                if min >= max {
                    return Err(ConfigError::normalization(
                        feature,
                        format!("min {min} must be below max {max}"),
                    ));
                }
                if matches!(self, Normalization::LogMinMax { .. }) && min < 0.0 {
                    return Err(ConfigError::normalization(feature, "log bounds must be non-negative"));
                }
            }
            Normalization::ZScore { mean, std_dev, clip } => {
                if !finite(&[mean, std_dev, clip]) {
                    return Err(ConfigError::normalization(feature, "parameters must be finite"));
                }
                if std_dev <= 0.0 {
                    return Err(ConfigError::normalization(feature, "std_dev must be positive"));
                }
                if clip <= 0.0 {
                    return Err(ConfigError::normalization(feature, "clip must be positive"));
                }
            }
        }
        Ok(())
    }
}

impl DimensionConfig {
    fn validate(&self, dimension: Dimension) -> Result<()> {
        let dim = dimension.as_str();
        check_finite(&format!("{dim}.weight"), self.weight)?;
        if self.weight < 0.0 {
            return Err(ConfigError::invalid(format!("{dim}.weight"), self.weight, "non-negative"));
        }
        check_unit(&format!("{dim}.anomaly_threshold"), self.anomaly_threshold)?;

        let keys = dimension.keys();
        let mut total = 0.0;
        for f in &self.features {
            if !keys.contains(&f.name.as_str()) {
                return Err(ConfigError::UnknownFeature {
                    dimension: dim,
                    feature: f.name.clone(),
                });
            }
            check_finite(&format!("{}.weight", f.name), f.weight)?;
            if f.weight < 0.0 {
                return Err(ConfigError::invalid(format!("{}.weight", f.name), f.weight, "non-negative"));
            }
            f.normalization.validate(&f.name)?;
            total += f.weight;
        }
        if total <= 0.0 {
            return Err(ConfigError::EmptyDimension { dimension: dim });
        }
        Ok(())
    }
}

impl SynthesisConfig {
    pub fn dimension(&self, dimension: Dimension) -> &DimensionConfig {
        match dimension {
            Dimension::Structural => &self.structural,
            Dimension::Entropy => &self.entropy,
            Dimension::Api => &self.api,
            Dimension::Resource => &self.resource,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for dim in Dimension::ALL {
            self.dimension(dim).validate(dim)?;
        }
        let total: f64 = Dimension::ALL.iter().map(|d| self.dimension(*d).weight).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightTotal { total });
        }
        check_unit("composite_threshold", self.composite_threshold)
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        let m = self.structural.inflation_multiple;
        if !m.is_finite() || m <= 1.0 {
            return Err(ConfigError::invalid("structural.inflation_multiple", m, "finite and above 1.0"));
        }
        let t = self.entropy.high_entropy_threshold;
        if !(0.0..=MAX_ENTROPY).contains(&t) {
            return Err(ConfigError::invalid("entropy.high_entropy_threshold", t, "within [0, 8]"));
        }
        let s = self.api.no_exports_sentinel;
        if !s.is_finite() || s <= 0.0 {
            return Err(ConfigError::invalid("api.no_exports_sentinel", s, "finite and positive"));
        }
        self.synthesis.validate()
    }

    /// Strict load: the file must exist, parse and validate.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PipelineConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from JSON file if present and valid; otherwise return default
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config rejected; using defaults");
                Self::default()
            }
        }
    }
}
