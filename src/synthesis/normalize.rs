//! Fixed-parameter normalization of raw features into [0, 1].

use crate::config::Normalization;

impl Normalization {
    /// Map `value` into [0, 1]. Parameters are assumed validated.
    pub fn apply(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        let n = match *self {
            Normalization::MinMax { min, max } => (value - min) / (max - min),
            Normalization::LogMinMax { min, max } => {
                let v = value.max(0.0).ln_1p();
                let (lo, hi) = (min.ln_1p(), max.ln_1p());
                (v - lo) / (hi - lo)
            }
            // One-sided: only deviation above the reference mean counts.
            Normalization::ZScore { mean, std_dev, clip } => {
                ((value - mean) / std_dev).clamp(0.0, clip) / clip
            }
        };
        if n.is_finite() {
            n.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
