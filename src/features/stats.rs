//! Fallback-safe descriptive statistics.
//!
//! Float aggregates sort their input first, so a permutation of the input
//! yields bit-identical output.

use std::collections::BTreeMap;

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Sum of byte sizes, saturating at `u64::MAX`. Negative sizes count as 0.
pub fn saturating_total<I>(sizes: I) -> u64
where
    I: IntoIterator<Item = i64>,
{
    sizes
        .into_iter()
        .fold(0u64, |acc, v| acc.saturating_add(u64::try_from(v).unwrap_or(0)))
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    sorted(values).iter().sum::<f64>() / values.len() as f64
}

/// Population variance; 0.0 with fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sq: Vec<f64> = values.iter().map(|v| (v - m) * (v - m)).collect();
    sorted(&sq).iter().sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// std-dev / mean; 0.0 with fewer than two values or a zero mean.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if values.len() < 2 || m == 0.0 {
        return 0.0;
    }
    ratio(std_dev(values), m)
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut it = values.iter().copied();
    let first = it.next()?;
    Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

/// `num / den`, or 0.0 when the quotient is undefined.
pub fn ratio(num: f64, den: f64) -> f64 {
    ratio_or(num, den, 0.0)
}

/// `num / den`, or `fallback` when the quotient is undefined.
pub fn ratio_or(num: f64, den: f64, fallback: f64) -> f64 {
    if den == 0.0 {
        return fallback;
    }
    let q = num / den;
    if q.is_finite() {
        q
    } else {
        fallback
    }
}

/// Shannon entropy in bits of a categorical count distribution.
pub fn shannon_entropy_bits<K>(counts: &BTreeMap<K, usize>) -> f64 {
    let total: usize = counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    counts
        .values()
        .filter(|c| **c > 0)
        .map(|c| {
            let p = *c as f64 / n;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_inputs_fall_back_to_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(variance(&[3.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[5.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), 0.0);
        assert_eq!(ratio(1.0, 0.0), 0.0);
        assert_eq!(ratio_or(1.0, 0.0, 9.0), 9.0);
        assert_eq!(min_max(&[]), None);
    }

    #[test]
    fn totals_saturate_instead_of_wrapping() {
        assert_eq!(saturating_total([i64::MAX, i64::MAX, i64::MAX]), u64::MAX);
        assert_eq!(saturating_total([4096, -1, 512]), 4608);
        assert_eq!(saturating_total(std::iter::empty()), 0);
    }

    #[test]
    fn variance_is_population_variance() {
        let v = variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((v - 4.0).abs() < 1e-12);
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn aggregates_ignore_input_order() {
        let a = [0.1, 7.3, 1e-9, 3.3333, 1e12, 2.5];
        let mut b = a;
        b.reverse();
        assert_eq!(mean(&a).to_bits(), mean(&b).to_bits());
        assert_eq!(variance(&a).to_bits(), variance(&b).to_bits());
    }

    #[test]
    fn entropy_of_uniform_distribution() {
        let mut counts = BTreeMap::new();
        counts.insert("RT_ICON", 2);
        counts.insert("RT_STRING", 2);
        counts.insert("RT_MANIFEST", 2);
        counts.insert("RT_VERSION", 2);
        assert!((shannon_entropy_bits(&counts) - 2.0).abs() < 1e-12);

        let single: BTreeMap<&str, usize> = [("RT_ICON", 5)].into_iter().collect();
        assert_eq!(shannon_entropy_bits(&single), 0.0);
    }
}
