//! Import/export behavioral profile: category mix, library fan-out and
//! process-injection API combinations.

use super::category::{ApiCategory, CategoryTable};
use super::{Dimension, FeatureAnalyzer};
use crate::config::ApiConfig;
use crate::features::{stats, FeatureVector};
use crate::sample::RawSample;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

pub const KEYS: &[&str] = &[
    "api_import_count",
    "api_export_count",
    "api_unique_library_count",
    "api_network_count",
    "api_file_count",
    "api_registry_count",
    "api_process_count",
    "api_other_count",
    "api_network_ratio",
    "api_file_ratio",
    "api_registry_ratio",
    "api_process_ratio",
    "api_other_ratio",
    "api_library_fanout_ratio",
    "api_imports_per_library",
    "api_import_export_ratio",
    "api_injection_combo_count",
    "api_injection_coverage",
];

/// Known process-injection import sets (normalized: lowercase, no A/W suffix).
pub const INJECTION_COMBOS: &[&[&str]] = &[
    // Remote thread (T1055.002)
    &["virtualallocex", "writeprocessmemory", "createremotethread"],
    // Native API variant
    &["ntallocatevirtualmemory", "ntwritevirtualmemory", "ntcreatethreadex"],
    // APC injection (T1055.004)
    &["virtualallocex", "writeprocessmemory", "queueuserapc"],
    // Thread hijacking (T1055.003)
    &["openthread", "suspendthread", "setthreadcontext", "resumethread"],
    // Process hollowing (T1055.012)
    &[
        "createprocess",
        "ntunmapviewofsection",
        "virtualallocex",
        "writeprocessmemory",
        "setthreadcontext",
    ],
];

/// Lowercase and drop a trailing ANSI/wide charset suffix (`CreateProcessW` → `createprocess`).
pub fn normalize_symbol(symbol: &str) -> String {
    let bytes = symbol.as_bytes();
    let trimmed = match bytes {
        [.., prev, b'A' | b'W'] if prev.is_ascii_lowercase() => &symbol[..symbol.len() - 1],
        _ => symbol,
    };
    trimmed.to_ascii_lowercase()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiStats {
    pub import_count: usize,
    pub export_count: usize,
    pub unique_library_count: usize,
    /// Indexed by [`ApiCategory::index`]
    pub category_counts: [usize; 5],
    pub injection_combo_count: usize,
    pub injection_coverage: f64,
}

impl ApiStats {
    pub fn from_sample(sample: &RawSample, table: &CategoryTable) -> Self {
        let mut s = ApiStats {
            import_count: sample.imports.len(),
            export_count: sample.exports.len(),
            ..Default::default()
        };

        let mut libraries = BTreeSet::new();
        let mut symbols = BTreeSet::new();
        for imp in &sample.imports {
            s.category_counts[table.classify(&imp.symbol_name).index()] += 1;
            if !imp.library.is_empty() {
                libraries.insert(imp.library.to_ascii_lowercase());
            }
            symbols.insert(normalize_symbol(&imp.symbol_name));
        }
        s.unique_library_count = libraries.len();

        for combo in INJECTION_COMBOS {
            let present = combo.iter().filter(|api| symbols.contains(**api)).count();
            if present == combo.len() {
                s.injection_combo_count += 1;
            }
            s.injection_coverage = s.injection_coverage.max(present as f64 / combo.len() as f64);
        }
        s
    }

    pub fn category_count(&self, category: ApiCategory) -> usize {
        self.category_counts[category.index()]
    }

    pub fn category_ratio(&self, category: ApiCategory) -> f64 {
        stats::ratio(self.category_count(category) as f64, self.import_count as f64)
    }

    pub fn library_fanout_ratio(&self) -> f64 {
        stats::ratio(self.unique_library_count as f64, self.import_count as f64)
    }

    pub fn imports_per_library(&self) -> f64 {
        stats::ratio(self.import_count as f64, self.unique_library_count as f64)
    }

    /// imports / exports, or `sentinel` when nothing is exported.
    pub fn import_export_ratio(&self, sentinel: f64) -> f64 {
        stats::ratio_or(self.import_count as f64, self.export_count as f64, sentinel)
    }

    pub fn to_features(&self, no_exports_sentinel: f64) -> FeatureVector {
        let mut fv = FeatureVector::new();
        fv.set_count("api_import_count", self.import_count);
        fv.set_count("api_export_count", self.export_count);
        fv.set_count("api_unique_library_count", self.unique_library_count);
        for cat in ApiCategory::ALL {
            fv.set_count(&format!("api_{}_count", cat.as_str()), self.category_count(cat));
            fv.set(&format!("api_{}_ratio", cat.as_str()), self.category_ratio(cat));
        }
        fv.set("api_library_fanout_ratio", self.library_fanout_ratio());
        fv.set("api_imports_per_library", self.imports_per_library());
        fv.set_or(
            "api_import_export_ratio",
            self.import_export_ratio(no_exports_sentinel),
            no_exports_sentinel,
        );
        fv.set_count("api_injection_combo_count", self.injection_combo_count);
        fv.set("api_injection_coverage", self.injection_coverage);
        fv
    }
}

pub struct ApiBehavioralProfiler {
    config: ApiConfig,
    table: Arc<CategoryTable>,
}

impl ApiBehavioralProfiler {
    pub fn new(config: ApiConfig, table: Arc<CategoryTable>) -> Self {
        Self { config, table }
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    pub fn stats(&self, sample: &RawSample) -> ApiStats {
        ApiStats::from_sample(sample, &self.table)
    }
}

impl FeatureAnalyzer for ApiBehavioralProfiler {
    fn dimension(&self) -> Dimension {
        Dimension::Api
    }

    fn analyze(&self, sample: &RawSample) -> FeatureVector {
        self.stats(sample).to_features(self.config.no_exports_sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{ExportEntry, ImportEntry};

    fn profiler() -> ApiBehavioralProfiler {
        ApiBehavioralProfiler::new(ApiConfig::default(), CategoryTable::shared())
    }

    fn imports(names: &[(&str, &str)]) -> Vec<ImportEntry> {
        names.iter().map(|(s, l)| ImportEntry::new(*s, *l)).collect()
    }

    #[test]
    fn no_imports_or_exports() {
        let fv = profiler().analyze(&RawSample::default());
        assert_eq!(fv.keys().count(), KEYS.len());
        for cat in ApiCategory::ALL {
            assert_eq!(fv.get(&format!("api_{}_ratio", cat.as_str())), Some(0.0));
        }
        assert_eq!(fv.get("api_library_fanout_ratio"), Some(0.0));
        assert_eq!(fv.get("api_imports_per_library"), Some(0.0));
        assert_eq!(fv.get("api_import_export_ratio"), Some(1.0e6));
    }

    #[test]
    fn ratios_and_fanout() {
        let sample = RawSample {
            imports: imports(&[
                ("connect", "WS2_32.dll"),
                ("send", "ws2_32.dll"),
                ("CreateFileW", "KERNEL32.dll"),
                ("GetTickCount", "kernel32.dll"),
            ]),
            exports: vec![ExportEntry::new("ServiceMain"), ExportEntry::new("DllMain")],
            ..Default::default()
        };
        let fv = profiler().analyze(&sample);
        assert_eq!(fv.get("api_network_ratio"), Some(0.5));
        assert_eq!(fv.get("api_file_ratio"), Some(0.25));
        assert_eq!(fv.get("api_other_ratio"), Some(0.25));
        assert_eq!(fv.get("api_unique_library_count"), Some(2.0));
        assert_eq!(fv.get("api_library_fanout_ratio"), Some(0.5));
        assert_eq!(fv.get("api_imports_per_library"), Some(2.0));
        assert_eq!(fv.get("api_import_export_ratio"), Some(2.0));
    }

    #[test]
    fn sentinel_is_configurable() {
        let p = ApiBehavioralProfiler::new(
            ApiConfig {
                no_exports_sentinel: 5.0e5,
            },
            CategoryTable::shared(),
        );
        let sample = RawSample {
            imports: imports(&[("connect", "ws2_32.dll")]),
            ..Default::default()
        };
        assert_eq!(p.analyze(&sample).get("api_import_export_ratio"), Some(5.0e5));
    }

    #[test]
    fn detects_injection_combos() {
        let sample = RawSample {
            imports: imports(&[
                ("VirtualAllocEx", "kernel32.dll"),
                ("WriteProcessMemory", "kernel32.dll"),
                ("CreateRemoteThread", "kernel32.dll"),
                ("QueueUserAPC", "kernel32.dll"),
                ("CreateProcessW", "kernel32.dll"),
            ]),
            ..Default::default()
        };
        let fv = profiler().analyze(&sample);
        assert_eq!(fv.get("api_injection_combo_count"), Some(2.0));
        assert_eq!(fv.get("api_injection_coverage"), Some(1.0));
    }

    #[test]
    fn partial_combo_reports_coverage() {
        let sample = RawSample {
            imports: imports(&[
                ("OpenThread", "kernel32.dll"),
                ("SuspendThread", "kernel32.dll"),
            ]),
            ..Default::default()
        };
        let fv = profiler().analyze(&sample);
        assert_eq!(fv.get("api_injection_combo_count"), Some(0.0));
        assert_eq!(fv.get("api_injection_coverage"), Some(0.5));
    }

    #[test]
    fn symbol_normalization() {
        assert_eq!(normalize_symbol("CreateProcessW"), "createprocess");
        assert_eq!(normalize_symbol("CreateProcessA"), "createprocess");
        assert_eq!(normalize_symbol("QueueUserAPC"), "queueuserapc");
        assert_eq!(normalize_symbol("W"), "w");
        assert_eq!(normalize_symbol(""), "");
    }
}
