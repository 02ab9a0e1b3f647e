//! Authoritative feature layout.
//!
//! Downstream classifiers consume features by name and by column position, so:
//! - names are never renamed or removed, only appended;
//! - any change to the list bumps [`FEATURE_VERSION`];
//! - [`layout_fingerprint`] lets a consumer detect a mismatch at load time.

use crate::analyzers::{api, entropy, resource, structural};
use crate::synthesis;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

pub const FEATURE_VERSION: u8 = 1;

static LAYOUT: OnceLock<Vec<&'static str>> = OnceLock::new();

/// All feature names in column order: structural, entropy, api, resource, synthesis.
pub fn feature_layout() -> &'static [&'static str] {
    LAYOUT.get_or_init(|| {
        [
            structural::KEYS,
            entropy::KEYS,
            api::KEYS,
            resource::KEYS,
            synthesis::KEYS,
        ]
        .concat()
    })
}

/// Hex SHA-256 over the version byte and the NUL-separated ordered names.
pub fn layout_fingerprint() -> String {
    let mut hasher = Sha256::new();
    hasher.update([FEATURE_VERSION]);
    for name in feature_layout() {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub fingerprint: String,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            fingerprint: layout_fingerprint(),
            feature_count: feature_layout().len(),
            feature_names: feature_layout().iter().map(|s| s.to_string()).collect(),
        }
    }

    /// True when a consumer built against `self` can read the current layout.
    pub fn is_compatible(&self) -> bool {
        self.version == FEATURE_VERSION && self.fingerprint == layout_fingerprint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn names_are_unique() {
        let set: BTreeSet<_> = feature_layout().iter().collect();
        assert_eq!(set.len(), feature_layout().len());
    }

    #[test]
    fn names_carry_dimension_prefix() {
        for name in feature_layout() {
            assert!(
                ["struct_", "entropy_", "api_", "resource_", "synth_"]
                    .iter()
                    .any(|p| name.starts_with(p)),
                "{name}"
            );
        }
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let a = layout_fingerprint();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, layout_fingerprint());
        assert!(LayoutInfo::current().is_compatible());
    }

    #[test]
    fn stale_layout_is_incompatible() {
        let mut info = LayoutInfo::current();
        info.fingerprint = "00".repeat(32);
        assert!(!info.is_compatible());
    }
}
