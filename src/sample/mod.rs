//! Raw static attributes of one PE file, as handed over by the external parser.
//! Read-only during derivation; analyzers never modify it.

use crate::features::stats;
use serde::{Deserialize, Serialize};

/// Highest Shannon entropy a byte stream can have (bits per byte).
pub const MAX_ENTROPY: f64 = 8.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Parser-supplied identifier (typically a content hash)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub imports: Vec<ImportEntry>,
    #[serde(default)]
    pub exports: Vec<ExportEntry>,
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    /// On-disk size. Signed so a corrupt header value survives to be rejected.
    pub raw_size: i64,
    /// In-memory size.
    pub virtual_size: i64,
    /// Bits per byte; `None` when the parser could not compute it.
    #[serde(default)]
    pub entropy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    pub symbol_name: String,
    pub library: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub symbol_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub size: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Section {
    pub fn new(name: impl Into<String>, raw_size: i64, virtual_size: i64, entropy: Option<f64>) -> Self {
        Self {
            name: name.into(),
            raw_size,
            virtual_size,
            entropy,
        }
    }

    /// Negative sizes cannot come from a valid header.
    pub fn is_well_formed(&self) -> bool {
        self.raw_size >= 0 && self.virtual_size >= 0
    }
}

impl ImportEntry {
    pub fn new(symbol_name: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            symbol_name: symbol_name.into(),
            library: library.into(),
        }
    }
}

impl ExportEntry {
    pub fn new(symbol_name: impl Into<String>) -> Self {
        Self {
            symbol_name: symbol_name.into(),
        }
    }
}

impl ResourceEntry {
    pub fn new(size: i64, kind: impl Into<String>) -> Self {
        Self {
            size,
            kind: kind.into(),
        }
    }
}

impl RawSample {
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    pub fn well_formed_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.is_well_formed())
    }

    /// File-level raw size: sum of raw sizes over well-formed sections.
    pub fn total_raw_size(&self) -> u64 {
        stats::saturating_total(self.well_formed_sections().map(|s| s.raw_size))
    }

    pub fn id_or_empty(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }
}
