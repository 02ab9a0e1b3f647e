//! Static API symbol → behavioral category table.
//!
//! Rules are evaluated in order against the lowercased symbol and the first
//! match wins; a symbol no rule matches is [`ApiCategory::Other`]. Order
//! matters: `RegisterClassExW` must hit the UI exclusion before the registry
//! prefix, and `InternetReadFile` must be network before it can be file.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiCategory {
    Network,
    File,
    Registry,
    Process,
    Other,
}

impl ApiCategory {
    pub const ALL: [ApiCategory; 5] = [
        ApiCategory::Network,
        ApiCategory::File,
        ApiCategory::Registry,
        ApiCategory::Process,
        ApiCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiCategory::Network => "network",
            ApiCategory::File => "file",
            ApiCategory::Registry => "registry",
            ApiCategory::Process => "process",
            ApiCategory::Other => "other",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Patterns are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "value", rename_all = "snake_case")]
pub enum SymbolPattern {
    Exact(String),
    Prefix(String),
    Contains(String),
}

impl SymbolPattern {
    fn matches(&self, lowered: &str) -> bool {
        match self {
            SymbolPattern::Exact(p) => lowered == p,
            SymbolPattern::Prefix(p) => lowered.starts_with(p.as_str()),
            SymbolPattern::Contains(p) => lowered.contains(p.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub pattern: SymbolPattern,
    pub category: ApiCategory,
}

impl CategoryRule {
    pub fn new(pattern: SymbolPattern, category: ApiCategory) -> Self {
        let pattern = match pattern {
            SymbolPattern::Exact(p) => SymbolPattern::Exact(p.to_ascii_lowercase()),
            SymbolPattern::Prefix(p) => SymbolPattern::Prefix(p.to_ascii_lowercase()),
            SymbolPattern::Contains(p) => SymbolPattern::Contains(p.to_ascii_lowercase()),
        };
        Self { pattern, category }
    }
}

#[derive(Clone, Copy)]
enum Kind {
    Exact,
    Prefix,
    Contains,
}

use ApiCategory::{File, Network, Other, Process, Registry};
use Kind::{Contains, Exact, Prefix};

const BUILTIN_RULES: &[(Kind, &str, ApiCategory)] = &[
    // Hook installation is process tampering despite the UI-ish name
    (Prefix, "setwindowshook", Process),
    (Contains, "windowsdirectory", File),
    // UI and COM names that would otherwise trip later rules
    (Prefix, "register", Other),
    (Contains, "window", Other),
    // Network
    (Prefix, "wsa", Network),
    (Prefix, "internet", Network),
    (Prefix, "http", Network),
    (Prefix, "winhttp", Network),
    (Prefix, "ftp", Network),
    (Prefix, "url", Network),
    (Prefix, "dns", Network),
    (Contains, "socket", Network),
    (Contains, "connect", Network),
    (Contains, "gethostby", Network),
    (Contains, "getaddrinfo", Network),
    (Prefix, "inet_", Network),
    (Exact, "send", Network),
    (Exact, "sendto", Network),
    (Exact, "recv", Network),
    (Exact, "recvfrom", Network),
    (Exact, "bind", Network),
    (Exact, "listen", Network),
    (Exact, "accept", Network),
    (Exact, "select", Network),
    (Exact, "htons", Network),
    (Exact, "ntohs", Network),
    // Registry
    (Prefix, "reg", Registry),
    (Contains, "registry", Registry),
    (Contains, "valuekey", Registry),
    (Prefix, "ntopenkey", Registry),
    (Prefix, "zwopenkey", Registry),
    (Prefix, "ntcreatekey", Registry),
    (Prefix, "zwcreatekey", Registry),
    (Prefix, "shreg", Registry),
    // Process, thread and memory manipulation
    (Contains, "process", Process),
    (Contains, "thread", Process),
    (Contains, "virtual", Process),
    (Contains, "memory", Process),
    (Contains, "alloc", Process),
    (Contains, "viewofsection", Process),
    (Contains, "loadlibrary", Process),
    (Prefix, "getprocaddress", Process),
    (Prefix, "queueuserapc", Process),
    // File system
    (Contains, "file", File),
    (Contains, "directory", File),
    (Contains, "drive", File),
    (Contains, "volume", File),
    (Contains, "temppath", File),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
}

static BUILTIN: OnceLock<Arc<CategoryTable>> = OnceLock::new();

impl CategoryTable {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| CategoryRule::new(r.pattern, r.category))
            .collect();
        Self { rules }
    }

    pub fn builtin() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|(kind, p, category)| {
                let p = p.to_string();
                let pattern = match kind {
                    Kind::Exact => SymbolPattern::Exact(p),
                    Kind::Prefix => SymbolPattern::Prefix(p),
                    Kind::Contains => SymbolPattern::Contains(p),
                };
                CategoryRule {
                    pattern,
                    category: *category,
                }
            })
            .collect();
        Self { rules }
    }

    /// Process-wide built-in table, constructed on first use and never mutated.
    pub fn shared() -> Arc<CategoryTable> {
        BUILTIN.get_or_init(|| Arc::new(Self::builtin())).clone()
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn classify(&self, symbol: &str) -> ApiCategory {
        let lowered = symbol.to_ascii_lowercase();
        self.rules
            .iter()
            .find(|r| r.pattern.matches(&lowered))
            .map(|r| r.category)
            .unwrap_or(ApiCategory::Other)
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}
