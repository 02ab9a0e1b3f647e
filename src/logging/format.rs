//! Structured logging setup and ndjson emission of derived feature records.

use crate::config::LogConfig;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install the global subscriber: stdout, level from RUST_LOG or `config.level`.
    /// Returns false when a subscriber was already installed by the host.
    pub fn init(config: &LogConfig) -> bool {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
        if config.json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stdout);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt)
                .try_init()
                .is_ok()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .try_init()
                .is_ok()
        }
    }

    /// Write one record as a single JSON line (e.g. a `DerivedFeatures` row for a dataset builder).
    pub fn emit_json(record: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(w, "{}", line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;

    #[test]
    fn emit_json_writes_one_line() {
        let mut fv = FeatureVector::new();
        fv.set("api_import_count", 3.0);
        let mut buf = Vec::new();
        StructuredLogger::emit_json(&fv, &mut buf).unwrap();
        StructuredLogger::emit_json(&fv, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"api_import_count":3.0}"#);
    }

    #[test]
    fn second_init_is_refused() {
        let config = LogConfig {
            level: "warn".into(),
            json: false,
        };
        let _ = StructuredLogger::init(&config);
        assert!(!StructuredLogger::init(&config));
    }
}
