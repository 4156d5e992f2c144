//! Layered settings: defaults, then an optional TOML file, then
//! `RAKEVIEW__*` environment variables. Command-line flags are applied last
//! by `main`.

use std::path::Path;

use rakeview_engine::EngineConfig;
use rakeview_ingest::DEFAULT_END_BUFFER_MS;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineConfig,
    pub ingest: IngestSettings,
    pub logging: LoggingSettings,
}

/// How session table text is read
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub end_buffer_ms: i64,
    pub utc_offset_minutes: i32,
}

impl Default for IngestSettings {
    fn default() -> Self {
        IngestSettings { end_buffer_ms: DEFAULT_END_BUFFER_MS, utc_offset_minutes: 0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. "info" or "rakeview_engine=debug"
    pub level: String,
    /// pretty, compact or json
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings { level: "warn".to_string(), format: "compact".to_string() }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder
            .add_source(
                config::Environment::with_prefix("RAKEVIEW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rakeview_engine::{FallbackPolicy, MatchingMode};

    const FILE: &str = r#"
[engine.rake]
percentage = 0.04

[engine.matching]
mode = "tolerant"
fallback = "nearest_in_time"

[logging]
level = "debug"
"#;

    // Single test: it is the only one in this crate touching RAKEVIEW__ variables
    #[test]
    fn test_layering_defaults_file_env() {
        let defaults = Settings::load(None).unwrap();
        assert_eq!(defaults.engine.matching, MatchingMode::Strict);
        assert_eq!(defaults.engine.rake.cap_in_bb, 3.0);
        assert_eq!(defaults.ingest.end_buffer_ms, DEFAULT_END_BUFFER_MS);
        assert_eq!(defaults.logging.level, "warn");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rakeview.toml");
        std::fs::write(&path, FILE).unwrap();

        let from_file = Settings::load(Some(&path)).unwrap();
        assert_eq!(from_file.engine.matching, MatchingMode::Tolerant(FallbackPolicy::NearestInTime));
        assert_eq!(from_file.engine.rake.percentage, 0.04);
        assert_eq!(from_file.engine.rake.cap_in_bb, 3.0);
        assert_eq!(from_file.logging.level, "debug");
        assert_eq!(from_file.logging.format, "compact");

        std::env::set_var("RAKEVIEW__ENGINE__RAKE__CAP_IN_BB", "4.5");
        std::env::set_var("RAKEVIEW__ENGINE__MATCHING__FALLBACK", "highest_stakes");
        let layered = Settings::load(Some(&path));
        std::env::remove_var("RAKEVIEW__ENGINE__RAKE__CAP_IN_BB");
        std::env::remove_var("RAKEVIEW__ENGINE__MATCHING__FALLBACK");

        let layered = layered.unwrap();
        assert_eq!(layered.engine.rake.cap_in_bb, 4.5);
        assert_eq!(layered.engine.rake.percentage, 0.04);
        assert_eq!(layered.engine.matching, MatchingMode::Tolerant(FallbackPolicy::HighestStakes));
    }
}
