//! Configuration for a deadreach run.

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Analysis configuration, loadable from a file and overridable from the
/// command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Names never reported as dead, e.g. `Legacy*` while a migration is
    /// in flight.
    pub retain_patterns: Vec<String>,

    /// Treat this package (by name or import path) as the program entry
    /// package, overriding the snapshot's own marker.
    pub entry_package: Option<String>,

    /// Emit the entity graph in Graphviz form through the logs while it is
    /// built.
    pub debug_graph: bool,

    /// Report configuration.
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal or json.
    pub format: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "terminal".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML).
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations next to the
    /// snapshot.
    pub fn from_default_locations(root: &Path) -> Result<Self> {
        let default_names = [
            ".deadreach.yml",
            ".deadreach.yaml",
            ".deadreach.toml",
            "deadreach.toml",
        ];

        for name in &default_names {
            let path = root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Whether a declaration name matches a retain pattern.
    pub fn should_retain(&self, name: &str) -> bool {
        self.retain_patterns.iter().any(|p| name_match(p, name))
    }
}

/// Simple wildcard matching for patterns like `*Handler` or `Legacy*`.
fn name_match(pattern: &str, name: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix('*') {
        return name.ends_with(suffix);
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return name.starts_with(prefix);
    }
    name == pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_match() {
        assert!(name_match("*Handler", "EventHandler"));
        assert!(name_match("Legacy*", "LegacyCodec"));
        assert!(name_match("exact", "exact"));
        assert!(!name_match("*Handler", "HandlerPool"));
        assert!(!name_match("Legacy*", "CodecLegacy"));
    }

    #[test]
    fn test_should_retain() {
        let config = Config {
            retain_patterns: vec!["*Hook".to_string()],
            ..Config::default()
        };
        assert!(config.should_retain("shutdownHook"));
        assert!(!config.should_retain("shutdown"));
    }
}
