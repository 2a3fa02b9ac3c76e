use crate::domain::diagnostics::Severity;
use anyhow::{Context as _, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine settings, fixed for the lifetime of an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cancel pending requests whose files are covered by a starting request
    pub coalesce_requests: bool,
    /// Emit a debug event for every matched / skipped triple
    pub trace_matching: bool,
    /// Severity of annotations raised from captured failures
    pub problem_severity: Severity,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coalesce_requests: true,
            trace_matching: false,
            problem_severity: Severity::Warning,
        }
    }
}

impl EngineConfig {
    /// Load from an optional JSON file, then apply `XREF_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("XREF_COALESCE") {
            self.coalesce_requests = parse_flag("XREF_COALESCE", &value)?;
        }
        if let Some(value) = lookup("XREF_TRACE_MATCHING") {
            self.trace_matching = parse_flag("XREF_TRACE_MATCHING", &value)?;
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{name}: expected a boolean, got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "problem_severity": "error" }}"#).unwrap();

        let config: EngineConfig =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(config.problem_severity, Severity::Error);
        assert!(config.coalesce_requests);
        assert!(!config.trace_matching);
    }

    #[test]
    fn test_env_overrides() {
        let env = HashMap::from([
            ("XREF_COALESCE", "off".to_string()),
            ("XREF_TRACE_MATCHING", "1".to_string()),
        ]);
        let mut config = EngineConfig::default();
        config
            .apply_overrides(|key| env.get(key).cloned())
            .unwrap();
        assert!(!config.coalesce_requests);
        assert!(config.trace_matching);

        let bad = HashMap::from([("XREF_COALESCE", "maybe".to_string())]);
        assert!(config.apply_overrides(|key| bad.get(key).cloned()).is_err());
    }
}
