//! Configuration schema for pipedb
//!
//! Configuration is stored at `~/.config/pipedb/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Workflow directory defaults
    pub workflow: WorkflowConfig,

    /// Resource file settings
    pub resources: ResourcesConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

impl GeneralConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Where workflow state lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Workflow directory holding db/, nodes/, tmp/, logs/ and locks/
    pub dir: PathBuf,

    /// Instance subdirectory; empty for the top-level instance
    pub instance: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("pipeline_work"),
            instance: String::new(),
        }
    }
}

/// Resource file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Suffix appended to temporary resource filenames
    pub temps_suffix: String,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            temps_suffix: ".tmp".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[workflow]"));
        assert!(toml.contains("temps_suffix = \".tmp\""));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.workflow.dir, PathBuf::from("pipeline_work"));
        assert!(!config.general.json_logs());
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [workflow]
            instance = "run7"

            [general]
            log_format = "JSON"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.workflow.instance, "run7");
        assert_eq!(config.workflow.dir, PathBuf::from("pipeline_work")); // default preserved
        assert_eq!(config.resources.temps_suffix, ".tmp");
        assert!(config.general.json_logs());
    }
}
