//! Runtime configuration

use crate::error::{PluginRuntimeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Plugin runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Log tolerated lifecycle rejections at `warn`
    #[serde(default = "default_log_rejections")]
    pub log_rejections: bool,

    /// Load coordination
    #[serde(default)]
    pub load: LoadConfig,

    /// Logging
    #[serde(default)]
    pub logging: LogConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_rejections: default_log_rejections(),
            load: LoadConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a file, detecting the format by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;
        Self::from_str(&content, format)
    }

    /// Load configuration from a string
    pub fn from_str(content: &str, format: ConfigFormat) -> Result<Self> {
        let config = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| PluginRuntimeError::config(format!("Failed to parse YAML: {e}")))?,
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| PluginRuntimeError::config(format!("Failed to parse TOML: {e}")))?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Ok(config)
    }
}

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format
    Yaml,
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PluginRuntimeError::config("Unable to detect config format"))?;

        match ext {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(PluginRuntimeError::config(format!(
                "Unsupported config format: {ext}"
            ))),
        }
    }
}

/// Load coordination configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// What a second load of a key that is already loading gets
    #[serde(default)]
    pub concurrent: ConcurrentLoadPolicy,

    /// Drive started loads on the ambient tokio runtime
    ///
    /// Without it, a load whose handles are all dropped before it settles
    /// is abandoned and its key reverts to `NOT_LOADED`.
    #[serde(default = "default_background")]
    pub background: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            concurrent: ConcurrentLoadPolicy::default(),
            background: default_background(),
        }
    }
}

/// Handling of a load requested while one is in flight for the same key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrentLoadPolicy {
    /// Fail the second request with `LoadInProgress`
    #[default]
    Reject,

    /// Hand the second request the in-flight load
    Join,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,

    /// Include the event target
    #[serde(default)]
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            with_target: false,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,

    /// One JSON object per event
    Json,
}

fn default_log_rejections() -> bool {
    true
}

fn default_background() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert!(config.log_rejections);
        assert_eq!(config.load.concurrent, ConcurrentLoadPolicy::Reject);
        assert!(config.load.background);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ConfigFormat::from_path(&PathBuf::from("weave.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(&PathBuf::from("weave.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(&PathBuf::from("weave.json")).unwrap(),
            ConfigFormat::Json
        );
        assert!(ConfigFormat::from_path(&PathBuf::from("weave.ini")).is_err());
        assert!(ConfigFormat::from_path(&PathBuf::from("weave")).is_err());
    }

    #[test]
    fn test_yaml_partial_config() {
        let config = RuntimeConfig::from_str(
            "load:\n  concurrent: join\nlogging:\n  format: json\n",
            ConfigFormat::Yaml,
        )
        .unwrap();

        assert_eq!(config.load.concurrent, ConcurrentLoadPolicy::Join);
        assert!(config.load.background);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.log_rejections);
    }

    #[test]
    fn test_toml_config() {
        let config = RuntimeConfig::from_str(
            "log_rejections = false\n\n[load]\nbackground = false\n",
            ConfigFormat::Toml,
        )
        .unwrap();

        assert!(!config.log_rejections);
        assert!(!config.load.background);
        assert_eq!(config.load.concurrent, ConcurrentLoadPolicy::Reject);
    }

    #[test]
    fn test_json_config_errors() {
        let err = RuntimeConfig::from_str("{\"load\": {\"concurrent\": \"queue\"}}", ConfigFormat::Json)
            .unwrap_err();
        assert!(matches!(err, PluginRuntimeError::SerdeError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = RuntimeConfig::from_file("/nonexistent/weave.yaml").unwrap_err();
        assert!(matches!(err, PluginRuntimeError::IoError(_)));
    }
}
