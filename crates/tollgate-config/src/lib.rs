//! Configuration management for Tollgate
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (TOLLGATE_* prefix, `__` between levels)
//! 2. tollgate.local.toml (gitignored, local overrides)
//! 3. tollgate.toml (git-tracked, deployment config)
//! 4. ~/.config/tollgate/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::{ConfigLoader, LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE};

/// Main Tollgate configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TollgateConfig {
    pub restrict: RestrictConfig,
    pub audit: AuditConfig,
}

/// Restriction enforcement settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestrictConfig {
    /// Verify user and user group restrictions when a session is created.
    pub enforce_login: bool,
    /// Verify connection and connection group restrictions on connect.
    pub enforce_connections: bool,
    /// Outcome when host restrictions exist but the remote address is unknown.
    pub unknown_address: UnknownAddressPolicy,
}

impl Default for RestrictConfig {
    fn default() -> Self {
        Self {
            enforce_login: true,
            enforce_connections: true,
            unknown_address: UnknownAddressPolicy::Deny,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownAddressPolicy {
    #[default]
    Deny,
    Allow,
}

/// Audit logging of restriction decisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl TollgateConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific deployment directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Parse a single TOML document, without merging other sources
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::ParseError {
            path: None,
            source,
        })
    }

    /// Read and parse a single TOML file, without merging other sources
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    /// Configuration that records restrictions but never enforces them
    pub fn permissive() -> Self {
        Self {
            restrict: RestrictConfig {
                enforce_login: false,
                enforce_connections: false,
                unknown_address: UnknownAddressPolicy::Allow,
            },
            ..Default::default()
        }
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Write the defaults to `tollgate.toml` in `project_dir` unless the file
    /// already exists. Returns the file path either way.
    pub fn write_starter(project_dir: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
        let path = project_dir.as_ref().join(PROJECT_CONFIG_FILE);
        if path.exists() {
            return Ok(path);
        }
        let content = Self::default().to_toml_string()?;
        std::fs::write(&path, content).map_err(|source| ConfigError::WriteError {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TollgateConfig::default();
        assert!(config.restrict.enforce_login);
        assert!(config.restrict.enforce_connections);
        assert_eq!(config.restrict.unknown_address, UnknownAddressPolicy::Deny);
        assert!(config.audit.enabled);
    }

    #[test]
    fn test_permissive_config() {
        let config = TollgateConfig::permissive();
        assert!(!config.restrict.enforce_login);
        assert!(!config.restrict.enforce_connections);
        assert_eq!(config.restrict.unknown_address, UnknownAddressPolicy::Allow);
        assert!(config.audit.enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TollgateConfig::from_toml_str(
            r#"
[restrict]
unknown_address = "allow"
"#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.restrict.unknown_address, UnknownAddressPolicy::Allow);
        assert!(config.restrict.enforce_login);
        assert!(config.audit.enabled);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = TollgateConfig::from_toml_str("[restrict]\nunknown_address = \"maybe\"\n")
            .expect_err("unknown variant must fail");
        assert!(matches!(err, ConfigError::ParseError { path: None, .. }));
    }

    #[test]
    fn test_from_file_reports_path() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("tollgate.toml");

        let err = TollgateConfig::from_file(&path).expect_err("missing file must fail");
        assert!(matches!(err, ConfigError::ReadError { .. }));

        std::fs::write(&path, "[audit]\nenabled = false\n").unwrap();
        let config = TollgateConfig::from_file(&path).expect("Failed to read config");
        assert!(!config.audit.enabled);

        std::fs::write(&path, "[audit\n").unwrap();
        let err = TollgateConfig::from_file(&path).expect_err("malformed file must fail");
        assert!(err.to_string().contains("tollgate.toml"));
    }

    #[test]
    fn test_write_starter_keeps_existing_file() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

        let path = TollgateConfig::write_starter(temp_dir.path()).expect("Failed to write");
        assert_eq!(path, temp_dir.path().join(PROJECT_CONFIG_FILE));
        assert_eq!(
            TollgateConfig::from_file(&path).unwrap(),
            TollgateConfig::default()
        );

        std::fs::write(&path, "[audit]\nenabled = false\n").unwrap();
        TollgateConfig::write_starter(temp_dir.path()).expect("Failed to write");
        assert!(!TollgateConfig::from_file(&path).unwrap().audit.enabled);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = TollgateConfig::permissive();
        let text = config.to_toml_string().expect("Failed to serialize");
        assert!(text.contains("unknown_address = \"allow\""));
        assert_eq!(TollgateConfig::from_toml_str(&text).unwrap(), config);
    }
}
