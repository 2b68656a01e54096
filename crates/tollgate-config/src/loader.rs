//! Configuration loader with multi-source merging

use crate::TollgateConfig;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::env;
use std::path::{Path, PathBuf};

/// Deployment config file name, git-tracked
pub const PROJECT_CONFIG_FILE: &str = "tollgate.toml";

/// Local override file name, gitignored
pub const LOCAL_CONFIG_FILE: &str = "tollgate.local.toml";

/// ~/.config/tollgate/config.toml, when the platform has a config directory
fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("org", "Tollgate", "tollgate")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "TOLLGATE".to_string(),
            user_config: true,
        }
    }

    /// Set the deployment directory holding `tollgate.toml`
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "TOLLGATE")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/tollgate/config.toml (for hermetic loading)
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<TollgateConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = TollgateConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/tollgate/config.toml)
        if self.user_config {
            if let Some(user_config_file) = user_config_file() {
                if user_config_file.exists() {
                    builder = builder.add_source(
                        config::File::from(user_config_file)
                            .required(false)
                            .format(config::FileFormat::Toml),
                    );
                }
            }
        }

        // 3. Deployment config (tollgate.toml)
        let project_config_file = self.project_dir.join(PROJECT_CONFIG_FILE);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 4. Local config (tollgate.local.toml, gitignored)
        let local_config_file = self.project_dir.join(LOCAL_CONFIG_FILE);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables (TOLLGATE_RESTRICT__ENFORCE_LOGIN=false)
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> TollgateConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnknownAddressPolicy;
    use std::fs;
    use tempfile::tempdir;

    fn loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new()
            .with_project_dir(dir)
            .with_env_prefix("TOLLGATE_LOADER_TEST")
            .without_user_config()
    }

    #[test]
    fn test_user_config_file_name() {
        // Platform dependent; only checks naming when discovery succeeds
        if let Some(path) = user_config_file() {
            assert!(path.to_string_lossy().contains("tollgate"));
            assert!(path.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_starter_file_loads_as_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        TollgateConfig::write_starter(temp_dir.path()).expect("Failed to write starter");

        let config = loader(temp_dir.path()).load().expect("Failed to load config");
        assert_eq!(config, TollgateConfig::default());
    }

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = loader(temp_dir.path()).load().expect("Failed to load config");

        assert_eq!(config, TollgateConfig::default());
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[restrict]
enforce_login = false
unknown_address = "allow"

[audit]
enabled = false
"#;
        fs::write(project_dir.join("tollgate.toml"), config_content)
            .expect("Failed to write config");

        let config = loader(project_dir).load().expect("Failed to load config");

        assert!(!config.restrict.enforce_login);
        assert!(config.restrict.enforce_connections);
        assert_eq!(config.restrict.unknown_address, UnknownAddressPolicy::Allow);
        assert!(!config.audit.enabled);
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("tollgate.toml"),
            r#"
[restrict]
unknown_address = "allow"
"#,
        )
        .expect("Failed to write project config");

        fs::write(
            project_dir.join("tollgate.local.toml"),
            r#"
[restrict]
unknown_address = "deny"
"#,
        )
        .expect("Failed to write local config");

        let config = loader(project_dir).load().expect("Failed to load config");

        // Local config should override project config
        assert_eq!(config.restrict.unknown_address, UnknownAddressPolicy::Deny);
    }

    // Environment variables are not exercised here: the process environment is
    // shared across parallel tests. They follow the pattern
    //
    // TOLLGATE_RESTRICT__ENFORCE_CONNECTIONS=false
    // TOLLGATE_AUDIT__ENABLED=false

    #[test]
    fn test_invalid_file_fails_to_load() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("tollgate.toml"),
            "[restrict]\nunknown_address = \"sometimes\"\n",
        )
        .expect("Failed to write config");

        assert!(loader(project_dir).load().is_err());
        assert_eq!(
            loader(project_dir).load_or_default(),
            TollgateConfig::default()
        );
    }
}
