//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`config.yaml`).
//! Defines the structs for the Matrix session, the state store and roster behaviour.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub services: ServicesConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
}

impl AppConfig {
    /// Reads and validates the config file. Any failure here is fatal at startup.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(content).context("Failed to parse config YAML")?;
        config.services.matrix.validate()?;
        Ok(config)
    }
}

/// Configuration for various connected services.
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub matrix: MatrixConfig,
}

/// Specific configuration for the Matrix service.
#[derive(Debug, Deserialize, Clone)]
pub struct MatrixConfig {
    pub homeserver: String,
    pub user_id: String,
    pub device_id: String,
    /// Access token for the session.
    #[serde(default)]
    pub token: Option<String>,
    /// Name of an environment variable holding the access token, e.g. "ROSTERBOT_TOKEN".
    #[serde(default)]
    pub token_env: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl MatrixConfig {
    fn validate(&self) -> Result<()> {
        if !self.user_id.starts_with('@') || !self.user_id.contains(':') {
            bail!("Malformed Matrix user id: {}", self.user_id);
        }
        if self.token.is_none() && self.token_env.is_none() {
            bail!("No access token configured (set services.matrix.token or token_env)");
        }
        Ok(())
    }

    /// The inline token wins over `token_env`. Blank values count as missing.
    pub fn resolve_token(&self) -> Result<String> {
        let token = match (&self.token, &self.token_env) {
            (Some(token), _) => token.clone(),
            (None, Some(var)) => std::env::var(var)
                .with_context(|| format!("Access token env var {var} is not set"))?,
            (None, None) => bail!("No access token configured"),
        };
        let token = token.trim();
        if token.is_empty() || token.contains(char::is_whitespace) {
            bail!("Access token is empty or malformed");
        }
        Ok(token.to_string())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> String {
    "data/roster.json".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RosterConfig {
    #[serde(default = "default_group_name")]
    pub group_name: String,
    /// Delay before a cleanup reply and its trigger are deleted.
    #[serde(default = "default_cleanup_seconds")]
    pub cleanup_seconds: u64,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            group_name: default_group_name(),
            cleanup_seconds: default_cleanup_seconds(),
        }
    }
}

fn default_group_name() -> String {
    "White Star".to_string()
}

fn default_cleanup_seconds() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommandsConfig {
    /// Skip unrecognised leading tokens until a verb is found.
    #[serde(default = "default_skip_unknown_prefix")]
    pub skip_unknown_prefix: bool,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            skip_unknown_prefix: default_skip_unknown_prefix(),
        }
    }
}

fn default_skip_unknown_prefix() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
services:
  matrix:
    homeserver: https://matrix.example.org
    user_id: "@rosterbot:example.org"
    device_id: ROSTERDEV
    token: syt_abc123
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = AppConfig::parse(MINIMAL).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.path, "data/roster.json");
        assert_eq!(config.roster.group_name, "White Star");
        assert_eq!(config.roster.cleanup_seconds, 10);
        assert!(config.commands.skip_unknown_prefix);
        assert_eq!(config.services.matrix.resolve_token().unwrap(), "syt_abc123");
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let yaml = MINIMAL.replace("    token: syt_abc123\n", "");
        assert!(AppConfig::parse(&yaml).is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let yaml = MINIMAL.replace("syt_abc123", "\"bad token\"");
        let config = AppConfig::parse(&yaml).unwrap();
        assert!(config.services.matrix.resolve_token().is_err());
    }

    #[test]
    fn test_malformed_user_id_rejected() {
        let yaml = MINIMAL.replace("\"@rosterbot:example.org\"", "rosterbot");
        assert!(AppConfig::parse(&yaml).is_err());
    }

    #[test]
    fn test_token_from_unset_env_fails() {
        let yaml = MINIMAL.replace(
            "token: syt_abc123",
            "token_env: ROSTERBOT_TEST_TOKEN_THAT_IS_NEVER_SET",
        );
        let config = AppConfig::parse(&yaml).unwrap();
        assert!(config.services.matrix.resolve_token().is_err());
    }

    #[test]
    fn test_memory_backend() {
        let yaml = format!("{MINIMAL}storage:\n  backend: memory\n");
        let config = AppConfig::parse(&yaml).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }
}
