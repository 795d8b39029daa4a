//! Configuration loading and management.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// `DataMentor` configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub claude: ClaudeConfig,
    /// Mentor roster. Empty means the built-in mentors are used.
    #[serde(default)]
    pub mentors: Vec<MentorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory for transient review/curriculum uploads.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Upload size ceiling in megabytes.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
    /// Base URL the terminal chat client talks to.
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

/// A mentor persona entry in config.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorConfig {
    pub id: String,
    pub display_name: String,
    pub expertise: String,
    pub system_prompt: String,
    pub welcome_message: String,
}

fn default_port() -> u16 {
    4000
}

fn default_upload_dir() -> PathBuf {
    config_dir().join("uploads")
}

const fn default_max_upload_mb() -> u64 {
    10
}

fn default_relay_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            upload_dir: default_upload_dir(),
            max_upload_mb: default_max_upload_mb(),
            relay_url: default_relay_url(),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// `ANTHROPIC_API_KEY` overrides the api key from the file, and
    /// `PORT` overrides the configured server port.
    pub fn load() -> Result<Self> {
        let path = config_path();
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        let path = config_path();

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var("ANTHROPIC_API_KEY").ok(),
            std::env::var("PORT").ok(),
        );
    }

    /// Apply override values. An empty api key is ignored, as is a port
    /// that does not parse.
    fn apply_overrides(&mut self, api_key: Option<String>, port: Option<String>) {
        if let Some(key) = api_key {
            if !key.is_empty() {
                self.claude.api_key = key;
            }
        }
        if let Some(port) = port.and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }
}

/// Get the `DataMentor` config directory (~/datamentor).
pub fn config_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from("./datamentor"),
        |d| d.home_dir().join("datamentor"),
    )
}

/// Get the config file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config = toml::from_str("[claude]\napi_key = \"sk-test\"").unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.max_upload_mb, 10);
        assert_eq!(config.claude.model, "claude-sonnet-4-20250514");
        assert!(config.mentors.is_empty());
    }

    #[test]
    fn mentors_parse_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [claude]
            api_key = "sk-test"

            [[mentors]]
            id = "ada"
            display_name = "Ada Lovelace"
            expertise = "Algorithms"
            system_prompt = "You are Ada."
            welcome_message = "Hello!"
            "#,
        )
        .unwrap();
        assert_eq!(config.mentors.len(), 1);
        assert_eq!(config.mentors[0].id, "ada");
    }

    #[test]
    fn env_overrides_replace_key_and_port() {
        let mut config: Config = toml::from_str("[claude]\napi_key = \"file-key\"").unwrap();
        config.apply_overrides(Some("env-key".to_string()), Some("8080".to_string()));
        assert_eq!(config.claude.api_key, "env-key");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn empty_env_key_keeps_file_key() {
        let mut config: Config = toml::from_str("[claude]\napi_key = \"file-key\"").unwrap();
        config.apply_overrides(Some(String::new()), None);
        assert_eq!(config.claude.api_key, "file-key");
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn unparsable_port_keeps_configured_port() {
        let mut config: Config =
            toml::from_str("[claude]\napi_key = \"k\"\n[server]\nport = 5000").unwrap();
        config.apply_overrides(None, Some("not-a-port".to_string()));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn config_round_trips() {
        let config: Config = toml::from_str("[claude]\napi_key = \"sk-test\"").unwrap();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let reparsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(reparsed.claude.api_key, "sk-test");
        assert_eq!(reparsed.server.port, config.server.port);
    }
}
