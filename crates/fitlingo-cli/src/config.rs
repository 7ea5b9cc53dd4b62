//! Configuration file management for fitlingo.
//!
//! Provides a TOML config file at `~/.config/fitlingo/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use fitlingo_core::generator::{DEFAULT_MODEL, GeminiConfig};
use fitlingo_db::config::DbConfig;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "FITLINGO_MODEL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub generator: GeneratorSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeneratorSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/fitlingo` or `~/.config/fitlingo`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("fitlingo");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("fitlingo")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at `path`.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents).context("failed to parse config file")
}

pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

/// Serialize and write `config` to `path`, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since the file may hold an API key.
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &config_path())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration.
#[derive(Debug)]
pub struct FitlingoConfig {
    pub db_config: DbConfig,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
}

impl FitlingoConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `FITLINGO_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - API key: `GEMINI_API_KEY` > `generator.api_key` > unset
    /// - Model: `FITLINGO_MODEL` > `generator.model` > [`DEFAULT_MODEL`]
    pub fn resolve(cli_db_url: Option<&str>) -> Self {
        Self::resolve_with(cli_db_url, load_config().ok())
    }

    fn resolve_with(cli_db_url: Option<&str>, file_config: Option<ConfigFile>) -> Self {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        let db_url = cli_db_url
            .map(str::to_owned)
            .or_else(|| env(DbConfig::ENV_VAR))
            .or_else(|| file_config.as_ref().map(|c| c.database.url.clone()))
            .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_owned());

        let generator = file_config.map(|c| c.generator).unwrap_or_default();
        let api_key = env(API_KEY_ENV).or(generator.api_key);
        let model = env(MODEL_ENV)
            .or(generator.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_owned());

        Self {
            db_config: DbConfig::new(db_url),
            api_key,
            model,
            base_url: generator.base_url,
        }
    }

    /// Gemini connection settings. Errors when no API key is configured.
    pub fn gemini_config(&self) -> Result<GeminiConfig> {
        let api_key = self.api_key.as_deref().with_context(|| {
            format!(
                "generator API key not found; set {API_KEY_ENV} or run \
                 `fitlingo init --api-key <key>` to create a config file"
            )
        })?;

        let config = GeminiConfig::new(api_key);
        Ok(match &self.base_url {
            Some(url) => config.with_base_url(url),
            None => config,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
