//! Configuration file management for esconn.
//!
//! Provides a TOML-based config file at `~/.config/esconn/config.toml` and a
//! resolution chain per field: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use esconn_core::{AdapterConfig, ConnectionSettings};

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub elasticsearch: ElasticsearchSection,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ElasticsearchSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Client log level: error, warning, info, debug, trace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the esconn config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/esconn` or `~/.config/esconn`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("esconn");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("esconn")
}

/// Return the path to the esconn config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &config_path())
}

pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub index: Option<String>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct EsconnConfig {
    /// Settings handed to the data source.
    pub settings: ConnectionSettings,
    /// The same settings with defaults applied.
    pub adapter: AdapterConfig,
}

impl EsconnConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// A missing config file is not an error; an unreadable one is ignored
    /// the same way.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file_config = load_config().ok();
        Self::resolve_with(cli, file_config.as_ref())
    }

    pub fn resolve_with(cli: &CliOverrides, file: Option<&ConfigFile>) -> Result<Self> {
        let section = file.map(|f| f.elasticsearch.clone()).unwrap_or_default();

        let host = cli.host.clone().or_else(|| env("ESCONN_HOST")).or(section.host);

        let port = match (cli.port, env("ESCONN_PORT")) {
            (Some(port), _) => Some(port),
            (None, Some(raw)) => Some(
                raw.parse::<u16>()
                    .with_context(|| format!("ESCONN_PORT is not a valid port: {raw:?}"))?,
            ),
            (None, None) => section.port,
        };

        let log = env("ESCONN_LOG").or(section.log);
        let index = cli.index.clone().or_else(|| env("ESCONN_INDEX")).or(section.index);
        let doc_type = env("ESCONN_TYPE").or(section.doc_type);

        let settings = ConnectionSettings {
            host,
            port,
            log,
            index,
            doc_type,
            request_timeout: section.request_timeout_ms,
            ..Default::default()
        };
        let adapter = AdapterConfig::resolve(&settings).context("invalid esconn configuration")?;

        Ok(Self { settings, adapter })
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
