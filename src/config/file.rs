//! TOML configuration file loading
//!
//! Supports `~/.config/solace/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct SolaceConfigFile {
    /// Path to a persona JSON/TOML file replacing the embedded persona
    #[serde(default)]
    pub persona_file: Option<String>,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Language model configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Conversation memory configuration
    #[serde(default)]
    pub sessions: SessionsFileConfig,

    /// Crisis alert configuration
    #[serde(default)]
    pub alerts: AlertsFileConfig,
}

/// HTTP server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Port to listen on
    pub port: Option<u16>,

    /// Directory with the web UI
    pub static_dir: Option<String>,
}

/// Language model configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Anthropic API key
    pub api_key: Option<String>,

    /// Model identifier (e.g. "claude-sonnet-4-20250514")
    pub model: Option<String>,

    /// Maximum reply tokens
    pub max_tokens: Option<u32>,

    /// API base URL
    pub api_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Conversation memory configuration
#[derive(Debug, Default, Deserialize)]
pub struct SessionsFileConfig {
    /// Turns kept per session
    pub max_turns: Option<usize>,

    /// Expire sessions idle for this many seconds
    pub idle_ttl_secs: Option<u64>,
}

/// Crisis alert configuration
#[derive(Debug, Default, Deserialize)]
pub struct AlertsFileConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,

    /// Sender address (defaults to `smtp_user`)
    pub from: Option<String>,

    /// Alert recipients
    pub recipients: Option<Vec<String>>,

    /// Recent turns included in each alert
    pub context_turns: Option<usize>,
}

/// Load the TOML config file from `path`, or the standard path when `None`
///
/// Returns `SolaceConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path: Option<&Path>) -> SolaceConfigFile {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return SolaceConfigFile::default();
    };

    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return SolaceConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                SolaceConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            SolaceConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/solace/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("solace").join("config.toml"))
}
