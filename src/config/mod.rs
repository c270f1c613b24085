//! Configuration management for Solace gateway
//!
//! Every setting resolves as env > config file > default. A `.env` file in
//! the working directory is loaded into the environment by the binary
//! before this runs.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use crate::alert::{DEFAULT_CONTEXT_TURNS, SmtpConfig};
use crate::llm::{DEFAULT_API_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::persona::{DEFAULT_PERSONA_ID, Persona};
use crate::session::DEFAULT_MAX_TURNS;
use crate::{Error, Result};

use file::SolaceConfigFile;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Solace gateway configuration
#[derive(Debug)]
pub struct Config {
    /// Persona the model speaks as
    pub persona: Persona,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Language model configuration
    pub llm: LlmConfig,

    /// Conversation memory configuration
    pub sessions: SessionConfig,

    /// Crisis alert configuration
    pub alerts: AlertConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path to static files directory (web UI)
    pub static_dir: Option<PathBuf>,
}

/// Language model configuration
#[derive(Debug)]
pub struct LlmConfig {
    /// Anthropic API key (`ANTHROPIC_API_KEY`)
    pub api_key: Option<SecretString>,

    /// Model identifier
    pub model: String,

    /// Maximum reply tokens
    pub max_tokens: u32,

    /// API base URL
    pub api_url: String,

    /// Request timeout
    pub timeout: Duration,
}

/// Conversation memory configuration
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Turns kept per session
    pub max_turns: usize,

    /// Expire sessions idle this long; `None` keeps them for the process lifetime
    pub idle_ttl: Option<Duration>,
}

/// Crisis alert configuration
#[derive(Debug)]
pub struct AlertConfig {
    /// SMTP delivery, present only when credentials and recipients are set
    pub smtp: Option<SmtpConfig>,

    /// Recent turns included in each alert
    pub context_turns: usize,
}

impl Config {
    /// Load configuration from the process environment and config file
    ///
    /// `config_path` overrides the standard `~/.config/solace/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns error if a configured persona file cannot be loaded
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let fc = file::load_config_file(config_path);
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed config file and an env lookup
    ///
    /// # Errors
    ///
    /// Returns error if a configured persona file cannot be loaded or a
    /// numeric env var does not parse
    pub fn from_sources<F>(fc: SolaceConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        // Persona (env > toml > embedded)
        let persona = match env("SOLACE_PERSONA_FILE").or(fc.persona_file) {
            Some(path) => Persona::from_file(Path::new(&path))?,
            None => Persona::embedded(DEFAULT_PERSONA_ID)?,
        };

        // Server (env > toml > default)
        let server = ServerConfig {
            port: parse_env(&env, "SOLACE_PORT")?
                .or(parse_env(&env, "PORT")?)
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            static_dir: env("SOLACE_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
        };

        // LLM (env > toml > default)
        let llm = LlmConfig {
            api_key: env("ANTHROPIC_API_KEY")
                .or(fc.llm.api_key)
                .map(SecretString::from),
            model: env("SOLACE_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: parse_env(&env, "SOLACE_LLM_MAX_TOKENS")?
                .or(fc.llm.max_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            api_url: env("SOLACE_LLM_API_URL")
                .or(fc.llm.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout: Duration::from_secs(
                parse_env(&env, "SOLACE_LLM_TIMEOUT_SECS")?
                    .or(fc.llm.timeout_secs)
                    .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
            ),
        };

        // Sessions (env > toml > default); a zero TTL means no expiry
        let sessions = SessionConfig {
            max_turns: parse_env(&env, "SOLACE_MAX_TURNS")?
                .or(fc.sessions.max_turns)
                .unwrap_or(DEFAULT_MAX_TURNS),
            idle_ttl: parse_env(&env, "SOLACE_SESSION_IDLE_TTL_SECS")?
                .or(fc.sessions.idle_ttl_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        };

        // Alerts (env > toml > default)
        let alerts_toml = fc.alerts;
        let username = env("SMTP_USER").or(alerts_toml.smtp_user);
        let password = env("SMTP_PASS").or(alerts_toml.smtp_pass);
        let recipients = env("SOLACE_ALERT_TO")
            .map(|s| parse_list(&s))
            .or(alerts_toml.recipients)
            .unwrap_or_default();

        let smtp = match (username, password) {
            (Some(username), Some(password)) if !recipients.is_empty() => Some(SmtpConfig {
                host: env("SMTP_HOST")
                    .or(alerts_toml.smtp_host)
                    .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                port: parse_env(&env, "SMTP_PORT")?
                    .or(alerts_toml.smtp_port)
                    .unwrap_or(DEFAULT_SMTP_PORT),
                from: env("SOLACE_ALERT_FROM")
                    .or(alerts_toml.from)
                    .unwrap_or_else(|| username.clone()),
                username,
                password: SecretString::from(password),
                recipients,
            }),
            (Some(_), Some(_)) => {
                tracing::info!(
                    "SMTP credentials set but no alert recipients, alerts will only be logged"
                );
                None
            }
            _ => {
                tracing::info!("SMTP not configured, alerts will only be logged");
                None
            }
        };

        let alerts = AlertConfig {
            smtp,
            context_turns: parse_env(&env, "SOLACE_ALERT_CONTEXT_TURNS")?
                .or(alerts_toml.context_turns)
                .unwrap_or(DEFAULT_CONTEXT_TURNS),
        };

        Ok(Self {
            persona,
            server,
            llm,
            sessions,
            alerts,
        })
    }
}

/// Parse an optional env var, failing loudly on malformed values
fn parse_env<T, F>(env: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| Error::Config(format!("invalid {key}={raw:?}: {e}")))
        })
        .transpose()
}

/// Split a comma separated list, dropping empty entries
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
