//! Configuration loading and resolution
//!
//! Every setting is resolved in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (only where a safe default exists)
//!
//! The backend URL and public key have no compiled default; startup fails
//! with a configuration error when neither is supplied.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable for the backend base URL
pub const ENV_API_URL: &str = "CROPAI_API_URL";
/// Environment variable for the public (anon) access key
pub const ENV_ANON_KEY: &str = "CROPAI_ANON_KEY";
/// Environment variable for the HTTP port
pub const ENV_PORT: &str = "CROPAI_PORT";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;
/// Default bind address (loopback only)
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
/// Default idle time before a browser session is dropped (seconds)
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
/// Default upper bound on live browser sessions
pub const DEFAULT_MAX_SESSIONS: usize = 1000;
/// Default period of the idle-session sweep (seconds)
pub const DEFAULT_SESSION_SWEEP_SECS: u64 = 60;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Backend base URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub api_url: Option<String>,

    /// Public access key sent with every backend request
    #[serde(default)]
    pub anon_key: Option<String>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// HTTP bind address
    #[serde(default)]
    pub bind_address: Option<String>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Browser session limits (optional)
    #[serde(default)]
    pub sessions: SessionsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log filter directive (trace, debug, info, warn, error or a full EnvFilter string)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[sessions]` section: bounds on in-memory browser sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SessionsConfig {
    /// Seconds without a request before a session is dropped
    #[serde(default = "default_session_idle_secs")]
    pub idle_timeout_secs: u64,

    /// Live sessions kept before the least recently seen is dropped
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Seconds between idle sweeps
    #[serde(default = "default_session_sweep_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: DEFAULT_SESSION_IDLE_SECS,
            max_sessions: DEFAULT_MAX_SESSIONS,
            sweep_interval_secs: DEFAULT_SESSION_SWEEP_SECS,
        }
    }
}

impl SessionsConfig {
    /// Reject zero values, which would drop every session immediately
    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout_secs == 0 {
            return Err(Error::Config(
                "sessions.idle_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_sessions == 0 {
            return Err(Error::Config(
                "sessions.max_sessions must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(Error::Config(
                "sessions.sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_session_idle_secs() -> u64 {
    DEFAULT_SESSION_IDLE_SECS
}

fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

fn default_session_sweep_secs() -> u64 {
    DEFAULT_SESSION_SWEEP_SECS
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_url: Option<String>,
    pub anon_key: Option<String>,
    pub port: Option<u16>,
    pub bind_address: Option<String>,
}

/// Backend endpoint and public credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL without trailing slash
    pub api_url: String,
    /// Public access key (never a privileged secret)
    pub anon_key: String,
}

impl BackendConfig {
    /// Build a backend config, normalizing and validating the URL
    pub fn new(api_url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self> {
        let api_url = api_url.into().trim().trim_end_matches('/').to_string();
        let anon_key = anon_key.into().trim().to_string();

        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "API URL must start with http:// or https://: {:?}",
                api_url
            )));
        }
        if anon_key.is_empty() {
            return Err(Error::Config("Public access key is empty".to_string()));
        }

        Ok(Self { api_url, anon_key })
    }

    /// `{api_url}/rest/v1`
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.api_url)
    }

    /// `{api_url}/auth/v1`
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.api_url)
    }

    /// `{api_url}/functions/v1/analyze-crop`
    pub fn prediction_url(&self) -> String {
        format!("{}/functions/v1/analyze-crop", self.api_url)
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub backend: BackendConfig,
    pub port: u16,
    pub bind_address: String,
    pub log_level: String,
    pub sessions: SessionsConfig,
}

/// Default config file location: `<config dir>/cropai/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cropai").join("config.toml"))
}

/// Load the TOML config file
///
/// An explicitly requested path must exist. When no path is given the
/// platform default is tried, and a missing file is not an error.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using command line and environment only");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    info!("Loaded config file {}", path.display());
    Ok(config)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve the service configuration from CLI, environment, TOML and defaults
pub fn resolve_service_config(cli: &CliOverrides, toml: &TomlConfig) -> Result<ServiceConfig> {
    let api_url = cli
        .api_url
        .clone()
        .or_else(|| env_value(ENV_API_URL))
        .or_else(|| toml.api_url.clone())
        .ok_or_else(|| {
            Error::Config(format!(
                "Backend URL not configured. Use --api-url, {} or api_url in config.toml",
                ENV_API_URL
            ))
        })?;

    let anon_key = cli
        .anon_key
        .clone()
        .or_else(|| env_value(ENV_ANON_KEY))
        .or_else(|| toml.anon_key.clone())
        .ok_or_else(|| {
            Error::Config(format!(
                "Public access key not configured. Use --anon-key, {} or anon_key in config.toml",
                ENV_ANON_KEY
            ))
        })?;

    let env_port = match env_value(ENV_PORT) {
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                warn!("Ignoring invalid {}={:?}", ENV_PORT, raw);
                None
            }
        },
        None => None,
    };
    let port = cli.port.or(env_port).or(toml.port).unwrap_or(DEFAULT_PORT);

    let bind_address = cli
        .bind_address
        .clone()
        .or_else(|| toml.bind_address.clone())
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

    toml.sessions.validate()?;

    Ok(ServiceConfig {
        backend: BackendConfig::new(api_url, anon_key)?,
        port,
        bind_address,
        log_level: toml.logging.level.clone(),
        sessions: toml.sessions,
    })
}
