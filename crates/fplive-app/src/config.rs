// Configuration loading and validation (config/fplive.toml).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fplive_scoring::{RuleSet, RulesError};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE: &str = "fplive.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub squad: SquadConfig,
    pub rules: RulesConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SquadConfig {
    pub entry_id: u64,
    /// Follow the current gameweek when absent.
    #[serde(default)]
    pub gameweek: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    pub season: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub backoff_base_secs: u64,
    pub backoff_cap_secs: u64,
    #[serde(default = "default_fallback_depth")]
    pub gameweek_fallback_depth: u32,
}

fn default_fallback_depth() -> u32 {
    2
}

impl Config {
    /// Scoring rules for the configured season.
    pub fn rules(&self) -> Result<&'static RuleSet, RulesError> {
        RuleSet::for_season(&self.rules.season)
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs(self.backoff_base_secs)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_secs(self.backoff_cap_secs)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/fplive.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` handles that.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path)
        .map_err(|_| ConfigError::FileNotFound { path: path.clone() })?;
    let config: Config =
        toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })?;

    validate(&config)?;

    Ok(config)
}

/// Copy any file in `defaults/` that is missing from `config/`. Returns the
/// copied paths. `.example` files are skipped.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);

        let mut dest = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(dest) => dest,
            // Already present in config/, leave it alone.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        };
        let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        dest.write_all(&content).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to write {}: {e}", target.display()),
        })?;
        copied.push(target);
    }

    Ok(copied)
}

/// Load config relative to the working directory, copying defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let base_url = &config.api.base_url;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(invalid(
            "api.base_url",
            format!("must start with http:// or https://, got {base_url}"),
        ));
    }

    if config.api.request_timeout_secs == 0 {
        return Err(invalid("api.request_timeout_secs", "must be > 0"));
    }

    if config.squad.entry_id == 0 {
        return Err(invalid("squad.entry_id", "must be > 0"));
    }

    if config.squad.gameweek == Some(0) {
        return Err(invalid("squad.gameweek", "gameweeks start at 1"));
    }

    if let Err(e) = config.rules() {
        let known: Vec<&str> = RuleSet::seasons().collect();
        return Err(invalid(
            "rules.season",
            format!("{e} (known seasons: {})", known.join(", ")),
        ));
    }

    let polling = &config.polling;
    let polling_fields: &[(&str, u64)] = &[
        ("polling.interval_secs", polling.interval_secs),
        ("polling.backoff_base_secs", polling.backoff_base_secs),
    ];
    for (name, val) in polling_fields {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }

    if polling.backoff_cap_secs < polling.backoff_base_secs {
        return Err(invalid(
            "polling.backoff_cap_secs",
            format!(
                "must be >= backoff_base_secs ({}), got {}",
                polling.backoff_base_secs, polling.backoff_cap_secs
            ),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
