// Configuration loading and parsing (dynasty.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use dynasty_stats::StatsOptions;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE: &str = "dynasty.toml";

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

    #[error("no platform cache directory available; set cache.dir")]
    NoCacheDir,
}

// ---------------------------------------------------------------------------
// dynasty.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub league: LeagueConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    /// Most recent season's league id; older seasons are found by walking back.
    pub league_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: dynasty_core::sleeper::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: dynasty_core::sleeper::DEFAULT_TIMEOUT.as_secs(),
            max_concurrent_requests: dynasty_stats::feed::DEFAULT_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Snapshot directory. Defaults to the platform cache directory.
    pub dir: Option<PathBuf>,
    pub ttl_hours: f64,
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            ttl_hours: 24.0,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub top_n: usize,
    pub churn_top_n: usize,
    pub trade_top_n: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        let options = StatsOptions::default();
        Self {
            top_n: options.top_n,
            churn_top_n: options.churn_top_n,
            trade_top_n: options.trade_top_n,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.request_timeout_secs)
    }

    /// Snapshot TTL. Out-of-range values saturate; `validate` rejects them
    /// at load time.
    pub fn cache_ttl(&self) -> Duration {
        Duration::try_from_secs_f64(self.cache.ttl_hours * 3600.0).unwrap_or(Duration::MAX)
    }

    /// Where snapshots are written: `cache.dir` if set, else the platform
    /// cache directory.
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.cache.dir {
            return Ok(dir.clone());
        }
        ProjectDirs::from("", "", "dynasty")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .ok_or(ConfigError::NoCacheDir)
    }

    pub fn stats_options(&self) -> StatsOptions {
        StatsOptions {
            top_n: self.stats.top_n,
            churn_top_n: self.stats.churn_top_n,
            trade_top_n: self.stats.trade_top_n,
            concurrency: self.provider.max_concurrent_requests,
            ..StatsOptions::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load `config/dynasty.toml` relative to `base_dir`, apply the league id
/// override and validate. Does not copy defaults.
pub fn load_config_from(base_dir: &Path, league_override: Option<&str>) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound { path: path.clone() })?;
    let mut config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    if let Some(league_id) = league_override.map(str::trim).filter(|id| !id.is_empty()) {
        config.league.league_id = league_id.to_string();
    }

    validate(&config)?;
    Ok(config)
}

/// Copy `defaults/dynasty.toml` into `config/` unless a config file is
/// already there. Returns the path written, if any.
pub fn ensure_config_files(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let default_file = base_dir.join("defaults").join(CONFIG_FILE);
    let config_dir = base_dir.join("config");

    if !default_file.is_file() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/{CONFIG_FILE} nor config/ found in {}; \
                     pass --config-dir or run from the dynasty-app directory",
                    base_dir.display()
                ),
            });
        }
        return Ok(None);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let target = config_dir.join(CONFIG_FILE);
    match std::fs::OpenOptions::new().write(true).create_new(true).open(&target) {
        Ok(mut dest) => {
            let content = std::fs::read(&default_file).map_err(|e| ConfigError::DefaultsCopyError {
                message: format!("failed to read {}: {e}", default_file.display()),
            })?;
            std::io::Write::write_all(&mut dest, &content).map_err(|e| ConfigError::DefaultsCopyError {
                message: format!("failed to write {}: {e}", target.display()),
            })?;
            Ok(Some(target))
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", target.display()),
        }),
    }
}

/// Copy missing defaults, then load and validate.
pub fn load_config(base_dir: &Path, league_override: Option<&str>) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir, league_override)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.league_id.trim().is_empty() {
        return Err(invalid(
            "league.league_id",
            "must not be empty (set it in dynasty.toml or DYNASTY_LEAGUE_ID)",
        ));
    }

    if config.provider.base_url.trim().is_empty() {
        return Err(invalid("provider.base_url", "must not be empty"));
    }

    let counts: &[(&str, u64)] = &[
        ("provider.request_timeout_secs", config.provider.request_timeout_secs),
        ("provider.max_concurrent_requests", config.provider.max_concurrent_requests as u64),
        ("stats.top_n", config.stats.top_n as u64),
        ("stats.churn_top_n", config.stats.churn_top_n as u64),
        ("stats.trade_top_n", config.stats.trade_top_n as u64),
    ];
    for (name, val) in counts {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }

    let ttl = config.cache.ttl_hours;
    if !ttl.is_finite() || ttl <= 0.0 {
        return Err(invalid("cache.ttl_hours", format!("must be > 0, got {ttl}")));
    }
    if Duration::try_from_secs_f64(ttl * 3600.0).is_err() {
        return Err(invalid("cache.ttl_hours", format!("is too large, got {ttl}")));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
