//! Global newsdesk configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::CachePolicy;
use crate::error::{NewsdeskError, NewsdeskResult};

static DEFAULT_SESSION_FILE: &str = "~/.config/newsdesk/session.toml";
static DEFAULT_LOG_LEVEL: &str = "warn";
static DEFAULT_MAX_AGE: &str = "5m";
static DEFAULT_REFRESH_INTERVAL: &str = "30s";
const DEFAULT_CACHE_CAPACITY: usize = 32;

fn default_session_file() -> PathBuf {
    PathBuf::from(DEFAULT_SESSION_FILE)
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_max_age() -> String {
    DEFAULT_MAX_AGE.to_string()
}

fn default_refresh_interval() -> String {
    DEFAULT_REFRESH_INTERVAL.to_string()
}

fn default_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

/// Global configuration at ~/.config/newsdesk/config.toml
///
/// Every key can be overridden from the environment with a `NEWSDESK_`
/// prefix, nested keys separated by `__` (e.g. `NEWSDESK_CACHE__MAX_AGE`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewsdeskConfig {
    /// Search endpoint for event documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_url: Option<String>,

    /// IANA zone used to assign events to days. Defaults to the system zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,

    /// Section titles offered by the section filter.
    #[serde(default)]
    pub sections: Vec<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// How long a fetched window is served without revalidating.
    #[serde(default = "default_max_age")]
    pub max_age: String,

    /// Number of windows kept.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Redraw interval for `grid --watch`.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_age: default_max_age(),
            capacity: default_capacity(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

impl Default for NewsdeskConfig {
    fn default() -> Self {
        NewsdeskConfig {
            index_url: None,
            time_zone: None,
            sections: Vec::new(),
            log_level: default_log_level(),
            session_file: default_session_file(),
            cache: CacheConfig::default(),
        }
    }
}

impl NewsdeskConfig {
    pub fn config_dir() -> NewsdeskResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| NewsdeskError::Config("Could not determine config directory".into()))?
            .join("newsdesk");

        Ok(config_dir)
    }

    pub fn config_path() -> NewsdeskResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load ~/.config/newsdesk/config.toml, creating a commented default on first run.
    pub fn load() -> NewsdeskResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> NewsdeskResult<Self> {
        let config: NewsdeskConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("NEWSDESK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| NewsdeskError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| NewsdeskError::Config(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> NewsdeskResult<()> {
        if let Some(raw) = &self.index_url {
            if !raw.trim().is_empty() {
                parse_index_url(raw)?;
            }
        }
        if self.cache.capacity == 0 {
            return Err(NewsdeskError::Config(
                "cache.capacity must be greater than zero".into(),
            ));
        }
        parse_duration("cache.max_age", &self.cache.max_age)?;
        parse_duration("cache.refresh_interval", &self.cache.refresh_interval)?;

        Ok(())
    }

    /// The configured search endpoint. Fetching is impossible without one.
    pub fn index_url(&self) -> NewsdeskResult<Url> {
        match self.index_url.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_index_url(raw),
            _ => Err(NewsdeskError::Config(format!(
                "index_url is not set. Add it to {}",
                Self::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "config.toml".to_string())
            ))),
        }
    }

    pub fn session_path(&self) -> PathBuf {
        let full_path_str =
            shellexpand::tilde(&self.session_file.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn cache_policy(&self) -> NewsdeskResult<CachePolicy> {
        let capacity = std::num::NonZeroUsize::new(self.cache.capacity).ok_or_else(|| {
            NewsdeskError::Config("cache.capacity must be greater than zero".into())
        })?;

        Ok(CachePolicy {
            max_age: parse_duration("cache.max_age", &self.cache.max_age)?,
            capacity,
            refresh_interval: parse_duration(
                "cache.refresh_interval",
                &self.cache.refresh_interval,
            )?,
        })
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> NewsdeskResult<()> {
        let contents = format!(
            "\
# newsdesk configuration

# Search endpoint for event documents:
# index_url = \"https://index.example.com/core_event/_search\"

# Time zone used to place events on days (defaults to the system zone):
# time_zone = \"Europe/Stockholm\"

# Sections offered by the section filter:
# sections = [\"Inrikes\", \"Utrikes\", \"Sport\"]

# log_level = \"{DEFAULT_LOG_LEVEL}\"
# session_file = \"{DEFAULT_SESSION_FILE}\"

# [cache]
# max_age = \"{DEFAULT_MAX_AGE}\"
# capacity = {DEFAULT_CACHE_CAPACITY}
# refresh_interval = \"{DEFAULT_REFRESH_INTERVAL}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                NewsdeskError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| NewsdeskError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

fn parse_index_url(raw: &str) -> NewsdeskResult<Url> {
    Url::parse(raw.trim())
        .map_err(|e| NewsdeskError::Config(format!("index_url '{}' is not a valid URL: {}", raw, e)))
}

fn parse_duration(key: &str, raw: &str) -> NewsdeskResult<Duration> {
    humantime::parse_duration(raw)
        .map_err(|e| NewsdeskError::Config(format!("{key} '{raw}' is not a duration: {e}")))
}
