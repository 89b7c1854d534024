//! Runtime configuration loaded from environment variables.
//!
//! # Responsibility
//! - Resolve database location, breed upstream settings and logging options.
//! - Reject malformed values up front instead of at first use.
//!
//! # Invariants
//! - Process environment wins over a `.env` file in the working directory
//!   (or its ancestors); the file only fills unset keys.
//! - Empty-string variables are treated as unset.
//! - `breed_cache_ttl_seconds` is non-negative; `upstream_timeout_seconds`
//!   is strictly positive.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_THECATAPI_KEY: &str = "THECATAPI_KEY";
pub const ENV_BREEDS_URL: &str = "THECATAPI_BREEDS_URL";
pub const ENV_BREED_CACHE_TTL: &str = "BREED_CACHE_TTL_SECONDS";
pub const ENV_UPSTREAM_TIMEOUT: &str = "THECATAPI_TIMEOUT_SECONDS";
pub const ENV_LOG_LEVEL: &str = "SPYCAT_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SPYCAT_LOG_DIR";

pub const DEFAULT_DATABASE_PATH: &str = "./sca.db";
pub const DEFAULT_BREEDS_URL: &str = "https://api.thecatapi.com/v1/breeds";
pub const DEFAULT_BREED_CACHE_TTL_SECONDS: u64 = 3600;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 10;

const SQLITE_URL_PREFIXES: [&str; 2] = ["sqlite:///", "sqlite://"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
    /// A `.env` file exists but cannot be read or parsed.
    EnvFile(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}=`{value}`: {reason}")
            }
            Self::EnvFile(reason) => write!(f, "cannot load .env file: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub database_path: PathBuf,
    pub thecatapi_key: Option<String>,
    pub breeds_url: String,
    pub breed_cache_ttl_seconds: u64,
    pub upstream_timeout_seconds: u64,
    /// `None` falls back to [`crate::default_log_level`].
    pub log_level: Option<String>,
    /// `None` leaves file logging disabled.
    pub log_dir: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            thecatapi_key: None,
            breeds_url: DEFAULT_BREEDS_URL.to_string(),
            breed_cache_ttl_seconds: DEFAULT_BREED_CACHE_TTL_SECONDS,
            upstream_timeout_seconds: DEFAULT_UPSTREAM_TIMEOUT_SECONDS,
            log_level: None,
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Loads configuration from the process environment, falling back to a
    /// `.env` file for keys the environment leaves unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_dotenv_and_lookup(dotenvy::dotenv_iter(), |key| std::env::var(key).ok())
    }

    /// Loads configuration from `lookup`, filling unset keys from an
    /// already opened `.env` iterator. A missing file is not an error.
    pub fn from_dotenv_and_lookup<F>(
        dotenv: dotenvy::Result<dotenvy::Iter<File>>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = read_dotenv(dotenv)?;
        Self::from_lookup(|key| lookup(key).or_else(|| file_vars.get(key).cloned()))
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let database_path = get(ENV_DATABASE_URL)
            .map(|value| parse_database_url(&value))
            .unwrap_or(defaults.database_path);

        let breed_cache_ttl_seconds = match get(ENV_BREED_CACHE_TTL) {
            Some(value) => parse_seconds(ENV_BREED_CACHE_TTL, &value)?,
            None => defaults.breed_cache_ttl_seconds,
        };

        let upstream_timeout_seconds = match get(ENV_UPSTREAM_TIMEOUT) {
            Some(value) => {
                let seconds = parse_seconds(ENV_UPSTREAM_TIMEOUT, &value)?;
                if seconds == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_UPSTREAM_TIMEOUT,
                        value,
                        reason: "timeout must be at least one second",
                    });
                }
                seconds
            }
            None => defaults.upstream_timeout_seconds,
        };

        Ok(Self {
            database_path,
            thecatapi_key: get(ENV_THECATAPI_KEY),
            breeds_url: get(ENV_BREEDS_URL).unwrap_or(defaults.breeds_url),
            breed_cache_ttl_seconds,
            upstream_timeout_seconds,
            log_level: get(ENV_LOG_LEVEL),
            log_dir: get(ENV_LOG_DIR),
        })
    }

    pub fn breed_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.breed_cache_ttl_seconds)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_seconds)
    }
}

fn read_dotenv(
    dotenv: dotenvy::Result<dotenvy::Iter<File>>,
) -> Result<HashMap<String, String>, ConfigError> {
    let iter = match dotenv {
        Ok(iter) => iter,
        Err(err) if err.not_found() => return Ok(HashMap::new()),
        Err(err) => return Err(ConfigError::EnvFile(err.to_string())),
    };
    iter.map(|item| item.map_err(|err| ConfigError::EnvFile(err.to_string())))
        .collect()
}

fn parse_database_url(value: &str) -> PathBuf {
    let path = SQLITE_URL_PREFIXES
        .iter()
        .find_map(|prefix| value.strip_prefix(prefix))
        .unwrap_or(value);
    PathBuf::from(path)
}

fn parse_seconds(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: "expected a non-negative integer number of seconds",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load(pairs: &[(&str, &str)]) -> Result<CoreConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.breed_cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.upstream_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn sqlite_url_prefix_is_stripped() {
        let config = load(&[(ENV_DATABASE_URL, "sqlite:///./data/sca.db")]).unwrap();
        assert_eq!(config.database_path, PathBuf::from("./data/sca.db"));

        let bare = load(&[(ENV_DATABASE_URL, "/var/lib/sca.db")]).unwrap();
        assert_eq!(bare.database_path, PathBuf::from("/var/lib/sca.db"));
    }

    #[test]
    fn ttl_accepts_zero_and_rejects_negative() {
        let zero = load(&[(ENV_BREED_CACHE_TTL, "0")]).unwrap();
        assert_eq!(zero.breed_cache_ttl_seconds, 0);

        let err = load(&[(ENV_BREED_CACHE_TTL, "-5")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: ENV_BREED_CACHE_TTL,
                ..
            }
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = load(&[(ENV_UPSTREAM_TIMEOUT, "0")]).unwrap_err();
        assert!(err.to_string().contains(ENV_UPSTREAM_TIMEOUT));
    }

    #[test]
    fn blank_values_are_unset() {
        let config = load(&[(ENV_THECATAPI_KEY, "   "), (ENV_LOG_DIR, "")]).unwrap();
        assert_eq!(config.thecatapi_key, None);
        assert_eq!(config.log_dir, None);
    }

    fn write_env_file(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn env_file_fills_unset_keys() {
        let (_dir, path) = write_env_file(
            "DATABASE_URL=sqlite:///./from-file.db\nBREED_CACHE_TTL_SECONDS=60\nTHECATAPI_KEY=file-key\n",
        );
        let config =
            CoreConfig::from_dotenv_and_lookup(dotenvy::from_path_iter(&path), |_| None).unwrap();
        assert_eq!(config.database_path, PathBuf::from("./from-file.db"));
        assert_eq!(config.breed_cache_ttl_seconds, 60);
        assert_eq!(config.thecatapi_key.as_deref(), Some("file-key"));
    }

    #[test]
    fn process_environment_overrides_env_file() {
        let (_dir, path) = write_env_file("BREED_CACHE_TTL_SECONDS=60\n");
        let config = CoreConfig::from_dotenv_and_lookup(dotenvy::from_path_iter(&path), |key| {
            (key == ENV_BREED_CACHE_TTL).then(|| "120".to_string())
        })
        .unwrap();
        assert_eq!(config.breed_cache_ttl_seconds, 120);
    }

    #[test]
    fn missing_env_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::from_dotenv_and_lookup(
            dotenvy::from_path_iter(dir.path().join(".env")),
            |_| None,
        )
        .unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn malformed_env_file_is_reported() {
        let (_dir, path) = write_env_file("THIS IS NOT A PAIR\n");
        let err = CoreConfig::from_dotenv_and_lookup(dotenvy::from_path_iter(&path), |_| None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile(_)));
    }
}
