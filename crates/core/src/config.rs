use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file locations searched when no explicit path is given, in order.
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["lunchly.toml", "config/lunchly.toml"];

/// Environment variables read for each setting, highest priority first.
pub const ENV_VARS: [(&str, &[&str]); 5] = [
    ("database.url", &["LUNCHLY_DATABASE_URL"]),
    ("database.max_connections", &["LUNCHLY_DATABASE_MAX_CONNECTIONS"]),
    ("database.timeout_secs", &["LUNCHLY_DATABASE_TIMEOUT_SECS"]),
    ("logging.level", &["LUNCHLY_LOGGING_LEVEL", "LUNCHLY_LOG_LEVEL"]),
    ("logging.format", &["LUNCHLY_LOGGING_FORMAT", "LUNCHLY_LOG_FORMAT"]),
];

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Values given on the command line. They win over file and environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://lunchly.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Layers defaults, the config file, `LUNCHLY_*` variables and
    /// `options.overrides`, later layers winning, then validates the result.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let file = match discover_config_path(options.config_path.as_deref()) {
            Some(path) => read_patch(&path)?,
            None if options.require_file => {
                let expected =
                    options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATHS[0]));
                return Err(ConfigError::MissingConfigFile(expected));
            }
            None => ConfigPatch::default(),
        };

        let mut config = Self::default();
        for layer in [file, ConfigPatch::from_env()?, ConfigPatch::from(options.overrides)] {
            config.database.merge(layer.database);
            config.logging.merge(layer.logging);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let database = &self.database;
        let url = database.url.trim();
        let sqlite_url =
            url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
        let level = self.logging.level.trim().to_ascii_lowercase();

        let problem = if !sqlite_url {
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
        } else if database.max_connections == 0 {
            "database.max_connections must be greater than zero"
        } else if !(1..=300).contains(&database.timeout_secs) {
            "database.timeout_secs must be in range 1..=300"
        } else if !LOG_LEVELS.contains(&level.as_str()) {
            "logging.level must be one of trace|debug|info|warn|error"
        } else {
            return Ok(());
        };

        Err(ConfigError::Validation(problem.to_string()))
    }
}

/// The file `AppConfig::load` reads: `explicit` if it exists, otherwise the
/// first of [`DEFAULT_CONFIG_PATHS`] present in the working directory.
pub fn discover_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => DEFAULT_CONFIG_PATHS.into_iter().map(PathBuf::from).find(|path| path.exists()),
    }
}

/// Environment variable names for a dotted setting path such as `logging.level`.
pub fn env_keys(key_path: &str) -> &'static [&'static str] {
    ENV_VARS.iter().find(|(path, _)| *path == key_path).map(|(_, keys)| *keys).unwrap_or_default()
}

/// One configuration source. Present fields replace the layer underneath.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigPatch {
    database: DatabasePatch,
    logging: LoggingPatch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl ConfigPatch {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database: DatabasePatch {
                url: env_value("database.url")?,
                max_connections: env_value("database.max_connections")?,
                timeout_secs: env_value("database.timeout_secs")?,
            },
            logging: LoggingPatch {
                level: env_value("logging.level")?,
                format: env_value("logging.format")?,
            },
        })
    }
}

impl From<ConfigOverrides> for ConfigPatch {
    fn from(overrides: ConfigOverrides) -> Self {
        Self {
            database: DatabasePatch { url: overrides.database_url, ..DatabasePatch::default() },
            logging: LoggingPatch { level: overrides.log_level, ..LoggingPatch::default() },
        }
    }
}

impl DatabaseConfig {
    fn merge(&mut self, patch: DatabasePatch) {
        overwrite(&mut self.url, patch.url);
        overwrite(&mut self.max_connections, patch.max_connections);
        overwrite(&mut self.timeout_secs, patch.timeout_secs);
    }
}

impl LoggingConfig {
    fn merge(&mut self, patch: LoggingPatch) {
        overwrite(&mut self.level, patch.level);
        overwrite(&mut self.format, patch.format);
    }
}

fn overwrite<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// First non-blank variable among the setting's keys, parsed as `T`.
fn env_value<T: FromStr>(key_path: &str) -> Result<Option<T>, ConfigError> {
    let found = env_keys(key_path).iter().find_map(|key| {
        env::var(key).ok().filter(|value| !value.trim().is_empty()).map(|value| (*key, value))
    });
    let Some((key, value)) = found else {
        return Ok(None);
    };

    match value.parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(ConfigError::InvalidEnvOverride { key: key.to_string(), value }),
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    toml::from_str(&interpolate_env_vars(&raw)?)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Replaces every `${VAR}` with the value of `VAR`.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let end = tail.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &tail[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &tail[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}
