use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub auth_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Maximum rows requested per lookup. The backend caps result sets
    /// anyway; this keeps dropdown payloads small on slow desks.
    pub result_limit: usize,
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

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub api_auth_token: Option<String>,
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
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                timeout_secs: 30,
                auth_token: None,
            },
            search: SearchConfig { result_limit: 25 },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Compact,
            },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
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
    /// Layered load: defaults, then the config file (if any), then
    /// `HIREDESK_*` environment variables, then explicit overrides.
    /// Later layers win; the merged result is validated once.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options
                .config_path
                .unwrap_or_else(|| PathBuf::from("hiredesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(api) = patch.api {
            if let Some(base_url) = api.base_url {
                self.api.base_url = base_url;
            }
            if let Some(timeout_secs) = api.timeout_secs {
                self.api.timeout_secs = timeout_secs;
            }
            if let Some(auth_token_value) = api.auth_token {
                self.api.auth_token = Some(secret_value(auth_token_value));
            }
        }

        if let Some(search) = patch.search {
            if let Some(result_limit) = search.result_limit {
                self.search.result_limit = result_limit;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("HIREDESK_API_BASE_URL") {
            self.api.base_url = value;
        }
        if let Some(value) = read_env("HIREDESK_API_TIMEOUT_SECS") {
            self.api.timeout_secs = parse_u64("HIREDESK_API_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("HIREDESK_API_AUTH_TOKEN") {
            self.api.auth_token = Some(secret_value(value));
        }

        if let Some(value) = read_env("HIREDESK_SEARCH_RESULT_LIMIT") {
            self.search.result_limit = parse_usize("HIREDESK_SEARCH_RESULT_LIMIT", &value)?;
        }

        let log_level =
            read_env("HIREDESK_LOGGING_LEVEL").or_else(|| read_env("HIREDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("HIREDESK_LOGGING_FORMAT").or_else(|| read_env("HIREDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(api_base_url) = overrides.api_base_url {
            self.api.base_url = api_base_url;
        }
        if let Some(api_auth_token) = overrides.api_auth_token {
            self.api.auth_token = Some(secret_value(api_auth_token));
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_api(&self.api)?;
        validate_search(&self.search)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [
        PathBuf::from("hiredesk.toml"),
        PathBuf::from("config/hiredesk.toml"),
    ]
    .into_iter()
    .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated).map_err(|source| ConfigError::ParseFile {
        path: path.to_path_buf(),
        source,
    })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
    let base_url = api.base_url.trim();
    let has_scheme = base_url.starts_with("http://") || base_url.starts_with("https://");
    if !has_scheme {
        return Err(ConfigError::Validation(
            "api.base_url must start with http:// or https://".to_string(),
        ));
    }
    let remainder = base_url
        .trim_start_matches("http://")
        .trim_start_matches("https://");
    if remainder.is_empty() {
        return Err(ConfigError::Validation(
            "api.base_url must include a host, e.g. `https://hiredesk.example.com`".to_string(),
        ));
    }

    if api.timeout_secs == 0 || api.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "api.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if let Some(token) = &api.auth_token {
        if token.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "api.auth_token is set but empty; remove it or provide a real token".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    if search.result_limit == 0 || search.result_limit > 200 {
        return Err(ConfigError::Validation(
            "search.result_limit must be in range 1..=200".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    api: Option<ApiPatch>,
    search: Option<SearchPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    auth_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    result_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
