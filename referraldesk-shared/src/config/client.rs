use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://api.referraldesk.in/api/";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Fixed storage key of the persisted credential; also the file name.
pub const CREDENTIAL_KEY: &str = "auth_token";

/// Errors raised while resolving the client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration file: {0}")]
    Parse(String),
    #[error("Unsupported configuration format. Use 'yaml', 'json' or 'toml'.")]
    UnsupportedFormat,
    #[error("Invalid {name} value: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                name: "REFERRALDESK_LOG_FORMAT",
                reason: format!("unknown log format `{other}`"),
            }),
        }
    }
}

/// The main configuration structure for the ReferralDesk client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST API; endpoint paths are joined onto it.
    pub base_url: Url,

    /// File holding the persisted bearer token.
    pub credentials_path: PathBuf,

    /// Logging level
    pub log_level: String,

    /// Logging format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl ClientConfig {
    /// Generates a default configuration.
    ///
    /// # Panics
    /// Never in practice: the built-in base URL is a valid constant.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            credentials_path: default_credentials_path(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Compact,
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// Precedence, lowest first: built-in defaults, the configuration file,
    /// `REFERRALDESK_*` environment variables, then `base_url_override`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if an
    /// environment variable holds an invalid value.
    pub fn load_config(
        config_path: Option<PathBuf>,
        base_url_override: Option<Url>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::with_defaults();

        if let Some(path) = config_path {
            let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            config = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => serde_yml::from_str(&content)
                    .map_err(|err| ConfigError::Parse(err.to_string()))?,
                Some("json") => serde_json::from_str(&content)
                    .map_err(|err| ConfigError::Parse(err.to_string()))?,
                Some("toml") => {
                    toml::from_str(&content).map_err(|err| ConfigError::Parse(err.to_string()))?
                }
                _ => return Err(ConfigError::UnsupportedFormat),
            };
        }

        if let Ok(base_url) = env::var("REFERRALDESK_BASE_URL") {
            config.base_url = Url::parse(&base_url).map_err(|err| ConfigError::InvalidValue {
                name: "REFERRALDESK_BASE_URL",
                reason: err.to_string(),
            })?;
        }
        if let Ok(path) = env::var("REFERRALDESK_CREDENTIALS_PATH") {
            config.credentials_path = PathBuf::from(path);
        }
        if let Ok(log_level) = env::var("REFERRALDESK_LOG_LEVEL") {
            config.log_level = log_level;
        }
        if let Ok(log_format) = env::var("REFERRALDESK_LOG_FORMAT") {
            config.log_format = log_format.parse()?;
        }

        if let Some(base_url) = base_url_override {
            config.base_url = base_url;
        }

        config.base_url = normalize_base_url(config.base_url);
        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Default location of the credential file inside the platform config directory.
#[must_use]
pub fn default_credentials_path() -> PathBuf {
    ProjectDirs::from("in", "ReferralDesk", "referraldesk").map_or_else(
        || PathBuf::from(".").join(CREDENTIAL_KEY),
        |dirs| dirs.config_dir().join(CREDENTIAL_KEY),
    )
}

// `Url::join` drops the last segment unless the base ends with a slash.
fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("REFERRALDESK_BASE_URL");
            env::remove_var("REFERRALDESK_CREDENTIALS_PATH");
            env::remove_var("REFERRALDESK_LOG_LEVEL");
            env::remove_var("REFERRALDESK_LOG_FORMAT");
        }
    }

    #[test]
    #[serial]
    fn test_config_with_defaults() {
        cleanup_env_vars();
        let config = ClientConfig::with_defaults();

        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Compact);
        assert!(config.credentials_path.ends_with(CREDENTIAL_KEY));
    }

    #[test]
    #[serial]
    fn test_load_config_with_override() {
        cleanup_env_vars();
        let override_url = Url::parse("http://localhost:9000/api").unwrap();
        let config = ClientConfig::load_config(None, Some(override_url)).unwrap();

        assert_eq!(config.base_url.as_str(), "http://localhost:9000/api/");
        assert_eq!(
            config.base_url.join("profile").unwrap().as_str(),
            "http://localhost:9000/api/profile"
        );
    }

    #[test]
    #[serial]
    fn test_load_config_with_environment_variables() {
        cleanup_env_vars();
        unsafe {
            env::set_var("REFERRALDESK_BASE_URL", "http://10.0.0.5:8080/");
            env::set_var("REFERRALDESK_CREDENTIALS_PATH", "/tmp/referraldesk/token");
            env::set_var("REFERRALDESK_LOG_LEVEL", "debug");
            env::set_var("REFERRALDESK_LOG_FORMAT", "json");
        }

        let config = ClientConfig::load_config(None, None).unwrap();

        assert_eq!(config.base_url.as_str(), "http://10.0.0.5:8080/");
        assert_eq!(
            config.credentials_path,
            PathBuf::from("/tmp/referraldesk/token")
        );
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_override_beats_environment() {
        cleanup_env_vars();
        unsafe {
            env::set_var("REFERRALDESK_BASE_URL", "http://from-env/");
        }

        let override_url = Url::parse("http://from-flag/").unwrap();
        let config = ClientConfig::load_config(None, Some(override_url)).unwrap();
        assert_eq!(config.base_url.as_str(), "http://from-flag/");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_base_url_environment() {
        cleanup_env_vars();
        unsafe {
            env::set_var("REFERRALDESK_BASE_URL", "not a url");
        }

        let result = ClientConfig::load_config(None, None);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid REFERRALDESK_BASE_URL")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_load_config_from_yaml_file() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("client.yaml");
        fs::write(
            &config_file,
            r#"
base_url: "http://yaml.example/api/"
credentials_path: "/yaml/token"
log_level: "trace"
log_format: "json"
"#,
        )
        .unwrap();

        let config = ClientConfig::load_config(Some(config_file), None).unwrap();
        assert_eq!(config.base_url.as_str(), "http://yaml.example/api/");
        assert_eq!(config.credentials_path, PathBuf::from("/yaml/token"));
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    #[serial]
    fn test_load_config_from_toml_file() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("client.toml");
        fs::write(
            &config_file,
            r#"
base_url = "http://toml.example/"
credentials_path = "/toml/token"
log_level = "warn"
"#,
        )
        .unwrap();

        let config = ClientConfig::load_config(Some(config_file), None).unwrap();
        assert_eq!(config.base_url.as_str(), "http://toml.example/");
        assert_eq!(config.log_format, LogFormat::Compact);
    }

    #[test]
    #[serial]
    fn test_load_config_from_json_file() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("client.json");
        let written = ClientConfig {
            log_level: "error".into(),
            ..ClientConfig::with_defaults()
        };
        fs::write(&config_file, serde_json::to_string(&written).unwrap()).unwrap();

        let config = ClientConfig::load_config(Some(config_file), None).unwrap();
        assert_eq!(config, written);
    }

    #[test]
    #[serial]
    fn test_unsupported_extension() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("client.ini");
        fs::write(&config_file, "base_url=x").unwrap();

        let result = ClientConfig::load_config(Some(config_file), None);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat)));
    }

    #[test]
    #[serial]
    fn test_missing_file() {
        cleanup_env_vars();
        let result = ClientConfig::load_config(Some(PathBuf::from("/nope/client.yaml")), None);
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
