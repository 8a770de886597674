use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Env prefix for overrides, e.g. `MINIREQ_BASE_URL` or `MINIREQ_LOG__LEVEL`.
pub const ENV_PREFIX: &str = "MINIREQ_";

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_timeout_ms() -> u64 {
    30_000
}

/// Storage keys under which the session is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKeys {
    /// Key of the access token (defaults to `Authorization`).
    #[serde(default = "StorageKeys::default_access_token_key")]
    pub access_token_key: String,
    /// Key of the user-info blob (defaults to `Account_Info`).
    #[serde(default = "StorageKeys::default_account_info_key")]
    pub account_info_key: String,
}

impl StorageKeys {
    fn default_access_token_key() -> String {
        "Authorization".to_string()
    }
    fn default_account_info_key() -> String {
        "Account_Info".to_string()
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access_token_key: Self::default_access_token_key(),
            account_info_key: Self::default_account_info_key(),
        }
    }
}

/// Backend paths used by the session refresh routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Exchanges a login-provider code for a token (`POST`).
    #[serde(default = "Endpoints::default_login")]
    pub login: String,
    /// Returns the account blob for a token (`GET`).
    #[serde(default = "Endpoints::default_user_info")]
    pub user_info: String,
}

impl Endpoints {
    fn default_login() -> String {
        "/api/wx/login".to_string()
    }
    fn default_user_info() -> String {
        "/api/wx/getUserInfo".to_string()
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: Self::default_login(),
            user_info: Self::default_user_info(),
        }
    }
}

/// Logging output settings, consumed by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "LogConfig::default_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
    /// Append logs to this file instead of stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LogConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            file: None,
        }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Prefix for every relative request path.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Default per-request timeout in milliseconds (defaults to 30000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub storage: StorageKeys,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            storage: StorageKeys::default(),
            endpoints: Endpoints::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid or extraction fails.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Format as _, Serialized, Yaml},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::string(yaml))
            .extract()
    }

    /// Loads configuration from a file path, merged with defaults and
    /// `MINIREQ_`-prefixed environment variables (highest precedence).
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be read or parsed.
    #[allow(clippy::result_large_err)]
    pub fn from_file(path: &std::path::Path) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Env, Format as _, Serialized, Yaml},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    /// Defaults merged with environment overrides only.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if an environment value has the wrong type.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Env, Serialized},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve a request path against the base URL.
    ///
    /// Anything starting with `http` is taken as already absolute.
    #[must_use]
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http") {
            return url.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if url.is_empty() || url.starts_with('/') {
            format!("{base}{url}")
        } else {
            format!("{base}/{url}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = r#"
base_url: "https://api.example.com"
timeout_ms: 5000
storage:
  access_token_key: "token"
endpoints:
  login: "/auth/login"
log:
  level: "debug"
  json: true
"#;

    #[test]
    fn test_default_config() {
        let c = Config::default();
        assert_eq!(c.base_url, "http://127.0.0.1:8000");
        assert_eq!(c.timeout(), Duration::from_secs(30));
        assert_eq!(c.storage.access_token_key, "Authorization");
        assert_eq!(c.storage.account_info_key, "Account_Info");
        assert_eq!(c.endpoints.login, "/api/wx/login");
        assert_eq!(c.endpoints.user_info, "/api/wx/getUserInfo");
        assert_eq!(c.log.level, "info");
    }

    #[test]
    fn test_from_yaml_overrides() {
        let c = Config::from_yaml(SAMPLE_YAML).unwrap();
        assert_eq!(c.base_url, "https://api.example.com");
        assert_eq!(c.timeout_ms, 5000);
        assert_eq!(c.storage.access_token_key, "token");
        assert_eq!(c.endpoints.login, "/auth/login");
        assert!(c.log.json);
    }

    #[test]
    fn test_from_yaml_nested_defaults_applied() {
        let c = Config::from_yaml(SAMPLE_YAML).unwrap();
        assert_eq!(c.storage.account_info_key, "Account_Info");
        assert_eq!(c.endpoints.user_info, "/api/wx/getUserInfo");
    }

    #[test]
    fn test_from_yaml_invalid_type() {
        assert!(Config::from_yaml("timeout_ms: soon").is_err());
    }

    #[test]
    fn test_from_file_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "minireq.yaml",
                "base_url: \"http://file.local\"\nendpoints:\n  user_info: \"/from/file\"\n",
            )?;
            jail.set_env("MINIREQ_ENDPOINTS__USER_INFO", "/from/env");
            jail.set_env("MINIREQ_LOG__LEVEL", "trace");
            let c = Config::from_file(std::path::Path::new("minireq.yaml"))?;
            assert_eq!(c.base_url, "http://file.local");
            assert_eq!(c.endpoints.user_info, "/from/env");
            assert_eq!(c.log.level, "trace");
            Ok(())
        });
    }

    #[test]
    fn test_resolve_relative() {
        let c = Config::default();
        assert_eq!(
            c.resolve_url("/api/task/list"),
            "http://127.0.0.1:8000/api/task/list"
        );
    }

    #[test]
    fn test_resolve_absolute_passthrough() {
        let c = Config::default();
        assert_eq!(
            c.resolve_url("https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn test_resolve_joins_single_slash() {
        let c = Config {
            base_url: "http://host/".into(),
            ..Config::default()
        };
        assert_eq!(c.resolve_url("/x"), "http://host/x");
        assert_eq!(c.resolve_url("x"), "http://host/x");
    }
}
