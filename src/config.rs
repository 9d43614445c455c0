//! Configuration management for the AdWords report utilities.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/// API versions this crate knows how to talk to, oldest first.
pub const SUPPORTED_VERSIONS: &[&str] = &["v201802", "v201806", "v201809"];

/// OAuth2 token endpoint.
const DEFAULT_TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";

/// Base URL of the AdWords API.
const DEFAULT_API_BASE_URL: &str = "https://adwords.google.com";

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// AdWords developer token
    pub developer_token: String,

    /// OAuth2 client ID
    pub client_id: String,

    /// OAuth2 client secret
    pub client_secret: String,

    /// Long-lived OAuth2 refresh token
    pub refresh_token: String,

    /// Default client customer id (e.g. "123-456-7890")
    pub client_customer_id: Option<String>,

    /// API version; the newest supported version when absent
    pub service_version: Option<String>,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Override for the API host (used by tests and proxies)
    pub api_base_url: Option<String>,

    /// Override for the OAuth2 token endpoint
    pub token_url: Option<String>,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,

    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: u32,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Buffer before token expiration to refresh (seconds)
    #[serde(default = "default_token_buffer")]
    pub token_refresh_buffer_seconds: u64,
}

fn default_user_agent() -> String {
    concat!("adwords-reports/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    3
}

fn default_retry_backoff() -> u32 {
    2
}

fn default_timeout() -> u64 {
    30
}

fn default_token_buffer() -> u64 {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("developer_token", &self.developer_token),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", &self.refresh_token),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(name.into()));
            }
        }

        if let Some(ref version) = self.service_version {
            if !SUPPORTED_VERSIONS.contains(&version.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Invalid service_version '{}'. Supported versions: {:?}",
                    version, SUPPORTED_VERSIONS
                )));
            }
        }

        if self.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "max_retries must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// The configured API version, or the newest supported one.
    pub fn service_version(&self) -> &str {
        self.service_version
            .as_deref()
            .unwrap_or(latest_version())
    }

    /// Get the OAuth2 token URL.
    pub fn token_url(&self) -> &str {
        self.token_url.as_deref().unwrap_or(DEFAULT_TOKEN_URL)
    }

    /// Get the API base URL.
    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    /// Get the report download URL for an API version.
    pub fn report_download_url(&self, version: &str) -> String {
        format!(
            "{}/api/adwords/reportdownload/{}",
            self.api_base_url().trim_end_matches('/'),
            version
        )
    }

    /// Retry policy described by the retry fields.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            std::time::Duration::from_secs(self.retry_delay_seconds),
            self.retry_backoff,
        )
    }

    /// Get timeout as Duration.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }

    /// Get token refresh buffer as chrono Duration.
    pub fn token_buffer(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_refresh_buffer_seconds as i64)
    }
}

/// Newest entry of [`SUPPORTED_VERSIONS`].
pub fn latest_version() -> &'static str {
    SUPPORTED_VERSIONS[SUPPORTED_VERSIONS.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_config() -> Config {
        Config {
            developer_token: "dev-token".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
            client_customer_id: Some("123-456-7890".to_string()),
            service_version: None,
            user_agent: default_user_agent(),
            api_base_url: None,
            token_url: None,
            max_retries: 3,
            retry_delay_seconds: 3,
            retry_backoff: 2,
            timeout_seconds: 30,
            token_refresh_buffer_seconds: 5,
        }
    }

    #[test]
    fn test_url_construction() {
        let config = sample_config();

        assert_eq!(config.token_url(), "https://accounts.google.com/o/oauth2/token");
        assert_eq!(
            config.report_download_url("v201809"),
            "https://adwords.google.com/api/adwords/reportdownload/v201809"
        );

        let config = Config {
            api_base_url: Some("http://localhost:8080/".to_string()),
            ..sample_config()
        };
        assert_eq!(
            config.report_download_url("v201806"),
            "http://localhost:8080/api/adwords/reportdownload/v201806"
        );
    }

    #[test]
    fn test_service_version_defaults_to_latest() {
        let config = sample_config();
        assert_eq!(config.service_version(), "v201809");

        let config = Config {
            service_version: Some("v201802".to_string()),
            ..sample_config()
        };
        assert_eq!(config.service_version(), "v201802");
    }

    #[test]
    fn test_validate_rejects_unknown_version() {
        let config = Config {
            service_version: Some("v2099".to_string()),
            ..sample_config()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_validate_rejects_empty_credentials() {
        let config = Config {
            refresh_token: "  ".to_string(),
            ..sample_config()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: refresh_token");
    }

    #[test]
    fn test_load_applies_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "developer_token": "dev",
                "client_id": "id",
                "client_secret": "secret",
                "refresh_token": "refresh"
            }}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.client_customer_id, None);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay_seconds, 3);
        assert_eq!(config.retry_backoff, 2);
        assert_eq!(config.timeout(), std::time::Duration::from_secs(30));
        assert_eq!(config.token_buffer(), chrono::Duration::seconds(5));
        assert!(config.user_agent.starts_with("adwords-reports/"));

        let policy = config.retry_policy();
        assert_eq!(policy.max_retries(), 3);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = Config::load("/nonexistent/adwords.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
