//! Configuration module
//!
//! Client configuration loaded from the environment (and `.env` via dotenvy):
//! API location and auth, file ceiling, record schema, heartbeat timing and
//! the local state directory.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Common constants
const API_URL: &str = "http://localhost:8000";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const MAX_FILE_SIZE_MB: u64 = 50;
const DEFAULT_ETID: u32 = 100001;
const PROGRESS_TICK_MS: u64 = 200;
const PROGRESS_STEP: u8 = 10;
const STATE_DIR: &str = ".docseal";
const SUPPORT_EMAIL: &str = "support@docseal.local";

/// How the API key is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer {key}`
    Bearer,
    /// `X-API-Key: {key}`
    ApiKey,
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub auth_scheme: AuthScheme,
    pub request_timeout_secs: u64,
    pub max_file_size_bytes: u64,
    pub default_etid: u32,
    pub progress_tick_ms: u64,
    pub progress_step: u8,
    pub state_dir: PathBuf,
    pub support_email: String,
    pub environment: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: API_URL.to_string(),
            api_key: None,
            auth_scheme: AuthScheme::Bearer,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            default_etid: DEFAULT_ETID,
            progress_tick_ms: PROGRESS_TICK_MS,
            progress_step: PROGRESS_STEP,
            state_dir: PathBuf::from(STATE_DIR),
            support_email: SUPPORT_EMAIL.to_string(),
            environment: "development".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("DOCSEAL_API_URL")
            .or_else(|| lookup("API_URL"))
            .unwrap_or_else(|| API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let auth_scheme = match lookup("DOCSEAL_AUTH_SCHEME")
            .unwrap_or_else(|| "bearer".to_string())
            .to_lowercase()
            .as_str()
        {
            "bearer" => AuthScheme::Bearer,
            "api-key" | "api_key" | "x-api-key" => AuthScheme::ApiKey,
            other => {
                return Err(anyhow::anyhow!(
                    "DOCSEAL_AUTH_SCHEME must be 'bearer' or 'api-key', got '{}'",
                    other
                ))
            }
        };

        let max_file_size_mb = lookup("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|| MAX_FILE_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_FILE_SIZE_MB);
        let max_file_size_bytes = max_file_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| {
                anyhow::anyhow!("MAX_FILE_SIZE_MB is too large: {}", max_file_size_mb)
            })?;

        Ok(Self {
            api_url,
            api_key: lookup("DOCSEAL_API_KEY").filter(|k| !k.trim().is_empty()),
            auth_scheme,
            request_timeout_secs: lookup("DOCSEAL_API_TIMEOUT_SECS")
                .unwrap_or_else(|| REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REQUEST_TIMEOUT_SECS),
            max_file_size_bytes,
            default_etid: lookup("DOCSEAL_ETID")
                .unwrap_or_else(|| DEFAULT_ETID.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DOCSEAL_ETID must be a valid number"))?,
            progress_tick_ms: lookup("DOCSEAL_PROGRESS_TICK_MS")
                .unwrap_or_else(|| PROGRESS_TICK_MS.to_string())
                .parse()
                .unwrap_or(PROGRESS_TICK_MS),
            progress_step: lookup("DOCSEAL_PROGRESS_STEP")
                .unwrap_or_else(|| PROGRESS_STEP.to_string())
                .parse()
                .unwrap_or(PROGRESS_STEP),
            state_dir: lookup("DOCSEAL_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(STATE_DIR)),
            support_email: lookup("DOCSEAL_SUPPORT_EMAIL")
                .unwrap_or_else(|| SUPPORT_EMAIL.to_string()),
            environment: lookup("ENVIRONMENT")
                .or_else(|| lookup("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
        })
    }

    /// Check if the client is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.api_url.is_empty() {
            return Err(anyhow::anyhow!("DOCSEAL_API_URL cannot be empty"));
        }
        let Some((scheme, rest)) = self.api_url.split_once("://") else {
            return Err(anyhow::anyhow!(
                "DOCSEAL_API_URL must include a scheme: {}",
                self.api_url
            ));
        };
        if scheme != "http" && scheme != "https" {
            return Err(anyhow::anyhow!(
                "DOCSEAL_API_URL must use http or https, got '{}'",
                scheme
            ));
        }
        let host = rest.split(['/', ':']).next().unwrap_or_default();
        let is_local = matches!(host, "localhost" | "127.0.0.1");
        if self.is_production() && scheme == "http" && !is_local {
            return Err(anyhow::anyhow!(
                "DOCSEAL_API_URL must use https in production"
            ));
        }
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than zero"));
        }
        if self.progress_tick_ms == 0 || self.progress_step == 0 {
            return Err(anyhow::anyhow!(
                "DOCSEAL_PROGRESS_TICK_MS and DOCSEAL_PROGRESS_STEP must be greater than zero"
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ClientConfig, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.max_file_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.default_etid, 100001);
        assert_eq!(config.auth_scheme, AuthScheme::Bearer);
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("API_URL", "https://seal.example.com/"),
            ("DOCSEAL_API_KEY", "k-123"),
            ("DOCSEAL_AUTH_SCHEME", "api-key"),
            ("MAX_FILE_SIZE_MB", "5"),
            ("DOCSEAL_ETID", "7"),
            ("DOCSEAL_PROGRESS_TICK_MS", "not-a-number"),
        ])
        .unwrap();
        assert_eq!(config.api_url, "https://seal.example.com");
        assert_eq!(config.api_key.as_deref(), Some("k-123"));
        assert_eq!(config.auth_scheme, AuthScheme::ApiKey);
        assert_eq!(config.max_file_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.default_etid, 7);
        assert_eq!(config.progress_tick_ms, 200);
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("DOCSEAL_AUTH_SCHEME", "basic")]).is_err());
        assert!(config_from(&[("DOCSEAL_ETID", "loan")]).is_err());

        let config = config_from(&[("DOCSEAL_API_URL", "ftp://example.com")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("DOCSEAL_API_URL", "localhost:8000")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("MAX_FILE_SIZE_MB", "0")]).unwrap();
        assert!(config.validate().is_err());

        let huge = u64::MAX.to_string();
        let err = config_from(&[("MAX_FILE_SIZE_MB", huge.as_str())]).unwrap_err();
        assert!(err.to_string().contains("MAX_FILE_SIZE_MB"));
    }

    #[test]
    fn test_production_requires_https_for_remote_hosts() {
        let config = config_from(&[
            ("ENVIRONMENT", "production"),
            ("DOCSEAL_API_URL", "http://seal.example.com"),
        ])
        .unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("ENVIRONMENT", "prod")]).unwrap();
        assert!(config.is_production());
        assert!(config.validate().is_ok());
    }
}
