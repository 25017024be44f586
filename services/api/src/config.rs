//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use issuezz_core::{CacheSettings, ContextWindow, IssueFetchPolicy};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub suggest_model: String,
    pub review_model: String,
    pub followup_model: String,
    pub github_api_url: String,
    pub github_token: Option<String>,
    /// The only host file downloads are allowed from.
    pub github_raw_url: String,
    /// When set, AI calls go to this remote gateway instead of the in-process assistant.
    pub ai_gateway_url: Option<String>,
    pub issue_fetch_policy: IssueFetchPolicy,
    pub context_window: ContextWindow,
    pub cache: CacheSettings,
    /// Sessions idle this long are dropped; zero keeps them until deleted.
    pub session_idle_ttl: Duration,
    pub http_timeout: Duration,
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8000)),
            log_level: Level::INFO,
            openai_api_key: None,
            openai_base_url: None,
            suggest_model: DEFAULT_MODEL.to_string(),
            review_model: DEFAULT_MODEL.to_string(),
            followup_model: DEFAULT_MODEL.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            github_token: None,
            github_raw_url: DEFAULT_GITHUB_RAW_URL.to_string(),
            ai_gateway_url: None,
            issue_fetch_policy: IssueFetchPolicy::default(),
            context_window: ContextWindow::default(),
            cache: CacheSettings::default(),
            session_idle_ttl: Duration::from_secs(3600),
            http_timeout: Duration::from_secs(30),
            cors_origins: split_origins(DEFAULT_CORS_ORIGINS),
        }
    }
}

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_GITHUB_RAW_URL: &str = "https://raw.githubusercontent.com";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:3001";

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads an optional variable, treating an empty value as unset.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Either a completion key or a remote gateway must be configured.
fn require_ai_provider(
    openai_api_key: Option<&str>,
    ai_gateway_url: Option<&str>,
) -> Result<(), ConfigError> {
    if openai_api_key.is_none() && ai_gateway_url.is_none() {
        return Err(ConfigError::MissingVar("OPENAI_API_KEY".to_string()));
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}

fn parse_secs(name: &str, default: u64) -> Result<Duration, ConfigError> {
    parse_number(name, default).map(Duration::from_secs)
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load AI Settings ---
        let ai_gateway_url = optional_var("AI_GATEWAY_URL");
        let openai_api_key = optional_var("OPENAI_API_KEY");
        require_ai_provider(openai_api_key.as_deref(), ai_gateway_url.as_deref())?;
        let openai_base_url = optional_var("OPENAI_BASE_URL");
        let suggest_model =
            optional_var("SUGGEST_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let review_model =
            optional_var("REVIEW_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let followup_model =
            optional_var("FOLLOWUP_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        // --- Load GitHub Settings ---
        let github_api_url = optional_var("GITHUB_API_URL")
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let github_token = optional_var("GITHUB_TOKEN");
        let github_raw_url = optional_var("GITHUB_RAW_URL")
            .unwrap_or_else(|| DEFAULT_GITHUB_RAW_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        // --- Load Flow Policies ---
        let issue_fetch_policy = match optional_var("ISSUE_FETCH_POLICY") {
            Some(raw) => raw.parse::<IssueFetchPolicy>().map_err(|e| {
                ConfigError::InvalidValue("ISSUE_FETCH_POLICY".to_string(), e.to_string())
            })?,
            None => IssueFetchPolicy::default(),
        };
        let context_window = match optional_var("CONTEXT_WINDOW") {
            Some(raw) => raw.parse::<ContextWindow>().map_err(|e| {
                ConfigError::InvalidValue("CONTEXT_WINDOW".to_string(), e.to_string())
            })?,
            None => ContextWindow::default(),
        };

        let cache = CacheSettings {
            ttl: parse_secs("CACHE_TTL_SECS", 3600)?,
            capacity: parse_number("CACHE_CAPACITY", issuezz_core::cache::DEFAULT_CACHE_CAPACITY)?,
        };
        let session_idle_ttl = parse_secs("SESSION_IDLE_SECS", 3600)?;
        let http_timeout = parse_secs("HTTP_TIMEOUT_SECS", 30)?;
        let cors_origins = split_origins(
            &optional_var("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
        );

        Ok(Self {
            bind_address,
            log_level,
            openai_api_key,
            openai_base_url,
            suggest_model,
            review_model,
            followup_model,
            github_api_url,
            github_token,
            github_raw_url,
            ai_gateway_url,
            issue_fetch_policy,
            context_window,
            cache,
            session_idle_ttl,
            http_timeout,
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_cors_origins() {
        assert_eq!(
            split_origins(" http://a.test , ,http://b.test"),
            vec!["http://a.test", "http://b.test"]
        );
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.bind_address.port(), 8000);
        assert_eq!(config.suggest_model, "gpt-4o-mini");
        assert_eq!(config.cache.ttl, Duration::from_secs(3600));
        assert_eq!(config.cache.capacity, 256);
        assert_eq!(config.session_idle_ttl, Duration::from_secs(3600));
        assert_eq!(config.github_raw_url, "https://raw.githubusercontent.com");
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.context_window, ContextWindow::Full);
    }

    #[test]
    fn an_ai_provider_is_required() {
        assert!(matches!(
            require_ai_provider(None, None),
            Err(ConfigError::MissingVar(name)) if name == "OPENAI_API_KEY"
        ));
        assert!(require_ai_provider(Some("sk-test"), None).is_ok());
        assert!(require_ai_provider(None, Some("http://gateway")).is_ok());
    }
}
