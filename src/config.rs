//! Session manager configuration loaded from environment variables.
//!
//! Everything except the provider base URL has a sensible default, so a host
//! can run against a local identity provider with a single variable set.

use std::env;

/// Configuration for the session manager, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity provider base URL (scheme + host, no trailing slash)
    pub api_base_url: String,
    /// Per-request timeout for provider calls, in seconds
    pub request_timeout_secs: u64,
    /// Whether durable cookie records carry the `Secure` attribute
    pub cookie_secure: bool,
    /// Optional `Domain` attribute for durable cookie records
    pub cookie_domain: Option<String>,
    /// Grace period when evaluating access-token expiry, in seconds.
    /// Zero means a token is expired the instant its `exp` claim passes.
    pub clock_skew_secs: i64,
    /// Lifetime of the refresh-token record when "remember me" is set, in days
    pub remember_me_days: i64,
    /// Sign-in entry point guards redirect unauthenticated visitors to
    pub login_path: String,
    /// Default landing point guards redirect authenticated visitors to
    pub home_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Reads a `.env` file first if one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            api_base_url: env::var("SK_API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("SK_API_BASE_URL"))?,
            request_timeout_secs: env::var("SK_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            cookie_secure: env::var("SK_COOKIE_SECURE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            cookie_domain: env::var("SK_COOKIE_DOMAIN").ok().filter(|v| !v.is_empty()),
            clock_skew_secs: env::var("SK_CLOCK_SKEW_SECS")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .unwrap_or(0),
            remember_me_days: env::var("SK_REMEMBER_ME_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            login_path: env::var("SK_LOGIN_PATH").unwrap_or_else(|_| "/login".to_string()),
            home_path: env::var("SK_HOME_PATH").unwrap_or_else(|_| "/dashboard".to_string()),
        })
    }

    /// Default config for tests: local provider, relaxed cookies, no skew.
    pub fn test_default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 5,
            cookie_secure: false,
            cookie_domain: None,
            clock_skew_secs: 0,
            remember_me_days: 30,
            login_path: "/login".to_string(),
            home_path: "/dashboard".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
