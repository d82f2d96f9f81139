//! Centralized configuration management.
//!
//! All environment variables are loaded and validated at startup through this module.
//! Nothing else reads the environment, so a bad value fails the process before it binds.

use std::{str::FromStr, time::Duration};
use thiserror::Error;
use tracklift::{MatchPolicy, MigrationConfig, SearchFailurePolicy};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required {0} env var")]
    Missing(&'static str),

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Spotify application client id (required)
    pub client_id: String,
    /// Spotify application client secret (required)
    pub client_secret: String,
    /// Redirect URI registered with Spotify, pointing at `/callback` (required)
    pub redirect_uri: String,
    /// Apple Music developer token; Apple Music sources are refused without it
    pub apple_music_token: Option<String>,
    /// Apple Music storefront (default: "us")
    pub apple_music_storefront: String,
    /// Market used for Spotify searches (default: "US")
    pub spotify_market: String,
    pub spotify_api_base: String,
    pub spotify_accounts_base: String,
    pub apple_music_api_base: String,
    /// Per-call timeout for every upstream request (default: 15s)
    pub request_timeout: Duration,
    pub migration: MigrationConfig,
    /// HTTP server bind address (default: "0.0.0.0")
    pub ip: String,
    /// HTTP server port (default: 3000)
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));
        let or = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        let migration = MigrationConfig {
            max_batch_size: parse(&var, "BATCH_SIZE", tracklift::DEFAULT_MAX_BATCH_SIZE)?,
            resolve_concurrency: parse(&var, "RESOLVE_CONCURRENCY", 1)?,
            match_policy: parse(&var, "MATCH_POLICY", MatchPolicy::First)?,
            search_failure_policy: parse(&var, "SEARCH_FAILURE_POLICY", SearchFailurePolicy::Abort)?,
        };
        migration.validate().map_err(|e| ConfigError::Invalid {
            name: "migration settings",
            reason: e.to_string(),
        })?;

        let timeout_secs: u64 = parse(&var, "REQUEST_TIMEOUT_SECS", 15)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "REQUEST_TIMEOUT_SECS",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET")?,
            redirect_uri: required("REDIRECT_URI")?,
            apple_music_token: var("APPLE_MUSIC_TOKEN"),
            apple_music_storefront: or("APPLE_MUSIC_STOREFRONT", "us"),
            spotify_market: or("SPOTIFY_MARKET", "US"),
            spotify_api_base: or("SPOTIFY_API_BASE", tracklift::spotify::client::DEFAULT_API_BASE),
            spotify_accounts_base: or(
                "SPOTIFY_ACCOUNTS_BASE",
                tracklift::spotify::auth::DEFAULT_ACCOUNTS_BASE,
            ),
            apple_music_api_base: or(
                "APPLE_MUSIC_API_BASE",
                tracklift::apple_music::client::DEFAULT_API_BASE,
            ),
            request_timeout: Duration::from_secs(timeout_secs),
            migration,
            ip: or("IP", "0.0.0.0"),
            port: parse(&var, "PORT", 3000)?,
        })
    }

    /// Address the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

fn parse<T>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: format!("'{raw}': {e}"),
        }),
        None => Ok(default),
    }
}
