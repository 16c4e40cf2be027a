use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::directory::DEFAULT_DIRECTORY_URL;

/// Upper bound for every configured duration.
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 3600);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    // Instances
    pub directory_url: String,
    pub default_instance: Option<String>,
    pub api_version: String,

    // TTLs
    pub blacklist_cooldown: Duration,
    pub video_ttl: Duration, // When stream URLs carry no `expire`
    pub search_ttl: Duration,

    // Failover
    pub rotation_backoff: Duration,
    pub max_attempts: usize, // 0 = unbounded

    // HTTP
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl RelayConfig {
    /// Loads `.env` (if present) and then the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source. Unset or
    /// blank variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let duration = |key: &str, default: Duration| -> Result<Duration> {
            match var(key) {
                Some(value) => humantime::parse_duration(value.trim())
                    .with_context(|| format!("{key} is not a valid duration: {value:?}")),
                None => Ok(default),
            }
        };

        let config = Self {
            directory_url: var("RABBITPIPE_DIRECTORY_URL").unwrap_or(defaults.directory_url),
            default_instance: var("RABBITPIPE_INSTANCE"),
            api_version: var("RABBITPIPE_API_VERSION").unwrap_or(defaults.api_version),

            blacklist_cooldown: duration(
                "RABBITPIPE_BLACKLIST_COOLDOWN",
                defaults.blacklist_cooldown,
            )?,
            video_ttl: duration("RABBITPIPE_VIDEO_TTL", defaults.video_ttl)?,
            search_ttl: duration("RABBITPIPE_SEARCH_TTL", defaults.search_ttl)?,

            rotation_backoff: duration("RABBITPIPE_ROTATION_BACKOFF", defaults.rotation_backoff)?,
            max_attempts: match var("RABBITPIPE_MAX_ATTEMPTS") {
                Some(value) => value
                    .trim()
                    .parse()
                    .with_context(|| format!("RABBITPIPE_MAX_ATTEMPTS is not a number: {value:?}"))?,
                None => defaults.max_attempts,
            },

            request_timeout: duration("RABBITPIPE_REQUEST_TIMEOUT", defaults.request_timeout)?,
            user_agent: var("RABBITPIPE_USER_AGENT").unwrap_or(defaults.user_agent),
        };

        config.validate()?;

        Ok(config)
    }

    /// Sanity checks on values that would make the client misbehave.
    ///
    /// - every TTL and the request timeout must be non-zero
    /// - no duration may exceed [`MAX_DURATION`]
    /// - the API version must not be empty
    /// - the directory URL must parse
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.directory_url)
            .with_context(|| format!("invalid directory URL: {}", self.directory_url))?;

        if self.api_version.trim().is_empty() {
            anyhow::bail!("API version must not be empty");
        }

        if self.blacklist_cooldown.is_zero() {
            anyhow::bail!("Blacklist cooldown must be greater than 0");
        }

        if self.video_ttl.is_zero() || self.search_ttl.is_zero() {
            anyhow::bail!("Cache TTLs must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("Request timeout must be greater than 0");
        }

        let durations = [
            ("blacklist cooldown", self.blacklist_cooldown),
            ("video TTL", self.video_ttl),
            ("search TTL", self.search_ttl),
            ("rotation backoff", self.rotation_backoff),
            ("request timeout", self.request_timeout),
        ];
        for (name, value) in durations {
            if value > MAX_DURATION {
                anyhow::bail!(
                    "{} cannot exceed {}, got: {}",
                    name,
                    humantime::format_duration(MAX_DURATION),
                    humantime::format_duration(value)
                );
            }
        }

        Ok(())
    }

    /// One-paragraph description for logs.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Directory: {} (API {})\n  \
            Default instance: {}\n  \
            TTLs: videos {}, search {}, blacklist {}\n  \
            Failover: backoff {}, max attempts {}\n  \
            HTTP: timeout {}",
            self.directory_url,
            self.api_version,
            self.default_instance.as_deref().unwrap_or("none"),
            humantime::format_duration(self.video_ttl),
            humantime::format_duration(self.search_ttl),
            humantime::format_duration(self.blacklist_cooldown),
            humantime::format_duration(self.rotation_backoff),
            if self.max_attempts == 0 {
                "unbounded".to_string()
            } else {
                self.max_attempts.to_string()
            },
            humantime::format_duration(self.request_timeout),
        )
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            default_instance: None,
            api_version: "v1".to_string(),

            blacklist_cooldown: Duration::from_secs(3600), // 1 hour
            video_ttl: Duration::from_secs(5 * 3600),
            search_ttl: Duration::from_secs(3 * 3600),

            rotation_backoff: Duration::from_secs(10),
            max_attempts: 10,

            request_timeout: Duration::from_secs(15),
            user_agent: concat!("rabbitpipe/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
