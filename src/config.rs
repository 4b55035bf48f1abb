use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::auth::Token;
use crate::error::{Result, SentryLensError};

/// Request ceiling for one endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: u32,
    pub window: Duration,
}

impl RateLimit {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub base_url: String,
    pub org: String,
    pub project: String,
    pub token: Token,
}

#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub endpoint: String,
    pub api_key: Option<Token>,
    pub model: String,
}

/// Everything a run needs, handed to each component's constructor.
#[derive(Debug, Clone)]
pub struct Config {
    pub sentry: SentryConfig,
    pub translation: TranslationConfig,
    pub cache_path: PathBuf,
    pub cache_ttl: chrono::Duration,
    pub summary_limit: RateLimit,
    pub translation_limit: RateLimit,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub batch_pause: Duration,
    pub priority_capacity: u64,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.sentry.org.trim().is_empty() {
            return Err(SentryLensError::Config(
                "organization slug must not be empty".to_string(),
            ));
        }
        if self.sentry.project.trim().is_empty() {
            return Err(SentryLensError::Config(
                "project id must not be empty".to_string(),
            ));
        }
        Url::parse(&self.sentry.base_url)
            .map_err(|e| SentryLensError::Config(format!("Invalid Sentry URL: {e}")))?;
        Url::parse(&self.translation.endpoint)
            .map_err(|e| SentryLensError::Config(format!("Invalid translation URL: {e}")))?;

        if self.cache_ttl <= chrono::Duration::zero() {
            return Err(SentryLensError::Config(format!(
                "cache TTL must be positive, got {} days",
                self.cache_ttl.num_days()
            )));
        }

        for (name, limit) in [
            ("summary", self.summary_limit),
            ("translation", self.translation_limit),
        ] {
            if limit.limit == 0 || limit.window.is_zero() {
                return Err(SentryLensError::Config(format!(
                    "{name} rate limit needs a non-zero limit and window"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config(base_url: &str) -> Config {
    Config {
        sentry: SentryConfig {
            base_url: base_url.to_string(),
            org: "acme".to_string(),
            project: "1283350".to_string(),
            token: Token::from("test-token"),
        },
        translation: TranslationConfig {
            endpoint: format!("{base_url}/v1/completions"),
            api_key: Some(Token::from("together-key")),
            model: "test-model".to_string(),
        },
        cache_path: PathBuf::from("summary_cache.json"),
        cache_ttl: chrono::Duration::days(7),
        summary_limit: RateLimit::new(100, Duration::from_millis(50)),
        translation_limit: RateLimit::new(100, Duration::from_millis(50)),
        max_retries: 3,
        retry_base_delay: Duration::from_millis(1),
        batch_pause: Duration::ZERO,
        priority_capacity: 100,
    }
}
