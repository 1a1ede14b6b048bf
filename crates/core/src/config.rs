//! Backend connection settings

use std::str::FromStr;
use std::time::Duration;

use crate::gateway::RetryPolicy;
use crate::{Error, Result};

/// Bucket that holds avatars, channel pictures and chat images
pub const DEFAULT_BUCKET: &str = "spooderimage";

/// Where the hosted backend lives and how calls to it are retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Project URL without a trailing slash
    pub url: String,
    /// Public (anon) API key
    pub anon_key: String,
    /// Object-storage bucket for uploads
    pub bucket: String,
    pub retry: RetryPolicy,
}

impl BackendConfig {
    /// Create a config with default bucket and retry policy
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            url: normalize_url(&url.into())?,
            anon_key: anon_key.into(),
            bucket: DEFAULT_BUCKET.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Set the upload bucket
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Read the config from `SPOODER_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the config through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} is not set", name)))
        };

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_or(&lookup, "SPOODER_MAX_RETRIES", defaults.max_attempts)?,
            attempt_timeout: Duration::from_secs(parse_or(
                &lookup,
                "SPOODER_TIMEOUT_SECS",
                defaults.attempt_timeout.as_secs(),
            )?),
            initial_backoff: Duration::from_millis(parse_or(
                &lookup,
                "SPOODER_BACKOFF_MS",
                duration_millis(defaults.initial_backoff),
            )?),
        };
        if retry.max_attempts == 0 {
            return Err(Error::Config("SPOODER_MAX_RETRIES must be at least 1".into()));
        }

        let config = Self::new(required("SPOODER_URL")?, required("SPOODER_ANON_KEY")?)?
            .with_retry(retry);
        Ok(match lookup("SPOODER_BUCKET") {
            Some(bucket) if !bucket.trim().is_empty() => config.with_bucket(bucket.trim()),
            _ => config,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {}", name, raw))),
        None => Ok(default),
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn normalize_url(raw: &str) -> Result<String> {
    let url = raw.trim().trim_end_matches('/');
    if url.is_empty() {
        return Err(Error::Config("Backend URL cannot be empty".into()));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(Error::Config(
            "Backend URL must start with http:// or https://".into(),
        ));
    }
    Ok(url.to_string())
}
