//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `cache_version` or `shell_assets` is empty.
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `worker_url` is not an absolute http(s) URL
    /// - any `precache_urls` entry is not an absolute http(s) URL
    /// - any `shell_assets` entry is empty, absolute, or carries a scheme
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_version".into(),
                hint: "Set SHARECACHE_CACHE_VERSION to a generation name such as share-tracker-v2".into(),
            });
        }

        let worker_url = Url::parse(&self.worker_url).map_err(|e| invalid("worker_url", e.to_string()))?;
        if !matches!(worker_url.scheme(), "http" | "https") {
            return Err(invalid("worker_url", format!("unsupported scheme: {}", worker_url.scheme())));
        }

        for entry in &self.precache_urls {
            let url = Url::parse(entry).map_err(|e| invalid("precache_urls", format!("{entry}: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(invalid("precache_urls", format!("{entry}: unsupported scheme")));
            }
        }

        if self.shell_assets.is_empty() {
            return Err(ConfigError::Missing {
                field: "shell_assets".into(),
                hint: "List the document, script and style paths relative to the worker".into(),
            });
        }
        for asset in &self.shell_assets {
            if asset.trim().is_empty() {
                return Err(invalid("shell_assets", "entries must not be empty"));
            }
            if asset.starts_with('/') || asset.contains("://") {
                return Err(invalid("shell_assets", format!("{asset}: must be relative to the worker scope")));
            }
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.precache_urls.is_empty() {
            tracing::warn!(
                cache_version = %self.cache_version,
                "precache_urls is empty; vendor assets will only be cached on first use"
            );
        }

        Ok(())
    }
}
