//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHARECACHE_*)
//! 2. TOML config file (if SHARECACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHARECACHE_*)
/// 2. TOML config file (if SHARECACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the current cache generation.
    ///
    /// Bumping this value is what rotates the cache on the next deployment.
    /// Set via SHARECACHE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Absolute vendor URLs fetched into the generation at install time, in order.
    ///
    /// Set via SHARECACHE_PRECACHE_URLS environment variable (`[url, url]`).
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// URL the worker script is registered from. The scope is its directory.
    ///
    /// Set via SHARECACHE_WORKER_URL environment variable.
    #[serde(default = "default_worker_url")]
    pub worker_url: String,

    /// The application's own document, script and style, relative to the scope.
    ///
    /// Set via SHARECACHE_SHELL_ASSETS environment variable (`[path, path]`).
    #[serde(default = "default_shell_assets")]
    pub shell_assets: Vec<String>,

    /// Whether a freshly installed version activates without waiting.
    ///
    /// Set via SHARECACHE_SKIP_WAITING_ON_INSTALL environment variable.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,

    /// Path to SQLite cache database, or `:memory:`.
    ///
    /// Set via SHARECACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHARECACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via SHARECACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHARECACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_cache_version() -> String {
    "share-tracker-v1".into()
}

fn default_precache_urls() -> Vec<String> {
    [
        "https://fonts.googleapis.com/css2?family=Inter:wght@400;600;700&display=swap",
        "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css",
        "https://www.gstatic.com/firebasejs/10.7.1/firebase-app-compat.js",
        "https://www.gstatic.com/firebasejs/10.7.1/firebase-auth-compat.js",
        "https://www.gstatic.com/firebasejs/10.7.1/firebase-firestore-compat.js",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_worker_url() -> String {
    "http://localhost:8080/service-worker.js".into()
}

fn default_shell_assets() -> Vec<String> {
    vec!["index.html".into(), "script.js".into(), "style.css".into()]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./sharecache.sqlite")
}

fn default_user_agent() -> String {
    "sharecache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            precache_urls: default_precache_urls(),
            worker_url: default_worker_url(),
            shell_assets: default_shell_assets(),
            skip_waiting_on_install: true,
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whether the store should live in memory instead of on disk.
    pub fn in_memory(&self) -> bool {
        self.db_path.as_os_str() == ":memory:"
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHARECACHE_`
    /// 2. TOML file from `SHARECACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHARECACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHARECACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
