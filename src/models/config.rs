//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and scheduling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Identifier discovery rules
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::config("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::config("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent_jobs == 0 {
            return Err(AppError::config("crawler.max_concurrent_jobs must be > 0"));
        }
        if self.crawler.max_concurrent_sites == 0 {
            return Err(AppError::config("crawler.max_concurrent_sites must be > 0"));
        }
        if let Some(proxy) = &self.crawler.proxy {
            url::Url::parse(proxy)
                .map_err(|e| AppError::config(format!("crawler.proxy '{proxy}': {e}")))?;
        }
        if self.discovery.max_identifiers == Some(0) {
            return Err(AppError::config(
                "discovery.max_identifiers must be > 0 when set",
            ));
        }
        if self
            .discovery
            .soft_block_markers
            .iter()
            .any(|m| m.trim().is_empty())
        {
            return Err(AppError::config(
                "discovery.soft_block_markers contains an empty marker",
            ));
        }
        Ok(())
    }
}

/// HTTP client and scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum targets crawled at once
    #[serde(default = "defaults::max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Maximum sites fetched at once for one identifier
    #[serde(default = "defaults::max_concurrent_sites")]
    pub max_concurrent_sites: usize,

    /// Optional proxy URL (http, https or socks5)
    #[serde(default)]
    pub proxy: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent_jobs: defaults::max_concurrent_jobs(),
            max_concurrent_sites: defaults::max_concurrent_sites(),
            proxy: None,
        }
    }
}

/// Which discovered fields are followed into new probes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionPolicy {
    /// Follow a value only under the field name it was observed with.
    #[default]
    Matched,
    /// Offer every discovered value to every probe whose value format accepts it.
    AllFields,
}

/// Identifier discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub expansion: ExpansionPolicy,

    /// Upper bound on identifiers probed in one run
    #[serde(default)]
    pub max_identifiers: Option<usize>,

    /// Substrings of a raw response that mean an anti-bot challenge
    #[serde(default = "defaults::soft_block_markers")]
    pub soft_block_markers: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            expansion: ExpansionPolicy::default(),
            max_identifiers: None,
            soft_block_markers: defaults::soft_block_markers(),
        }
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/74.0.3729.169 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent_jobs() -> usize {
        8
    }
    pub fn max_concurrent_sites() -> usize {
        8
    }
    pub fn soft_block_markers() -> Vec<String> {
        vec!["/checkcaptcha?key=".into()]
    }
}
