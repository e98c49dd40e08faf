use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, ErrorDetails};

/// Top-level pricegate configuration, loaded from `pricegate.toml`.
///
/// Every field has a default, so an empty file (or `Config::default()`) yields
/// a fully working configuration with the stock caps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub scraping: ScrapingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GatewayConfig {
    /// Socket address the gateway binds to.
    pub bind_address: SocketAddr,
    /// Enables debug-level detail in error responses and logs.
    pub debug: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ScrapingConfig {
    /// Base URL of the extract endpoint.
    pub api_base: String,
    /// Lifetime spend cap in dollars.
    pub total_budget: f64,
    /// Per-calendar-day spend cap in dollars.
    pub daily_budget: f64,
    /// Token bucket capacity.
    pub max_tokens: u32,
    /// Token bucket refill rate, tokens per minute.
    pub refill_per_minute: u32,
    /// TTL for cached per-(product, zip) price records, in seconds.
    pub price_cache_ttl_secs: u64,
    /// TTL for cached multi-store comparisons, in seconds.
    pub comparison_cache_ttl_secs: u64,
    /// Attempts per lookup before degrading to synthetic data.
    pub max_retries: u32,
    /// Linear backoff unit between attempts, in milliseconds.
    pub retry_backoff_ms: u64,
    /// Timeout for each extract call, in seconds.
    pub http_timeout_secs: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.zyte.com/v1/extract".to_string(),
            total_budget: 5.00,
            daily_budget: 1.00,
            max_tokens: 8,
            refill_per_minute: 8,
            price_cache_ttl_secs: 6 * 60 * 60,
            comparison_cache_ttl_secs: 5 * 60,
            max_retries: 2,
            retry_backoff_ms: 2000,
            http_timeout_secs: 30,
        }
    }
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3100))
}

impl Config {
    /// Load and validate a config file from the given path.
    pub fn load_from_path(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::new(ErrorDetails::Config {
                message: format!("Failed to read config file {}: {e}", path.display()),
            })
        })?;
        let config: Config = toml::from_str(&contents).map_err(|e| {
            Error::new(ErrorDetails::Config {
                message: format!("Failed to parse config file {}: {e}", path.display()),
            })
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.scraping.total_budget < 0.0 || self.scraping.daily_budget < 0.0 {
            return Err(Error::new(ErrorDetails::Config {
                message: "Budget caps must be non-negative".to_string(),
            }));
        }
        if self.scraping.max_tokens == 0 || self.scraping.refill_per_minute == 0 {
            return Err(Error::new(ErrorDetails::Config {
                message: "`max_tokens` and `refill_per_minute` must be positive".to_string(),
            }));
        }
        Ok(())
    }
}
