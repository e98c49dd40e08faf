use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::budget::BudgetLedger;
use crate::config_parser::Config;
use crate::error::{Error, ErrorDetails};
use crate::pricing::{PriceComparisonService, PriceScraper};
use crate::rate_limit::ScraperRateLimiter;
use crate::scrape::{ZyteClient, ZyteCredentials};

/// State for the API
#[derive(Clone)]
pub struct AppStateData {
    pub config: Arc<Config>,
    pub budget: Arc<BudgetLedger>,
    pub scraper: Arc<PriceScraper<ZyteClient>>,
    pub comparison: Arc<PriceComparisonService<ZyteClient>>,
    /// Whether a real extract API key is configured. When false the whole
    /// subsystem serves synthetic data only.
    pub live_mode: bool,
}

pub type AppState = axum::extract::State<AppStateData>;

impl AppStateData {
    pub fn new(config: Arc<Config>) -> Result<Self, Error> {
        Self::new_with_credentials(config, ZyteCredentials::from_env())
    }

    /// Construct the full service graph. Every component is an owned object
    /// wired here rather than a global, so tests can substitute any of them.
    pub fn new_with_credentials(
        config: Arc<Config>,
        credentials: ZyteCredentials,
    ) -> Result<Self, Error> {
        let scraping = &config.scraping;
        let http_client = setup_http_client(scraping.http_timeout_secs)?;

        let live_mode = matches!(credentials, ZyteCredentials::Static(_));
        let budget = Arc::new(BudgetLedger::new(
            scraping.total_budget,
            scraping.daily_budget,
        ));
        let rate_limiter = Arc::new(ScraperRateLimiter::new(
            scraping.max_tokens,
            scraping.refill_per_minute,
        ));
        let zyte = ZyteClient::new(
            scraping.api_base.clone(),
            credentials,
            budget.clone(),
            rate_limiter,
            Duration::from_secs(scraping.http_timeout_secs),
        );
        let scraper = Arc::new(PriceScraper::new(
            zyte,
            budget.clone(),
            Duration::from_secs(scraping.price_cache_ttl_secs),
            http_client,
            scraping.max_retries,
            Duration::from_millis(scraping.retry_backoff_ms),
        ));
        let comparison = Arc::new(PriceComparisonService::new(
            scraper.clone(),
            Duration::from_secs(scraping.comparison_cache_ttl_secs),
        ));

        Ok(Self {
            config,
            budget,
            scraper,
            comparison,
            live_mode,
        })
    }
}

pub fn setup_http_client(timeout_secs: u64) -> Result<Client, Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| {
            Error::new(ErrorDetails::AppState {
                message: format!("Failed to build HTTP client: {e}"),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_without_credentials_is_fallback_only() {
        let config = Arc::new(Config::default());
        let state = AppStateData::new_with_credentials(config, ZyteCredentials::None).unwrap();

        assert!(!state.live_mode);
        assert_eq!(state.budget.snapshot().remaining, 5.00);
    }

    #[test]
    fn test_app_state_with_static_key_is_live() {
        let config = Arc::new(Config::default());
        let credentials = ZyteCredentials::Static("test-key".to_string().into());
        let state = AppStateData::new_with_credentials(config, credentials).unwrap();

        assert!(state.live_mode);
    }
}
