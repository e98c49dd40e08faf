use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::budget::{BudgetLedger, DEFAULT_EXTRACT_COST_ESTIMATE};
use crate::cache::TtlCache;
use crate::error::{Error, ErrorDetails};
use crate::pricing::pricebook;
use crate::pricing::stores::{self, Store};
use crate::pricing::types::PriceRecord;
use crate::pricing::PriceScraperMetrics;
use crate::scrape::{ExtractOptions, ExtractProvider, RawExtractResponse};

/// Bodies shorter than this are treated as a parse failure: a real search
/// results page is never this small.
const MIN_PLAUSIBLE_BODY_BYTES: usize = 100;

/// Geolocation hint sent with every extract call.
const GEOLOCATION: &str = "US";

/// Maps a (product, zip code) pair to a normalized price record.
///
/// Every lookup resolves to one of three outcomes: a cached or freshly
/// scraped record, a synthetic record tagged `Fallback`, or `None` for a zip
/// code no store serves. A transient scraping failure never surfaces as an
/// error; the scraper always degrades to synthetic data so callers can render
/// a price unconditionally.
#[derive(Debug)]
pub struct PriceScraper<P: ExtractProvider> {
    provider: P,
    budget: Arc<BudgetLedger>,
    cache: TtlCache<PriceRecord>,
    http_client: reqwest::Client,
    max_retries: u32,
    retry_backoff: Duration,
    metrics: PriceScraperMetrics,
}

impl<P: ExtractProvider> PriceScraper<P> {
    pub fn new(
        provider: P,
        budget: Arc<BudgetLedger>,
        cache_ttl: Duration,
        http_client: reqwest::Client,
        max_retries: u32,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            provider,
            budget,
            cache: TtlCache::new(cache_ttl),
            http_client,
            max_retries: max_retries.max(1),
            retry_backoff,
            metrics: PriceScraperMetrics::default(),
        }
    }

    /// Resolve the current price of a product in a zip code.
    ///
    /// Returns `None` only when the zip code is not served by any store in
    /// the directory. All other outcomes produce a record.
    pub async fn scrape_product_price(
        &self,
        product: &str,
        zip_code: &str,
    ) -> Option<PriceRecord> {
        let product_key = product.trim().to_lowercase();
        let cache_key = format!("{product_key}:{zip_code}");

        if let Some(record) = self.cache.get(&cache_key) {
            self.metrics.record_cache_hit();
            debug!(product = %product_key, zip_code, "Price cache hit");
            return Some(record);
        }
        self.metrics.record_cache_miss();

        // An unserved zip code is absent in every mode: there is no store to
        // price against, so this is not a fallback case.
        let Some(store) = stores::resolve_store(zip_code) else {
            self.metrics.record_unresolved();
            debug!(zip_code, "No store mapped to zip code");
            return None;
        };

        // Out of budget (or no API key at all): synthesize without touching
        // the network.
        if !self.provider.is_live() || !self.budget.can_afford(DEFAULT_EXTRACT_COST_ESTIMATE) {
            let record =
                pricebook::synthetic_record(&product_key, zip_code, Some(store), Utc::now());
            self.metrics.record_fallback();
            self.cache.put(cache_key, record.clone());
            return Some(record);
        }

        let record = match self.scrape_with_retry(&product_key, zip_code, store).await {
            Ok(record) => {
                self.metrics.record_real();
                record
            }
            Err(_) => {
                // The error was already logged on construction; all that is
                // left is to degrade.
                debug!(
                    product = %product_key,
                    zip_code,
                    "Degrading to synthetic price data after failed scrape"
                );
                self.metrics.record_fallback();
                pricebook::synthetic_record(&product_key, zip_code, Some(store), Utc::now())
            }
        };

        self.cache.put(cache_key, record.clone());
        Some(record)
    }

    async fn scrape_with_retry(
        &self,
        product: &str,
        zip_code: &str,
        store: &Store,
    ) -> Result<PriceRecord, Error> {
        let target = store.search_url(product)?;
        let options = ExtractOptions {
            geolocation: Some(GEOLOCATION.to_string()),
            echo_data: Some(format!("{product}:{zip_code}")),
            ..Default::default()
        };

        let mut last_error = None;
        for attempt in 1..=self.max_retries {
            match self
                .provider
                .extract(&target, &options, &self.http_client)
                .await
            {
                Ok(raw) => match self.parse_record(&raw, product, zip_code, store) {
                    Ok(record) => return Ok(record),
                    Err(e) => last_error = Some(e),
                },
                Err(e) => {
                    // Budget exhaustion is a hard stop, not a transient
                    // failure; retrying would just burn the wait.
                    if matches!(
                        e.get_details(),
                        ErrorDetails::BudgetExceeded { .. } | ErrorDetails::ApiKeyMissing { .. }
                    ) {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(self.retry_backoff * attempt).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::new(ErrorDetails::InternalError {
                message: "Scrape retry loop exited without an error".to_string(),
            })
        }))
    }

    fn parse_record(
        &self,
        raw: &RawExtractResponse,
        product: &str,
        zip_code: &str,
        store: &Store,
    ) -> Result<PriceRecord, Error> {
        let body = raw.decoded_body()?.ok_or_else(|| {
            Error::new(ErrorDetails::ResponseParse {
                message: "Extract response contained no page body".to_string(),
            })
        })?;

        if body.len() < MIN_PLAUSIBLE_BODY_BYTES {
            return Err(Error::new(ErrorDetails::ResponseParse {
                message: format!(
                    "Page body implausibly short ({} bytes), treating as parse failure",
                    body.len()
                ),
            }));
        }

        Ok(pricebook::record_from_page(
            product,
            zip_code,
            store,
            Utc::now(),
        ))
    }

    pub fn metrics(&self) -> &PriceScraperMetrics {
        &self.metrics
    }

    pub fn budget(&self) -> &Arc<BudgetLedger> {
        &self.budget
    }
}
