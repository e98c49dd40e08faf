use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use tracing::debug;

use crate::pricing::scraper::PriceScraper;
use crate::pricing::stores;
use crate::pricing::types::PriceRecord;
use crate::scrape::ExtractProvider;

/// Default search radius when the caller does not provide one.
pub const DEFAULT_RADIUS_MILES: f64 = 10.0;

const COMPARISON_CACHE_MAX_ENTRIES: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorePrice {
    pub store_id: String,
    pub store_name: String,
    pub distance_miles: f64,
    pub record: PriceRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductComparison {
    pub product: String,
    pub best_price: StorePrice,
    /// All store prices, ascending by price.
    pub prices: Vec<StorePrice>,
    pub average_price: f64,
    pub price_range: PriceRange,
    /// Spread between the most and least expensive store.
    pub estimated_savings: f64,
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Rank a product's store prices and compute savings statistics.
///
/// Returns `None` when no store produced a price, in which case the product
/// is omitted from the comparison output entirely.
pub fn build_comparison(product: &str, mut prices: Vec<StorePrice>) -> Option<ProductComparison> {
    if prices.is_empty() {
        return None;
    }

    prices.sort_by(|a, b| {
        a.record
            .price
            .partial_cmp(&b.record.price)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let min = prices[0].record.price;
    let max = prices[prices.len() - 1].record.price;
    let average =
        round_cents(prices.iter().map(|p| p.record.price).sum::<f64>() / prices.len() as f64);

    Some(ProductComparison {
        product: product.to_string(),
        best_price: prices[0].clone(),
        average_price: average,
        price_range: PriceRange { min, max },
        estimated_savings: round_cents(max - min),
        prices,
    })
}

/// Fans price lookups out across the stores near a location and ranks the
/// results per product.
///
/// Lookups run sequentially, in program order, through the shared rate
/// limiter and budget ledger; there is no parallel fan-out. Whole
/// comparisons are memoized for a short window since they are expensive to
/// assemble relative to how quickly grocery prices move.
pub struct PriceComparisonService<P: ExtractProvider> {
    scraper: Arc<PriceScraper<P>>,
    cache: Cache<String, Arc<Vec<ProductComparison>>>,
}

impl<P: ExtractProvider> PriceComparisonService<P> {
    pub fn new(scraper: Arc<PriceScraper<P>>, cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(COMPARISON_CACHE_MAX_ENTRIES)
            .time_to_live(cache_ttl)
            .build();
        Self { scraper, cache }
    }

    pub async fn compare(
        &self,
        products: &[String],
        zip_code: &str,
        radius_miles: f64,
    ) -> Arc<Vec<ProductComparison>> {
        let cache_key = format!("{zip_code}:{radius_miles}:{}", products.join(","));
        self.cache
            .get_with(cache_key, async {
                Arc::new(self.compare_uncached(products, zip_code, radius_miles).await)
            })
            .await
    }

    async fn compare_uncached(
        &self,
        products: &[String],
        zip_code: &str,
        radius_miles: f64,
    ) -> Vec<ProductComparison> {
        let nearby = stores::stores_near(zip_code, radius_miles);
        if nearby.is_empty() {
            debug!(zip_code, radius_miles, "No stores within radius");
            return Vec::new();
        }

        let mut comparisons = Vec::new();
        for product in products {
            let mut prices = Vec::new();
            for (store, distance_miles) in &nearby {
                let Some(record) = self
                    .scraper
                    .scrape_product_price(product, store.zip_code)
                    .await
                else {
                    continue;
                };
                prices.push(StorePrice {
                    store_id: store.id.to_string(),
                    store_name: store.name.to_string(),
                    distance_miles: (*distance_miles * 10.0).round() / 10.0,
                    record,
                });
            }

            // Products with no store results are omitted, not errors
            if let Some(comparison) = build_comparison(product, prices) {
                comparisons.push(comparison);
            }
        }
        comparisons
    }
}
