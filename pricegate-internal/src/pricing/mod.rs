pub mod comparison;
pub mod pricebook;
pub mod scraper;
pub mod stores;
pub mod types;

pub use comparison::{PriceComparisonService, PriceRange, ProductComparison, StorePrice};
pub use scraper::PriceScraper;
pub use types::{PriceRecord, PriceSource, Promotion, PromotionType};

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for price scraper monitoring
#[derive(Debug, Default)]
pub struct PriceScraperMetrics {
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub real_records: AtomicU64,
    pub fallback_records: AtomicU64,
    pub unresolved_locations: AtomicU64,
}

impl PriceScraperMetrics {
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_real(&self) {
        self.real_records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallback_records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unresolved(&self) {
        self.unresolved_locations.fetch_add(1, Ordering::Relaxed);
    }
}
