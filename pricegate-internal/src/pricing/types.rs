use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance of a price record.
///
/// `Fallback` marks records synthesized from static heuristics rather than a
/// live extract call. The tag propagates unchanged through caching and
/// aggregation so consumers can always distinguish real from synthetic data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriceSource {
    RealData,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromotionType {
    Sale,
    Bogo,
    DigitalCoupon,
    Loyalty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    #[serde(rename = "type")]
    pub promotion_type: PromotionType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub savings: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
}

/// Normalized per-(product, store) price, independent of origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub product: String,
    pub price: f64,
    pub unit: String,
    pub price_per_unit: f64,
    pub availability: bool,
    pub promotions: Vec<Promotion>,
    pub source: PriceSource,
    pub scraped_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}
