use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::endpoints::validate_zip;
use crate::error::{Error, ErrorDetails};
use crate::gateway_util::AppState;
use crate::pricing::comparison::DEFAULT_RADIUS_MILES;
use crate::pricing::{PriceRecord, ProductComparison};

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub zip: String,
}

/// GET `/v1/prices/{product}?zip=NNNNN`
///
/// Always answers 200 with a record (real or fallback) when the zip resolves
/// to a store; 404 only for an unserved zip code.
pub async fn price_lookup_handler(
    State(state): AppState,
    Path(product): Path<String>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<PriceRecord>, Error> {
    if product.trim().is_empty() {
        return Err(Error::new(ErrorDetails::InvalidRequest {
            message: "Product name must not be empty".to_string(),
        }));
    }
    validate_zip(&query.zip)?;

    match state.scraper.scrape_product_price(&product, &query.zip).await {
        Some(record) => Ok(Json(record)),
        None => Err(Error::new(ErrorDetails::UnknownLocation {
            zip_code: query.zip,
        })),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompareRequest {
    pub products: Vec<String>,
    pub zip_code: String,
    #[serde(default)]
    pub radius_miles: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub comparisons: Vec<ProductComparison>,
}

/// POST `/v1/prices/compare`
///
/// Products that yield no store results are omitted from the response; an
/// empty `comparisons` array is a valid answer, never an error.
pub async fn compare_handler(
    State(state): AppState,
    Json(request): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, Error> {
    if request.products.is_empty() {
        return Err(Error::new(ErrorDetails::InvalidRequest {
            message: "`products` must not be empty".to_string(),
        }));
    }
    validate_zip(&request.zip_code)?;

    let radius_miles = request.radius_miles.unwrap_or(DEFAULT_RADIUS_MILES);
    if radius_miles.is_nan() || radius_miles <= 0.0 {
        return Err(Error::new(ErrorDetails::InvalidRequest {
            message: "`radiusMiles` must be positive".to_string(),
        }));
    }

    let comparisons = state
        .comparison
        .compare(&request.products, &request.zip_code, radius_miles)
        .await;

    Ok(Json(CompareResponse {
        comparisons: comparisons.as_ref().clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_parser::Config;
    use crate::gateway_util::AppStateData;
    use crate::pricing::PriceSource;
    use crate::scrape::ZyteCredentials;
    use axum::extract::State;
    use std::sync::Arc;

    fn fallback_only_state() -> AppStateData {
        AppStateData::new_with_credentials(Arc::new(Config::default()), ZyteCredentials::None)
            .unwrap()
    }

    #[test]
    fn test_compare_request_wire_format() {
        let json = r#"{
            "products": ["milk", "eggs"],
            "zipCode": "33130",
            "radiusMiles": 5.0
        }"#;

        let request: CompareRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.products, vec!["milk", "eggs"]);
        assert_eq!(request.zip_code, "33130");
        assert_eq!(request.radius_miles, Some(5.0));
    }

    #[test]
    fn test_compare_request_radius_is_optional() {
        let json = r#"{"products": ["milk"], "zipCode": "33130"}"#;
        let request: CompareRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.radius_miles, None);
    }

    #[tokio::test]
    async fn test_price_lookup_serves_fallback_record() {
        let state = fallback_only_state();

        let response = price_lookup_handler(
            State(state),
            Path("milk".to_string()),
            Query(PriceQuery {
                zip: "33130".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.source, PriceSource::Fallback);
        assert_eq!(response.0.product, "milk");
    }

    #[tokio::test]
    async fn test_price_lookup_unknown_zip_is_not_found() {
        let state = fallback_only_state();

        let err = price_lookup_handler(
            State(state),
            Path("milk".to_string()),
            Query(PriceQuery {
                zip: "99999".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_compare_rejects_empty_products() {
        let state = fallback_only_state();

        let err = compare_handler(
            State(state),
            Json(CompareRequest {
                products: vec![],
                zip_code: "33130".to_string(),
                radius_miles: None,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_compare_unknown_zip_is_empty_not_error() {
        let state = fallback_only_state();

        let response = compare_handler(
            State(state),
            Json(CompareRequest {
                products: vec!["milk".to_string()],
                zip_code: "99999".to_string(),
                radius_miles: None,
            }),
        )
        .await
        .unwrap();

        assert!(response.0.comparisons.is_empty());
    }

    #[tokio::test]
    async fn test_compare_ranks_fallback_prices() {
        let state = fallback_only_state();

        let response = compare_handler(
            State(state),
            Json(CompareRequest {
                products: vec!["milk".to_string()],
                zip_code: "33130".to_string(),
                radius_miles: Some(10.0),
            }),
        )
        .await
        .unwrap();

        let comparison = &response.0.comparisons[0];
        assert_eq!(comparison.product, "milk");
        assert!(!comparison.prices.is_empty());
        assert_eq!(
            comparison.best_price.record.price,
            comparison.price_range.min
        );
        for pair in comparison.prices.windows(2) {
            assert!(pair[0].record.price <= pair[1].record.price);
        }
    }
}
