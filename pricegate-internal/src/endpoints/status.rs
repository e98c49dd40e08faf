use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::budget::BudgetStatus;
use crate::gateway_util::AppState;

pub const PRICEGATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET `/health`. Liveness only, touches no dependencies.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    /// "live" when an extract API key is configured, "fallback-only" otherwise.
    pub mode: &'static str,
}

/// GET `/status`
pub async fn status_handler(State(state): AppState) -> Json<StatusResponse> {
    Json(StatusResponse {
        service: "pricegate",
        version: PRICEGATE_VERSION,
        mode: if state.live_mode {
            "live"
        } else {
            "fallback-only"
        },
    })
}

/// GET `/v1/budget`. Ledger snapshot, rendered verbatim.
pub async fn budget_status_handler(State(state): AppState) -> Json<BudgetStatus> {
    Json(state.budget.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_parser::Config;
    use crate::gateway_util::AppStateData;
    use crate::scrape::ZyteCredentials;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_status_reports_fallback_only_mode() {
        let state = AppStateData::new_with_credentials(
            Arc::new(Config::default()),
            ZyteCredentials::None,
        )
        .unwrap();

        let response = status_handler(State(state)).await;
        assert_eq!(response.0.service, "pricegate");
        assert_eq!(response.0.mode, "fallback-only");
    }

    #[tokio::test]
    async fn test_budget_status_wire_format() {
        let state = AppStateData::new_with_credentials(
            Arc::new(Config::default()),
            ZyteCredentials::None,
        )
        .unwrap();

        let response = budget_status_handler(State(state)).await;
        let json = serde_json::to_value(&response.0).unwrap();

        assert_eq!(json["used"], 0.0);
        assert_eq!(json["remaining"], 5.0);
        assert_eq!(json["requestCount"], 0);
        assert_eq!(json["dailySpent"], 0.0);
        assert_eq!(json["dailyBudget"], 1.0);
    }
}
