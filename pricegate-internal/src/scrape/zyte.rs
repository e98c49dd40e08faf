use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::budget::BudgetLedger;
use crate::error::{Error, ErrorDetails};
use crate::rate_limit::ScraperRateLimiter;
use crate::scrape::{ExtractOptions, ExtractProvider, RawExtractResponse};

const PROVIDER_TYPE: &str = "Zyte";

/// Environment variable carrying the extract API key.
pub const ZYTE_API_KEY_VAR: &str = "ZYTE_API_KEY";

#[derive(Debug, Clone)]
pub enum ZyteCredentials {
    Static(SecretString),
    None,
}

impl ZyteCredentials {
    pub fn from_env() -> Self {
        match std::env::var(ZYTE_API_KEY_VAR) {
            Ok(key) if !key.is_empty() => ZyteCredentials::Static(SecretString::from(key)),
            _ => {
                tracing::warn!(
                    "{ZYTE_API_KEY_VAR} is not set; price scraping will run in fallback-only mode"
                );
                ZyteCredentials::None
            }
        }
    }

    fn get_api_key(&self) -> Option<&SecretString> {
        match self {
            ZyteCredentials::Static(api_key) => Some(api_key),
            ZyteCredentials::None => None,
        }
    }
}

// Zyte-specific request format for the extract endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZyteExtractRequest {
    url: String,
    http_response_body: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    geolocation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    echo_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    browser_html: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    screenshot: Option<bool>,
}

/// Client for the Zyte extract API, combining budget gating and rate limiting
/// into a single logical `extract` operation.
///
/// Sequence per call: estimate cost, reserve against the ledger (fail fast
/// with no network activity if a cap would be exceeded), acquire a rate
/// limiter token (may suspend), then issue the HTTP call. The estimated cost
/// is committed only after the call succeeds; failed calls are not billed.
/// There is no retry at this layer.
#[derive(Debug)]
pub struct ZyteClient {
    api_base: String,
    credentials: ZyteCredentials,
    budget: Arc<BudgetLedger>,
    rate_limiter: Arc<ScraperRateLimiter>,
    timeout: Duration,
}

impl ZyteClient {
    pub fn new(
        api_base: String,
        credentials: ZyteCredentials,
        budget: Arc<BudgetLedger>,
        rate_limiter: Arc<ScraperRateLimiter>,
        timeout: Duration,
    ) -> Self {
        Self {
            api_base,
            credentials,
            budget,
            rate_limiter,
            timeout,
        }
    }

    pub fn budget(&self) -> &Arc<BudgetLedger> {
        &self.budget
    }
}

impl ExtractProvider for ZyteClient {
    fn is_live(&self) -> bool {
        matches!(self.credentials, ZyteCredentials::Static(_))
    }

    async fn extract(
        &self,
        target: &Url,
        options: &ExtractOptions,
        client: &Client,
    ) -> Result<RawExtractResponse, Error> {
        let api_key = self.credentials.get_api_key().ok_or_else(|| {
            Error::new(ErrorDetails::ApiKeyMissing {
                provider_name: PROVIDER_TYPE.to_string(),
            })
        })?;

        let estimated_cost = self.budget.estimate_cost(target, options);
        self.budget.check_and_reserve(estimated_cost)?;

        self.rate_limiter.acquire().await;

        let zyte_request = ZyteExtractRequest {
            url: target.to_string(),
            http_response_body: true,
            geolocation: options.geolocation.clone(),
            echo_data: options.echo_data.clone(),
            browser_html: options.browser_html.then_some(true),
            screenshot: options.screenshot.then_some(true),
        };

        let raw_request = serde_json::to_string(&zyte_request).map_err(|e| {
            Error::new(ErrorDetails::Serialization {
                message: format!("Failed to serialize Zyte request: {e}"),
            })
        })?;

        let response = client
            .post(&self.api_base)
            .basic_auth(api_key.expose_secret(), Some(""))
            .json(&zyte_request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                Error::new(ErrorDetails::ScrapeClient {
                    message: format!("Failed to send request to Zyte: {e}"),
                    status_code: None,
                    raw_request: Some(raw_request.clone()),
                    raw_response: None,
                })
            })?;

        let status = response.status();
        let raw_response = response.text().await.map_err(|e| {
            Error::new(ErrorDetails::ScrapeClient {
                message: format!("Failed to read Zyte response: {e}"),
                status_code: Some(status),
                raw_request: Some(raw_request.clone()),
                raw_response: None,
            })
        })?;

        if !status.is_success() {
            return Err(Error::new(ErrorDetails::ScrapeServer {
                message: format!("Zyte returned error status {status}: {raw_response}"),
                raw_request: Some(raw_request),
                raw_response: Some(raw_response),
            }));
        }

        // The call succeeded, so the estimated cost is now real spend.
        self.budget.commit(estimated_cost);

        let extract_response: RawExtractResponse =
            serde_json::from_str(&raw_response).map_err(|e| {
                Error::new(ErrorDetails::Serialization {
                    message: format!("Failed to parse Zyte response: {e}"),
                })
            })?;

        Ok(extract_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zyte_request_serialization() {
        let request = ZyteExtractRequest {
            url: "https://www.publix.com/search?query=milk".to_string(),
            http_response_body: true,
            geolocation: Some("US".to_string()),
            echo_data: Some("milk:33130".to_string()),
            browser_html: None,
            screenshot: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["url"], "https://www.publix.com/search?query=milk");
        assert_eq!(parsed["httpResponseBody"], true);
        assert_eq!(parsed["geolocation"], "US");
        assert_eq!(parsed["echoData"], "milk:33130");
        // Expensive features are omitted entirely when not requested
        assert!(parsed.get("browserHtml").is_none());
        assert!(parsed.get("screenshot").is_none());
    }

    #[test]
    fn test_missing_credentials_is_not_live() {
        let budget = Arc::new(BudgetLedger::new(5.00, 1.00));
        let rate_limiter = Arc::new(ScraperRateLimiter::new(8, 8));
        let client = ZyteClient::new(
            "https://api.zyte.com/v1/extract".to_string(),
            ZyteCredentials::None,
            budget,
            rate_limiter,
            Duration::from_secs(30),
        );

        assert!(!client.is_live());
    }

    #[tokio::test]
    async fn test_extract_without_credentials_errors_before_any_accounting() {
        let budget = Arc::new(BudgetLedger::new(5.00, 1.00));
        let rate_limiter = Arc::new(ScraperRateLimiter::new(8, 8));
        let zyte = ZyteClient::new(
            "https://api.zyte.com/v1/extract".to_string(),
            ZyteCredentials::None,
            budget.clone(),
            rate_limiter,
            Duration::from_secs(30),
        );

        let target = Url::parse("https://www.publix.com/search?query=milk").unwrap();
        let http_client = Client::new();
        let err = zyte
            .extract(&target, &ExtractOptions::default(), &http_client)
            .await
            .unwrap_err();

        assert!(matches!(
            err.get_details(),
            ErrorDetails::ApiKeyMissing { .. }
        ));
        assert_eq!(budget.snapshot().request_count, 0);
        assert_eq!(budget.snapshot().used, 0.0);
    }
}
