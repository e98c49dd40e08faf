pub mod zyte;

pub use zyte::{ZyteClient, ZyteCredentials};

use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, ErrorDetails};

/// Per-call options for an extract request.
///
/// `browser_html` and `screenshot` are expensive features and multiply the
/// estimated cost of the call; see `BudgetLedger::estimate_cost`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractOptions {
    pub geolocation: Option<String>,
    pub echo_data: Option<String>,
    pub browser_html: bool,
    pub screenshot: bool,
}

/// Normalized response from the extract endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawExtractResponse {
    /// Status code observed by the extractor when fetching the target page.
    pub status_code: u16,
    /// Base64-encoded raw body of the target page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_response_body: Option<String>,
    /// Rendered HTML, present only when browser rendering was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_html: Option<String>,
    /// Base64-encoded screenshot, present only when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    /// Caller metadata echoed back unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo_data: Option<String>,
}

impl RawExtractResponse {
    /// Decode the base64 page body, if one was returned.
    pub fn decoded_body(&self) -> Result<Option<Vec<u8>>, Error> {
        match &self.http_response_body {
            Some(encoded) => base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map(Some)
                .map_err(|e| {
                    Error::new(ErrorDetails::ResponseParse {
                        message: format!("Response body is not valid base64: {e}"),
                    })
                }),
            None => Ok(None),
        }
    }
}

/// Seam between the price scraper and the extract transport.
///
/// The production implementation is `ZyteClient`; tests substitute counting
/// and failing fakes.
pub trait ExtractProvider {
    /// Whether a real API key is configured. When false, callers must not
    /// attempt `extract` and should degrade to synthetic data.
    fn is_live(&self) -> bool;

    async fn extract(
        &self,
        target: &Url,
        options: &ExtractOptions,
        client: &reqwest::Client,
    ) -> Result<RawExtractResponse, Error>;
}
