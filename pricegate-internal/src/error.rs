use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use std::fmt::Display;

#[derive(Debug, PartialEq)]
// As long as the struct member is private, we force people to use the `new` method and log the error.
// We box `ErrorDetails` per the `clippy::result_large_err` lint
pub struct Error(Box<ErrorDetails>);

impl Error {
    pub fn new(details: ErrorDetails) -> Self {
        details.log();
        Error(Box::new(details))
    }

    pub fn new_without_logging(details: ErrorDetails) -> Self {
        Error(Box::new(details))
    }

    pub fn status_code(&self) -> StatusCode {
        self.0.status_code()
    }

    pub fn get_details(&self) -> &ErrorDetails {
        &self.0
    }

    pub fn get_owned_details(self) -> ErrorDetails {
        *self.0
    }

    pub fn log(&self) {
        self.0.log();
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl From<ErrorDetails> for Error {
    fn from(details: ErrorDetails) -> Self {
        Error::new(details)
    }
}

/// Which budget window rejected a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetScope {
    Total,
    Daily,
}

impl Display for BudgetScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetScope::Total => write!(f, "total"),
            BudgetScope::Daily => write!(f, "daily"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ErrorDetails {
    ApiKeyMissing {
        provider_name: String,
    },
    AppState {
        message: String,
    },
    BudgetExceeded {
        scope: BudgetScope,
        estimated_cost: f64,
        remaining: f64,
    },
    Cache {
        message: String,
    },
    Config {
        message: String,
    },
    InternalError {
        message: String,
    },
    InvalidRequest {
        message: String,
    },
    ResponseParse {
        message: String,
    },
    ScrapeClient {
        message: String,
        status_code: Option<StatusCode>,
        raw_request: Option<String>,
        raw_response: Option<String>,
    },
    ScrapeServer {
        message: String,
        raw_request: Option<String>,
        raw_response: Option<String>,
    },
    Serialization {
        message: String,
    },
    UnknownLocation {
        zip_code: String,
    },
}

impl ErrorDetails {
    /// Defines the log level for this error
    fn level(&self) -> tracing::Level {
        match self {
            ErrorDetails::ApiKeyMissing { .. } => tracing::Level::ERROR,
            ErrorDetails::AppState { .. } => tracing::Level::ERROR,
            // Budget exhaustion is an expected stop condition, not a fault
            ErrorDetails::BudgetExceeded { .. } => tracing::Level::WARN,
            ErrorDetails::Cache { .. } => tracing::Level::WARN,
            ErrorDetails::Config { .. } => tracing::Level::ERROR,
            ErrorDetails::InternalError { .. } => tracing::Level::ERROR,
            ErrorDetails::InvalidRequest { .. } => tracing::Level::WARN,
            // Indicates the scraping target changed shape, not a network fault
            ErrorDetails::ResponseParse { .. } => tracing::Level::WARN,
            ErrorDetails::ScrapeClient { .. } => tracing::Level::ERROR,
            ErrorDetails::ScrapeServer { .. } => tracing::Level::ERROR,
            ErrorDetails::Serialization { .. } => tracing::Level::ERROR,
            ErrorDetails::UnknownLocation { .. } => tracing::Level::WARN,
        }
    }

    /// Defines the HTTP status code for responses involving this error
    fn status_code(&self) -> StatusCode {
        match self {
            ErrorDetails::ApiKeyMissing { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::AppState { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::BudgetExceeded { .. } => StatusCode::PAYMENT_REQUIRED,
            ErrorDetails::Cache { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            ErrorDetails::ResponseParse { .. } => StatusCode::BAD_GATEWAY,
            ErrorDetails::ScrapeClient { status_code, .. } => {
                status_code.unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ErrorDetails::ScrapeServer { .. } => StatusCode::BAD_GATEWAY,
            ErrorDetails::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::UnknownLocation { .. } => StatusCode::NOT_FOUND,
        }
    }

    /// Log the error using the `tracing` library
    pub fn log(&self) {
        match self.level() {
            tracing::Level::ERROR => tracing::error!("{self}"),
            tracing::Level::WARN => tracing::warn!("{self}"),
            tracing::Level::INFO => tracing::info!("{self}"),
            tracing::Level::DEBUG => tracing::debug!("{self}"),
            tracing::Level::TRACE => tracing::trace!("{self}"),
        }
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorDetails::ApiKeyMissing { provider_name } => {
                write!(f, "API key missing for provider: {provider_name}")
            }
            ErrorDetails::AppState { message } => {
                write!(f, "Error initializing AppState: {message}")
            }
            ErrorDetails::BudgetExceeded {
                scope,
                estimated_cost,
                remaining,
            } => {
                write!(
                    f,
                    "Scraping budget exceeded ({scope}): estimated cost ${estimated_cost:.4} exceeds remaining ${remaining:.4}"
                )
            }
            ErrorDetails::Cache { message } => {
                write!(f, "Error in cache: {message}")
            }
            ErrorDetails::Config { message } => {
                write!(f, "{message}")
            }
            ErrorDetails::InternalError { message } => {
                write!(f, "Internal error: {message}")
            }
            ErrorDetails::InvalidRequest { message } => {
                write!(f, "Invalid request: {message}")
            }
            ErrorDetails::ResponseParse { message } => {
                write!(f, "Error parsing extract response: {message}")
            }
            ErrorDetails::ScrapeClient {
                message,
                status_code,
                ..
            } => match status_code {
                Some(code) => write!(f, "Error from extract client (status {code}): {message}"),
                None => write!(f, "Error from extract client: {message}"),
            },
            ErrorDetails::ScrapeServer { message, .. } => {
                write!(f, "Error from extract server: {message}")
            }
            ErrorDetails::Serialization { message } => {
                write!(f, "Error serializing or deserializing: {message}")
            }
            ErrorDetails::UnknownLocation { zip_code } => {
                write!(f, "No store is mapped to zip code: {zip_code}")
            }
        }
    }
}

impl IntoResponse for Error {
    /// Log the error and convert it into an Axum response
    fn into_response(self) -> Response {
        let body = json!({"error": self.to_string()});
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_exceeded_error() {
        let error = Error::new(ErrorDetails::BudgetExceeded {
            scope: BudgetScope::Daily,
            estimated_cost: 0.005,
            remaining: 0.001,
        });

        assert_eq!(
            error.to_string(),
            "Scraping budget exceeded (daily): estimated cost $0.0050 exceeds remaining $0.0010"
        );
        assert_eq!(error.status_code(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(error.get_details().level(), tracing::Level::WARN);
    }

    #[test]
    fn test_unknown_location_error() {
        let error = Error::new(ErrorDetails::UnknownLocation {
            zip_code: "00000".to_string(),
        });

        assert_eq!(
            error.to_string(),
            "No store is mapped to zip code: 00000"
        );
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_scrape_client_error_status_passthrough() {
        let error = Error::new_without_logging(ErrorDetails::ScrapeClient {
            message: "connection reset".to_string(),
            status_code: Some(StatusCode::SERVICE_UNAVAILABLE),
            raw_request: None,
            raw_response: None,
        });

        assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_error_into_response() {
        let error = Error::new_without_logging(ErrorDetails::InvalidRequest {
            message: "products list is empty".to_string(),
        });

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
