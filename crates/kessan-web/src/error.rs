use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use kessan_core::ProviderError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// What went wrong, e.g. `Failed to fetch stock data: Quote not found for symbol: XYZ`
    pub error: String,
}

/// A provider failure, tagged with the operation it broke.
#[derive(Debug, thiserror::Error)]
#[error("{context}: {source}")]
pub struct ApiError {
    context: &'static str,
    source: ProviderError,
}

impl ApiError {
    pub fn stock_data(source: ProviderError) -> Self {
        Self {
            context: "Failed to fetch stock data",
            source,
        }
    }

    pub fn stock_history(source: ProviderError) -> Self {
        Self {
            context: "Failed to fetch stock history",
            source,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.source {
            ProviderError::NotFound(_) => StatusCode::NOT_FOUND,
            ProviderError::Rejected(_) => StatusCode::BAD_REQUEST,
            ProviderError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        warn!("{status}: {self}");
        HttpResponse::build(status).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
