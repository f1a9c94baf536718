use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Service-level error taxonomy.
///
/// Most scoring failures are recovered locally with neutral defaults and
/// never reach this type; only request-fatal conditions surface here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The content store could not return candidates. Ranking cannot
    /// proceed without candidates, so this is surfaced as retryable.
    #[error("Candidate fetch failed: {0}")]
    CandidateFetch(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::CandidateFetch(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let retryable = matches!(self, AppError::CandidateFetch(_));
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
            "retryable": retryable,
        }))
    }
}
