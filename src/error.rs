use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Duration;

use crate::api::response;

/// Failures of the fetch phase. Each one ends the extraction attempt.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Response exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },

    #[error("Remote server answered with HTTP {status}")]
    HttpError { status: u16 },

    #[error("Network error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Document is empty or unparseable")]
    EmptyOrUnparseable,

    #[error("Parsing did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Parsing was aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Scrape failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Missing or empty caller identity")]
    Unauthorized,

    #[error("Record belongs to another user")]
    Forbidden,

    #[error("Record not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Extract(ExtractError::Fetch(err)) => match err {
                FetchError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
                FetchError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
            AppError::Extract(ExtractError::Parse(err)) => match err {
                ParseError::EmptyOrUnparseable => StatusCode::UNPROCESSABLE_ENTITY,
                ParseError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                ParseError::Aborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        response::error::<()>(status, self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
