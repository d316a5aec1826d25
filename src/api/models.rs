use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::store::ScrapeRecord;

/// Header carrying the authenticated caller, set by the upstream auth layer.
pub const USER_HEADER: &str = "x-user-id";

#[derive(Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

/// Compact view of a record for history listings.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<ScrapeRecord> for HistoryEntry {
    fn from(record: ScrapeRecord) -> Self {
        Self {
            id: record.id,
            url: record.url,
            title: record.document.title,
            word_count: record.summary.word_count,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: Uuid,
}

/// Identity of the caller making the request.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| UserId(id.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}
