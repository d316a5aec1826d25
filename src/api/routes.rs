use axum::{
    Router,
    extract::{Json, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::AppState;
use crate::api::models::{DeleteResponse, HistoryEntry, ScrapeRequest, UserId};
use crate::api::response::{self, ApiResponse};
use crate::error::{AppError, Result};
use crate::export::{flat_pairs, to_csv};
use crate::store::{NewScrape, ScrapeRecord};

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/scrape", post(scrape_handler))
        .route("/api/history", get(history_handler))
        .route("/api/results/:id", get(result_handler).delete(delete_handler))
        .route("/api/results/:id/csv", get(csv_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn scrape_handler(
    State(state): State<AppState>,
    user: UserId,
    Json(req): Json<ScrapeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ScrapeRecord>>)> {
    let url = req.url.trim();
    if url.is_empty() {
        return Err(AppError::BadRequest("url is required".to_string()));
    }

    tracing::info!(user = %user.0, url, "processing scrape request");
    let start_time = std::time::Instant::now();

    let extraction = state.extractor.extract(url).await?;
    tracing::info!(
        url,
        elapsed = ?start_time.elapsed(),
        words = extraction.summary.word_count,
        links = extraction.summary.link_count,
        "extraction finished"
    );

    // Only a complete extraction is ever persisted.
    let record = state.store.insert(NewScrape {
        user_id: user.0,
        url: url.to_string(),
        extraction,
        created_at: Utc::now(),
    })?;
    tracing::debug!(id = %record.id, "scrape record saved");

    Ok(response::created(record))
}

async fn history_handler(
    State(state): State<AppState>,
    user: UserId,
) -> Result<impl IntoResponse> {
    let history: Vec<HistoryEntry> = state
        .store
        .list_for_user(&user.0)?
        .into_iter()
        .map(HistoryEntry::from)
        .collect();

    Ok(response::success(history))
}

async fn result_handler(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let record = owned_record(&state, &user, &id)?;
    Ok(response::success(record))
}

async fn csv_handler(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let record = owned_record(&state, &user, &id)?;
    let body = to_csv(&flat_pairs(&record));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"scrape_{}.csv\"", record.id),
            ),
        ],
        body,
    ))
}

async fn delete_handler(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let record = owned_record(&state, &user, &id)?;
    if !state.store.delete(record.id)? {
        return Err(AppError::NotFound);
    }

    tracing::info!(id = %record.id, user = %user.0, "scrape record deleted");
    Ok(response::success(DeleteResponse { id: record.id }))
}

/// Look up a record and check that `user` owns it.
fn owned_record(state: &AppState, user: &UserId, id: &str) -> Result<ScrapeRecord> {
    let id = Uuid::parse_str(id).map_err(|_| AppError::NotFound)?;
    let record = state.store.get(id)?.ok_or(AppError::NotFound)?;

    if record.user_id != user.0 {
        return Err(AppError::Forbidden);
    }
    Ok(record)
}
