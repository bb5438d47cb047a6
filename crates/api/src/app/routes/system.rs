use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Same-day order count, revenue, and pending backlog for the staff
/// dashboard.
pub async fn today_stats(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.today_stats(Utc::now()).await {
        Ok(stats) => (StatusCode::OK, Json(dto::stats_to_json(&stats))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
