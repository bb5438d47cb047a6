use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use bakeshop_catalog::Catalog;
use bakeshop_core::ItemId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_menu))
        .route("/categories", get(list_categories))
        .route("/:id", get(get_item))
}

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    pub category: Option<String>,
}

/// Available items, optionally narrowed to one category.
pub async fn list_menu(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<MenuQuery>,
) -> axum::response::Response {
    let items = services
        .catalog
        .list(query.category.as_deref())
        .iter()
        .map(dto::item_to_json)
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let categories = services.catalog.categories();
    (StatusCode::OK, Json(serde_json::json!({ "categories": categories }))).into_response()
}

/// A single item by id, available or not.
pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.catalog.item(id) {
        Some(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "menu item not found"),
    }
}
