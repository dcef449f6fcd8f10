//! Item controller.

use crate::{
    responses::{created, no_content, ok, ApiResponse, ApiResult, AppError},
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use itemcache_core::ItemCacheError;
use itemcache_service::{ItemDto, ItemResponse};
use serde::Deserialize;
use tracing::debug;
use utoipa::IntoParams;

/// Optional `status` query parameter.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StatusQuery {
    /// Item status, case-insensitive (`CURRENT` or `DISCONTINUED`).
    pub status: Option<String>,
}

/// Creates the item router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:key", get(get_item).put(update_item).delete(delete_item))
}

/// List items, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    params(StatusQuery),
    responses(
        (status = 200, description = "Items ordered by status then age", body = [ItemResponse]),
        (status = 400, description = "Unknown status")
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Vec<ItemResponse>> {
    debug!("List items request, status: {:?}", query.status);

    let response = state.item_service.list_items(query.status).await?;
    ok(response)
}

/// Get an item by key.
#[utoipa::path(
    get,
    path = "/items/{key}",
    tag = "items",
    params(("key" = String, Path, description = "Item key")),
    responses(
        (status = 200, description = "The item", body = ItemResponse),
        (status = 404, description = "No item under this key")
    )
)]
pub async fn get_item(State(state): State<AppState>, Path(key): Path<String>) -> ApiResult<ItemResponse> {
    debug!("Get item request: {}", key);

    let response = state.item_service.get_item(&key).await?;
    ok(response)
}

/// Create a new item.
#[utoipa::path(
    post,
    path = "/items",
    tag = "items",
    request_body = ItemDto,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<ItemDto>,
) -> Result<(StatusCode, Json<ApiResponse<ItemResponse>>), AppError> {
    debug!("Create item request: {}", request.name);

    let response = state.item_service.create_item(request).await?;
    Ok(created(response))
}

/// Replace an item, or with `?status=` change only its status.
#[utoipa::path(
    put,
    path = "/items/{key}",
    tag = "items",
    params(("key" = String, Path, description = "Item key"), StatusQuery),
    request_body(content = ItemDto, description = "Required unless `status` is given"),
    responses(
        (status = 204, description = "Item updated"),
        (status = 400, description = "Invalid request or status"),
        (status = 404, description = "No item under this key"),
        (status = 409, description = "Item changed since it was read")
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<StatusQuery>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    if let Some(status) = query.status {
        debug!("Update item status request: {} -> {}", key, status);
        state.item_service.update_item_status(&key, &status).await?;
        return Ok(no_content());
    }

    debug!("Update item request: {}", key);
    let request: ItemDto = serde_json::from_slice(&body)
        .map_err(|e| ItemCacheError::validation(format!("Invalid item body: {}", e)))?;
    state.item_service.update_item(&key, request).await?;
    Ok(no_content())
}

/// Delete an item. Succeeds whether or not it existed.
#[utoipa::path(
    delete,
    path = "/items/{key}",
    tag = "items",
    params(("key" = String, Path, description = "Item key")),
    responses(
        (status = 204, description = "Item deleted or already absent")
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    debug!("Delete item request: {}", key);

    state.item_service.delete_item(&key).await?;
    Ok(no_content())
}
