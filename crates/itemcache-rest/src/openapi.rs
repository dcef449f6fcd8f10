//! OpenAPI documentation configuration.

use crate::controllers::{HealthResponse, ReadinessResponse};
use itemcache_core::{ErrorResponse, ItemKey, ItemStatus, Version};
use itemcache_service::{ItemDto, ItemResponse};
use utoipa::OpenApi;

/// OpenAPI documentation for the item cache API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Item Cache API",
        version = "1.0.0",
        description = "Items served from a coherent cache over a relational store",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        crate::controllers::item_controller::list_items,
        crate::controllers::item_controller::get_item,
        crate::controllers::item_controller::create_item,
        crate::controllers::item_controller::update_item,
        crate::controllers::item_controller::delete_item,
        crate::controllers::health_controller::health_check,
        crate::controllers::health_controller::readiness_check,
        crate::controllers::health_controller::liveness_check,
    ),
    components(
        schemas(
            ItemKey,
            ItemStatus,
            Version,
            ErrorResponse,
            ItemDto,
            ItemResponse,
            HealthResponse,
            ReadinessResponse,
        )
    ),
    tags(
        (name = "items", description = "Item endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;
