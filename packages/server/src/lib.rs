pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod images;
pub mod models;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::http::HeaderValue;
use common::storage::Bucket;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Image Store API",
        version = "1.0.0",
        description = "Content-addressed image storage with reference counting"
    ),
    tags(
        (name = "Images", description = "Upload, lookup and deletion of images"),
        (name = "References", description = "Reference counting for image owners"),
        (name = "Admin", description = "Maintenance operations"),
    ),
)]
struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes(&state.config))
        .split_for_parts();

    let storage = &state.config.storage;
    let products = ServeDir::new(storage.root.join(Bucket::Products.dir_name()));
    let products_path = storage.products_path();
    let cors = cors_layer(&state.config.server.cors);

    router
        .with_state(state)
        .nest_service(&products_path, products)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
        .layer(cors)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age));

    if config.allow_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins = config.allow_origins.iter().filter_map(|origin| {
        HeaderValue::from_str(origin)
            .inspect_err(|e| {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin")
            })
            .ok()
    });
    layer.allow_origin(AllowOrigin::list(origins))
}
