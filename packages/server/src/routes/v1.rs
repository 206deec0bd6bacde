use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(image_routes(config))
        .merge(reference_routes())
        .merge(admin_routes())
}

fn image_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::image::upload_image))
        .layer(handlers::image::upload_body_limit(
            config.storage.max_upload_size,
        ));

    OpenApiRouter::new()
        .routes(routes!(handlers::image::list_images))
        .routes(routes!(
            handlers::image::get_image,
            handlers::image::delete_image
        ))
        .merge(upload)
}

fn reference_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        handlers::reference::attach_reference,
        handlers::reference::detach_reference
    ))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::admin::run_gc))
}
