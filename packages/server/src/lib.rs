pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;
pub mod uploads;

use axum::Json;
use axum::routing::get;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::middleware::cors::{AllowedOrigins, cors};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mahasiswa API",
        version = "1.0.0",
        description = "CRUD API for student records with profile image uploads"
    ),
    tags(
        (name = "Mahasiswa", description = "Student CRUD operations"),
        (name = "Health", description = "Service health"),
    ),
)]
struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let allowed = AllowedOrigins::new(state.config.server.cors.allow_origins.clone());
    let upload_dir = state.config.upload.dir.clone();

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(handlers::health::health))
        .nest("/api", routes::api_routes())
        .split_for_parts();

    router
        .with_state(state)
        .route(
            "/api-docs/openapi.json",
            get(move || {
                let api = api.clone();
                async move { Json(api) }
            }),
        )
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(allowed, cors))
}
