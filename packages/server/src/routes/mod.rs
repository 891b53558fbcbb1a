use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

/// Routes nested under `/api`.
pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::mahasiswa::list_mahasiswa,
            handlers::mahasiswa::create_mahasiswa
        ))
        .routes(routes!(
            handlers::mahasiswa::get_mahasiswa,
            handlers::mahasiswa::update_mahasiswa,
            handlers::mahasiswa::delete_mahasiswa
        ))
        .layer(handlers::mahasiswa::mahasiswa_body_limit())
}
