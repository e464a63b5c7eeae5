// src/routes/mod.rs
pub mod dashboard;
pub mod relay;

use crate::state::SharedState;
use axum::{
    Router,
    routing::{get, post},
};
use dashboard::{
    code_page, code_submit, conversation_page, conversation_submit, root_handler, settings_page,
};
use relay::{code_handler, conversation_handler, music_handler};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub fn create_router() -> Router<SharedState> {
    let api_routes = Router::new()
        .route("/code", post(code_handler))
        .route("/conversation", post(conversation_handler))
        .route("/music", post(music_handler));

    Router::new()
        .nest("/api", api_routes)
        .route("/", get(root_handler))
        .route("/code", get(code_page).post(code_submit))
        .route("/conversation", get(conversation_page).post(conversation_submit))
        .route("/settings", get(settings_page))
        .route("/health", get(|| async { "OK" }))
}

/// The full application: routes, static assets and middleware, bound to `state`.
pub fn app(state: SharedState) -> Router {
    let assets = ServeDir::new(&state.config.public_dir);

    create_router()
        .fallback_service(assets)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::very_permissive()),
        )
        .with_state(state)
}
