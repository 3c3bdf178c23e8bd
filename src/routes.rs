// src/routes.rs
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{self, AppState};

pub fn create_routes(state: AppState) -> Router {
    let api = Router::new()
        .route("/coins", get(handlers::get_coins))
        .route("/poll", get(handlers::get_poll))
        .route("/poll/top", get(handlers::get_top))
        .route("/vote", post(handlers::vote))
        .route("/admin/select-coins", post(handlers::select_coins));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
