use axum::{
    Router,
    routing::{get, post},
};

use super::handlers;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/widget.js", get(handlers::widget_script))
        .route("/api/chat", post(handlers::handle_chat))
        .route("/api/widget/config", get(handlers::widget_config))
        .route("/api/admin/login", post(handlers::handle_login))
        .route(
            "/api/admin/config",
            get(handlers::get_admin_config).post(handlers::update_admin_config),
        )
        .with_state(state)
}
