//! Service sessions: gateway-opened, lifetime-bounded admissions.

pub mod handlers;
pub mod models;
pub mod queries;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::AppState;

pub use models::{is_expired, ServiceSession, SessionView};

/// Session control for the gateway, manager surface only. The
/// administrator surface mounts the list handler on its own.
pub fn manager_router() -> Router<AppState> {
    Router::new()
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::open_session),
        )
        .route("/sessions/{id}/touch", post(handlers::touch_session))
        .route("/sessions/{id}/expire", post(handlers::force_expire_session))
}
