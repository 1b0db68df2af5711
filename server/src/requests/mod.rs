//! Access request workflow: submission, review, one-shot resolution.

pub mod handlers;
pub mod models;
pub mod queries;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::AppState;

pub use models::{AccessRequest, RequestState};

/// Citizen surface: submission and own-request views.
pub fn citizen_router() -> Router<AppState> {
    Router::new()
        .route(
            "/requests",
            get(handlers::list_own_requests).post(handlers::submit_request),
        )
        .route("/requests/{id}", get(handlers::get_own_request))
}

/// Resolver surfaces: scoped listings and one-shot resolution.
pub fn resolver_router() -> Router<AppState> {
    Router::new()
        .route("/requests", get(handlers::list_requests))
        .route("/requests/{id}", get(handlers::get_request))
        .route("/requests/{id}/approve", post(handlers::approve_request))
        .route("/requests/{id}/reject", post(handlers::reject_request))
}
