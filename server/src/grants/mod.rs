//! Grant Ledger Module
//!
//! One row per approval decision, kept forever. Status is derived from
//! the row and the clock; nothing in the ledger stores "expired".

pub mod handlers;
pub mod models;
pub mod queries;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::AppState;

pub use models::{Grant, GrantStatus, GrantView};

/// Citizen surface: the caller's own grants.
pub fn citizen_router() -> Router<AppState> {
    Router::new()
        .route("/grants", get(handlers::list_own_grants))
        .route("/grants/{id}", get(handlers::get_own_grant))
}

/// Resolver surfaces: scoped ledger views, extension and revocation.
pub fn resolver_router() -> Router<AppState> {
    Router::new()
        .route("/grants", get(handlers::list_grants))
        .route("/grants/{id}", get(handlers::get_grant))
        .route("/grants/{id}/extend", post(handlers::extend_grant))
        .route("/grants/{id}/revoke", post(handlers::revoke_grant))
}
