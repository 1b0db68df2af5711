//! Actor Directory Module
//!
//! Citizens, grantees, administrators and the site manager. Role records
//! reference a citizen account; the gateway owns account credentials.

pub mod handlers;
pub mod models;
pub mod queries;
pub mod types;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::api::AppState;

pub use models::{Administrator, Citizen, Grantee, SiteManager};

/// Grantee management, administrator and manager surfaces.
pub fn grantee_router() -> Router<AppState> {
    Router::new()
        .route(
            "/grantees",
            get(handlers::list_grantees).post(handlers::create_grantee),
        )
        .route(
            "/grantees/{id}",
            patch(handlers::update_grantee).delete(handlers::delete_grantee),
        )
}

/// Administrator management, manager surface only.
pub fn administrator_router() -> Router<AppState> {
    Router::new()
        .route(
            "/administrators",
            get(handlers::list_administrators).post(handlers::create_administrator),
        )
        .route(
            "/administrators/{id}",
            patch(handlers::update_administrator).delete(handlers::delete_administrator),
        )
}
