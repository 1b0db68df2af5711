//! Permission Registry Module
//!
//! Standing, time-windowed access rules targeting one node of the
//! resource tree. A permission names the citizens it admits; whether it
//! is open right now is always recomputed, never stored.

pub mod handlers;
pub mod models;
pub mod queries;
pub mod registry;
pub mod types;

use axum::{routing::get, Router};

use crate::api::AppState;

pub use models::{Permission, ScopeTier};
pub use registry::is_open;

/// Permission CRUD with the tier in the path. The handlers scope
/// listings and authority by the calling actor.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/permissions/{tier}",
            get(handlers::list_permissions).post(handlers::create_permission),
        )
        .route(
            "/permissions/{tier}/{id}",
            get(handlers::get_permission)
                .patch(handlers::update_permission)
                .delete(handlers::delete_permission),
        )
}
