//! API Router and Application State
//!
//! Central routing configuration and shared state. Routes are grouped
//! into four role surfaces; the shared handlers behind the grantee,
//! administrator and manager surfaces scope their answers by the actor
//! the surface middleware resolved.

pub mod docs;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    access, actors, audit, auth, catalog, config::Config, grants, permissions, requests, sessions,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Server configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Citizen surface: any account the gateway vouches for.
    let citizen_routes = Router::new()
        .route("/me", get(actors::handlers::my_profile))
        .merge(catalog::directory_router())
        .merge(requests::citizen_router())
        .merge(grants::citizen_router())
        .route(
            "/access/services/{id}",
            get(access::handlers::check_my_access),
        );

    // Grantee surface: resolution and service-tier permissions for
    // their assigned services.
    let grantee_routes = Router::new()
        .route("/me", get(actors::handlers::my_grantee_record))
        .route("/services", get(catalog::handlers::list_services))
        .route("/services/{id}", get(catalog::handlers::get_service))
        .merge(requests::resolver_router())
        .merge(grants::resolver_router())
        .merge(permissions::router())
        .layer(from_fn_with_state(state.clone(), auth::require_grantee));

    // Administrator surface: everything under their department.
    let admin_routes = Router::new()
        .route(
            "/me",
            get(actors::handlers::my_administrator_record)
                .patch(actors::handlers::update_my_administrator_record),
        )
        .route("/department", get(catalog::handlers::my_department))
        .merge(catalog::association_router())
        .merge(catalog::service_router())
        .merge(actors::grantee_router())
        .merge(requests::resolver_router())
        .merge(grants::resolver_router())
        .merge(permissions::router())
        .merge(audit::router())
        .route("/sessions", get(sessions::handlers::list_sessions))
        .layer(from_fn_with_state(state.clone(), auth::require_administrator));

    // Manager surface: the unrestricted instance plus gateway plumbing.
    let manager_routes = Router::new()
        .route(
            "/me",
            get(actors::handlers::my_manager_record)
                .patch(actors::handlers::update_my_manager_record),
        )
        .route("/citizens", get(actors::handlers::list_citizens))
        .merge(catalog::department_router())
        .merge(catalog::association_router())
        .merge(catalog::service_router())
        .merge(actors::grantee_router())
        .merge(actors::administrator_router())
        .merge(requests::resolver_router())
        .merge(grants::resolver_router())
        .merge(permissions::router())
        .merge(audit::router())
        .merge(sessions::manager_router())
        .route("/access/check", post(access::handlers::check_access))
        .layer(from_fn_with_state(state.clone(), auth::require_manager));

    // Every surface sits behind gateway-token authentication.
    let protected_routes = Router::new()
        .nest("/api", citizen_routes)
        .nest("/api/grantee", grantee_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/manager", manager_routes)
        .layer(from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Role surfaces
        .merge(protected_routes)
        // API documentation
        .merge(docs::router())
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Build version
    version: &'static str,
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
