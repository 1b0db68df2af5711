//! Resource Hierarchy Module
//!
//! Departments own associations, associations own public services.
//! Permissions target a node of this tree; requests, grants and access
//! checks hang off individual services.

pub mod handlers;
pub mod models;
pub mod queries;
pub mod types;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::api::AppState;

pub use models::{Association, Department, Service, ServiceChain};

/// Citizen-facing directory: visible rows only.
pub fn directory_router() -> Router<AppState> {
    Router::new()
        .route("/departments", get(handlers::list_departments_directory))
        .route("/services", get(handlers::list_services_directory))
        .route("/services/{id}", get(handlers::get_service_directory))
}

/// Department CRUD, manager surface only.
pub fn department_router() -> Router<AppState> {
    Router::new()
        .route(
            "/departments",
            get(handlers::list_departments).post(handlers::create_department),
        )
        .route(
            "/departments/{id}",
            get(handlers::get_department)
                .patch(handlers::update_department)
                .delete(handlers::delete_department),
        )
}

/// Association CRUD, administrator and manager surfaces.
pub fn association_router() -> Router<AppState> {
    Router::new()
        .route(
            "/associations",
            get(handlers::list_associations).post(handlers::create_association),
        )
        .route(
            "/associations/{id}",
            get(handlers::get_association)
                .patch(handlers::update_association)
                .delete(handlers::delete_association),
        )
}

/// Service CRUD and grantee assignment, administrator and manager
/// surfaces.
pub fn service_router() -> Router<AppState> {
    Router::new()
        .route(
            "/services",
            get(handlers::list_services).post(handlers::create_service),
        )
        .route(
            "/services/{id}",
            get(handlers::get_service)
                .patch(handlers::update_service)
                .delete(handlers::delete_service),
        )
        .route("/services/{id}/grantees", post(handlers::assign_grantee))
        .route(
            "/services/{id}/grantees/{grantee_id}",
            delete(handlers::remove_grantee),
        )
}
