//! OpenAPI document assembly.
//!
//! Aggregates every annotated handler into one spec served at
//! `/api-docs/openapi.json`. The document is public; the endpoints it
//! describes are not.

use axum::{routing::get, Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::actors::handlers::my_profile,
        crate::actors::handlers::my_grantee_record,
        crate::actors::handlers::my_administrator_record,
        crate::actors::handlers::update_my_administrator_record,
        crate::actors::handlers::my_manager_record,
        crate::actors::handlers::update_my_manager_record,
        crate::actors::handlers::list_citizens,
        crate::actors::handlers::list_grantees,
        crate::actors::handlers::create_grantee,
        crate::actors::handlers::update_grantee,
        crate::actors::handlers::delete_grantee,
        crate::actors::handlers::list_administrators,
        crate::actors::handlers::create_administrator,
        crate::actors::handlers::update_administrator,
        crate::actors::handlers::delete_administrator,
        crate::catalog::handlers::list_departments_directory,
        crate::catalog::handlers::list_services_directory,
        crate::catalog::handlers::get_service_directory,
        crate::catalog::handlers::list_departments,
        crate::catalog::handlers::get_department,
        crate::catalog::handlers::my_department,
        crate::catalog::handlers::create_department,
        crate::catalog::handlers::update_department,
        crate::catalog::handlers::delete_department,
        crate::catalog::handlers::list_associations,
        crate::catalog::handlers::get_association,
        crate::catalog::handlers::create_association,
        crate::catalog::handlers::update_association,
        crate::catalog::handlers::delete_association,
        crate::catalog::handlers::list_services,
        crate::catalog::handlers::get_service,
        crate::catalog::handlers::create_service,
        crate::catalog::handlers::update_service,
        crate::catalog::handlers::delete_service,
        crate::catalog::handlers::assign_grantee,
        crate::catalog::handlers::remove_grantee,
        crate::permissions::handlers::list_permissions,
        crate::permissions::handlers::get_permission,
        crate::permissions::handlers::create_permission,
        crate::permissions::handlers::update_permission,
        crate::permissions::handlers::delete_permission,
        crate::requests::handlers::submit_request,
        crate::requests::handlers::list_own_requests,
        crate::requests::handlers::get_own_request,
        crate::requests::handlers::list_requests,
        crate::requests::handlers::get_request,
        crate::requests::handlers::approve_request,
        crate::requests::handlers::reject_request,
        crate::grants::handlers::list_own_grants,
        crate::grants::handlers::get_own_grant,
        crate::grants::handlers::list_grants,
        crate::grants::handlers::get_grant,
        crate::grants::handlers::extend_grant,
        crate::grants::handlers::revoke_grant,
        crate::access::handlers::check_access,
        crate::access::handlers::check_my_access,
        crate::sessions::handlers::open_session,
        crate::sessions::handlers::touch_session,
        crate::sessions::handlers::force_expire_session,
        crate::sessions::handlers::list_sessions,
        crate::audit::handlers::list_audit_entries,
    ),
    components(schemas(
        crate::actors::models::Citizen,
        crate::actors::models::Grantee,
        crate::actors::models::Administrator,
        crate::actors::models::SiteManager,
        crate::actors::types::CreateGranteeRequest,
        crate::actors::types::UpdateGranteeRequest,
        crate::actors::types::CreateAdministratorRequest,
        crate::actors::types::UpdateAdministratorRequest,
        crate::actors::types::UpdateManagerRequest,
        crate::catalog::models::Department,
        crate::catalog::models::Association,
        crate::catalog::models::Service,
        crate::catalog::types::CreateDepartmentRequest,
        crate::catalog::types::UpdateDepartmentRequest,
        crate::catalog::types::CreateAssociationRequest,
        crate::catalog::types::UpdateAssociationRequest,
        crate::catalog::types::CreateServiceRequest,
        crate::catalog::types::UpdateServiceRequest,
        crate::catalog::types::AssignGranteeRequest,
        crate::permissions::models::Permission,
        crate::permissions::models::ScopeTier,
        crate::permissions::types::CreatePermissionRequest,
        crate::permissions::types::UpdatePermissionRequest,
        crate::requests::models::AccessRequest,
        crate::requests::models::RequestState,
        crate::requests::types::SubmitAccessRequest,
        crate::requests::types::ApproveAccessRequest,
        crate::requests::types::DeclineAccessRequest,
        crate::requests::types::ApprovalResponse,
        crate::grants::models::Grant,
        crate::grants::models::GrantStatus,
        crate::grants::models::GrantView,
        crate::grants::types::ExtendGrantRequest,
        crate::access::models::AccessDecision,
        crate::access::models::AccessSource,
        crate::access::types::AccessCheckRequest,
        crate::sessions::models::ServiceSession,
        crate::sessions::models::SessionView,
        crate::sessions::types::OpenSessionRequest,
        crate::audit::models::AuditEntry,
        crate::auth::ActorKind,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "actors", description = "Citizen accounts and role records"),
        (name = "catalog", description = "Departments, associations and services"),
        (name = "permissions", description = "Standing time-windowed permissions"),
        (name = "requests", description = "Access request workflow"),
        (name = "grants", description = "Grant ledger"),
        (name = "access", description = "Access evaluation"),
        (name = "sessions", description = "Gateway service sessions"),
        (name = "audit", description = "Audit log"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// API documentation routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/api-docs/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
