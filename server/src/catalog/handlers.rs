//! HTTP handlers for the resource hierarchy.
//!
//! The same handler serves every role surface it is mounted under; the
//! extracted [`ActorScope`] decides which rows the caller sees and which
//! nodes they may change. Department writes are manager-only,
//! associations and services are also writable by the administrator of
//! the owning department.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::audit;
use crate::auth::{
    ensure_association_authority, ensure_service_authority, ActorScope, AdminContext, AuthCitizen,
};
use crate::error::{ApiError, ApiResult};

use super::models::{Association, Department, Service};
use super::queries;
use super::types::{
    AssignGranteeRequest, CreateAssociationRequest, CreateDepartmentRequest, CreateServiceRequest,
    UpdateAssociationRequest, UpdateDepartmentRequest, UpdateServiceRequest,
};

// ============================================================================
// Citizen directory
// ============================================================================

/// GET /api/departments - Public department directory
#[utoipa::path(
    get,
    path = "/api/departments",
    tag = "catalog",
    responses(
        (status = 200, description = "All departments", body = Vec<Department>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_departments_directory(
    State(state): State<AppState>,
    _citizen: AuthCitizen,
) -> ApiResult<Json<Vec<Department>>> {
    let departments = queries::list_departments(&state.db).await?;
    Ok(Json(departments))
}

/// GET /api/services - Citizen-visible service directory
#[utoipa::path(
    get,
    path = "/api/services",
    tag = "catalog",
    responses(
        (status = 200, description = "Visible services", body = Vec<Service>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_services_directory(
    State(state): State<AppState>,
    _citizen: AuthCitizen,
) -> ApiResult<Json<Vec<Service>>> {
    let services = queries::list_visible_services(&state.db).await?;
    Ok(Json(services))
}

/// GET /api/services/{id} - Citizen view of one service
///
/// Hidden services answer 404 here; citizens cannot tell a hidden service
/// from a missing one.
#[utoipa::path(
    get,
    path = "/api/services/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service", body = Service),
        (status = 404, description = "Unknown or hidden service"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_service_directory(
    State(state): State<AppState>,
    _citizen: AuthCitizen,
    Path(service_id): Path<Uuid>,
) -> ApiResult<Json<Service>> {
    let service = queries::find_visible_service_by_id(&state.db, service_id)
        .await?
        .ok_or(ApiError::NotFound("Service"))?;

    Ok(Json(service))
}

// ============================================================================
// Departments
// ============================================================================

/// GET /api/manager/departments - List all departments
#[utoipa::path(
    get,
    path = "/api/manager/departments",
    tag = "catalog",
    responses(
        (status = 200, description = "All departments", body = Vec<Department>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_departments(
    State(state): State<AppState>,
    _scope: ActorScope,
) -> ApiResult<Json<Vec<Department>>> {
    let departments = queries::list_departments(&state.db).await?;
    Ok(Json(departments))
}

/// GET /api/manager/departments/{id} - Department detail
#[utoipa::path(
    get,
    path = "/api/manager/departments/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department", body = Department),
        (status = 404, description = "Unknown department"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_department(
    State(state): State<AppState>,
    _scope: ActorScope,
    Path(department_id): Path<Uuid>,
) -> ApiResult<Json<Department>> {
    let department = queries::find_department_by_id(&state.db, department_id)
        .await?
        .ok_or(ApiError::NotFound("Department"))?;

    Ok(Json(department))
}

/// GET /api/admin/department - The caller's own department
#[utoipa::path(
    get,
    path = "/api/admin/department",
    tag = "catalog",
    responses(
        (status = 200, description = "Department run by the caller", body = Department),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn my_department(
    State(state): State<AppState>,
    admin: AdminContext,
) -> ApiResult<Json<Department>> {
    let department = queries::find_department_by_id(&state.db, admin.department_id)
        .await?
        .ok_or(ApiError::NotFound("Department"))?;

    Ok(Json(department))
}

/// POST /api/manager/departments - Create a department
#[utoipa::path(
    post,
    path = "/api/manager/departments",
    tag = "catalog",
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 400, description = "Invalid or duplicate fields"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn create_department(
    State(state): State<AppState>,
    scope: ActorScope,
    Json(request): Json<CreateDepartmentRequest>,
) -> ApiResult<(StatusCode, Json<Department>)> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if let Some(administrator_id) = request.administrator_id {
        crate::actors::queries::find_administrator_by_id(&state.db, administrator_id)
            .await?
            .ok_or(ApiError::NotFound("Administrator"))?;
    }

    let result = queries::create_department(
        &state.db,
        &request.title,
        &request.description,
        &request.email,
        &request.telephone,
        &request.website,
        request.administrator_id,
    )
    .await;

    let department = match result {
        Ok(department) => department,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            return Err(ApiError::Validation(
                "Department title, email, telephone or website already in use".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    audit::record(
        &state.db,
        &scope,
        "department.create",
        Some("department"),
        Some(department.id),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(department)))
}

/// PATCH /api/manager/departments/{id} - Update a department
#[utoipa::path(
    patch,
    path = "/api/manager/departments/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Department ID")),
    request_body = UpdateDepartmentRequest,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 404, description = "Unknown department"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn update_department(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(department_id): Path<Uuid>,
    Json(request): Json<UpdateDepartmentRequest>,
) -> ApiResult<Json<Department>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if let Some(Some(administrator_id)) = request.administrator_id {
        crate::actors::queries::find_administrator_by_id(&state.db, administrator_id)
            .await?
            .ok_or(ApiError::NotFound("Administrator"))?;
    }

    let result = queries::update_department(
        &state.db,
        department_id,
        request.title.as_deref(),
        request.description.as_deref(),
        request.email.as_deref(),
        request.telephone.as_deref(),
        request.website.as_deref(),
        request.administrator_id,
    )
    .await;

    let department = match result {
        Ok(Some(department)) => department,
        Ok(None) => return Err(ApiError::NotFound("Department")),
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            return Err(ApiError::Validation(
                "Department title, email, telephone or website already in use".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    audit::record(
        &state.db,
        &scope,
        "department.update",
        Some("department"),
        Some(department.id),
        None,
    )
    .await;

    Ok(Json(department))
}

/// DELETE /api/manager/departments/{id} - Delete a department
#[utoipa::path(
    delete,
    path = "/api/manager/departments/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 404, description = "Unknown department"),
        (status = 409, description = "Department still has associations"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn delete_department(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(department_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = match queries::delete_department(&state.db, department_id).await {
        Ok(deleted) => deleted,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_foreign_key_violation() => {
            return Err(ApiError::InvalidState(
                "Department still has associations".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if !deleted {
        return Err(ApiError::NotFound("Department"));
    }

    audit::record(
        &state.db,
        &scope,
        "department.delete",
        Some("department"),
        Some(department_id),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Associations
// ============================================================================

/// GET /api/manager/associations, /api/admin/associations
///
/// Managers see every association, administrators those under their
/// department.
#[utoipa::path(
    get,
    path = "/api/manager/associations",
    tag = "catalog",
    responses(
        (status = 200, description = "Associations in scope", body = Vec<Association>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_associations(
    State(state): State<AppState>,
    scope: ActorScope,
) -> ApiResult<Json<Vec<Association>>> {
    let associations = match &scope {
        ActorScope::Administrator { department_id, .. } => {
            queries::list_associations_in_department(&state.db, *department_id).await?
        }
        _ => queries::list_associations(&state.db).await?,
    };

    Ok(Json(associations))
}

/// GET .../associations/{id} - Association detail
#[utoipa::path(
    get,
    path = "/api/manager/associations/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Association ID")),
    responses(
        (status = 200, description = "Association", body = Association),
        (status = 404, description = "Unknown association"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_association(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(association_id): Path<Uuid>,
) -> ApiResult<Json<Association>> {
    let association = queries::find_association_by_id(&state.db, association_id)
        .await?
        .ok_or(ApiError::NotFound("Association"))?;

    if let ActorScope::Administrator { department_id, .. } = &scope {
        if association.department_id != *department_id {
            return Err(ApiError::Authorization(
                "Not authorized to manage this association".into(),
            ));
        }
    }

    Ok(Json(association))
}

/// POST .../associations - Create an association
#[utoipa::path(
    post,
    path = "/api/manager/associations",
    tag = "catalog",
    request_body = CreateAssociationRequest,
    responses(
        (status = 201, description = "Association created", body = Association),
        (status = 400, description = "Invalid or duplicate fields"),
        (status = 403, description = "Department outside the caller's scope"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn create_association(
    State(state): State<AppState>,
    scope: ActorScope,
    Json(request): Json<CreateAssociationRequest>,
) -> ApiResult<(StatusCode, Json<Association>)> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    queries::find_department_by_id(&state.db, request.department_id)
        .await?
        .ok_or(ApiError::NotFound("Department"))?;

    crate::auth::ensure_department_authority(&scope, request.department_id)?;

    let result = queries::create_association(
        &state.db,
        &request.title,
        &request.email,
        request.website.as_deref(),
        request.department_id,
    )
    .await;

    let association = match result {
        Ok(association) => association,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            return Err(ApiError::Validation(
                "Association title or email already in use".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    audit::record(
        &state.db,
        &scope,
        "association.create",
        Some("association"),
        Some(association.id),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(association)))
}

/// PATCH .../associations/{id} - Update an association
#[utoipa::path(
    patch,
    path = "/api/manager/associations/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Association ID")),
    request_body = UpdateAssociationRequest,
    responses(
        (status = 200, description = "Association updated", body = Association),
        (status = 404, description = "Unknown association"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn update_association(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(association_id): Path<Uuid>,
    Json(request): Json<UpdateAssociationRequest>,
) -> ApiResult<Json<Association>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    ensure_association_authority(&state.db, &scope, association_id).await?;

    let result = queries::update_association(
        &state.db,
        association_id,
        request.title.as_deref(),
        request.email.as_deref(),
        request.website.as_deref(),
    )
    .await;

    let association = match result {
        Ok(Some(association)) => association,
        Ok(None) => return Err(ApiError::NotFound("Association")),
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            return Err(ApiError::Validation(
                "Association title or email already in use".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    audit::record(
        &state.db,
        &scope,
        "association.update",
        Some("association"),
        Some(association.id),
        None,
    )
    .await;

    Ok(Json(association))
}

/// DELETE .../associations/{id} - Delete an association
#[utoipa::path(
    delete,
    path = "/api/manager/associations/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Association ID")),
    responses(
        (status = 204, description = "Association deleted"),
        (status = 404, description = "Unknown association"),
        (status = 409, description = "Association still has services or grantees"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn delete_association(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(association_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ensure_association_authority(&state.db, &scope, association_id).await?;

    let deleted = match queries::delete_association(&state.db, association_id).await {
        Ok(deleted) => deleted,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_foreign_key_violation() => {
            return Err(ApiError::InvalidState(
                "Association still has services or grantees".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if !deleted {
        return Err(ApiError::NotFound("Association"));
    }

    audit::record(
        &state.db,
        &scope,
        "association.delete",
        Some("association"),
        Some(association_id),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Services
// ============================================================================

/// GET .../services on the role surfaces
///
/// Managers see everything, administrators the services under their
/// department, grantees the services assigned to them.
#[utoipa::path(
    get,
    path = "/api/manager/services",
    tag = "catalog",
    responses(
        (status = 200, description = "Services in scope", body = Vec<Service>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_services(
    State(state): State<AppState>,
    scope: ActorScope,
) -> ApiResult<Json<Vec<Service>>> {
    let services = match &scope {
        ActorScope::Administrator { department_id, .. } => {
            queries::list_services_in_department(&state.db, *department_id).await?
        }
        ActorScope::Grantee { grantee_id, .. } => {
            queries::list_services_for_grantee(&state.db, *grantee_id).await?
        }
        _ => queries::list_services(&state.db).await?,
    };

    Ok(Json(services))
}

/// GET .../services/{id} - Service detail on the role surfaces
#[utoipa::path(
    get,
    path = "/api/manager/services/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service", body = Service),
        (status = 404, description = "Unknown service"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_service(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(service_id): Path<Uuid>,
) -> ApiResult<Json<Service>> {
    let service = queries::find_service_by_id(&state.db, service_id)
        .await?
        .ok_or(ApiError::NotFound("Service"))?;

    ensure_service_authority(&state.db, &scope, service_id).await?;

    Ok(Json(service))
}

/// POST .../services - Create a service
#[utoipa::path(
    post,
    path = "/api/manager/services",
    tag = "catalog",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service created", body = Service),
        (status = 400, description = "Invalid or duplicate fields"),
        (status = 403, description = "Association outside the caller's scope"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn create_service(
    State(state): State<AppState>,
    scope: ActorScope,
    Json(request): Json<CreateServiceRequest>,
) -> ApiResult<(StatusCode, Json<Service>)> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    queries::find_association_by_id(&state.db, request.association_id)
        .await?
        .ok_or(ApiError::NotFound("Association"))?;

    ensure_association_authority(&state.db, &scope, request.association_id).await?;

    let result = queries::create_service(
        &state.db,
        &request.title,
        &request.machine_name,
        &request.description,
        &request.email,
        &request.url,
        request.association_id,
        request.restricted,
        request.visibility,
    )
    .await;

    let service = match result {
        Ok(service) => service,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            return Err(ApiError::Validation(
                "Service title, machine name or URL already in use".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    audit::record(
        &state.db,
        &scope,
        "service.create",
        Some("service"),
        Some(service.id),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(service)))
}

/// PATCH .../services/{id} - Update a service
#[utoipa::path(
    patch,
    path = "/api/manager/services/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Service updated", body = Service),
        (status = 404, description = "Unknown service"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn update_service(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(service_id): Path<Uuid>,
    Json(request): Json<UpdateServiceRequest>,
) -> ApiResult<Json<Service>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    queries::find_service_by_id(&state.db, service_id)
        .await?
        .ok_or(ApiError::NotFound("Service"))?;

    ensure_service_update_authority(&state.db, &scope, service_id).await?;

    let result = queries::update_service(
        &state.db,
        service_id,
        request.title.as_deref(),
        request.description.as_deref(),
        request.email.as_deref(),
        request.url.as_deref(),
        request.restricted,
        request.visibility,
    )
    .await;

    let service = match result {
        Ok(Some(service)) => service,
        Ok(None) => return Err(ApiError::NotFound("Service")),
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            return Err(ApiError::Validation(
                "Service title or URL already in use".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    audit::record(
        &state.db,
        &scope,
        "service.update",
        Some("service"),
        Some(service.id),
        None,
    )
    .await;

    Ok(Json(service))
}

/// DELETE .../services/{id} - Delete a service
#[utoipa::path(
    delete,
    path = "/api/manager/services/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 204, description = "Service deleted"),
        (status = 404, description = "Unknown service"),
        (status = 409, description = "Service still referenced by requests or sessions"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn delete_service(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(service_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ensure_service_update_authority(&state.db, &scope, service_id).await?;

    let deleted = match queries::delete_service(&state.db, service_id).await {
        Ok(deleted) => deleted,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_foreign_key_violation() => {
            return Err(ApiError::InvalidState(
                "Service still referenced by requests or sessions".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if !deleted {
        return Err(ApiError::NotFound("Service"));
    }

    audit::record(
        &state.db,
        &scope,
        "service.delete",
        Some("service"),
        Some(service_id),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Service grantee assignment
// ============================================================================

/// POST .../services/{id}/grantees - Assign a grantee to a service
#[utoipa::path(
    post,
    path = "/api/manager/services/{id}/grantees",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = AssignGranteeRequest,
    responses(
        (status = 204, description = "Grantee assigned"),
        (status = 404, description = "Unknown service or grantee"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn assign_grantee(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(service_id): Path<Uuid>,
    Json(request): Json<AssignGranteeRequest>,
) -> ApiResult<StatusCode> {
    queries::find_service_by_id(&state.db, service_id)
        .await?
        .ok_or(ApiError::NotFound("Service"))?;

    ensure_service_update_authority(&state.db, &scope, service_id).await?;

    crate::actors::queries::find_grantee_by_id(&state.db, request.grantee_id)
        .await?
        .ok_or(ApiError::NotFound("Grantee"))?;

    queries::assign_grantee_to_service(&state.db, service_id, request.grantee_id).await?;

    audit::record(
        &state.db,
        &scope,
        "service.assign_grantee",
        Some("service"),
        Some(service_id),
        Some(serde_json::json!({ "grantee_id": request.grantee_id })),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE .../services/{id}/grantees/{grantee_id} - Unassign a grantee
#[utoipa::path(
    delete,
    path = "/api/manager/services/{id}/grantees/{grantee_id}",
    tag = "catalog",
    params(
        ("id" = Uuid, Path, description = "Service ID"),
        ("grantee_id" = Uuid, Path, description = "Grantee ID"),
    ),
    responses(
        (status = 204, description = "Grantee unassigned"),
        (status = 404, description = "No such assignment"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn remove_grantee(
    State(state): State<AppState>,
    scope: ActorScope,
    Path((service_id, grantee_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    ensure_service_update_authority(&state.db, &scope, service_id).await?;

    if !queries::remove_grantee_from_service(&state.db, service_id, grantee_id).await? {
        return Err(ApiError::NotFound("Assignment"));
    }

    audit::record(
        &state.db,
        &scope,
        "service.remove_grantee",
        Some("service"),
        Some(service_id),
        Some(serde_json::json!({ "grantee_id": grantee_id })),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Catalog writes on a service exclude grantees; only the department
/// administrator or the manager may change the row itself.
async fn ensure_service_update_authority(
    pool: &sqlx::PgPool,
    scope: &ActorScope,
    service_id: Uuid,
) -> ApiResult<()> {
    match scope {
        ActorScope::Citizen { .. } | ActorScope::Grantee { .. } => Err(ApiError::Authorization(
            "Not authorized to manage this service".into(),
        )),
        _ => ensure_service_authority(pool, scope, service_id).await,
    }
}
