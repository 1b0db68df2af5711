//! HTTP handlers for the actor directory.
//!
//! Grantee and administrator records are managed here. The site manager
//! may create and remove either role anywhere; an administrator may only
//! register grantees under their own department, and no more of them
//! than their grantee limit allows.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::audit;
use crate::auth::{ActorScope, AdminContext, AuthCitizen, GranteeContext, ManagerContext};
use crate::error::{ApiError, ApiResult};

use super::models::{Administrator, Citizen, Grantee, SiteManager};
use super::queries;
use super::types::{
    CreateAdministratorRequest, CreateGranteeRequest, UpdateAdministratorRequest,
    UpdateGranteeRequest, UpdateManagerRequest,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

// ============================================================================
// Self views
// ============================================================================

/// GET /api/me - The citizen account behind the gateway token
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "actors",
    responses(
        (status = 200, description = "Citizen profile", body = Citizen),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn my_profile(
    State(state): State<AppState>,
    citizen: AuthCitizen,
) -> ApiResult<Json<Citizen>> {
    let profile = queries::find_citizen_by_id(&state.db, citizen.id)
        .await?
        .ok_or(ApiError::NotFound("Citizen"))?;

    Ok(Json(profile))
}

/// GET /api/grantee/me - The caller's grantee record
#[utoipa::path(
    get,
    path = "/api/grantee/me",
    tag = "actors",
    responses(
        (status = 200, description = "Grantee record", body = Grantee),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn my_grantee_record(ctx: GranteeContext) -> Json<Grantee> {
    Json(ctx.grantee)
}

/// GET /api/admin/me - The caller's administrator record
#[utoipa::path(
    get,
    path = "/api/admin/me",
    tag = "actors",
    responses(
        (status = 200, description = "Administrator record", body = Administrator),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn my_administrator_record(ctx: AdminContext) -> Json<Administrator> {
    Json(ctx.administrator)
}

/// PATCH /api/admin/me - Update the caller's administrator record
///
/// The grantee limit is set by the site manager and cannot be raised
/// from here.
#[utoipa::path(
    patch,
    path = "/api/admin/me",
    tag = "actors",
    request_body = UpdateAdministratorRequest,
    responses(
        (status = 200, description = "Administrator updated", body = Administrator),
        (status = 403, description = "Attempted to change the grantee limit"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn update_my_administrator_record(
    State(state): State<AppState>,
    ctx: AdminContext,
    Json(request): Json<UpdateAdministratorRequest>,
) -> ApiResult<Json<Administrator>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if request.grantee_limit.is_some() {
        return Err(ApiError::Authorization(
            "Grantee limit is set by the site manager".into(),
        ));
    }

    let administrator = apply_administrator_update(&state, ctx.administrator.id, &request).await?;

    audit::record(
        &state.db,
        &ActorScope::Administrator {
            administrator_id: ctx.administrator.id,
            department_id: ctx.department_id,
        },
        "administrator.update",
        Some("administrator"),
        Some(administrator.id),
        None,
    )
    .await;

    Ok(Json(administrator))
}

/// GET /api/manager/me - The site manager record
#[utoipa::path(
    get,
    path = "/api/manager/me",
    tag = "actors",
    responses(
        (status = 200, description = "Site manager record", body = SiteManager),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn my_manager_record(ctx: ManagerContext) -> Json<SiteManager> {
    Json(ctx.manager)
}

/// PATCH /api/manager/me - Update the site manager's contact details
#[utoipa::path(
    patch,
    path = "/api/manager/me",
    tag = "actors",
    request_body = UpdateManagerRequest,
    responses(
        (status = 200, description = "Site manager updated", body = SiteManager),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn update_my_manager_record(
    State(state): State<AppState>,
    ctx: ManagerContext,
    Json(request): Json<UpdateManagerRequest>,
) -> ApiResult<Json<SiteManager>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let result = queries::update_manager(
        &state.db,
        ctx.manager.id,
        request.username.as_deref(),
        request.first_email.as_deref(),
        request.second_email.as_deref(),
    )
    .await;

    let manager = match result {
        Ok(Some(manager)) => manager,
        Ok(None) => return Err(ApiError::NotFound("Site manager")),
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            return Err(ApiError::Validation(
                "Username or email already in use".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    audit::record(
        &state.db,
        &ActorScope::Manager {
            manager_id: manager.id,
        },
        "manager.update",
        Some("manager"),
        Some(manager.id),
        None,
    )
    .await;

    Ok(Json(manager))
}

// ============================================================================
// Citizens
// ============================================================================

/// GET /api/manager/citizens - Page through the citizen directory
#[utoipa::path(
    get,
    path = "/api/manager/citizens",
    tag = "actors",
    params(
        ("limit" = Option<i64>, Query, description = "Page size (max 200)"),
        ("offset" = Option<i64>, Query, description = "Page offset"),
    ),
    responses(
        (status = 200, description = "Citizens", body = Vec<Citizen>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_citizens(
    State(state): State<AppState>,
    _ctx: ManagerContext,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Citizen>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let citizens = queries::list_citizens(&state.db, limit, offset).await?;
    Ok(Json(citizens))
}

// ============================================================================
// Grantees
// ============================================================================

/// GET /api/manager/grantees, /api/admin/grantees
///
/// Managers see every grantee, administrators those registered under
/// their department.
#[utoipa::path(
    get,
    path = "/api/manager/grantees",
    tag = "actors",
    responses(
        (status = 200, description = "Grantees in scope", body = Vec<Grantee>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_grantees(
    State(state): State<AppState>,
    scope: ActorScope,
) -> ApiResult<Json<Vec<Grantee>>> {
    let grantees = match &scope {
        ActorScope::Administrator { department_id, .. } => {
            queries::list_grantees_in_department(&state.db, *department_id).await?
        }
        _ => queries::list_grantees(&state.db).await?,
    };

    Ok(Json(grantees))
}

/// POST .../grantees - Register a grantee
#[utoipa::path(
    post,
    path = "/api/manager/grantees",
    tag = "actors",
    request_body = CreateGranteeRequest,
    responses(
        (status = 201, description = "Grantee registered", body = Grantee),
        (status = 400, description = "Invalid fields or citizen already a grantee"),
        (status = 403, description = "Association outside the caller's department, or limit reached"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn create_grantee(
    State(state): State<AppState>,
    scope: ActorScope,
    Json(request): Json<CreateGranteeRequest>,
) -> ApiResult<(StatusCode, Json<Grantee>)> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    queries::find_citizen_by_id(&state.db, request.citizen_id)
        .await?
        .ok_or(ApiError::NotFound("Citizen"))?;

    let association =
        crate::catalog::queries::find_association_by_id(&state.db, request.association_id)
            .await?
            .ok_or(ApiError::NotFound("Association"))?;

    if let ActorScope::Administrator {
        administrator_id,
        department_id,
    } = &scope
    {
        if association.department_id != *department_id {
            return Err(ApiError::Authorization(
                "Not authorized to manage this association".into(),
            ));
        }

        let administrator = queries::find_administrator_by_id(&state.db, *administrator_id)
            .await?
            .ok_or(ApiError::NotFound("Administrator"))?;
        let registered = queries::count_grantees_in_department(&state.db, *department_id).await?;
        if registered >= i64::from(administrator.grantee_limit) {
            return Err(ApiError::Authorization(format!(
                "Grantee limit of {} reached for this department",
                administrator.grantee_limit
            )));
        }
    }

    let result = queries::create_grantee(
        &state.db,
        &request.username,
        request.citizen_id,
        request.association_id,
    )
    .await;

    let grantee = match result {
        Ok(grantee) => grantee,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            return Err(ApiError::Validation(
                "Citizen is already a grantee or username is taken".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    audit::record(
        &state.db,
        &scope,
        "grantee.create",
        Some("grantee"),
        Some(grantee.id),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(grantee)))
}

/// PATCH .../grantees/{id} - Update a grantee
#[utoipa::path(
    patch,
    path = "/api/manager/grantees/{id}",
    tag = "actors",
    params(("id" = Uuid, Path, description = "Grantee ID")),
    request_body = UpdateGranteeRequest,
    responses(
        (status = 200, description = "Grantee updated", body = Grantee),
        (status = 404, description = "Unknown grantee"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn update_grantee(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(grantee_id): Path<Uuid>,
    Json(request): Json<UpdateGranteeRequest>,
) -> ApiResult<Json<Grantee>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    ensure_grantee_authority(&state, &scope, grantee_id).await?;

    if let Some(association_id) = request.association_id {
        let association =
            crate::catalog::queries::find_association_by_id(&state.db, association_id)
                .await?
                .ok_or(ApiError::NotFound("Association"))?;

        if let ActorScope::Administrator { department_id, .. } = &scope {
            if association.department_id != *department_id {
                return Err(ApiError::Authorization(
                    "Not authorized to manage this association".into(),
                ));
            }
        }
    }

    let result = queries::update_grantee(
        &state.db,
        grantee_id,
        request.username.as_deref(),
        request.association_id,
    )
    .await;

    let grantee = match result {
        Ok(Some(grantee)) => grantee,
        Ok(None) => return Err(ApiError::NotFound("Grantee")),
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            return Err(ApiError::Validation("Username is taken".into()));
        }
        Err(e) => return Err(e.into()),
    };

    audit::record(
        &state.db,
        &scope,
        "grantee.update",
        Some("grantee"),
        Some(grantee.id),
        None,
    )
    .await;

    Ok(Json(grantee))
}

/// DELETE .../grantees/{id} - Remove a grantee
///
/// Grants already issued by them keep their nullable `grantee_id`
/// reference intact through the FK's SET NULL.
#[utoipa::path(
    delete,
    path = "/api/manager/grantees/{id}",
    tag = "actors",
    params(("id" = Uuid, Path, description = "Grantee ID")),
    responses(
        (status = 204, description = "Grantee removed"),
        (status = 404, description = "Unknown grantee"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn delete_grantee(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(grantee_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ensure_grantee_authority(&state, &scope, grantee_id).await?;

    if !queries::delete_grantee(&state.db, grantee_id).await? {
        return Err(ApiError::NotFound("Grantee"));
    }

    audit::record(
        &state.db,
        &scope,
        "grantee.delete",
        Some("grantee"),
        Some(grantee_id),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Administrators
// ============================================================================

/// GET /api/manager/administrators - All administrators
#[utoipa::path(
    get,
    path = "/api/manager/administrators",
    tag = "actors",
    responses(
        (status = 200, description = "Administrators", body = Vec<Administrator>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_administrators(
    State(state): State<AppState>,
    _ctx: ManagerContext,
) -> ApiResult<Json<Vec<Administrator>>> {
    let administrators = queries::list_administrators(&state.db).await?;
    Ok(Json(administrators))
}

/// POST /api/manager/administrators - Register an administrator
#[utoipa::path(
    post,
    path = "/api/manager/administrators",
    tag = "actors",
    request_body = CreateAdministratorRequest,
    responses(
        (status = 201, description = "Administrator registered", body = Administrator),
        (status = 400, description = "Invalid fields or citizen already an administrator"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn create_administrator(
    State(state): State<AppState>,
    ctx: ManagerContext,
    Json(request): Json<CreateAdministratorRequest>,
) -> ApiResult<(StatusCode, Json<Administrator>)> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    queries::find_citizen_by_id(&state.db, request.citizen_id)
        .await?
        .ok_or(ApiError::NotFound("Citizen"))?;

    let result = queries::create_administrator(
        &state.db,
        &request.username,
        request.citizen_id,
        &request.first_email,
        request.second_email.as_deref(),
        request.grantee_limit.unwrap_or(DEFAULT_GRANTEE_LIMIT),
    )
    .await;

    let administrator = match result {
        Ok(administrator) => administrator,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            return Err(ApiError::Validation(
                "Citizen is already an administrator, or username/email is taken".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    audit::record(
        &state.db,
        &ActorScope::Manager {
            manager_id: ctx.manager.id,
        },
        "administrator.create",
        Some("administrator"),
        Some(administrator.id),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(administrator)))
}

/// PATCH /api/manager/administrators/{id} - Update an administrator
#[utoipa::path(
    patch,
    path = "/api/manager/administrators/{id}",
    tag = "actors",
    params(("id" = Uuid, Path, description = "Administrator ID")),
    request_body = UpdateAdministratorRequest,
    responses(
        (status = 200, description = "Administrator updated", body = Administrator),
        (status = 404, description = "Unknown administrator"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn update_administrator(
    State(state): State<AppState>,
    ctx: ManagerContext,
    Path(administrator_id): Path<Uuid>,
    Json(request): Json<UpdateAdministratorRequest>,
) -> ApiResult<Json<Administrator>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let administrator = apply_administrator_update(&state, administrator_id, &request).await?;

    audit::record(
        &state.db,
        &ActorScope::Manager {
            manager_id: ctx.manager.id,
        },
        "administrator.update",
        Some("administrator"),
        Some(administrator.id),
        None,
    )
    .await;

    Ok(Json(administrator))
}

/// DELETE /api/manager/administrators/{id} - Remove an administrator
#[utoipa::path(
    delete,
    path = "/api/manager/administrators/{id}",
    tag = "actors",
    params(("id" = Uuid, Path, description = "Administrator ID")),
    responses(
        (status = 204, description = "Administrator removed"),
        (status = 404, description = "Unknown administrator"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn delete_administrator(
    State(state): State<AppState>,
    ctx: ManagerContext,
    Path(administrator_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !queries::delete_administrator(&state.db, administrator_id).await? {
        return Err(ApiError::NotFound("Administrator"));
    }

    audit::record(
        &state.db,
        &ActorScope::Manager {
            manager_id: ctx.manager.id,
        },
        "administrator.delete",
        Some("administrator"),
        Some(administrator_id),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helpers
// ============================================================================

const DEFAULT_GRANTEE_LIMIT: i32 = 5;

/// Administrators may only touch grantees registered under their own
/// department.
async fn ensure_grantee_authority(
    state: &AppState,
    scope: &ActorScope,
    grantee_id: Uuid,
) -> ApiResult<()> {
    let grantee = queries::find_grantee_by_id(&state.db, grantee_id)
        .await?
        .ok_or(ApiError::NotFound("Grantee"))?;

    match scope {
        ActorScope::Manager { .. } => Ok(()),
        ActorScope::Administrator { department_id, .. } => {
            let association =
                crate::catalog::queries::find_association_by_id(&state.db, grantee.association_id)
                    .await?
                    .ok_or(ApiError::NotFound("Association"))?;

            if association.department_id == *department_id {
                Ok(())
            } else {
                Err(ApiError::Authorization(
                    "Not authorized to manage this grantee".into(),
                ))
            }
        }
        _ => Err(ApiError::Authorization(
            "Not authorized to manage grantees".into(),
        )),
    }
}

async fn apply_administrator_update(
    state: &AppState,
    administrator_id: Uuid,
    request: &UpdateAdministratorRequest,
) -> ApiResult<Administrator> {
    let result = queries::update_administrator(
        &state.db,
        administrator_id,
        request.username.as_deref(),
        request.first_email.as_deref(),
        request.second_email.as_deref(),
        request.grantee_limit,
    )
    .await;

    match result {
        Ok(Some(administrator)) => Ok(administrator),
        Ok(None) => Err(ApiError::NotFound("Administrator")),
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => Err(
            ApiError::Validation("Username or email already in use".into()),
        ),
        Err(e) => Err(e.into()),
    }
}
