//! HTTP handlers for the permission registry.
//!
//! All routes carry the tier as a path segment, so each tier reads like
//! its own resource collection. Which rows a caller may touch follows
//! the authority matrix: managers everywhere, administrators inside
//! their department, grantees only on the services assigned to them.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::audit;
use crate::auth::{ensure_scope_authority, ActorScope};
use crate::error::{ApiError, ApiResult};

use super::models::{Permission, ScopeTier};
use super::queries;
use super::types::{CreatePermissionRequest, UpdatePermissionRequest};

/// GET .../permissions/{tier} - Permissions of one tier in caller scope
#[utoipa::path(
    get,
    path = "/api/manager/permissions/{tier}",
    tag = "permissions",
    params(("tier" = ScopeTier, Path, description = "Resource tier")),
    responses(
        (status = 200, description = "Permissions in scope", body = Vec<Permission>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_permissions(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(tier): Path<ScopeTier>,
) -> ApiResult<Json<Vec<Permission>>> {
    let permissions = match &scope {
        ActorScope::Manager { .. } => queries::list_permissions_by_tier(&state.db, tier).await?,
        ActorScope::Administrator { department_id, .. } => {
            queries::list_permissions_in_department(&state.db, tier, *department_id).await?
        }
        ActorScope::Grantee { grantee_id, .. } => {
            if tier != ScopeTier::Service {
                return Err(ApiError::Authorization(
                    "Grantees only hold service-tier permissions".into(),
                ));
            }
            queries::list_permissions_for_grantee(&state.db, *grantee_id).await?
        }
        ActorScope::Citizen { .. } => {
            return Err(ApiError::Authorization(
                "Not authorized to browse the permission registry".into(),
            ));
        }
    };

    Ok(Json(permissions))
}

/// GET .../permissions/{tier}/{id} - Permission detail
#[utoipa::path(
    get,
    path = "/api/manager/permissions/{tier}/{id}",
    tag = "permissions",
    params(
        ("tier" = ScopeTier, Path, description = "Resource tier"),
        ("id" = Uuid, Path, description = "Permission ID"),
    ),
    responses(
        (status = 200, description = "Permission", body = Permission),
        (status = 404, description = "Unknown permission at this tier"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_permission(
    State(state): State<AppState>,
    scope: ActorScope,
    Path((tier, permission_id)): Path<(ScopeTier, Uuid)>,
) -> ApiResult<Json<Permission>> {
    let permission = queries::find_permission(&state.db, tier, permission_id)
        .await?
        .ok_or(ApiError::NotFound("Permission"))?;

    ensure_scope_authority(&state.db, &scope, tier, permission.scope_target).await?;

    Ok(Json(permission))
}

/// POST .../permissions/{tier} - Create a permission
#[utoipa::path(
    post,
    path = "/api/manager/permissions/{tier}",
    tag = "permissions",
    params(("tier" = ScopeTier, Path, description = "Resource tier")),
    request_body = CreatePermissionRequest,
    responses(
        (status = 201, description = "Permission created", body = Permission),
        (status = 400, description = "Invalid window, unknown target or unknown citizens"),
        (status = 403, description = "Target outside the caller's scope"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, scope, request))]
pub async fn create_permission(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(tier): Path<ScopeTier>,
    Json(request): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<Permission>)> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if request.start_time >= request.end_time {
        return Err(ApiError::Validation(
            "start_time must be before end_time".into(),
        ));
    }

    if !scope_target_exists(&state, tier, request.scope_target).await? {
        return Err(ApiError::Validation(format!(
            "No {} exists with the given scope_target",
            tier.as_str()
        )));
    }

    ensure_scope_authority(&state.db, &scope, tier, request.scope_target).await?;

    let result = queries::create_permission(
        &state.db,
        tier,
        &request.name,
        &request.description,
        request.scope_target,
        request.start_time,
        request.end_time,
        &request.citizens,
    )
    .await;

    let permission = match result {
        Ok(permission) => permission,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_foreign_key_violation() => {
            return Err(ApiError::Validation(
                "One or more named citizens do not exist".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    audit::record(
        &state.db,
        &scope,
        "permission.create",
        Some("permission"),
        Some(permission.id),
        Some(serde_json::json!({ "tier": tier.as_str() })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(permission)))
}

/// PATCH .../permissions/{tier}/{id} - Update a permission
///
/// Window edits are revalidated against whichever bound is kept.
#[utoipa::path(
    patch,
    path = "/api/manager/permissions/{tier}/{id}",
    tag = "permissions",
    params(
        ("tier" = ScopeTier, Path, description = "Resource tier"),
        ("id" = Uuid, Path, description = "Permission ID"),
    ),
    request_body = UpdatePermissionRequest,
    responses(
        (status = 200, description = "Permission updated", body = Permission),
        (status = 400, description = "Window would invert"),
        (status = 404, description = "Unknown permission at this tier"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, scope, request))]
pub async fn update_permission(
    State(state): State<AppState>,
    scope: ActorScope,
    Path((tier, permission_id)): Path<(ScopeTier, Uuid)>,
    Json(request): Json<UpdatePermissionRequest>,
) -> ApiResult<Json<Permission>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let existing = queries::find_permission(&state.db, tier, permission_id)
        .await?
        .ok_or(ApiError::NotFound("Permission"))?;

    ensure_scope_authority(&state.db, &scope, tier, existing.scope_target).await?;

    let start_time = request.start_time.unwrap_or(existing.start_time);
    let end_time = request.end_time.unwrap_or(existing.end_time);
    if start_time >= end_time {
        return Err(ApiError::Validation(
            "start_time must be before end_time".into(),
        ));
    }

    let result = queries::update_permission(
        &state.db,
        permission_id,
        request.name.as_deref(),
        request.description.as_deref(),
        request.start_time,
        request.end_time,
        request.active,
        request.citizens.as_deref(),
    )
    .await;

    let permission = match result {
        Ok(Some(permission)) => permission,
        Ok(None) => return Err(ApiError::NotFound("Permission")),
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_foreign_key_violation() => {
            return Err(ApiError::Validation(
                "One or more named citizens do not exist".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    audit::record(
        &state.db,
        &scope,
        "permission.update",
        Some("permission"),
        Some(permission.id),
        Some(serde_json::json!({ "tier": tier.as_str() })),
    )
    .await;

    Ok(Json(permission))
}

/// DELETE .../permissions/{tier}/{id} - Delete a permission
///
/// Hard delete; grants never reference permissions, so nothing dangles.
#[utoipa::path(
    delete,
    path = "/api/manager/permissions/{tier}/{id}",
    tag = "permissions",
    params(
        ("tier" = ScopeTier, Path, description = "Resource tier"),
        ("id" = Uuid, Path, description = "Permission ID"),
    ),
    responses(
        (status = 204, description = "Permission deleted"),
        (status = 404, description = "Unknown permission at this tier"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, scope))]
pub async fn delete_permission(
    State(state): State<AppState>,
    scope: ActorScope,
    Path((tier, permission_id)): Path<(ScopeTier, Uuid)>,
) -> ApiResult<StatusCode> {
    let existing = queries::find_permission(&state.db, tier, permission_id)
        .await?
        .ok_or(ApiError::NotFound("Permission"))?;

    ensure_scope_authority(&state.db, &scope, tier, existing.scope_target).await?;

    if !queries::delete_permission(&state.db, permission_id).await? {
        return Err(ApiError::NotFound("Permission"));
    }

    audit::record(
        &state.db,
        &scope,
        "permission.delete",
        Some("permission"),
        Some(permission_id),
        Some(serde_json::json!({ "tier": tier.as_str() })),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn scope_target_exists(
    state: &AppState,
    tier: ScopeTier,
    target: Uuid,
) -> ApiResult<bool> {
    let found = match tier {
        ScopeTier::Department => crate::catalog::queries::find_department_by_id(&state.db, target)
            .await?
            .is_some(),
        ScopeTier::Association => {
            crate::catalog::queries::find_association_by_id(&state.db, target)
                .await?
                .is_some()
        }
        ScopeTier::Service => crate::catalog::queries::find_service_by_id(&state.db, target)
            .await?
            .is_some(),
    };

    Ok(found)
}
