//! HTTP handlers for the grant ledger.
//!
//! The ledger is append-and-amend: extension and revocation rewrite the
//! end policy or the declined switch, nothing is ever deleted. Status is
//! derived at read time, so responses carry a [`GrantView`] stamped with
//! the status at this instant.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::api::AppState;
use crate::audit;
use crate::auth::{ensure_service_authority, ActorScope, AuthCitizen};
use crate::error::{ApiError, ApiResult};

use super::models::{Grant, GrantView};
use super::queries;
use super::types::ExtendGrantRequest;

// ============================================================================
// Citizen surface
// ============================================================================

/// GET /api/grants - Grants issued against the caller's requests
#[utoipa::path(
    get,
    path = "/api/grants",
    tag = "grants",
    responses(
        (status = 200, description = "The caller's grants", body = Vec<GrantView>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_own_grants(
    State(state): State<AppState>,
    citizen: AuthCitizen,
) -> ApiResult<Json<Vec<GrantView>>> {
    let now = Utc::now();
    let grants = queries::list_grants_for_citizen(&state.db, citizen.id).await?;

    let views = grants
        .into_iter()
        .map(|g| GrantView::from_grant(g, now))
        .collect();
    Ok(Json(views))
}

/// GET /api/grants/{id} - One of the caller's grants
#[utoipa::path(
    get,
    path = "/api/grants/{id}",
    tag = "grants",
    params(("id" = Uuid, Path, description = "Grant ID")),
    responses(
        (status = 200, description = "Grant", body = GrantView),
        (status = 404, description = "No such grant of the caller's"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_own_grant(
    State(state): State<AppState>,
    citizen: AuthCitizen,
    Path(grant_id): Path<Uuid>,
) -> ApiResult<Json<GrantView>> {
    let grant = queries::find_grant_by_id(&state.db, grant_id)
        .await?
        .ok_or(ApiError::NotFound("Grant"))?;

    let request_id = grant.request_id.ok_or(ApiError::NotFound("Grant"))?;
    let request = crate::requests::queries::find_request_by_id(&state.db, request_id)
        .await?
        .ok_or(ApiError::NotFound("Grant"))?;
    if request.citizen_id != citizen.id {
        return Err(ApiError::NotFound("Grant"));
    }

    Ok(Json(GrantView::from_grant(grant, Utc::now())))
}

// ============================================================================
// Resolver surfaces
// ============================================================================

/// GET .../grants - The ledger slice visible to the caller
#[utoipa::path(
    get,
    path = "/api/manager/grants",
    tag = "grants",
    responses(
        (status = 200, description = "Grants in scope", body = Vec<GrantView>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_grants(
    State(state): State<AppState>,
    scope: ActorScope,
) -> ApiResult<Json<Vec<GrantView>>> {
    let now = Utc::now();
    let grants = match &scope {
        ActorScope::Manager { .. } => queries::list_grants(&state.db).await?,
        ActorScope::Administrator { department_id, .. } => {
            queries::list_grants_in_department(&state.db, *department_id).await?
        }
        ActorScope::Grantee { grantee_id, .. } => {
            queries::list_grants_for_grantee(&state.db, *grantee_id).await?
        }
        ActorScope::Citizen { .. } => {
            return Err(ApiError::Authorization(
                "Not authorized to browse the grant ledger".into(),
            ));
        }
    };

    let views = grants
        .into_iter()
        .map(|g| GrantView::from_grant(g, now))
        .collect();
    Ok(Json(views))
}

/// GET .../grants/{id} - Grant detail on the resolver surfaces
#[utoipa::path(
    get,
    path = "/api/manager/grants/{id}",
    tag = "grants",
    params(("id" = Uuid, Path, description = "Grant ID")),
    responses(
        (status = 200, description = "Grant", body = GrantView),
        (status = 404, description = "Unknown grant"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_grant(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(grant_id): Path<Uuid>,
) -> ApiResult<Json<GrantView>> {
    let grant = queries::find_grant_by_id(&state.db, grant_id)
        .await?
        .ok_or(ApiError::NotFound("Grant"))?;

    ensure_grant_authority(&state, &scope, &grant).await?;

    Ok(Json(GrantView::from_grant(grant, Utc::now())))
}

/// POST .../grants/{id}/extend - Replace the end policy
///
/// Exactly one of `end_date` / `indefinite` must be given. Declined
/// grants cannot be extended.
#[utoipa::path(
    post,
    path = "/api/manager/grants/{id}/extend",
    tag = "grants",
    params(("id" = Uuid, Path, description = "Grant ID")),
    request_body = ExtendGrantRequest,
    responses(
        (status = 200, description = "Grant extended", body = GrantView),
        (status = 400, description = "End policy missing, doubled or inverted"),
        (status = 404, description = "Unknown grant"),
        (status = 409, description = "Grant already declined"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, scope, request))]
pub async fn extend_grant(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(grant_id): Path<Uuid>,
    Json(request): Json<ExtendGrantRequest>,
) -> ApiResult<Json<GrantView>> {
    let end_date = resolve_end_policy(request.end_date, request.indefinite)?;

    let grant = queries::find_grant_by_id(&state.db, grant_id)
        .await?
        .ok_or(ApiError::NotFound("Grant"))?;

    ensure_grant_authority(&state, &scope, &grant).await?;

    if let (Some(end), Some(start)) = (end_date, grant.start_date) {
        if end <= start {
            return Err(ApiError::Validation(
                "end_date must be after the grant's start_date".into(),
            ));
        }
    }

    let Some(updated) = queries::extend_grant(&state.db, grant_id, end_date).await? else {
        // The row was there a moment ago, so it was declined racing us.
        return Err(ApiError::InvalidState("Grant already declined".into()));
    };

    audit::record(
        &state.db,
        &scope,
        "grant.extend",
        Some("grant"),
        Some(grant_id),
        Some(serde_json::json!({ "end_date": end_date })),
    )
    .await;

    Ok(Json(GrantView::from_grant(updated, Utc::now())))
}

/// POST .../grants/{id}/revoke - Decline a grant
///
/// Declining is terminal; a second revoke reports the conflict.
#[utoipa::path(
    post,
    path = "/api/manager/grants/{id}/revoke",
    tag = "grants",
    params(("id" = Uuid, Path, description = "Grant ID")),
    responses(
        (status = 200, description = "Grant revoked", body = GrantView),
        (status = 404, description = "Unknown grant"),
        (status = 409, description = "Grant already declined"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, scope))]
pub async fn revoke_grant(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(grant_id): Path<Uuid>,
) -> ApiResult<Json<GrantView>> {
    let grant = queries::find_grant_by_id(&state.db, grant_id)
        .await?
        .ok_or(ApiError::NotFound("Grant"))?;

    ensure_grant_authority(&state, &scope, &grant).await?;

    let Some(updated) = queries::revoke_grant(&state.db, grant_id).await? else {
        return Err(ApiError::InvalidState("Grant already declined".into()));
    };

    audit::record(
        &state.db,
        &scope,
        "grant.revoke",
        Some("grant"),
        Some(grant_id),
        None,
    )
    .await;

    Ok(Json(GrantView::from_grant(updated, Utc::now())))
}

// ============================================================================
// Helpers
// ============================================================================

/// Exactly one of `end_date` / `indefinite` supplies the end policy.
pub fn resolve_end_policy(
    end_date: Option<chrono::DateTime<Utc>>,
    indefinite: bool,
) -> ApiResult<Option<chrono::DateTime<Utc>>> {
    match (end_date, indefinite) {
        (Some(end), false) => Ok(Some(end)),
        (None, true) => Ok(None),
        _ => Err(ApiError::Validation(
            "Provide exactly one of end_date or indefinite".into(),
        )),
    }
}

/// Authority over a grant follows the service its request targets. A
/// grant detached from any request is the manager's alone.
async fn ensure_grant_authority(
    state: &AppState,
    scope: &ActorScope,
    grant: &Grant,
) -> ApiResult<()> {
    if !scope.is_resolver() {
        return Err(ApiError::Authorization(
            "Not authorized to manage this grant".into(),
        ));
    }

    match grant.request_id {
        Some(request_id) => {
            let request = crate::requests::queries::find_request_by_id(&state.db, request_id)
                .await?
                .ok_or(ApiError::NotFound("Request"))?;
            ensure_service_authority(&state.db, scope, request.service_id).await
        }
        // A grant with no owning request only answers to the manager.
        None => match scope {
            ActorScope::Manager { .. } => Ok(()),
            _ => Err(ApiError::Authorization(
                "Not authorized to manage this grant".into(),
            )),
        },
    }
}
