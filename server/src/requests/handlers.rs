//! HTTP handlers for the access request workflow.
//!
//! A request is resolved exactly once. Approval and rejection both run
//! a compare-and-swap against the unresolved state, so two resolvers
//! racing on the same request produce one winner and one
//! `INVALID_STATE`; approval additionally writes the grant in the same
//! transaction, so no approved request is ever missing its grant.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::audit;
use crate::auth::{ensure_service_authority, ActorScope, AuthCitizen};
use crate::error::{ApiError, ApiResult};
use crate::grants::handlers::resolve_end_policy;
use crate::grants::{Grant, GrantView};

use super::models::AccessRequest;
use super::queries;
use super::types::{
    ApprovalResponse, ApproveAccessRequest, DeclineAccessRequest, SubmitAccessRequest,
};

// ============================================================================
// Citizen surface
// ============================================================================

/// POST /api/requests - Submit an access request
///
/// A hidden service answers exactly like a missing one, so citizens
/// cannot probe for services withdrawn from the directory.
#[utoipa::path(
    post,
    path = "/api/requests",
    tag = "requests",
    request_body = SubmitAccessRequest,
    responses(
        (status = 201, description = "Request submitted", body = AccessRequest),
        (status = 400, description = "Invalid fields or unknown service"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, citizen, request), fields(citizen_id = %citizen.id))]
pub async fn submit_request(
    State(state): State<AppState>,
    citizen: AuthCitizen,
    Json(request): Json<SubmitAccessRequest>,
) -> ApiResult<(StatusCode, Json<AccessRequest>)> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    crate::catalog::queries::find_visible_service_by_id(&state.db, request.service_id)
        .await?
        .ok_or_else(|| ApiError::Validation("Unknown or unavailable service".into()))?;

    let created = queries::create_request(
        &state.db,
        citizen.id,
        request.service_id,
        &request.subject,
        &request.message,
        serde_json::json!(request.attachments),
    )
    .await?;

    audit::record(
        &state.db,
        &ActorScope::Citizen {
            citizen_id: citizen.id,
        },
        "request.submit",
        Some("request"),
        Some(created.id),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/requests - The caller's own requests
#[utoipa::path(
    get,
    path = "/api/requests",
    tag = "requests",
    responses(
        (status = 200, description = "The caller's requests", body = Vec<AccessRequest>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_own_requests(
    State(state): State<AppState>,
    citizen: AuthCitizen,
) -> ApiResult<Json<Vec<AccessRequest>>> {
    let requests = queries::list_requests_for_citizen(&state.db, citizen.id).await?;
    Ok(Json(requests))
}

/// GET /api/requests/{id} - One of the caller's requests
#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    tag = "requests",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request", body = AccessRequest),
        (status = 404, description = "No such request of the caller's"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_own_request(
    State(state): State<AppState>,
    citizen: AuthCitizen,
    Path(request_id): Path<Uuid>,
) -> ApiResult<Json<AccessRequest>> {
    let request = queries::find_request_by_id(&state.db, request_id)
        .await?
        .ok_or(ApiError::NotFound("Request"))?;

    if request.citizen_id != citizen.id {
        return Err(ApiError::NotFound("Request"));
    }

    Ok(Json(request))
}

// ============================================================================
// Resolver surfaces
// ============================================================================

/// GET .../requests - Requests in the caller's scope
#[utoipa::path(
    get,
    path = "/api/manager/requests",
    tag = "requests",
    responses(
        (status = 200, description = "Requests in scope", body = Vec<AccessRequest>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_requests(
    State(state): State<AppState>,
    scope: ActorScope,
) -> ApiResult<Json<Vec<AccessRequest>>> {
    let requests = match &scope {
        ActorScope::Manager { .. } => queries::list_requests(&state.db).await?,
        ActorScope::Administrator { department_id, .. } => {
            queries::list_requests_in_department(&state.db, *department_id).await?
        }
        ActorScope::Grantee { grantee_id, .. } => {
            queries::list_requests_for_grantee(&state.db, *grantee_id).await?
        }
        ActorScope::Citizen { .. } => {
            return Err(ApiError::Authorization(
                "Not authorized to browse requests".into(),
            ));
        }
    };

    Ok(Json(requests))
}

/// GET .../requests/{id} - Request detail on the resolver surfaces
#[utoipa::path(
    get,
    path = "/api/manager/requests/{id}",
    tag = "requests",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request", body = AccessRequest),
        (status = 404, description = "Unknown request"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_request(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(request_id): Path<Uuid>,
) -> ApiResult<Json<AccessRequest>> {
    let request = queries::find_request_by_id(&state.db, request_id)
        .await?
        .ok_or(ApiError::NotFound("Request"))?;

    ensure_resolver_authority(&state, &scope, request.service_id).await?;

    Ok(Json(request))
}

/// POST .../requests/{id}/approve - Approve a request
///
/// Resolves the request and writes the bound grant in one transaction.
#[utoipa::path(
    post,
    path = "/api/manager/requests/{id}/approve",
    tag = "requests",
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = ApproveAccessRequest,
    responses(
        (status = 200, description = "Request approved, grant issued", body = ApprovalResponse),
        (status = 400, description = "End policy missing or doubled"),
        (status = 403, description = "Service outside the caller's authority"),
        (status = 404, description = "Unknown request"),
        (status = 409, description = "Request already resolved"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, scope, request))]
pub async fn approve_request(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(request_id): Path<Uuid>,
    Json(request): Json<ApproveAccessRequest>,
) -> ApiResult<Json<ApprovalResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let end_date = resolve_end_policy(request.end_date, request.indefinite)?;

    let existing = queries::find_request_by_id(&state.db, request_id)
        .await?
        .ok_or(ApiError::NotFound("Request"))?;

    ensure_resolver_authority(&state, &scope, existing.service_id).await?;

    if existing.is_resolved() {
        return Err(already_resolved(&existing));
    }

    let now = Utc::now();
    let mut tx = state.db.begin().await?;

    // Compare-and-swap on the unresolved state; a concurrent resolver
    // makes this return no row.
    let resolved = sqlx::query_as::<_, AccessRequest>(
        r"
        UPDATE requests
        SET granted = TRUE, response_message = $2, updated_at = NOW()
        WHERE id = $1 AND granted = FALSE AND decline = FALSE
        RETURNING id, citizen_id, service_id, subject, message, attachments,
                  granted, decline, response_message, created_at, updated_at
        ",
    )
    .bind(request_id)
    .bind(&request.response_message)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(resolved) = resolved else {
        drop(tx);
        return match queries::find_request_by_id(&state.db, request_id).await? {
            Some(racer) => Err(already_resolved(&racer)),
            None => Err(ApiError::NotFound("Request")),
        };
    };

    let grantee_id = match &scope {
        ActorScope::Grantee { grantee_id, .. } => Some(*grantee_id),
        _ => None,
    };

    let grant = sqlx::query_as::<_, Grant>(
        r"
        INSERT INTO grants (id, request_id, grantee_id, granted, start_date, end_date, amount, message)
        VALUES ($1, $2, $3, TRUE, $4, $5, $6, $7)
        RETURNING id, request_id, grantee_id, granted, decline, start_date, end_date,
                  amount, message, created_at, updated_at
        ",
    )
    .bind(Uuid::now_v7())
    .bind(request_id)
    .bind(grantee_id)
    .bind(now)
    .bind(end_date)
    .bind(request.amount)
    .bind(request.message.as_deref().unwrap_or(""))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    audit::record(
        &state.db,
        &scope,
        "request.approve",
        Some("request"),
        Some(request_id),
        Some(serde_json::json!({ "grant_id": grant.id })),
    )
    .await;

    Ok(Json(ApprovalResponse {
        request: resolved,
        grant: GrantView::from_grant(grant, now),
    }))
}

/// POST .../requests/{id}/reject - Decline a request
///
/// Terminal like approval, but no grant is written.
#[utoipa::path(
    post,
    path = "/api/manager/requests/{id}/reject",
    tag = "requests",
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = DeclineAccessRequest,
    responses(
        (status = 200, description = "Request declined", body = AccessRequest),
        (status = 403, description = "Service outside the caller's authority"),
        (status = 404, description = "Unknown request"),
        (status = 409, description = "Request already resolved"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, scope, request))]
pub async fn reject_request(
    State(state): State<AppState>,
    scope: ActorScope,
    Path(request_id): Path<Uuid>,
    Json(request): Json<DeclineAccessRequest>,
) -> ApiResult<Json<AccessRequest>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let existing = queries::find_request_by_id(&state.db, request_id)
        .await?
        .ok_or(ApiError::NotFound("Request"))?;

    ensure_resolver_authority(&state, &scope, existing.service_id).await?;

    if existing.is_resolved() {
        return Err(already_resolved(&existing));
    }

    let resolved = sqlx::query_as::<_, AccessRequest>(
        r"
        UPDATE requests
        SET decline = TRUE, response_message = $2, updated_at = NOW()
        WHERE id = $1 AND granted = FALSE AND decline = FALSE
        RETURNING id, citizen_id, service_id, subject, message, attachments,
                  granted, decline, response_message, created_at, updated_at
        ",
    )
    .bind(request_id)
    .bind(&request.response_message)
    .fetch_optional(&state.db)
    .await?;

    let Some(resolved) = resolved else {
        return match queries::find_request_by_id(&state.db, request_id).await? {
            Some(racer) => Err(already_resolved(&racer)),
            None => Err(ApiError::NotFound("Request")),
        };
    };

    audit::record(
        &state.db,
        &scope,
        "request.reject",
        Some("request"),
        Some(request_id),
        None,
    )
    .await;

    Ok(Json(resolved))
}

fn already_resolved(request: &AccessRequest) -> ApiError {
    ApiError::InvalidState(format!("Request already {}", request.state().as_str()))
}

/// Resolution authority follows the target service; citizens hold none.
async fn ensure_resolver_authority(
    state: &AppState,
    scope: &ActorScope,
    service_id: Uuid,
) -> ApiResult<()> {
    if !scope.is_resolver() {
        return Err(ApiError::Authorization(
            "Not authorized to resolve requests".into(),
        ));
    }
    ensure_service_authority(&state.db, scope, service_id).await
}
