//! HTTP handlers for access checks.
//!
//! Both endpoints are read-only: they prefetch the rows the evaluator
//! needs and return its decision. A service id with no ancestor chain
//! produces a plain deny, not an error, so the gateway can treat every
//! answer uniformly.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::{AuthCitizen, ManagerContext};
use crate::error::ApiResult;

use super::evaluator::evaluate_access;
use super::models::AccessDecision;
use super::types::AccessCheckRequest;

/// POST /api/manager/access/check - Evaluate access for any pair
///
/// The gateway calls this before proxying traffic to a restricted
/// service.
#[utoipa::path(
    post,
    path = "/api/manager/access/check",
    tag = "access",
    request_body = AccessCheckRequest,
    responses(
        (status = 200, description = "Access decision", body = AccessDecision),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(
    skip(state, _manager, request),
    fields(citizen_id = %request.citizen_id, service_id = %request.service_id)
)]
pub async fn check_access(
    State(state): State<AppState>,
    _manager: ManagerContext,
    Json(request): Json<AccessCheckRequest>,
) -> ApiResult<Json<AccessDecision>> {
    let decision = decide(&state, request.citizen_id, request.service_id).await?;
    Ok(Json(decision))
}

/// GET /api/access/services/{id} - The caller's own standing
///
/// Lets a citizen see whether a service would admit them right now,
/// and through which rule.
#[utoipa::path(
    get,
    path = "/api/access/services/{id}",
    tag = "access",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Access decision", body = AccessDecision),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, citizen), fields(citizen_id = %citizen.id))]
pub async fn check_my_access(
    State(state): State<AppState>,
    citizen: AuthCitizen,
    Path(service_id): Path<Uuid>,
) -> ApiResult<Json<AccessDecision>> {
    let decision = decide(&state, citizen.id, service_id).await?;
    Ok(Json(decision))
}

/// Prefetch the evaluator's inputs and run it once at the current
/// instant. Session opening runs the same gate.
#[tracing::instrument(skip(state))]
pub(crate) async fn decide(
    state: &AppState,
    citizen_id: Uuid,
    service_id: Uuid,
) -> ApiResult<AccessDecision> {
    let Some(chain) = crate::catalog::queries::resolve_service_chain(&state.db, service_id).await?
    else {
        return Ok(AccessDecision::deny());
    };

    let permissions = crate::permissions::queries::find_candidate_permissions(
        &state.db,
        citizen_id,
        chain.service_id,
        chain.association_id,
        chain.department_id,
    )
    .await?;

    let grants =
        crate::grants::queries::list_grants_for_citizen_service(&state.db, citizen_id, service_id)
            .await?;

    Ok(evaluate_access(
        citizen_id,
        Some(&chain),
        &permissions,
        &grants,
        Utc::now(),
    ))
}
