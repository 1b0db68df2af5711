//! HTTP handlers for service sessions.
//!
//! Sessions are opened and maintained by the gateway through the
//! manager surface. Opening runs the access evaluator first, so a
//! session only ever exists for a pair the evaluator admitted at the
//! time.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::actors::handlers::ListQuery;
use crate::api::AppState;
use crate::audit;
use crate::auth::{ActorScope, ManagerContext};
use crate::error::{ApiError, ApiResult};

use super::models::SessionView;
use super::queries;
use super::types::OpenSessionRequest;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// POST /api/manager/sessions - Open a session for an admitted citizen
#[utoipa::path(
    post,
    path = "/api/manager/sessions",
    tag = "sessions",
    request_body = OpenSessionRequest,
    responses(
        (status = 201, description = "Session opened", body = SessionView),
        (status = 400, description = "Malformed client address"),
        (status = 403, description = "The evaluator denies this pair"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(
    skip(state, manager, request),
    fields(citizen_id = %request.citizen_id, service_id = %request.service_id)
)]
pub async fn open_session(
    State(state): State<AppState>,
    manager: ManagerContext,
    Json(request): Json<OpenSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let decision = crate::access::handlers::decide(&state, request.citizen_id, request.service_id)
        .await?;
    if !decision.allowed {
        return Err(ApiError::Authorization(
            "Citizen does not currently have access to this service".into(),
        ));
    }

    let session = queries::create_session(
        &state.db,
        request.citizen_id,
        request.service_id,
        &request.ip_address,
    )
    .await?;

    audit::record(
        &state.db,
        &ActorScope::Manager {
            manager_id: manager.manager.id,
        },
        "session.open",
        Some("session"),
        Some(session.id),
        Some(serde_json::json!({
            "citizen_id": request.citizen_id,
            "service_id": request.service_id,
        })),
    )
    .await;

    let view = SessionView::from_session(session, Utc::now(), state.config.session_lifetime_hours);
    Ok((StatusCode::CREATED, Json(view)))
}

/// POST /api/manager/sessions/{id}/touch - Refresh a session
///
/// Routine traffic keep-alive; not audited.
#[utoipa::path(
    post,
    path = "/api/manager/sessions/{id}/touch",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session refreshed", body = SessionView),
        (status = 404, description = "Unknown session"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, _manager))]
pub async fn touch_session(
    State(state): State<AppState>,
    _manager: ManagerContext,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let session = queries::touch_session(&state.db, session_id)
        .await?
        .ok_or(ApiError::NotFound("Session"))?;

    let view = SessionView::from_session(session, Utc::now(), state.config.session_lifetime_hours);
    Ok(Json(view))
}

/// POST /api/manager/sessions/{id}/expire - Force a session to expire
#[utoipa::path(
    post,
    path = "/api/manager/sessions/{id}/expire",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session expired", body = SessionView),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Session already expired"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, manager))]
pub async fn force_expire_session(
    State(state): State<AppState>,
    manager: ManagerContext,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let Some(session) = queries::force_expire_session(&state.db, session_id).await? else {
        return match queries::find_session_by_id(&state.db, session_id).await? {
            Some(_) => Err(ApiError::InvalidState("Session already expired".into())),
            None => Err(ApiError::NotFound("Session")),
        };
    };

    audit::record(
        &state.db,
        &ActorScope::Manager {
            manager_id: manager.manager.id,
        },
        "session.expire",
        Some("session"),
        Some(session_id),
        None,
    )
    .await;

    let view = SessionView::from_session(session, Utc::now(), state.config.session_lifetime_hours);
    Ok(Json(view))
}

/// GET .../sessions - Sessions in the caller's scope
#[utoipa::path(
    get,
    path = "/api/manager/sessions",
    tag = "sessions",
    params(
        ("limit" = Option<i64>, Query, description = "Page size (max 200)"),
        ("offset" = Option<i64>, Query, description = "Page offset"),
    ),
    responses(
        (status = 200, description = "Sessions, most recently seen first", body = Vec<SessionView>),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, scope))]
pub async fn list_sessions(
    State(state): State<AppState>,
    scope: ActorScope,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<SessionView>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let sessions = match &scope {
        ActorScope::Manager { .. } => queries::list_sessions(&state.db, limit, offset).await?,
        ActorScope::Administrator { department_id, .. } => {
            queries::list_sessions_in_department(&state.db, *department_id, limit, offset).await?
        }
        _ => {
            return Err(ApiError::Authorization(
                "Not authorized to list sessions".into(),
            ));
        }
    };

    let now = Utc::now();
    let lifetime = state.config.session_lifetime_hours;
    let views = sessions
        .into_iter()
        .map(|s| SessionView::from_session(s, now, lifetime))
        .collect();

    Ok(Json(views))
}
