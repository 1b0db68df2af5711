//! HTTP handlers for reading the audit log.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::AppState;
use crate::auth::ActorScope;
use crate::error::{ApiError, ApiResult};

use super::models::AuditEntry;
use super::queries;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AuditQuery {
    /// Action prefix filter, e.g. `request` or `permission.create`.
    pub action: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET .../audit - Page through audit entries
///
/// The manager reads the whole log; an administrator reads back the
/// entries they recorded themselves.
#[utoipa::path(
    get,
    path = "/api/manager/audit",
    tag = "audit",
    params(
        ("action" = Option<String>, Query, description = "Action prefix filter"),
        ("limit" = Option<i64>, Query, description = "Page size (max 200)"),
        ("offset" = Option<i64>, Query, description = "Page offset"),
    ),
    responses(
        (status = 200, description = "Audit entries, newest first", body = Vec<AuditEntry>),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_audit_entries(
    State(state): State<AppState>,
    scope: ActorScope,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<Vec<AuditEntry>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);
    let prefix = query.action.as_deref();

    let entries = match &scope {
        ActorScope::Manager { .. } => {
            queries::list_entries(&state.db, prefix, limit, offset).await?
        }
        ActorScope::Administrator { .. } => {
            let (kind, actor_id) = scope.audit_identity();
            queries::list_entries_for_actor(&state.db, kind, actor_id, prefix, limit, offset)
                .await?
        }
        _ => {
            return Err(ApiError::Authorization(
                "Not authorized to read the audit log".into(),
            ));
        }
    };

    Ok(Json(entries))
}
