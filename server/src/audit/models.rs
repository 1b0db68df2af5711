//! Audit Log Models

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::ActorKind;

/// One append-only record of a mutating operation.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_kind: ActorKind,
    pub actor_id: Uuid,
    /// Dotted verb, e.g. `request.approve`.
    pub action: String,
    pub target_type: Option<String>,
    pub target_id: Option<Uuid>,
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
