//! Audit Log Module
//!
//! Append-only record of mutating operations. Writes are best-effort:
//! a failed audit write is logged and never fails the operation that
//! triggered it.

pub mod handlers;
pub mod models;
pub mod queries;

use axum::{routing::get, Router};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::ActorScope;

pub use models::AuditEntry;

/// Audit log reads, administrator and manager surfaces.
pub fn router() -> Router<AppState> {
    Router::new().route("/audit", get(handlers::list_audit_entries))
}

/// Record one audit entry for a mutating operation.
pub async fn record(
    pool: &PgPool,
    scope: &ActorScope,
    action: &str,
    target_type: Option<&str>,
    target_id: Option<Uuid>,
    detail: Option<serde_json::Value>,
) {
    let (actor_kind, actor_id) = scope.audit_identity();

    if let Err(err) =
        queries::insert_entry(pool, actor_kind, actor_id, action, target_type, target_id, detail)
            .await
    {
        tracing::warn!(%err, action, "Failed to write audit entry");
    }
}
