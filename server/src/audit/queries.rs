//! Database queries for the audit log.

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::ActorKind;

use super::models::AuditEntry;

/// Append one audit entry.
pub async fn insert_entry(
    pool: &PgPool,
    actor_kind: ActorKind,
    actor_id: Uuid,
    action: &str,
    target_type: Option<&str>,
    target_id: Option<Uuid>,
    detail: Option<serde_json::Value>,
) -> sqlx::Result<AuditEntry> {
    sqlx::query_as::<_, AuditEntry>(
        r"
        INSERT INTO audit_log (id, actor_kind, actor_id, action, target_type, target_id, detail)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, actor_kind, actor_id, action, target_type, target_id, detail, created_at
        ",
    )
    .bind(Uuid::now_v7())
    .bind(actor_kind)
    .bind(actor_id)
    .bind(action)
    .bind(target_type)
    .bind(target_id)
    .bind(detail)
    .fetch_one(pool)
    .await
}

/// Page through the entries recorded by one actor, newest first.
pub async fn list_entries_for_actor(
    pool: &PgPool,
    actor_kind: ActorKind,
    actor_id: Uuid,
    action_prefix: Option<&str>,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<AuditEntry>> {
    if let Some(prefix) = action_prefix {
        let pattern = format!("{prefix}%");
        sqlx::query_as::<_, AuditEntry>(
            r"
            SELECT id, actor_kind, actor_id, action, target_type, target_id, detail, created_at
            FROM audit_log
            WHERE actor_kind = $1 AND actor_id = $2 AND action LIKE $3
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            ",
        )
        .bind(actor_kind)
        .bind(actor_id)
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    } else {
        sqlx::query_as::<_, AuditEntry>(
            r"
            SELECT id, actor_kind, actor_id, action, target_type, target_id, detail, created_at
            FROM audit_log
            WHERE actor_kind = $1 AND actor_id = $2
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(actor_kind)
        .bind(actor_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}

/// Page through audit entries, newest first, optionally restricted to
/// actions under one prefix (`request` matches `request.approve`).
pub async fn list_entries(
    pool: &PgPool,
    action_prefix: Option<&str>,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<AuditEntry>> {
    if let Some(prefix) = action_prefix {
        let pattern = format!("{prefix}%");
        sqlx::query_as::<_, AuditEntry>(
            r"
            SELECT id, actor_kind, actor_id, action, target_type, target_id, detail, created_at
            FROM audit_log
            WHERE action LIKE $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    } else {
        sqlx::query_as::<_, AuditEntry>(
            r"
            SELECT id, actor_kind, actor_id, action, target_type, target_id, detail, created_at
            FROM audit_log
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}
