//! Database queries for service sessions.

use sqlx::PgPool;
use uuid::Uuid;

use super::models::ServiceSession;

/// Find a session by ID.
pub async fn find_session_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<ServiceSession>> {
    sqlx::query_as::<_, ServiceSession>(
        r"
        SELECT id, citizen_id, service_id, ip_address, last_seen, enforce_expiry,
               created_at, updated_at
        FROM service_sessions
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// List sessions, most recently seen first.
pub async fn list_sessions(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<ServiceSession>> {
    sqlx::query_as::<_, ServiceSession>(
        r"
        SELECT id, citizen_id, service_id, ip_address, last_seen, enforce_expiry,
               created_at, updated_at
        FROM service_sessions
        ORDER BY last_seen DESC
        LIMIT $1 OFFSET $2
        ",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// List sessions against services under one department.
pub async fn list_sessions_in_department(
    pool: &PgPool,
    department_id: Uuid,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<ServiceSession>> {
    sqlx::query_as::<_, ServiceSession>(
        r"
        SELECT ss.id, ss.citizen_id, ss.service_id, ss.ip_address, ss.last_seen,
               ss.enforce_expiry, ss.created_at, ss.updated_at
        FROM service_sessions ss
        JOIN services s ON ss.service_id = s.id
        JOIN associations a ON s.association_id = a.id
        WHERE a.department_id = $1
        ORDER BY ss.last_seen DESC
        LIMIT $2 OFFSET $3
        ",
    )
    .bind(department_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Open a session with `last_seen` stamped at the database clock.
pub async fn create_session(
    pool: &PgPool,
    citizen_id: Uuid,
    service_id: Uuid,
    ip_address: &str,
) -> sqlx::Result<ServiceSession> {
    sqlx::query_as::<_, ServiceSession>(
        r"
        INSERT INTO service_sessions (id, citizen_id, service_id, ip_address, last_seen)
        VALUES ($1, $2, $3, $4, NOW())
        RETURNING id, citizen_id, service_id, ip_address, last_seen, enforce_expiry,
                  created_at, updated_at
        ",
    )
    .bind(Uuid::now_v7())
    .bind(citizen_id)
    .bind(service_id)
    .bind(ip_address)
    .fetch_one(pool)
    .await
}

/// Refresh `last_seen`. `None` means the session does not exist.
pub async fn touch_session(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<ServiceSession>> {
    sqlx::query_as::<_, ServiceSession>(
        r"
        UPDATE service_sessions
        SET last_seen = NOW(), updated_at = NOW()
        WHERE id = $1
        RETURNING id, citizen_id, service_id, ip_address, last_seen, enforce_expiry,
                  created_at, updated_at
        ",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Flip `enforce_expiry` on a session that does not already have it.
/// `None` means the row is missing or was already enforced; the caller
/// re-reads to tell the two apart.
pub async fn force_expire_session(
    pool: &PgPool,
    id: Uuid,
) -> sqlx::Result<Option<ServiceSession>> {
    sqlx::query_as::<_, ServiceSession>(
        r"
        UPDATE service_sessions
        SET enforce_expiry = TRUE, updated_at = NOW()
        WHERE id = $1 AND enforce_expiry = FALSE
        RETURNING id, citizen_id, service_id, ip_address, last_seen, enforce_expiry,
                  created_at, updated_at
        ",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
