//! Database queries for the grant ledger.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::Grant;

/// Find a grant by ID.
pub async fn find_grant_by_id(pool: &PgPool, grant_id: Uuid) -> sqlx::Result<Option<Grant>> {
    sqlx::query_as::<_, Grant>(
        r"
        SELECT id, request_id, grantee_id, granted, decline, start_date, end_date,
               amount, message, created_at, updated_at
        FROM grants
        WHERE id = $1
        ",
    )
    .bind(grant_id)
    .fetch_optional(pool)
    .await
}

/// Find the grant bound to a request.
pub async fn find_grant_by_request(
    pool: &PgPool,
    request_id: Uuid,
) -> sqlx::Result<Option<Grant>> {
    sqlx::query_as::<_, Grant>(
        r"
        SELECT id, request_id, grantee_id, granted, decline, start_date, end_date,
               amount, message, created_at, updated_at
        FROM grants
        WHERE request_id = $1
        ",
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await
}

/// List the whole ledger, newest first.
pub async fn list_grants(pool: &PgPool) -> sqlx::Result<Vec<Grant>> {
    sqlx::query_as::<_, Grant>(
        r"
        SELECT id, request_id, grantee_id, granted, decline, start_date, end_date,
               amount, message, created_at, updated_at
        FROM grants
        ORDER BY created_at DESC
        ",
    )
    .fetch_all(pool)
    .await
}

/// List the grants issued against a citizen's requests.
pub async fn list_grants_for_citizen(
    pool: &PgPool,
    citizen_id: Uuid,
) -> sqlx::Result<Vec<Grant>> {
    sqlx::query_as::<_, Grant>(
        r"
        SELECT g.id, g.request_id, g.grantee_id, g.granted, g.decline, g.start_date,
               g.end_date, g.amount, g.message, g.created_at, g.updated_at
        FROM grants g
        JOIN requests r ON r.id = g.request_id
        WHERE r.citizen_id = $1
        ORDER BY g.created_at DESC
        ",
    )
    .bind(citizen_id)
    .fetch_all(pool)
    .await
}

/// List grants on the services assigned to a grantee.
pub async fn list_grants_for_grantee(
    pool: &PgPool,
    grantee_id: Uuid,
) -> sqlx::Result<Vec<Grant>> {
    sqlx::query_as::<_, Grant>(
        r"
        SELECT g.id, g.request_id, g.grantee_id, g.granted, g.decline, g.start_date,
               g.end_date, g.amount, g.message, g.created_at, g.updated_at
        FROM grants g
        JOIN requests r ON r.id = g.request_id
        WHERE r.service_id IN (SELECT service_id FROM service_grantees WHERE grantee_id = $1)
        ORDER BY g.created_at DESC
        ",
    )
    .bind(grantee_id)
    .fetch_all(pool)
    .await
}

/// List grants on services under one department.
pub async fn list_grants_in_department(
    pool: &PgPool,
    department_id: Uuid,
) -> sqlx::Result<Vec<Grant>> {
    sqlx::query_as::<_, Grant>(
        r"
        SELECT g.id, g.request_id, g.grantee_id, g.granted, g.decline, g.start_date,
               g.end_date, g.amount, g.message, g.created_at, g.updated_at
        FROM grants g
        JOIN requests r ON r.id = g.request_id
        JOIN services s ON s.id = r.service_id
        JOIN associations a ON a.id = s.association_id
        WHERE a.department_id = $1
        ORDER BY g.created_at DESC
        ",
    )
    .bind(department_id)
    .fetch_all(pool)
    .await
}

/// Active-path lookup for the access evaluator: every grant bound to a
/// request by this citizen for this service. Status is derived by the
/// caller.
pub async fn list_grants_for_citizen_service(
    pool: &PgPool,
    citizen_id: Uuid,
    service_id: Uuid,
) -> sqlx::Result<Vec<Grant>> {
    sqlx::query_as::<_, Grant>(
        r"
        SELECT g.id, g.request_id, g.grantee_id, g.granted, g.decline, g.start_date,
               g.end_date, g.amount, g.message, g.created_at, g.updated_at
        FROM grants g
        JOIN requests r ON r.id = g.request_id
        WHERE r.citizen_id = $1 AND r.service_id = $2
        ORDER BY g.created_at DESC
        ",
    )
    .bind(citizen_id)
    .bind(service_id)
    .fetch_all(pool)
    .await
}

/// Replace the end policy of a grant unless it is already declined.
///
/// Returns the updated row, or `None` when no undeclined grant with
/// this ID exists; the caller re-reads to tell the two apart.
pub async fn extend_grant(
    pool: &PgPool,
    grant_id: Uuid,
    end_date: Option<DateTime<Utc>>,
) -> sqlx::Result<Option<Grant>> {
    sqlx::query_as::<_, Grant>(
        r"
        UPDATE grants
        SET end_date = $2, updated_at = NOW()
        WHERE id = $1 AND decline = FALSE
        RETURNING id, request_id, grantee_id, granted, decline, start_date, end_date,
                  amount, message, created_at, updated_at
        ",
    )
    .bind(grant_id)
    .bind(end_date)
    .fetch_optional(pool)
    .await
}

/// Switch a grant to declined unless it already is.
///
/// Same `None` contract as [`extend_grant`].
pub async fn revoke_grant(pool: &PgPool, grant_id: Uuid) -> sqlx::Result<Option<Grant>> {
    sqlx::query_as::<_, Grant>(
        r"
        UPDATE grants
        SET decline = TRUE, updated_at = NOW()
        WHERE id = $1 AND decline = FALSE
        RETURNING id, request_id, grantee_id, granted, decline, start_date, end_date,
                  amount, message, created_at, updated_at
        ",
    )
    .bind(grant_id)
    .fetch_optional(pool)
    .await
}
