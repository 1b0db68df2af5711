//! Database queries for access requests.
//!
//! The resolution update itself lives in the handlers, where it shares
//! a transaction with the grant insert.

use sqlx::PgPool;
use uuid::Uuid;

use super::models::AccessRequest;

/// Find a request by ID.
pub async fn find_request_by_id(
    pool: &PgPool,
    request_id: Uuid,
) -> sqlx::Result<Option<AccessRequest>> {
    sqlx::query_as::<_, AccessRequest>(
        r"
        SELECT id, citizen_id, service_id, subject, message, attachments,
               granted, decline, response_message, created_at, updated_at
        FROM requests
        WHERE id = $1
        ",
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await
}

/// List every request, newest first.
pub async fn list_requests(pool: &PgPool) -> sqlx::Result<Vec<AccessRequest>> {
    sqlx::query_as::<_, AccessRequest>(
        r"
        SELECT id, citizen_id, service_id, subject, message, attachments,
               granted, decline, response_message, created_at, updated_at
        FROM requests
        ORDER BY created_at DESC
        ",
    )
    .fetch_all(pool)
    .await
}

/// List a citizen's own requests.
pub async fn list_requests_for_citizen(
    pool: &PgPool,
    citizen_id: Uuid,
) -> sqlx::Result<Vec<AccessRequest>> {
    sqlx::query_as::<_, AccessRequest>(
        r"
        SELECT id, citizen_id, service_id, subject, message, attachments,
               granted, decline, response_message, created_at, updated_at
        FROM requests
        WHERE citizen_id = $1
        ORDER BY created_at DESC
        ",
    )
    .bind(citizen_id)
    .fetch_all(pool)
    .await
}

/// List requests against the services assigned to a grantee.
pub async fn list_requests_for_grantee(
    pool: &PgPool,
    grantee_id: Uuid,
) -> sqlx::Result<Vec<AccessRequest>> {
    sqlx::query_as::<_, AccessRequest>(
        r"
        SELECT id, citizen_id, service_id, subject, message, attachments,
               granted, decline, response_message, created_at, updated_at
        FROM requests
        WHERE service_id IN (SELECT service_id FROM service_grantees WHERE grantee_id = $1)
        ORDER BY created_at DESC
        ",
    )
    .bind(grantee_id)
    .fetch_all(pool)
    .await
}

/// List requests against services under one department.
pub async fn list_requests_in_department(
    pool: &PgPool,
    department_id: Uuid,
) -> sqlx::Result<Vec<AccessRequest>> {
    sqlx::query_as::<_, AccessRequest>(
        r"
        SELECT r.id, r.citizen_id, r.service_id, r.subject, r.message, r.attachments,
               r.granted, r.decline, r.response_message, r.created_at, r.updated_at
        FROM requests r
        JOIN services s ON s.id = r.service_id
        JOIN associations a ON a.id = s.association_id
        WHERE a.department_id = $1
        ORDER BY r.created_at DESC
        ",
    )
    .bind(department_id)
    .fetch_all(pool)
    .await
}

/// Insert a pending request.
pub async fn create_request(
    pool: &PgPool,
    citizen_id: Uuid,
    service_id: Uuid,
    subject: &str,
    message: &str,
    attachments: serde_json::Value,
) -> sqlx::Result<AccessRequest> {
    sqlx::query_as::<_, AccessRequest>(
        r"
        INSERT INTO requests (id, citizen_id, service_id, subject, message, attachments)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, citizen_id, service_id, subject, message, attachments,
                  granted, decline, response_message, created_at, updated_at
        ",
    )
    .bind(Uuid::now_v7())
    .bind(citizen_id)
    .bind(service_id)
    .bind(subject)
    .bind(message)
    .bind(attachments)
    .fetch_one(pool)
    .await
}
