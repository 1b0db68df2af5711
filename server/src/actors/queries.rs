//! Database queries for the actor directory.
//!
//! Provides async functions for:
//! - Citizen lookups (the rows themselves are registered by the gateway)
//! - Grantee and administrator management
//! - Site manager lookup

use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Administrator, Citizen, Grantee, SiteManager};

// ============================================================================
// Citizen Queries
// ============================================================================

/// Find a citizen by ID.
pub async fn find_citizen_by_id(pool: &PgPool, citizen_id: Uuid) -> sqlx::Result<Option<Citizen>> {
    sqlx::query_as::<_, Citizen>(
        r"
        SELECT id, username, first_name, second_name, surname, national_id,
               dob, email, email_verified, created_at, updated_at
        FROM citizens
        WHERE id = $1
        ",
    )
    .bind(citizen_id)
    .fetch_optional(pool)
    .await
}

/// List citizens, newest first.
pub async fn list_citizens(pool: &PgPool, limit: i64, offset: i64) -> sqlx::Result<Vec<Citizen>> {
    sqlx::query_as::<_, Citizen>(
        r"
        SELECT id, username, first_name, second_name, surname, national_id,
               dob, email, email_verified, created_at, updated_at
        FROM citizens
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        ",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

// ============================================================================
// Grantee Queries
// ============================================================================

/// Find the grantee record owned by a citizen account.
pub async fn find_grantee_by_citizen(
    pool: &PgPool,
    citizen_id: Uuid,
) -> sqlx::Result<Option<Grantee>> {
    sqlx::query_as::<_, Grantee>(
        r"
        SELECT id, username, citizen_id, association_id, created_at, updated_at
        FROM grantees
        WHERE citizen_id = $1
        ",
    )
    .bind(citizen_id)
    .fetch_optional(pool)
    .await
}

/// Find a grantee by ID.
pub async fn find_grantee_by_id(pool: &PgPool, grantee_id: Uuid) -> sqlx::Result<Option<Grantee>> {
    sqlx::query_as::<_, Grantee>(
        r"
        SELECT id, username, citizen_id, association_id, created_at, updated_at
        FROM grantees
        WHERE id = $1
        ",
    )
    .bind(grantee_id)
    .fetch_optional(pool)
    .await
}

/// List all grantees.
pub async fn list_grantees(pool: &PgPool) -> sqlx::Result<Vec<Grantee>> {
    sqlx::query_as::<_, Grantee>(
        r"
        SELECT id, username, citizen_id, association_id, created_at, updated_at
        FROM grantees
        ORDER BY username ASC
        ",
    )
    .fetch_all(pool)
    .await
}

/// List grantees attached to associations under one department.
pub async fn list_grantees_in_department(
    pool: &PgPool,
    department_id: Uuid,
) -> sqlx::Result<Vec<Grantee>> {
    sqlx::query_as::<_, Grantee>(
        r"
        SELECT g.id, g.username, g.citizen_id, g.association_id, g.created_at, g.updated_at
        FROM grantees g
        JOIN associations a ON a.id = g.association_id
        WHERE a.department_id = $1
        ORDER BY g.username ASC
        ",
    )
    .bind(department_id)
    .fetch_all(pool)
    .await
}

/// Count grantees attached to associations under one department.
pub async fn count_grantees_in_department(
    pool: &PgPool,
    department_id: Uuid,
) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        r"
        SELECT COUNT(*)
        FROM grantees g
        JOIN associations a ON a.id = g.association_id
        WHERE a.department_id = $1
        ",
    )
    .bind(department_id)
    .fetch_one(pool)
    .await
}

/// Create a grantee record.
pub async fn create_grantee(
    pool: &PgPool,
    username: &str,
    citizen_id: Uuid,
    association_id: Uuid,
) -> sqlx::Result<Grantee> {
    sqlx::query_as::<_, Grantee>(
        r"
        INSERT INTO grantees (id, username, citizen_id, association_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, citizen_id, association_id, created_at, updated_at
        ",
    )
    .bind(Uuid::now_v7())
    .bind(username)
    .bind(citizen_id)
    .bind(association_id)
    .fetch_one(pool)
    .await
}

/// Update a grantee's username and/or association.
pub async fn update_grantee(
    pool: &PgPool,
    grantee_id: Uuid,
    username: Option<&str>,
    association_id: Option<Uuid>,
) -> sqlx::Result<Option<Grantee>> {
    sqlx::query_as::<_, Grantee>(
        r"
        UPDATE grantees
        SET username = COALESCE($2, username),
            association_id = COALESCE($3, association_id),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, username, citizen_id, association_id, created_at, updated_at
        ",
    )
    .bind(grantee_id)
    .bind(username)
    .bind(association_id)
    .fetch_optional(pool)
    .await
}

/// Delete a grantee record.
///
/// Returns `true` if a row was deleted.
pub async fn delete_grantee(pool: &PgPool, grantee_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM grantees WHERE id = $1")
        .bind(grantee_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Administrator Queries
// ============================================================================

/// Find the administrator record owned by a citizen account.
pub async fn find_administrator_by_citizen(
    pool: &PgPool,
    citizen_id: Uuid,
) -> sqlx::Result<Option<Administrator>> {
    sqlx::query_as::<_, Administrator>(
        r"
        SELECT id, username, citizen_id, first_email, second_email, grantee_limit,
               created_at, updated_at
        FROM administrators
        WHERE citizen_id = $1
        ",
    )
    .bind(citizen_id)
    .fetch_optional(pool)
    .await
}

/// Find an administrator by ID.
pub async fn find_administrator_by_id(
    pool: &PgPool,
    administrator_id: Uuid,
) -> sqlx::Result<Option<Administrator>> {
    sqlx::query_as::<_, Administrator>(
        r"
        SELECT id, username, citizen_id, first_email, second_email, grantee_limit,
               created_at, updated_at
        FROM administrators
        WHERE id = $1
        ",
    )
    .bind(administrator_id)
    .fetch_optional(pool)
    .await
}

/// List all administrators.
pub async fn list_administrators(pool: &PgPool) -> sqlx::Result<Vec<Administrator>> {
    sqlx::query_as::<_, Administrator>(
        r"
        SELECT id, username, citizen_id, first_email, second_email, grantee_limit,
               created_at, updated_at
        FROM administrators
        ORDER BY username ASC
        ",
    )
    .fetch_all(pool)
    .await
}

/// Create an administrator record.
pub async fn create_administrator(
    pool: &PgPool,
    username: &str,
    citizen_id: Uuid,
    first_email: &str,
    second_email: Option<&str>,
    grantee_limit: i32,
) -> sqlx::Result<Administrator> {
    sqlx::query_as::<_, Administrator>(
        r"
        INSERT INTO administrators (id, username, citizen_id, first_email, second_email, grantee_limit)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, username, citizen_id, first_email, second_email, grantee_limit,
                  created_at, updated_at
        ",
    )
    .bind(Uuid::now_v7())
    .bind(username)
    .bind(citizen_id)
    .bind(first_email)
    .bind(second_email)
    .bind(grantee_limit)
    .fetch_one(pool)
    .await
}

/// Update an administrator record.
pub async fn update_administrator(
    pool: &PgPool,
    administrator_id: Uuid,
    username: Option<&str>,
    first_email: Option<&str>,
    second_email: Option<&str>,
    grantee_limit: Option<i32>,
) -> sqlx::Result<Option<Administrator>> {
    sqlx::query_as::<_, Administrator>(
        r"
        UPDATE administrators
        SET username = COALESCE($2, username),
            first_email = COALESCE($3, first_email),
            second_email = COALESCE($4, second_email),
            grantee_limit = COALESCE($5, grantee_limit),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, username, citizen_id, first_email, second_email, grantee_limit,
                  created_at, updated_at
        ",
    )
    .bind(administrator_id)
    .bind(username)
    .bind(first_email)
    .bind(second_email)
    .bind(grantee_limit)
    .fetch_optional(pool)
    .await
}

/// Delete an administrator record.
///
/// Returns `true` if a row was deleted.
pub async fn delete_administrator(pool: &PgPool, administrator_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM administrators WHERE id = $1")
        .bind(administrator_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Site Manager Queries
// ============================================================================

/// Find the site manager record owned by a citizen account.
pub async fn find_manager_by_citizen(
    pool: &PgPool,
    citizen_id: Uuid,
) -> sqlx::Result<Option<SiteManager>> {
    sqlx::query_as::<_, SiteManager>(
        r"
        SELECT id, username, citizen_id, first_email, second_email, created_at, updated_at
        FROM site_managers
        WHERE citizen_id = $1
        ",
    )
    .bind(citizen_id)
    .fetch_optional(pool)
    .await
}

/// Update the site manager's contact details.
pub async fn update_manager(
    pool: &PgPool,
    manager_id: Uuid,
    username: Option<&str>,
    first_email: Option<&str>,
    second_email: Option<&str>,
) -> sqlx::Result<Option<SiteManager>> {
    sqlx::query_as::<_, SiteManager>(
        r"
        UPDATE site_managers
        SET username = COALESCE($2, username),
            first_email = COALESCE($3, first_email),
            second_email = COALESCE($4, second_email),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, username, citizen_id, first_email, second_email, created_at, updated_at
        ",
    )
    .bind(manager_id)
    .bind(username)
    .bind(first_email)
    .bind(second_email)
    .fetch_optional(pool)
    .await
}
