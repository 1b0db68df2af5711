//! Database queries for the permission registry.
//!
//! Every read aggregates the named citizens into the row, so callers
//! always see the full citizen set alongside the window.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Permission, ScopeTier};

/// Find one permission, constrained to a tier so tiered routes cannot
/// reach across each other.
pub async fn find_permission(
    pool: &PgPool,
    tier: ScopeTier,
    permission_id: Uuid,
) -> sqlx::Result<Option<Permission>> {
    sqlx::query_as::<_, Permission>(
        r"
        SELECT p.id, p.name, p.description, p.scope_tier, p.scope_target,
               p.start_time, p.end_time, p.active, p.created_at, p.updated_at,
               COALESCE(
                   array_agg(pc.citizen_id) FILTER (WHERE pc.citizen_id IS NOT NULL),
                   '{}'
               ) AS citizens
        FROM permissions p
        LEFT JOIN permission_citizens pc ON pc.permission_id = p.id
        WHERE p.id = $1 AND p.scope_tier = $2
        GROUP BY p.id
        ",
    )
    .bind(permission_id)
    .bind(tier)
    .fetch_optional(pool)
    .await
}

/// Fetch a permission by ID alone.
pub async fn find_permission_by_id(
    pool: &PgPool,
    permission_id: Uuid,
) -> sqlx::Result<Option<Permission>> {
    sqlx::query_as::<_, Permission>(
        r"
        SELECT p.id, p.name, p.description, p.scope_tier, p.scope_target,
               p.start_time, p.end_time, p.active, p.created_at, p.updated_at,
               COALESCE(
                   array_agg(pc.citizen_id) FILTER (WHERE pc.citizen_id IS NOT NULL),
                   '{}'
               ) AS citizens
        FROM permissions p
        LEFT JOIN permission_citizens pc ON pc.permission_id = p.id
        WHERE p.id = $1
        GROUP BY p.id
        ",
    )
    .bind(permission_id)
    .fetch_optional(pool)
    .await
}

/// List every permission of one tier.
pub async fn list_permissions_by_tier(
    pool: &PgPool,
    tier: ScopeTier,
) -> sqlx::Result<Vec<Permission>> {
    sqlx::query_as::<_, Permission>(
        r"
        SELECT p.id, p.name, p.description, p.scope_tier, p.scope_target,
               p.start_time, p.end_time, p.active, p.created_at, p.updated_at,
               COALESCE(
                   array_agg(pc.citizen_id) FILTER (WHERE pc.citizen_id IS NOT NULL),
                   '{}'
               ) AS citizens
        FROM permissions p
        LEFT JOIN permission_citizens pc ON pc.permission_id = p.id
        WHERE p.scope_tier = $1
        GROUP BY p.id
        ORDER BY p.start_time DESC
        ",
    )
    .bind(tier)
    .fetch_all(pool)
    .await
}

/// List permissions of one tier whose target lies under a department.
pub async fn list_permissions_in_department(
    pool: &PgPool,
    tier: ScopeTier,
    department_id: Uuid,
) -> sqlx::Result<Vec<Permission>> {
    match tier {
        ScopeTier::Department => {
            sqlx::query_as::<_, Permission>(
                r"
                SELECT p.id, p.name, p.description, p.scope_tier, p.scope_target,
                       p.start_time, p.end_time, p.active, p.created_at, p.updated_at,
                       COALESCE(
                           array_agg(pc.citizen_id) FILTER (WHERE pc.citizen_id IS NOT NULL),
                           '{}'
                       ) AS citizens
                FROM permissions p
                LEFT JOIN permission_citizens pc ON pc.permission_id = p.id
                WHERE p.scope_tier = 'department' AND p.scope_target = $1
                GROUP BY p.id
                ORDER BY p.start_time DESC
                ",
            )
            .bind(department_id)
            .fetch_all(pool)
            .await
        }
        ScopeTier::Association => {
            sqlx::query_as::<_, Permission>(
                r"
                SELECT p.id, p.name, p.description, p.scope_tier, p.scope_target,
                       p.start_time, p.end_time, p.active, p.created_at, p.updated_at,
                       COALESCE(
                           array_agg(pc.citizen_id) FILTER (WHERE pc.citizen_id IS NOT NULL),
                           '{}'
                       ) AS citizens
                FROM permissions p
                LEFT JOIN permission_citizens pc ON pc.permission_id = p.id
                WHERE p.scope_tier = 'association'
                  AND p.scope_target IN (SELECT id FROM associations WHERE department_id = $1)
                GROUP BY p.id
                ORDER BY p.start_time DESC
                ",
            )
            .bind(department_id)
            .fetch_all(pool)
            .await
        }
        ScopeTier::Service => {
            sqlx::query_as::<_, Permission>(
                r"
                SELECT p.id, p.name, p.description, p.scope_tier, p.scope_target,
                       p.start_time, p.end_time, p.active, p.created_at, p.updated_at,
                       COALESCE(
                           array_agg(pc.citizen_id) FILTER (WHERE pc.citizen_id IS NOT NULL),
                           '{}'
                       ) AS citizens
                FROM permissions p
                LEFT JOIN permission_citizens pc ON pc.permission_id = p.id
                WHERE p.scope_tier = 'service'
                  AND p.scope_target IN (
                      SELECT s.id FROM services s
                      JOIN associations a ON a.id = s.association_id
                      WHERE a.department_id = $1
                  )
                GROUP BY p.id
                ORDER BY p.start_time DESC
                ",
            )
            .bind(department_id)
            .fetch_all(pool)
            .await
        }
    }
}

/// List service-tier permissions on the services assigned to a grantee.
pub async fn list_permissions_for_grantee(
    pool: &PgPool,
    grantee_id: Uuid,
) -> sqlx::Result<Vec<Permission>> {
    sqlx::query_as::<_, Permission>(
        r"
        SELECT p.id, p.name, p.description, p.scope_tier, p.scope_target,
               p.start_time, p.end_time, p.active, p.created_at, p.updated_at,
               COALESCE(
                   array_agg(pc.citizen_id) FILTER (WHERE pc.citizen_id IS NOT NULL),
                   '{}'
               ) AS citizens
        FROM permissions p
        LEFT JOIN permission_citizens pc ON pc.permission_id = p.id
        WHERE p.scope_tier = 'service'
          AND p.scope_target IN (SELECT service_id FROM service_grantees WHERE grantee_id = $1)
        GROUP BY p.id
        ORDER BY p.start_time DESC
        ",
    )
    .bind(grantee_id)
    .fetch_all(pool)
    .await
}

/// Insert a permission and its citizen set in one transaction.
#[allow(clippy::too_many_arguments)]
pub async fn create_permission(
    pool: &PgPool,
    tier: ScopeTier,
    name: &str,
    description: &str,
    scope_target: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    citizens: &[Uuid],
) -> sqlx::Result<Permission> {
    let mut tx = pool.begin().await?;

    let permission_id = Uuid::now_v7();
    sqlx::query(
        r"
        INSERT INTO permissions (id, name, description, scope_tier, scope_target, start_time, end_time)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(permission_id)
    .bind(name)
    .bind(description)
    .bind(tier)
    .bind(scope_target)
    .bind(start_time)
    .bind(end_time)
    .execute(&mut *tx)
    .await?;

    for citizen_id in citizens {
        sqlx::query(
            r"
            INSERT INTO permission_citizens (permission_id, citizen_id)
            VALUES ($1, $2)
            ON CONFLICT (permission_id, citizen_id) DO NOTHING
            ",
        )
        .bind(permission_id)
        .bind(citizen_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    find_permission_by_id(pool, permission_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Patch a permission row and optionally replace its citizen set.
#[allow(clippy::too_many_arguments)]
pub async fn update_permission(
    pool: &PgPool,
    permission_id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    active: Option<bool>,
    citizens: Option<&[Uuid]>,
) -> sqlx::Result<Option<Permission>> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r"
        UPDATE permissions
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            start_time = COALESCE($4, start_time),
            end_time = COALESCE($5, end_time),
            active = COALESCE($6, active),
            updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(permission_id)
    .bind(name)
    .bind(description)
    .bind(start_time)
    .bind(end_time)
    .bind(active)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    if let Some(citizens) = citizens {
        sqlx::query("DELETE FROM permission_citizens WHERE permission_id = $1")
            .bind(permission_id)
            .execute(&mut *tx)
            .await?;

        for citizen_id in citizens {
            sqlx::query(
                r"
                INSERT INTO permission_citizens (permission_id, citizen_id)
                VALUES ($1, $2)
                ON CONFLICT (permission_id, citizen_id) DO NOTHING
                ",
            )
            .bind(permission_id)
            .bind(citizen_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    find_permission_by_id(pool, permission_id).await
}

/// Hard-delete a permission. The citizen set cascades.
///
/// Returns `true` if a row was deleted.
pub async fn delete_permission(pool: &PgPool, permission_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
        .bind(permission_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Fetch the permissions that name a citizen and target any node on the
/// ancestor chain of a service. Openness is evaluated by the caller.
pub async fn find_candidate_permissions(
    pool: &PgPool,
    citizen_id: Uuid,
    service_id: Uuid,
    association_id: Uuid,
    department_id: Uuid,
) -> sqlx::Result<Vec<Permission>> {
    sqlx::query_as::<_, Permission>(
        r"
        SELECT p.id, p.name, p.description, p.scope_tier, p.scope_target,
               p.start_time, p.end_time, p.active, p.created_at, p.updated_at,
               COALESCE(
                   array_agg(pc.citizen_id) FILTER (WHERE pc.citizen_id IS NOT NULL),
                   '{}'
               ) AS citizens
        FROM permissions p
        LEFT JOIN permission_citizens pc ON pc.permission_id = p.id
        WHERE p.id IN (
                  SELECT permission_id FROM permission_citizens WHERE citizen_id = $1
              )
          AND (
                  (p.scope_tier = 'service' AND p.scope_target = $2)
                  OR (p.scope_tier = 'association' AND p.scope_target = $3)
                  OR (p.scope_tier = 'department' AND p.scope_target = $4)
              )
        GROUP BY p.id
        ",
    )
    .bind(citizen_id)
    .bind(service_id)
    .bind(association_id)
    .bind(department_id)
    .fetch_all(pool)
    .await
}
