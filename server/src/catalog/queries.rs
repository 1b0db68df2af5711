//! Database queries for the resource hierarchy.

use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Association, Department, Service, ServiceChain};

// ============================================================================
// Department Queries
// ============================================================================

/// Find a department by ID.
pub async fn find_department_by_id(
    pool: &PgPool,
    department_id: Uuid,
) -> sqlx::Result<Option<Department>> {
    sqlx::query_as::<_, Department>(
        r"
        SELECT id, title, description, email, telephone, website, administrator_id,
               created_at, updated_at
        FROM departments
        WHERE id = $1
        ",
    )
    .bind(department_id)
    .fetch_optional(pool)
    .await
}

/// Find the department run by an administrator.
pub async fn find_department_by_administrator(
    pool: &PgPool,
    administrator_id: Uuid,
) -> sqlx::Result<Option<Department>> {
    sqlx::query_as::<_, Department>(
        r"
        SELECT id, title, description, email, telephone, website, administrator_id,
               created_at, updated_at
        FROM departments
        WHERE administrator_id = $1
        ",
    )
    .bind(administrator_id)
    .fetch_optional(pool)
    .await
}

/// List all departments.
pub async fn list_departments(pool: &PgPool) -> sqlx::Result<Vec<Department>> {
    sqlx::query_as::<_, Department>(
        r"
        SELECT id, title, description, email, telephone, website, administrator_id,
               created_at, updated_at
        FROM departments
        ORDER BY title ASC
        ",
    )
    .fetch_all(pool)
    .await
}

/// Create a department.
pub async fn create_department(
    pool: &PgPool,
    title: &str,
    description: &str,
    email: &str,
    telephone: &str,
    website: &str,
    administrator_id: Option<Uuid>,
) -> sqlx::Result<Department> {
    sqlx::query_as::<_, Department>(
        r"
        INSERT INTO departments (id, title, description, email, telephone, website, administrator_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, title, description, email, telephone, website, administrator_id,
                  created_at, updated_at
        ",
    )
    .bind(Uuid::now_v7())
    .bind(title)
    .bind(description)
    .bind(email)
    .bind(telephone)
    .bind(website)
    .bind(administrator_id)
    .fetch_one(pool)
    .await
}

/// Update a department. `administrator_id` is replaced outright so the
/// manager can also unassign an administrator.
pub async fn update_department(
    pool: &PgPool,
    department_id: Uuid,
    title: Option<&str>,
    description: Option<&str>,
    email: Option<&str>,
    telephone: Option<&str>,
    website: Option<&str>,
    administrator_id: Option<Option<Uuid>>,
) -> sqlx::Result<Option<Department>> {
    sqlx::query_as::<_, Department>(
        r"
        UPDATE departments
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            email = COALESCE($4, email),
            telephone = COALESCE($5, telephone),
            website = COALESCE($6, website),
            administrator_id = CASE WHEN $7 THEN $8 ELSE administrator_id END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, title, description, email, telephone, website, administrator_id,
                  created_at, updated_at
        ",
    )
    .bind(department_id)
    .bind(title)
    .bind(description)
    .bind(email)
    .bind(telephone)
    .bind(website)
    .bind(administrator_id.is_some())
    .bind(administrator_id.flatten())
    .fetch_optional(pool)
    .await
}

/// Delete a department.
///
/// Returns `true` if a row was deleted. Fails with a foreign key
/// violation while associations still reference it.
pub async fn delete_department(pool: &PgPool, department_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM departments WHERE id = $1")
        .bind(department_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Association Queries
// ============================================================================

/// Find an association by ID.
pub async fn find_association_by_id(
    pool: &PgPool,
    association_id: Uuid,
) -> sqlx::Result<Option<Association>> {
    sqlx::query_as::<_, Association>(
        r"
        SELECT id, title, email, website, department_id, created_at, updated_at
        FROM associations
        WHERE id = $1
        ",
    )
    .bind(association_id)
    .fetch_optional(pool)
    .await
}

/// List all associations.
pub async fn list_associations(pool: &PgPool) -> sqlx::Result<Vec<Association>> {
    sqlx::query_as::<_, Association>(
        r"
        SELECT id, title, email, website, department_id, created_at, updated_at
        FROM associations
        ORDER BY title ASC
        ",
    )
    .fetch_all(pool)
    .await
}

/// List associations under one department.
pub async fn list_associations_in_department(
    pool: &PgPool,
    department_id: Uuid,
) -> sqlx::Result<Vec<Association>> {
    sqlx::query_as::<_, Association>(
        r"
        SELECT id, title, email, website, department_id, created_at, updated_at
        FROM associations
        WHERE department_id = $1
        ORDER BY title ASC
        ",
    )
    .bind(department_id)
    .fetch_all(pool)
    .await
}

/// Create an association under a department.
pub async fn create_association(
    pool: &PgPool,
    title: &str,
    email: &str,
    website: Option<&str>,
    department_id: Uuid,
) -> sqlx::Result<Association> {
    sqlx::query_as::<_, Association>(
        r"
        INSERT INTO associations (id, title, email, website, department_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, title, email, website, department_id, created_at, updated_at
        ",
    )
    .bind(Uuid::now_v7())
    .bind(title)
    .bind(email)
    .bind(website)
    .bind(department_id)
    .fetch_one(pool)
    .await
}

/// Update an association.
pub async fn update_association(
    pool: &PgPool,
    association_id: Uuid,
    title: Option<&str>,
    email: Option<&str>,
    website: Option<&str>,
) -> sqlx::Result<Option<Association>> {
    sqlx::query_as::<_, Association>(
        r"
        UPDATE associations
        SET title = COALESCE($2, title),
            email = COALESCE($3, email),
            website = COALESCE($4, website),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, title, email, website, department_id, created_at, updated_at
        ",
    )
    .bind(association_id)
    .bind(title)
    .bind(email)
    .bind(website)
    .fetch_optional(pool)
    .await
}

/// Delete an association.
///
/// Returns `true` if a row was deleted.
pub async fn delete_association(pool: &PgPool, association_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM associations WHERE id = $1")
        .bind(association_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Service Queries
// ============================================================================

/// Find a service by ID.
pub async fn find_service_by_id(pool: &PgPool, service_id: Uuid) -> sqlx::Result<Option<Service>> {
    sqlx::query_as::<_, Service>(
        r"
        SELECT id, title, machine_name, description, email, url, association_id,
               restricted, visibility, created_at, updated_at
        FROM services
        WHERE id = $1
        ",
    )
    .bind(service_id)
    .fetch_optional(pool)
    .await
}

/// Find a citizen-visible service by ID.
pub async fn find_visible_service_by_id(
    pool: &PgPool,
    service_id: Uuid,
) -> sqlx::Result<Option<Service>> {
    sqlx::query_as::<_, Service>(
        r"
        SELECT id, title, machine_name, description, email, url, association_id,
               restricted, visibility, created_at, updated_at
        FROM services
        WHERE id = $1 AND visibility = TRUE
        ",
    )
    .bind(service_id)
    .fetch_optional(pool)
    .await
}

/// List all services.
pub async fn list_services(pool: &PgPool) -> sqlx::Result<Vec<Service>> {
    sqlx::query_as::<_, Service>(
        r"
        SELECT id, title, machine_name, description, email, url, association_id,
               restricted, visibility, created_at, updated_at
        FROM services
        ORDER BY title ASC
        ",
    )
    .fetch_all(pool)
    .await
}

/// List citizen-visible services.
pub async fn list_visible_services(pool: &PgPool) -> sqlx::Result<Vec<Service>> {
    sqlx::query_as::<_, Service>(
        r"
        SELECT id, title, machine_name, description, email, url, association_id,
               restricted, visibility, created_at, updated_at
        FROM services
        WHERE visibility = TRUE
        ORDER BY title ASC
        ",
    )
    .fetch_all(pool)
    .await
}

/// List services under one department.
pub async fn list_services_in_department(
    pool: &PgPool,
    department_id: Uuid,
) -> sqlx::Result<Vec<Service>> {
    sqlx::query_as::<_, Service>(
        r"
        SELECT s.id, s.title, s.machine_name, s.description, s.email, s.url,
               s.association_id, s.restricted, s.visibility, s.created_at, s.updated_at
        FROM services s
        JOIN associations a ON a.id = s.association_id
        WHERE a.department_id = $1
        ORDER BY s.title ASC
        ",
    )
    .bind(department_id)
    .fetch_all(pool)
    .await
}

/// List the services assigned to a grantee.
pub async fn list_services_for_grantee(
    pool: &PgPool,
    grantee_id: Uuid,
) -> sqlx::Result<Vec<Service>> {
    sqlx::query_as::<_, Service>(
        r"
        SELECT s.id, s.title, s.machine_name, s.description, s.email, s.url,
               s.association_id, s.restricted, s.visibility, s.created_at, s.updated_at
        FROM services s
        JOIN service_grantees sg ON sg.service_id = s.id
        WHERE sg.grantee_id = $1
        ORDER BY s.title ASC
        ",
    )
    .bind(grantee_id)
    .fetch_all(pool)
    .await
}

/// Create a service under an association.
#[allow(clippy::too_many_arguments)]
pub async fn create_service(
    pool: &PgPool,
    title: &str,
    machine_name: &str,
    description: &str,
    email: &str,
    url: &str,
    association_id: Uuid,
    restricted: bool,
    visibility: bool,
) -> sqlx::Result<Service> {
    sqlx::query_as::<_, Service>(
        r"
        INSERT INTO services (id, title, machine_name, description, email, url,
                              association_id, restricted, visibility)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, title, machine_name, description, email, url, association_id,
                  restricted, visibility, created_at, updated_at
        ",
    )
    .bind(Uuid::now_v7())
    .bind(title)
    .bind(machine_name)
    .bind(description)
    .bind(email)
    .bind(url)
    .bind(association_id)
    .bind(restricted)
    .bind(visibility)
    .fetch_one(pool)
    .await
}

/// Update a service.
#[allow(clippy::too_many_arguments)]
pub async fn update_service(
    pool: &PgPool,
    service_id: Uuid,
    title: Option<&str>,
    description: Option<&str>,
    email: Option<&str>,
    url: Option<&str>,
    restricted: Option<bool>,
    visibility: Option<bool>,
) -> sqlx::Result<Option<Service>> {
    sqlx::query_as::<_, Service>(
        r"
        UPDATE services
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            email = COALESCE($4, email),
            url = COALESCE($5, url),
            restricted = COALESCE($6, restricted),
            visibility = COALESCE($7, visibility),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, title, machine_name, description, email, url, association_id,
                  restricted, visibility, created_at, updated_at
        ",
    )
    .bind(service_id)
    .bind(title)
    .bind(description)
    .bind(email)
    .bind(url)
    .bind(restricted)
    .bind(visibility)
    .fetch_optional(pool)
    .await
}

/// Delete a service.
///
/// Returns `true` if a row was deleted.
pub async fn delete_service(pool: &PgPool, service_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM services WHERE id = $1")
        .bind(service_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Resolve the ancestor chain of a service.
///
/// Returns `None` for an unknown service ID; the access evaluator turns
/// that into a plain denial.
pub async fn resolve_service_chain(
    pool: &PgPool,
    service_id: Uuid,
) -> sqlx::Result<Option<ServiceChain>> {
    sqlx::query_as::<_, ServiceChain>(
        r"
        SELECT s.id AS service_id, a.id AS association_id, a.department_id
        FROM services s
        JOIN associations a ON a.id = s.association_id
        WHERE s.id = $1
        ",
    )
    .bind(service_id)
    .fetch_optional(pool)
    .await
}

// ============================================================================
// Service Grantee Assignment
// ============================================================================

/// Assign a grantee to a service. Idempotent.
pub async fn assign_grantee_to_service(
    pool: &PgPool,
    service_id: Uuid,
    grantee_id: Uuid,
) -> sqlx::Result<()> {
    sqlx::query(
        r"
        INSERT INTO service_grantees (service_id, grantee_id)
        VALUES ($1, $2)
        ON CONFLICT (service_id, grantee_id) DO NOTHING
        ",
    )
    .bind(service_id)
    .bind(grantee_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a grantee from a service.
///
/// Returns `true` if an assignment was removed.
pub async fn remove_grantee_from_service(
    pool: &PgPool,
    service_id: Uuid,
    grantee_id: Uuid,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "DELETE FROM service_grantees WHERE service_id = $1 AND grantee_id = $2",
    )
    .bind(service_id)
    .bind(grantee_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
