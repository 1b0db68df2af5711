//! Actor Scope Resolution
//!
//! Handlers that serve several role surfaces extract an [`ActorScope`]
//! instead of a concrete role context; the query layer filters rows by
//! it and the authority helpers decide whether the actor may touch a
//! given node of the resource tree.

use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::permissions::ScopeTier;

use super::error::AuthError;
use super::middleware::{AdminContext, AuthCitizen, GranteeContext, ManagerContext};

/// Which kind of actor performed an operation, as stored in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, utoipa::ToSchema)]
#[sqlx(type_name = "actor_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Citizen,
    Grantee,
    Administrator,
    Manager,
}

/// The resolved scope of the current caller.
///
/// Exactly one role context is present per request (the role middleware
/// of the surface the route lives under), so resolution is unambiguous.
#[derive(Debug, Clone)]
pub enum ActorScope {
    Citizen {
        citizen_id: Uuid,
    },
    Grantee {
        grantee_id: Uuid,
        citizen_id: Uuid,
    },
    Administrator {
        administrator_id: Uuid,
        department_id: Uuid,
    },
    Manager {
        manager_id: Uuid,
    },
}

impl ActorScope {
    /// Identity pair recorded in the audit log.
    #[must_use]
    pub const fn audit_identity(&self) -> (ActorKind, Uuid) {
        match self {
            Self::Citizen { citizen_id } => (ActorKind::Citizen, *citizen_id),
            Self::Grantee { grantee_id, .. } => (ActorKind::Grantee, *grantee_id),
            Self::Administrator {
                administrator_id, ..
            } => (ActorKind::Administrator, *administrator_id),
            Self::Manager { manager_id } => (ActorKind::Manager, *manager_id),
        }
    }

    /// Whether this scope carries resolution authority at all.
    #[must_use]
    pub const fn is_resolver(&self) -> bool {
        !matches!(self, Self::Citizen { .. })
    }
}

impl<S> axum::extract::FromRequestParts<S> for ActorScope
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<ManagerContext>() {
            return Ok(Self::Manager {
                manager_id: ctx.manager.id,
            });
        }
        if let Some(ctx) = parts.extensions.get::<AdminContext>() {
            return Ok(Self::Administrator {
                administrator_id: ctx.administrator.id,
                department_id: ctx.department_id,
            });
        }
        if let Some(ctx) = parts.extensions.get::<GranteeContext>() {
            return Ok(Self::Grantee {
                grantee_id: ctx.grantee.id,
                citizen_id: ctx.grantee.citizen_id,
            });
        }
        let auth = parts
            .extensions
            .get::<AuthCitizen>()
            .ok_or(AuthError::MissingAuthHeader)?;
        Ok(Self::Citizen {
            citizen_id: auth.id,
        })
    }
}

// ============================================================================
// Authority checks
// ============================================================================

/// Ensure the actor may administer the given service.
///
/// Managers may touch everything, administrators the services under
/// their department, grantees the services assigned to them.
pub async fn ensure_service_authority(
    pool: &PgPool,
    scope: &ActorScope,
    service_id: Uuid,
) -> ApiResult<()> {
    let allowed = match scope {
        ActorScope::Manager { .. } => true,
        ActorScope::Administrator { department_id, .. } => {
            service_in_department(pool, service_id, *department_id).await?
        }
        ActorScope::Grantee { grantee_id, .. } => {
            grantee_manages_service(pool, *grantee_id, service_id).await?
        }
        ActorScope::Citizen { .. } => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(ApiError::Authorization(
            "Not authorized to manage this service".into(),
        ))
    }
}

/// Ensure the actor may administer the given association.
pub async fn ensure_association_authority(
    pool: &PgPool,
    scope: &ActorScope,
    association_id: Uuid,
) -> ApiResult<()> {
    let allowed = match scope {
        ActorScope::Manager { .. } => true,
        ActorScope::Administrator { department_id, .. } => {
            association_in_department(pool, association_id, *department_id).await?
        }
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(ApiError::Authorization(
            "Not authorized to manage this association".into(),
        ))
    }
}

/// Ensure the actor may administer the given department.
pub fn ensure_department_authority(scope: &ActorScope, department_id: Uuid) -> ApiResult<()> {
    let allowed = match scope {
        ActorScope::Manager { .. } => true,
        ActorScope::Administrator {
            department_id: own, ..
        } => *own == department_id,
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(ApiError::Authorization(
            "Not authorized to manage this department".into(),
        ))
    }
}

/// Ensure the actor may administer a permission targeting the given
/// node of the resource tree.
///
/// Grantees only hold authority at the service tier.
pub async fn ensure_scope_authority(
    pool: &PgPool,
    scope: &ActorScope,
    tier: ScopeTier,
    target: Uuid,
) -> ApiResult<()> {
    match tier {
        ScopeTier::Department => ensure_department_authority(scope, target),
        ScopeTier::Association => ensure_association_authority(pool, scope, target).await,
        ScopeTier::Service => ensure_service_authority(pool, scope, target).await,
    }
}

async fn service_in_department(
    pool: &PgPool,
    service_id: Uuid,
    department_id: Uuid,
) -> sqlx::Result<bool> {
    let result: (bool,) = sqlx::query_as(
        r"
        SELECT EXISTS(
            SELECT 1
            FROM services s
            JOIN associations a ON a.id = s.association_id
            WHERE s.id = $1 AND a.department_id = $2
        )
        ",
    )
    .bind(service_id)
    .bind(department_id)
    .fetch_one(pool)
    .await?;

    Ok(result.0)
}

async fn association_in_department(
    pool: &PgPool,
    association_id: Uuid,
    department_id: Uuid,
) -> sqlx::Result<bool> {
    let result: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM associations WHERE id = $1 AND department_id = $2)",
    )
    .bind(association_id)
    .bind(department_id)
    .fetch_one(pool)
    .await?;

    Ok(result.0)
}

async fn grantee_manages_service(
    pool: &PgPool,
    grantee_id: Uuid,
    service_id: Uuid,
) -> sqlx::Result<bool> {
    let result: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM service_grantees WHERE service_id = $1 AND grantee_id = $2)",
    )
    .bind(service_id)
    .bind(grantee_id)
    .fetch_one(pool)
    .await?;

    Ok(result.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ActorScope {
        ActorScope::Manager {
            manager_id: Uuid::now_v7(),
        }
    }

    fn administrator(department_id: Uuid) -> ActorScope {
        ActorScope::Administrator {
            administrator_id: Uuid::now_v7(),
            department_id,
        }
    }

    #[test]
    fn test_department_authority_manager_unrestricted() {
        assert!(ensure_department_authority(&manager(), Uuid::now_v7()).is_ok());
    }

    #[test]
    fn test_department_authority_admin_own_only() {
        let dept = Uuid::now_v7();
        let scope = administrator(dept);

        assert!(ensure_department_authority(&scope, dept).is_ok());
        assert!(ensure_department_authority(&scope, Uuid::now_v7()).is_err());
    }

    #[test]
    fn test_department_authority_denies_grantee_and_citizen() {
        let grantee = ActorScope::Grantee {
            grantee_id: Uuid::now_v7(),
            citizen_id: Uuid::now_v7(),
        };
        let citizen = ActorScope::Citizen {
            citizen_id: Uuid::now_v7(),
        };

        assert!(ensure_department_authority(&grantee, Uuid::now_v7()).is_err());
        assert!(ensure_department_authority(&citizen, Uuid::now_v7()).is_err());
    }

    #[test]
    fn test_audit_identity_names_role_record() {
        let id = Uuid::now_v7();
        let scope = ActorScope::Grantee {
            grantee_id: id,
            citizen_id: Uuid::now_v7(),
        };

        assert_eq!(scope.audit_identity(), (ActorKind::Grantee, id));
    }

    #[test]
    fn test_citizen_scope_is_not_a_resolver() {
        let citizen = ActorScope::Citizen {
            citizen_id: Uuid::now_v7(),
        };

        assert!(!citizen.is_resolver());
        assert!(manager().is_resolver());
    }
}
