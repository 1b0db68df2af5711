//! Resource Hierarchy Models
//!
//! The tree is strict: every service belongs to one association, every
//! association to one department.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Root tier of the resource tree.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Department {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub email: String,
    pub telephone: String,
    pub website: String,
    /// The administrator running this department, if one is assigned.
    pub administrator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Middle tier, grouping services under a department.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Association {
    pub id: Uuid,
    pub title: String,
    pub email: String,
    pub website: Option<String>,
    pub department_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Leaf tier: the public service citizens request access to.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub machine_name: String,
    pub description: String,
    pub email: String,
    pub url: String,
    pub association_id: Uuid,
    /// Whether the gateway should consult the access evaluator before
    /// proxying traffic to this service.
    pub restricted: bool,
    /// Whether citizens can see this service in the catalog.
    pub visibility: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resolved ancestor chain of one service.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ServiceChain {
    pub service_id: Uuid,
    pub association_id: Uuid,
    pub department_id: Uuid,
}
