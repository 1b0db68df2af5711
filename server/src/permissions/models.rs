//! Permission Registry Models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Which node kind of the resource tree a permission targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "scope_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScopeTier {
    Department,
    Association,
    Service,
}

impl ScopeTier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Department => "department",
            Self::Association => "association",
            Self::Service => "service",
        }
    }
}

/// A standing, time-windowed access rule naming one or more citizens.
///
/// Exactly one target node, discriminated by `scope_tier`. Whether the
/// permission is open right now is recomputed from the window and the
/// `active` switch on every evaluation; it is never stored.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub scope_tier: ScopeTier,
    pub scope_target: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Administrative kill-switch. A deactivated permission stays in
    /// the registry but never opens.
    pub active: bool,
    pub citizens: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
