//! Actor Directory Models

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A platform account. Citizens submit requests and are named by grants
/// and permissions; they never resolve anything themselves.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Citizen {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub second_name: Option<String>,
    pub surname: String,
    pub national_id: String,
    pub dob: NaiveDate,
    pub email: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Service-level issuing authority, attached to one association and
/// assigned to individual services through `service_grantees`.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Grantee {
    pub id: Uuid,
    pub username: String,
    pub citizen_id: Uuid,
    pub association_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Department-level authority. Owns at most one department and may
/// register up to `grantee_limit` grantees under it.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Administrator {
    pub id: Uuid,
    pub username: String,
    pub citizen_id: Uuid,
    pub first_email: String,
    pub second_email: Option<String>,
    pub grantee_limit: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Top authority over the whole platform. Exactly one row exists,
/// seeded at deployment.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct SiteManager {
    pub id: Uuid,
    pub username: String,
    pub citizen_id: Uuid,
    pub first_email: String,
    pub second_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
