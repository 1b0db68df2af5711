//! Request payloads for the permission registry.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePermissionRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Description too long (max 2000 characters)"))]
    #[serde(default)]
    pub description: String,
    /// Node of the resource tree the permission targets; its kind comes
    /// from the route's tier segment.
    pub scope_target: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(length(min = 1, message = "At least one citizen is required"))]
    pub citizens: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePermissionRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "Description too long (max 2000 characters)"))]
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub active: Option<bool>,
    /// Replaces the whole citizen set when present.
    #[validate(length(min = 1, message = "At least one citizen is required"))]
    pub citizens: Option<Vec<Uuid>>,
}
