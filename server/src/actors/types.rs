//! Actor Directory Type Definitions

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGranteeRequest {
    #[validate(length(min = 2, max = 50, message = "Username must be 2-50 characters"))]
    pub username: String,
    pub citizen_id: Uuid,
    pub association_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateGranteeRequest {
    #[validate(length(min = 2, max = 50, message = "Username must be 2-50 characters"))]
    pub username: Option<String>,
    pub association_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAdministratorRequest {
    #[validate(length(min = 2, max = 50, message = "Username must be 2-50 characters"))]
    pub username: String,
    pub citizen_id: Uuid,
    #[validate(email(message = "First email must be a valid email address"))]
    pub first_email: String,
    #[validate(email(message = "Second email must be a valid email address"))]
    pub second_email: Option<String>,
    /// How many grantees this administrator may register under their department.
    #[validate(range(min = 1, max = 99, message = "Grantee limit must be 1-99"))]
    pub grantee_limit: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAdministratorRequest {
    #[validate(length(min = 2, max = 50, message = "Username must be 2-50 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "First email must be a valid email address"))]
    pub first_email: Option<String>,
    #[validate(email(message = "Second email must be a valid email address"))]
    pub second_email: Option<String>,
    #[validate(range(min = 1, max = 99, message = "Grantee limit must be 1-99"))]
    pub grantee_limit: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateManagerRequest {
    #[validate(length(min = 2, max = 50, message = "Username must be 2-50 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "First email must be a valid email address"))]
    pub first_email: Option<String>,
    #[validate(email(message = "Second email must be a valid email address"))]
    pub second_email: Option<String>,
}
