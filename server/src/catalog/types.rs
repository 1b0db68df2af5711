//! Request payloads for catalog management.

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 2, max = 100, message = "Title must be 2-100 characters"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description too long (max 2000 characters)"))]
    #[serde(default)]
    pub description: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 3, max = 30, message = "Telephone must be 3-30 characters"))]
    pub telephone: String,
    #[validate(url(message = "Invalid website URL"))]
    pub website: String,
    pub administrator_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDepartmentRequest {
    #[validate(length(min = 2, max = 100, message = "Title must be 2-100 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description too long (max 2000 characters)"))]
    pub description: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 30, message = "Telephone must be 3-30 characters"))]
    pub telephone: Option<String>,
    #[validate(url(message = "Invalid website URL"))]
    pub website: Option<String>,
    /// Double-optional: absent leaves the assignment untouched, `null`
    /// clears it, a UUID reassigns.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub administrator_id: Option<Option<Uuid>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAssociationRequest {
    #[validate(length(min = 2, max = 100, message = "Title must be 2-100 characters"))]
    pub title: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(url(message = "Invalid website URL"))]
    pub website: Option<String>,
    pub department_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAssociationRequest {
    #[validate(length(min = 2, max = 100, message = "Title must be 2-100 characters"))]
    pub title: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(url(message = "Invalid website URL"))]
    pub website: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateServiceRequest {
    #[validate(length(min = 2, max = 100, message = "Title must be 2-100 characters"))]
    pub title: String,
    #[validate(length(
        min = 2,
        max = 50,
        message = "Machine name must be 2-50 characters"
    ))]
    pub machine_name: String,
    #[validate(length(max = 2000, message = "Description too long (max 2000 characters)"))]
    #[serde(default)]
    pub description: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(url(message = "Invalid service URL"))]
    pub url: String,
    pub association_id: Uuid,
    #[serde(default)]
    pub restricted: bool,
    #[serde(default = "default_visibility")]
    pub visibility: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateServiceRequest {
    #[validate(length(min = 2, max = 100, message = "Title must be 2-100 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description too long (max 2000 characters)"))]
    pub description: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(url(message = "Invalid service URL"))]
    pub url: Option<String>,
    pub restricted: Option<bool>,
    pub visibility: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignGranteeRequest {
    pub grantee_id: Uuid,
}

const fn default_visibility() -> bool {
    true
}

/// Distinguishes an absent field from an explicit `null`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
