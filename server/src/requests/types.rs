//! Request payloads for the access request workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::grants::GrantView;

use super::models::AccessRequest;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitAccessRequest {
    pub service_id: Uuid,
    #[validate(length(min = 2, max = 200, message = "Subject must be 2-200 characters"))]
    pub subject: String,
    #[validate(length(min = 1, max = 5000, message = "Message must be 1-5000 characters"))]
    pub message: String,
    /// Opaque references to uploaded documents; the files themselves
    /// live with the gateway.
    #[validate(length(max = 10, message = "At most 10 attachments"))]
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApproveAccessRequest {
    #[validate(length(min = 1, max = 2000, message = "Response must be 1-2000 characters"))]
    pub response_message: String,
    /// End of the issued grant. Exactly one of this and `indefinite`
    /// must be given.
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub indefinite: bool,
    pub amount: Option<i64>,
    #[validate(length(max = 2000, message = "Grant message too long (max 2000 characters)"))]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeclineAccessRequest {
    #[validate(length(min = 1, max = 2000, message = "Response must be 1-2000 characters"))]
    pub response_message: String,
}

/// Approval touches two entities atomically; both come back.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalResponse {
    pub request: AccessRequest,
    pub grant: GrantView,
}
