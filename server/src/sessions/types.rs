//! Service session request types.

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Body of the gateway's session-open call.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OpenSessionRequest {
    pub citizen_id: Uuid,
    pub service_id: Uuid,
    /// Client address as seen by the gateway.
    #[validate(ip)]
    pub ip_address: String,
}
