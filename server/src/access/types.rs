//! Authorization Evaluator request types.

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Body of the gateway-side access check.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AccessCheckRequest {
    pub citizen_id: Uuid,
    pub service_id: Uuid,
}
