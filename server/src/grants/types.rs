//! Request payloads for the grant ledger.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

/// Body of an extension. Exactly one of `end_date` / `indefinite` must
/// supply the new end policy.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExtendGrantRequest {
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub indefinite: bool,
}
