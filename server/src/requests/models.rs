//! Request Workflow Models

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A citizen's application for access to one service.
///
/// `granted` and `decline` start false (pending) and at most one of
/// them ever becomes true. Resolution happens exactly once; there is no
/// way back to pending.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct AccessRequest {
    pub id: Uuid,
    pub citizen_id: Uuid,
    pub service_id: Uuid,
    pub subject: String,
    pub message: String,
    /// Opaque attachment references, stored as a JSON array.
    pub attachments: serde_json::Value,
    pub granted: bool,
    pub decline: bool,
    pub response_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived lifecycle state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    Pending,
    Granted,
    Declined,
}

impl RequestState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Granted => "granted",
            Self::Declined => "declined",
        }
    }
}

impl AccessRequest {
    /// Derive the state from the resolution flags.
    #[must_use]
    pub const fn state(&self) -> RequestState {
        if self.granted {
            RequestState::Granted
        } else if self.decline {
            RequestState::Declined
        } else {
            RequestState::Pending
        }
    }

    /// Whether the request has been resolved either way.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.granted || self.decline
    }
}
