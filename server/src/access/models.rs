//! Authorization Evaluator Models

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::permissions::ScopeTier;

/// What let the citizen in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AccessSource {
    /// An open standing permission at some tier of the ancestor chain.
    Permission { tier: ScopeTier, permission_id: Uuid },
    /// An active grant issued for an approved request.
    Grant { grant_id: Uuid },
}

/// The evaluator's answer for one (citizen, service, instant) triple.
///
/// `allowed` is the contract; `source` exists so operators can see which
/// rule fired without re-running the evaluation by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct AccessDecision {
    pub allowed: bool,
    pub source: Option<AccessSource>,
}

impl AccessDecision {
    #[must_use]
    pub const fn allow(source: AccessSource) -> Self {
        Self {
            allowed: true,
            source: Some(source),
        }
    }

    #[must_use]
    pub const fn deny() -> Self {
        Self {
            allowed: false,
            source: None,
        }
    }
}
