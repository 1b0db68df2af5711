//! Grant Ledger Models

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One row of the grant ledger.
///
/// Written when a request is approved and never deleted; extension and
/// revocation only touch `end_date` and `decline`. `grantee_id` names
/// the issuing grantee when one resolved the request, and survives as
/// NULL if that grantee is later removed.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Grant {
    pub id: Uuid,
    pub request_id: Option<Uuid>,
    pub grantee_id: Option<Uuid>,
    pub granted: bool,
    pub decline: bool,
    pub start_date: Option<DateTime<Utc>>,
    /// `None` means the grant never expires.
    pub end_date: Option<DateTime<Utc>>,
    pub amount: Option<i64>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle status of a grant, derived from its fields at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GrantStatus {
    Pending,
    Active,
    Expired,
    Declined,
}

impl Grant {
    /// Derive the status at `now`.
    ///
    /// Precedence is strict: declined beats expired beats active beats
    /// pending. An absent `end_date` never expires.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> GrantStatus {
        if self.decline {
            GrantStatus::Declined
        } else if self.granted {
            match self.end_date {
                Some(end) if end < now => GrantStatus::Expired,
                _ => GrantStatus::Active,
            }
        } else {
            GrantStatus::Pending
        }
    }
}

/// Wire shape of a grant: the row plus its status at read time.
#[derive(Debug, Serialize, ToSchema)]
pub struct GrantView {
    pub id: Uuid,
    pub request_id: Option<Uuid>,
    pub grantee_id: Option<Uuid>,
    pub granted: bool,
    pub decline: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub amount: Option<i64>,
    pub message: String,
    pub status: GrantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GrantView {
    #[must_use]
    pub fn from_grant(grant: Grant, now: DateTime<Utc>) -> Self {
        let status = grant.status(now);
        Self {
            id: grant.id,
            request_id: grant.request_id,
            grantee_id: grant.grantee_id,
            granted: grant.granted,
            decline: grant.decline,
            start_date: grant.start_date,
            end_date: grant.end_date,
            amount: grant.amount,
            message: grant.message,
            status,
            created_at: grant.created_at,
            updated_at: grant.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn grant(granted: bool, decline: bool, end_offset_hours: Option<i64>) -> (Grant, DateTime<Utc>) {
        let now = Utc::now();
        let grant = Grant {
            id: Uuid::now_v7(),
            request_id: Some(Uuid::now_v7()),
            grantee_id: None,
            granted,
            decline,
            start_date: Some(now - Duration::days(1)),
            end_date: end_offset_hours.map(|h| now + Duration::hours(h)),
            amount: None,
            message: String::new(),
            created_at: now,
            updated_at: now,
        };
        (grant, now)
    }

    #[test]
    fn test_declined_beats_everything() {
        let (g, now) = grant(true, true, Some(-5));
        assert_eq!(g.status(now), GrantStatus::Declined);

        let (g, now) = grant(false, true, None);
        assert_eq!(g.status(now), GrantStatus::Declined);
    }

    #[test]
    fn test_expired_beats_active() {
        let (g, now) = grant(true, false, Some(-1));
        assert_eq!(g.status(now), GrantStatus::Expired);
    }

    #[test]
    fn test_active_with_future_end() {
        let (g, now) = grant(true, false, Some(1));
        assert_eq!(g.status(now), GrantStatus::Active);
    }

    #[test]
    fn test_indefinite_grant_never_expires() {
        let (g, now) = grant(true, false, None);
        assert_eq!(g.status(now), GrantStatus::Active);
        assert_eq!(g.status(now + Duration::days(10_000)), GrantStatus::Active);
    }

    #[test]
    fn test_unresolved_row_is_pending() {
        let (g, now) = grant(false, false, None);
        assert_eq!(g.status(now), GrantStatus::Pending);
    }

    #[test]
    fn test_end_date_boundary_is_still_active() {
        let (g, _) = grant(true, false, Some(1));
        let end = g.end_date.unwrap();
        assert_eq!(g.status(end), GrantStatus::Active);
        assert_eq!(g.status(end + Duration::seconds(1)), GrantStatus::Expired);
    }

    #[test]
    fn test_status_recomputed_as_time_passes() {
        let (g, now) = grant(true, false, Some(1));

        assert_eq!(g.status(now), GrantStatus::Active);
        assert_eq!(g.status(now + Duration::hours(2)), GrantStatus::Expired);
    }

    #[test]
    fn test_view_carries_status() {
        let (g, now) = grant(true, false, Some(-1));
        let view = GrantView::from_grant(g, now);
        assert_eq!(view.status, GrantStatus::Expired);
    }
}
