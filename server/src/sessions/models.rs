//! Service Session Models
//!
//! A session records that the gateway admitted a citizen to a service.
//! Whether it has expired is derived from `last_seen` and the configured
//! lifetime at read time; the row only stores the inputs.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One admitted citizen/service pairing, as stored.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct ServiceSession {
    pub id: Uuid,
    pub citizen_id: Uuid,
    pub service_id: Uuid,
    pub ip_address: String,
    pub last_seen: DateTime<Utc>,
    /// Set by force-expire; an enforced session is expired no matter
    /// how fresh `last_seen` is.
    pub enforce_expiry: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether a session has expired at `now`.
///
/// `enforce_expiry` dominates. Without it, a session expires only once
/// `now` is strictly past `last_seen` plus the configured lifetime; a
/// deployment with no lifetime never ages sessions out.
#[must_use]
pub fn is_expired(
    session: &ServiceSession,
    now: DateTime<Utc>,
    lifetime_hours: Option<i64>,
) -> bool {
    if session.enforce_expiry {
        return true;
    }

    match lifetime_hours {
        Some(hours) => now > session.last_seen + Duration::hours(hours),
        None => false,
    }
}

/// Wire shape of a session: the row plus its derived expiry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionView {
    pub id: Uuid,
    pub citizen_id: Uuid,
    pub service_id: Uuid,
    pub ip_address: String,
    pub last_seen: DateTime<Utc>,
    pub enforce_expiry: bool,
    pub expired: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionView {
    #[must_use]
    pub fn from_session(
        session: ServiceSession,
        now: DateTime<Utc>,
        lifetime_hours: Option<i64>,
    ) -> Self {
        let expired = is_expired(&session, now, lifetime_hours);
        Self {
            id: session.id,
            citizen_id: session.citizen_id,
            service_id: session.service_id,
            ip_address: session.ip_address,
            last_seen: session.last_seen,
            enforce_expiry: session.enforce_expiry,
            expired,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(last_seen: DateTime<Utc>, enforce_expiry: bool) -> ServiceSession {
        ServiceSession {
            id: Uuid::new_v4(),
            citizen_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            ip_address: "203.0.113.7".to_string(),
            last_seen,
            enforce_expiry,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_enforced_expiry_dominates_fresh_session() {
        let now = Utc::now();
        let s = session(now, true);

        assert!(is_expired(&s, now, None));
        assert!(is_expired(&s, now, Some(24)));
    }

    #[test]
    fn test_no_lifetime_never_ages_out() {
        let now = Utc::now();
        let s = session(now - Duration::days(10_000), false);

        assert!(!is_expired(&s, now, None));
    }

    #[test]
    fn test_ages_out_past_lifetime() {
        let now = Utc::now();
        let s = session(now - Duration::hours(13), false);

        assert!(is_expired(&s, now, Some(12)));
        assert!(!is_expired(&s, now, Some(24)));
    }

    #[test]
    fn test_boundary_instant_is_not_yet_expired() {
        let last_seen = Utc::now();
        let s = session(last_seen, false);
        let boundary = last_seen + Duration::hours(12);

        assert!(!is_expired(&s, boundary, Some(12)));
        assert!(is_expired(&s, boundary + Duration::seconds(1), Some(12)));
    }

    #[test]
    fn test_view_carries_derived_expiry() {
        let now = Utc::now();
        let stale = session(now - Duration::hours(48), false);
        let fresh = session(now, false);

        assert!(SessionView::from_session(stale, now, Some(12)).expired);
        assert!(!SessionView::from_session(fresh, now, Some(12)).expired);
    }
}
