//! Permission openness evaluation.
//!
//! A permission admits the citizens it names only while it is open.
//! Openness is a pure function of the row and the evaluation instant,
//! so a permission expires or comes into force without anyone writing
//! to the registry.

use chrono::{DateTime, Utc};

use super::models::Permission;

/// Whether a permission is open at `now`.
///
/// Open means the administrative switch is on and `now` lies inside
/// the inclusive `[start_time, end_time]` window.
#[must_use]
pub fn is_open(permission: &Permission, now: DateTime<Utc>) -> bool {
    permission.active && permission.start_time <= now && now <= permission.end_time
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::super::models::ScopeTier;
    use super::*;

    fn permission(
        start_offset_hours: i64,
        end_offset_hours: i64,
        active: bool,
    ) -> (Permission, DateTime<Utc>) {
        let now = Utc::now();
        let permission = Permission {
            id: Uuid::now_v7(),
            name: "After-hours clinic access".to_string(),
            description: String::new(),
            scope_tier: ScopeTier::Service,
            scope_target: Uuid::now_v7(),
            start_time: now + Duration::hours(start_offset_hours),
            end_time: now + Duration::hours(end_offset_hours),
            active,
            citizens: vec![Uuid::now_v7()],
            created_at: now,
            updated_at: now,
        };
        (permission, now)
    }

    #[test]
    fn test_open_inside_window() {
        let (p, now) = permission(-1, 1, true);
        assert!(is_open(&p, now));
    }

    #[test]
    fn test_closed_before_window() {
        let (p, now) = permission(1, 2, true);
        assert!(!is_open(&p, now));
    }

    #[test]
    fn test_closed_after_window() {
        let (p, now) = permission(-2, -1, true);
        assert!(!is_open(&p, now));
    }

    #[test]
    fn test_inactive_never_opens() {
        let (p, now) = permission(-1, 1, false);
        assert!(!is_open(&p, now));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let (p, _) = permission(-1, 1, true);
        assert!(is_open(&p, p.start_time));
        assert!(is_open(&p, p.end_time));
    }

    #[test]
    fn test_openness_changes_with_now_without_writes() {
        let (p, now) = permission(-1, 1, true);

        assert!(!is_open(&p, now - Duration::hours(2)));
        assert!(is_open(&p, now));
        assert!(!is_open(&p, now + Duration::hours(2)));
    }
}
