//! Access evaluation logic.
//!
//! Pure decision core: the handlers prefetch the ancestor chain, the
//! candidate permissions, and the grants for the pair, then this module
//! combines them without touching the store again.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::catalog::ServiceChain;
use crate::grants::{Grant, GrantStatus};
use crate::permissions::{is_open, Permission, ScopeTier};

use super::models::{AccessDecision, AccessSource};

/// Decide whether a citizen may use a service at `now`.
///
/// Resolution order:
/// 1. Unknown service (no ancestor chain) denies outright
/// 2. Any open permission naming the citizen on the service, its
///    association, or its department allows (union across tiers)
/// 3. Otherwise an Active grant for the (citizen, service) pair allows
/// 4. Otherwise deny
///
/// Permissions are scanned most specific tier first, so the reported
/// source is the narrowest rule that fired; the boolean outcome is the
/// same under any scan order.
#[must_use]
pub fn evaluate_access(
    citizen_id: Uuid,
    chain: Option<&ServiceChain>,
    permissions: &[Permission],
    grants: &[Grant],
    now: DateTime<Utc>,
) -> AccessDecision {
    let Some(chain) = chain else {
        return AccessDecision::deny();
    };

    let tiers = [
        (ScopeTier::Service, chain.service_id),
        (ScopeTier::Association, chain.association_id),
        (ScopeTier::Department, chain.department_id),
    ];

    for (tier, target) in tiers {
        // Membership and openness are rechecked here even though the
        // usual row fetch prefilters them.
        let matched = permissions.iter().find(|p| {
            p.scope_tier == tier
                && p.scope_target == target
                && p.citizens.contains(&citizen_id)
                && is_open(p, now)
        });

        if let Some(permission) = matched {
            return AccessDecision::allow(AccessSource::Permission {
                tier,
                permission_id: permission.id,
            });
        }
    }

    if let Some(grant) = grants.iter().find(|g| g.status(now) == GrantStatus::Active) {
        return AccessDecision::allow(AccessSource::Grant { grant_id: grant.id });
    }

    AccessDecision::deny()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn chain() -> ServiceChain {
        ServiceChain {
            service_id: Uuid::new_v4(),
            association_id: Uuid::new_v4(),
            department_id: Uuid::new_v4(),
        }
    }

    fn permission(
        tier: ScopeTier,
        target: Uuid,
        citizens: Vec<Uuid>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        active: bool,
    ) -> Permission {
        Permission {
            id: Uuid::new_v4(),
            name: "Test permission".to_string(),
            description: String::new(),
            scope_tier: tier,
            scope_target: target,
            start_time: start,
            end_time: end,
            active,
            citizens,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn grant(granted: bool, decline: bool, end_date: Option<DateTime<Utc>>) -> Grant {
        Grant {
            id: Uuid::new_v4(),
            request_id: Some(Uuid::new_v4()),
            grantee_id: None,
            granted,
            decline,
            start_date: Some(Utc::now() - Duration::days(1)),
            end_date,
            amount: None,
            message: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_department_permission_covers_descendant_service() {
        let c1 = Uuid::new_v4();
        let ch = chain();
        let t0 = Utc::now();
        let p = permission(
            ScopeTier::Department,
            ch.department_id,
            vec![c1],
            t0,
            t0 + Duration::days(30),
            true,
        );

        let decision = evaluate_access(c1, Some(&ch), &[p.clone()], &[], t0 + Duration::days(1));

        assert!(decision.allowed);
        assert_eq!(
            decision.source,
            Some(AccessSource::Permission {
                tier: ScopeTier::Department,
                permission_id: p.id,
            })
        );
    }

    #[test]
    fn test_inactive_permission_never_opens() {
        let c1 = Uuid::new_v4();
        let ch = chain();
        let t0 = Utc::now();
        let p = permission(
            ScopeTier::Department,
            ch.department_id,
            vec![c1],
            t0,
            t0 + Duration::days(30),
            false,
        );

        let decision = evaluate_access(c1, Some(&ch), &[p], &[], t0 + Duration::days(1));

        assert!(!decision.allowed);
        assert_eq!(decision.source, None);
    }

    #[test]
    fn test_grant_allows_before_end_date_and_not_after() {
        let c2 = Uuid::new_v4();
        let ch = chain();
        let now = Utc::now();
        let g = grant(true, false, Some(now + Duration::days(7)));

        let before = evaluate_access(c2, Some(&ch), &[], &[g.clone()], now + Duration::days(6));
        assert!(before.allowed);
        assert_eq!(before.source, Some(AccessSource::Grant { grant_id: g.id }));

        let after = evaluate_access(c2, Some(&ch), &[], &[g], now + Duration::days(8));
        assert!(!after.allowed);
    }

    #[test]
    fn test_unknown_service_denies_even_with_open_rules() {
        let c1 = Uuid::new_v4();
        let t0 = Utc::now();
        let p = permission(
            ScopeTier::Service,
            Uuid::new_v4(),
            vec![c1],
            t0 - Duration::days(1),
            t0 + Duration::days(1),
            true,
        );
        let g = grant(true, false, None);

        let decision = evaluate_access(c1, None, &[p], &[g], t0);

        assert!(!decision.allowed);
        assert_eq!(decision.source, None);
    }

    #[test]
    fn test_permission_checked_before_grant() {
        let c1 = Uuid::new_v4();
        let ch = chain();
        let now = Utc::now();
        let p = permission(
            ScopeTier::Association,
            ch.association_id,
            vec![c1],
            now - Duration::days(1),
            now + Duration::days(1),
            true,
        );
        let g = grant(true, false, None);

        let decision = evaluate_access(c1, Some(&ch), &[p.clone()], &[g], now);

        assert_eq!(
            decision.source,
            Some(AccessSource::Permission {
                tier: ScopeTier::Association,
                permission_id: p.id,
            })
        );
    }

    #[test]
    fn test_most_specific_tier_reported() {
        let c1 = Uuid::new_v4();
        let ch = chain();
        let now = Utc::now();
        let dept = permission(
            ScopeTier::Department,
            ch.department_id,
            vec![c1],
            now - Duration::days(1),
            now + Duration::days(1),
            true,
        );
        let svc = permission(
            ScopeTier::Service,
            ch.service_id,
            vec![c1],
            now - Duration::days(1),
            now + Duration::days(1),
            true,
        );

        // List order has the broad rule first; the narrow one still wins
        // the report.
        let decision = evaluate_access(c1, Some(&ch), &[dept, svc.clone()], &[], now);

        assert_eq!(
            decision.source,
            Some(AccessSource::Permission {
                tier: ScopeTier::Service,
                permission_id: svc.id,
            })
        );
    }

    #[test]
    fn test_citizen_not_named_is_denied() {
        let named = Uuid::new_v4();
        let other = Uuid::new_v4();
        let ch = chain();
        let now = Utc::now();
        let p = permission(
            ScopeTier::Department,
            ch.department_id,
            vec![named],
            now - Duration::days(1),
            now + Duration::days(1),
            true,
        );

        let decision = evaluate_access(other, Some(&ch), &[p], &[], now);

        assert!(!decision.allowed);
    }

    #[test]
    fn test_permission_on_sibling_node_does_not_match() {
        let c1 = Uuid::new_v4();
        let ch = chain();
        let now = Utc::now();
        // Same tier, different department.
        let p = permission(
            ScopeTier::Department,
            Uuid::new_v4(),
            vec![c1],
            now - Duration::days(1),
            now + Duration::days(1),
            true,
        );

        let decision = evaluate_access(c1, Some(&ch), &[p], &[], now);

        assert!(!decision.allowed);
    }

    #[test]
    fn test_declined_and_pending_grants_do_not_allow() {
        let c1 = Uuid::new_v4();
        let ch = chain();
        let now = Utc::now();
        let declined = grant(true, true, None);
        let pending = grant(false, false, None);

        let decision = evaluate_access(c1, Some(&ch), &[], &[declined, pending], now);

        assert!(!decision.allowed);
    }

    #[test]
    fn test_indefinite_grant_allows_far_future() {
        let c1 = Uuid::new_v4();
        let ch = chain();
        let now = Utc::now();
        let g = grant(true, false, None);

        let decision = evaluate_access(c1, Some(&ch), &[], &[g], now + Duration::days(10_000));

        assert!(decision.allowed);
    }

    #[test]
    fn test_no_rules_denies() {
        let decision = evaluate_access(Uuid::new_v4(), Some(&chain()), &[], &[], Utc::now());

        assert!(!decision.allowed);
        assert_eq!(decision.source, None);
    }
}
