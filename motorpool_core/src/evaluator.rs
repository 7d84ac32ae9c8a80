// motorpool_core/src/evaluator.rs

//! The Entitlement Evaluator: read-only ALLOW/DENY decisions over a ledger
//! snapshot, the actor's current grants and the clock.

use crate::capabilities::{Capability, PermissionService};
use crate::ledger::Ledger;
use crate::policy::{SpawnPolicy, UNLIMITED_QUOTA};
use crate::types::{ActorId, Remaining, ResourceKind, Timestamp};

/// Why an operation was refused. All of these are expected outcomes and
/// leave the ledger untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DenyReason {
    #[error("missing permission '{capability}'")]
    PermissionDenied { capability: Capability },
    #[error("cooldown active, {} remaining", .remaining.hms())]
    CooldownActive { remaining: Remaining },
    #[error("slow down, {:.1}s remaining", .remaining.secs())]
    RateLimited { remaining: Remaining },
    #[error("vehicle limit reached ({} allowed)", quota_text(.quota))]
    QuotaExceeded { quota: u32 },
    #[error("no {kind} found")]
    NotFound { kind: ResourceKind },
}

fn quota_text(quota: &u32) -> String {
    if *quota == UNLIMITED_QUOTA {
        "unlimited".to_string()
    } else {
        quota.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

/// Borrowed view used to answer entitlement questions. Holds no state of its own.
pub struct Evaluator<'a> {
    pub ledger: &'a Ledger,
    pub permissions: &'a dyn PermissionService,
    pub policy: &'a SpawnPolicy,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        ledger: &'a Ledger,
        permissions: &'a dyn PermissionService,
        policy: &'a SpawnPolicy,
    ) -> Self {
        Self {
            ledger,
            permissions,
            policy,
        }
    }

    /// Cooldown first (skipped entirely with `NoCooldown`), then quota.
    pub fn can_spawn(&self, actor: ActorId, kind: ResourceKind, now: Timestamp) -> Decision {
        let record = self.ledger.record(actor);

        if !self.permissions.has_permission(actor, Capability::NoCooldown) {
            if let Some(last) = record.and_then(|r| r.last_spawn(kind)) {
                let cooldown = self
                    .policy
                    .cooldown_tier(self.permissions, actor)
                    .duration_secs();
                // A clock stepping backwards counts as no time passed.
                let elapsed = now.seconds_since(last).max(0.0);
                if elapsed < cooldown {
                    return Decision::Deny(DenyReason::CooldownActive {
                        remaining: Remaining(cooldown - elapsed),
                    });
                }
            }
        }

        let quota = record.map_or(self.ledger.default_quota(), |r| r.quota);
        let held = record.map_or(0, |r| r.held());
        if held >= quota as usize {
            return Decision::Deny(DenyReason::QuotaExceeded { quota });
        }

        Decision::Allow
    }

    /// The uniform fetch/destroy throttle. Applies regardless of tier and is
    /// not bypassed by `NoCooldown`.
    pub fn can_fetch_or_destroy(&self, actor: ActorId, now: Timestamp) -> Decision {
        let window = self.policy.fetch_destroy_cooldown_secs;
        let last = self
            .ledger
            .record(actor)
            .and_then(|record| record.last_rate_limited_at);
        let Some(last) = last else {
            return Decision::Allow;
        };
        let elapsed = now.seconds_since(last).max(0.0);
        if elapsed < window {
            return Decision::Deny(DenyReason::RateLimited {
                remaining: Remaining(window - elapsed),
            });
        }
        Decision::Allow
    }

    /// Confirms `actor` holds the spawn grant for `kind`.
    pub fn resolve_capability_kind(
        &self,
        actor: ActorId,
        kind: ResourceKind,
    ) -> Result<ResourceKind, DenyReason> {
        let capability = Capability::spawn_capability(kind);
        if self.permissions.has_permission(actor, capability) {
            Ok(kind)
        } else {
            Err(DenyReason::PermissionDenied { capability })
        }
    }

    pub fn require(&self, actor: ActorId, capability: Capability) -> Decision {
        if self.permissions.has_permission(actor, capability) {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::PermissionDenied { capability })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilitySet;
    use crate::store::MemoryStore;
    use crate::types::ResourceHandle;
    use approx::assert_abs_diff_eq;

    const ACTOR: ActorId = ActorId(42);

    fn at(secs: f64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    fn setup(quota: u32) -> (Ledger, SpawnPolicy, CapabilitySet) {
        let mut ledger = Ledger::open(MemoryStore::new(), 1).unwrap();
        ledger.set_quota(ACTOR, quota).unwrap();
        (ledger, SpawnPolicy::default(), CapabilitySet::new())
    }

    #[test]
    fn first_spawn_is_allowed() {
        let (ledger, policy, grants) = setup(1);
        let eval = Evaluator::new(&ledger, &grants, &policy);
        assert_eq!(eval.can_spawn(ACTOR, ResourceKind::Car, at(0.0)), Decision::Allow);
    }

    #[test]
    fn unknown_actor_uses_default_quota() {
        let ledger = Ledger::open(MemoryStore::new(), 1).unwrap();
        let policy = SpawnPolicy::default();
        let grants = CapabilitySet::new();
        let eval = Evaluator::new(&ledger, &grants, &policy);
        assert!(eval.can_spawn(ActorId(9), ResourceKind::Car, at(0.0)).is_allowed());
    }

    #[test]
    fn no_grants_second_spawn_hits_quota_not_cooldown() {
        let (mut ledger, policy, grants) = setup(1);
        ledger
            .register_spawn(ACTOR, ResourceHandle::new(1, ResourceKind::Car), at(0.0))
            .unwrap();
        let eval = Evaluator::new(&ledger, &grants, &policy);
        assert_eq!(
            eval.can_spawn(ACTOR, ResourceKind::Car, at(0.0)),
            Decision::Deny(DenyReason::QuotaExceeded { quota: 1 })
        );
    }

    #[test]
    fn short_tier_cooldown_counts_down() {
        let (mut ledger, policy, mut grants) = setup(6);
        grants.grant(ACTOR, Capability::CooldownShort);
        ledger
            .register_spawn(ACTOR, ResourceHandle::new(1, ResourceKind::Car), at(0.0))
            .unwrap();
        let eval = Evaluator::new(&ledger, &grants, &policy);

        match eval.can_spawn(ACTOR, ResourceKind::Car, at(30.0)) {
            Decision::Deny(DenyReason::CooldownActive { remaining }) => {
                assert_abs_diff_eq!(remaining.secs(), 30.0);
                assert_eq!(remaining.hms(), "00:00:30");
            }
            other => panic!("expected cooldown, got {:?}", other),
        }
        assert!(eval.can_spawn(ACTOR, ResourceKind::Car, at(61.0)).is_allowed());
    }

    #[test]
    fn cooldown_is_tracked_per_kind() {
        let (mut ledger, policy, mut grants) = setup(6);
        grants.grant(ACTOR, Capability::CooldownMedium);
        ledger
            .register_spawn(ACTOR, ResourceHandle::new(1, ResourceKind::Car), at(0.0))
            .unwrap();
        let eval = Evaluator::new(&ledger, &grants, &policy);
        assert!(eval
            .can_spawn(ACTOR, ResourceKind::Helicopter, at(1.0))
            .is_allowed());
        assert!(!eval.can_spawn(ACTOR, ResourceKind::Car, at(1.0)).is_allowed());
    }

    #[test]
    fn short_and_long_grants_evaluate_at_long_duration() {
        let (mut ledger, policy, mut grants) = setup(6);
        grants.grant_all(ACTOR, [Capability::CooldownShort, Capability::CooldownLong]);
        ledger
            .register_spawn(ACTOR, ResourceHandle::new(1, ResourceKind::Car), at(0.0))
            .unwrap();
        let eval = Evaluator::new(&ledger, &grants, &policy);

        assert!(!eval.can_spawn(ACTOR, ResourceKind::Car, at(61.0)).is_allowed());
        match eval.can_spawn(ACTOR, ResourceKind::Car, at(86_000.0)) {
            Decision::Deny(DenyReason::CooldownActive { remaining }) => {
                assert_abs_diff_eq!(remaining.secs(), 400.0);
            }
            other => panic!("expected cooldown, got {:?}", other),
        }
        assert!(eval
            .can_spawn(ACTOR, ResourceKind::Car, at(86_400.0))
            .is_allowed());
    }

    #[test]
    fn no_cooldown_skips_cooldown_but_not_quota() {
        let (mut ledger, policy, mut grants) = setup(2);
        grants.grant_all(ACTOR, [Capability::CooldownLong, Capability::NoCooldown]);
        ledger
            .register_spawn(ACTOR, ResourceHandle::new(1, ResourceKind::Car), at(0.0))
            .unwrap();
        {
            let eval = Evaluator::new(&ledger, &grants, &policy);
            assert!(eval.can_spawn(ACTOR, ResourceKind::Car, at(1.0)).is_allowed());
        }
        ledger
            .register_spawn(ACTOR, ResourceHandle::new(2, ResourceKind::Car), at(1.0))
            .unwrap();
        let eval = Evaluator::new(&ledger, &grants, &policy);
        assert_eq!(
            eval.can_spawn(ACTOR, ResourceKind::Car, at(2.0)),
            Decision::Deny(DenyReason::QuotaExceeded { quota: 2 })
        );
    }

    #[test]
    fn rate_limiter_ignores_no_cooldown() {
        let (mut ledger, policy, mut grants) = setup(1);
        grants.grant(ACTOR, Capability::NoCooldown);
        ledger.mark_rate_limited(ACTOR, at(10.0));
        let eval = Evaluator::new(&ledger, &grants, &policy);

        match eval.can_fetch_or_destroy(ACTOR, at(11.0)) {
            Decision::Deny(DenyReason::RateLimited { remaining }) => {
                assert_abs_diff_eq!(remaining.secs(), 2.0);
            }
            other => panic!("expected rate limit, got {:?}", other),
        }
        assert!(eval.can_fetch_or_destroy(ACTOR, at(13.0)).is_allowed());
        assert!(eval.can_fetch_or_destroy(ActorId(5), at(11.0)).is_allowed());
    }

    #[test]
    fn clock_stepping_backwards_never_extends_a_wait() {
        let (mut ledger, policy, mut grants) = setup(6);
        ledger
            .register_spawn(ACTOR, ResourceHandle::new(1, ResourceKind::Car), at(100.0))
            .unwrap();
        ledger.mark_rate_limited(ACTOR, at(100.0));
        {
            // No tier grant: the zero-length cooldown stays zero.
            let eval = Evaluator::new(&ledger, &grants, &policy);
            assert!(eval.can_spawn(ACTOR, ResourceKind::Car, at(90.0)).is_allowed());
            match eval.can_fetch_or_destroy(ACTOR, at(90.0)) {
                Decision::Deny(DenyReason::RateLimited { remaining }) => {
                    assert_abs_diff_eq!(remaining.secs(), 3.0);
                }
                other => panic!("expected rate limit, got {:?}", other),
            }
        }

        grants.grant(ACTOR, Capability::CooldownShort);
        let eval = Evaluator::new(&ledger, &grants, &policy);
        match eval.can_spawn(ACTOR, ResourceKind::Car, at(90.0)) {
            Decision::Deny(DenyReason::CooldownActive { remaining }) => {
                assert_abs_diff_eq!(remaining.secs(), 60.0);
            }
            other => panic!("expected cooldown, got {:?}", other),
        }
    }

    #[test]
    fn spawn_capability_is_kind_specific() {
        let (ledger, policy, mut grants) = setup(1);
        grants.grant(ACTOR, Capability::SpawnCar);
        let eval = Evaluator::new(&ledger, &grants, &policy);
        assert_eq!(
            eval.resolve_capability_kind(ACTOR, ResourceKind::Car),
            Ok(ResourceKind::Car)
        );
        assert_eq!(
            eval.resolve_capability_kind(ACTOR, ResourceKind::Helicopter),
            Err(DenyReason::PermissionDenied {
                capability: Capability::SpawnHeli
            })
        );
    }

    #[test]
    fn deny_reasons_render_for_presentation() {
        let cooldown = DenyReason::CooldownActive {
            remaining: Remaining(3725.0),
        };
        assert_eq!(cooldown.to_string(), "cooldown active, 01:02:05 remaining");
        let limited = DenyReason::RateLimited {
            remaining: Remaining(1.3),
        };
        assert_eq!(limited.to_string(), "slow down, 1.3s remaining");
        assert_eq!(
            DenyReason::QuotaExceeded { quota: 3 }.to_string(),
            "vehicle limit reached (3 allowed)"
        );
        assert_eq!(
            DenyReason::QuotaExceeded {
                quota: UNLIMITED_QUOTA
            }
            .to_string(),
            "vehicle limit reached (unlimited allowed)"
        );
    }
}
