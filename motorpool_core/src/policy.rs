// motorpool_core/src/policy.rs

use crate::capabilities::{Capability, PermissionService};
use crate::types::ActorId;
use serde::{Deserialize, Serialize};

/// Quota value meaning "no practical limit".
pub const UNLIMITED_QUOTA: u32 = u32::MAX;

/// Permission-derived minimum interval between two spawns of the same kind.
/// Ordered by restrictiveness, so `max()` picks the governing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownTier {
    #[default]
    None,
    Short,
    Medium,
    Long,
}

impl CooldownTier {
    pub fn duration_secs(self) -> f64 {
        match self {
            CooldownTier::None => 0.0,
            CooldownTier::Short => 60.0,
            CooldownTier::Medium => 3600.0,
            CooldownTier::Long => 86400.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CooldownGrant {
    pub capability: Capability,
    pub tier: CooldownTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaGrant {
    pub capability: Capability,
    pub quota: u32,
}

/// Tunable rules consulted by the evaluator and the spawner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpawnPolicy {
    /// Ranked table of cooldown grants. When several are held, the longest
    /// tier governs (most restrictive wins).
    pub cooldown_tiers: Vec<CooldownGrant>,
    /// Quota grants. When several are held, the largest quota applies.
    pub quota_tiers: Vec<QuotaGrant>,
    /// Quota for actors holding no quota grant.
    pub default_quota: u32,
    /// Uniform throttle between fetch/destroy commands, in seconds.
    pub fetch_destroy_cooldown_secs: f64,
    /// Turn applied to the placement orientation of spawned and fetched
    /// vehicles, in degrees about the up axis.
    pub spawn_yaw_offset_deg: f64,
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        Self {
            cooldown_tiers: vec![
                CooldownGrant {
                    capability: Capability::CooldownLong,
                    tier: CooldownTier::Long,
                },
                CooldownGrant {
                    capability: Capability::CooldownMedium,
                    tier: CooldownTier::Medium,
                },
                CooldownGrant {
                    capability: Capability::CooldownShort,
                    tier: CooldownTier::Short,
                },
            ],
            quota_tiers: vec![
                QuotaGrant {
                    capability: Capability::QuotaUnlimited,
                    quota: UNLIMITED_QUOTA,
                },
                QuotaGrant {
                    capability: Capability::QuotaTier6,
                    quota: 6,
                },
                QuotaGrant {
                    capability: Capability::QuotaTier3,
                    quota: 3,
                },
            ],
            default_quota: 1,
            fetch_destroy_cooldown_secs: 3.0,
            spawn_yaw_offset_deg: -50.0,
        }
    }
}

impl SpawnPolicy {
    /// The governing cooldown tier for `actor`: the most restrictive one held.
    pub fn cooldown_tier(&self, permissions: &dyn PermissionService, actor: ActorId) -> CooldownTier {
        self.cooldown_tiers
            .iter()
            .filter(|grant| permissions.has_permission(actor, grant.capability))
            .map(|grant| grant.tier)
            .max()
            .unwrap_or_default()
    }

    /// The quota `actor` is entitled to from their current grants.
    pub fn quota_for(&self, permissions: &dyn PermissionService, actor: ActorId) -> u32 {
        self.quota_tiers
            .iter()
            .filter(|grant| permissions.has_permission(actor, grant.capability))
            .map(|grant| grant.quota)
            .max()
            .unwrap_or(self.default_quota)
    }
}
