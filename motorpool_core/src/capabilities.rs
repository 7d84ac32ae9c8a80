// motorpool_core/src/capabilities.rs

//! The closed set of permission grants the spawner understands, and the
//! contract for anything that can answer "does this actor hold X".

use crate::types::{ActorId, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    UseMenu,
    /// Gates the destroy command.
    DespawnOthers,
    CooldownShort,
    CooldownMedium,
    CooldownLong,
    SpawnCar,
    SpawnHeli,
    NoCooldown,
    QuotaTier3,
    QuotaTier6,
    QuotaUnlimited,
}

impl Capability {
    pub const ALL: [Capability; 11] = [
        Capability::UseMenu,
        Capability::DespawnOthers,
        Capability::CooldownShort,
        Capability::CooldownMedium,
        Capability::CooldownLong,
        Capability::SpawnCar,
        Capability::SpawnHeli,
        Capability::NoCooldown,
        Capability::QuotaTier3,
        Capability::QuotaTier6,
        Capability::QuotaUnlimited,
    ];

    /// The permission string a host permission system registers for this grant.
    pub fn permission_name(self) -> &'static str {
        match self {
            Capability::UseMenu => "vehiclespawner.use",
            Capability::DespawnOthers => "vehiclespawner.despawn",
            Capability::CooldownShort => "vehiclespawner.cooldown.1m",
            Capability::CooldownMedium => "vehiclespawner.cooldown.1h",
            Capability::CooldownLong => "vehiclespawner.cooldown.1d",
            Capability::SpawnCar => "vehiclespawner.car",
            Capability::SpawnHeli => "vehiclespawner.minicopter",
            Capability::NoCooldown => "vehiclespawner.nocooldown",
            Capability::QuotaTier3 => "vehiclespawner.limit.3",
            Capability::QuotaTier6 => "vehiclespawner.limit.6",
            Capability::QuotaUnlimited => "vehiclespawner.limit.unlimited",
        }
    }

    /// The grant required to spawn a given kind.
    pub fn spawn_capability(kind: ResourceKind) -> Capability {
        match kind {
            ResourceKind::Car => Capability::SpawnCar,
            ResourceKind::Helicopter => Capability::SpawnHeli,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.permission_name())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|cap| cap.permission_name() == s)
            .ok_or_else(|| format!("unknown permission '{}'", s))
    }
}

// --- PERMISSION SERVICE TRAIT ---
// The host's permission system implements this; so does the in-memory
// `CapabilitySet` used by tests and the headless demo.
pub trait PermissionService {
    fn has_permission(&self, actor: ActorId, capability: Capability) -> bool;
}

/// A simple in-memory grant table.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    grants: HashMap<ActorId, HashSet<Capability>>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, actor: ActorId, capability: Capability) -> &mut Self {
        self.grants.entry(actor).or_default().insert(capability);
        self
    }

    pub fn grant_all(
        &mut self,
        actor: ActorId,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> &mut Self {
        self.grants.entry(actor).or_default().extend(capabilities);
        self
    }

    pub fn revoke(&mut self, actor: ActorId, capability: Capability) -> bool {
        self.grants
            .get_mut(&actor)
            .is_some_and(|set| set.remove(&capability))
    }

    pub fn held_by(&self, actor: ActorId) -> impl Iterator<Item = Capability> + '_ {
        self.grants.get(&actor).into_iter().flatten().copied()
    }
}

impl PermissionService for CapabilitySet {
    fn has_permission(&self, actor: ActorId, capability: Capability) -> bool {
        self.grants
            .get(&actor)
            .is_some_and(|set| set.contains(&capability))
    }
}

/// A grant list for one actor, handy for host adapters that already know who
/// is asking (e.g. a permissions component on the player's entity).
impl PermissionService for HashSet<Capability> {
    fn has_permission(&self, _actor: ActorId, capability: Capability) -> bool {
        self.contains(&capability)
    }
}
