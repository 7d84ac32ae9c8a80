// motorpool_sim/src/simulation/core/components.rs

use bevy::prelude::Component;
use motorpool_core::capabilities::Capability;
use motorpool_core::types::ActorId;
use std::collections::HashSet;

/// Marks an entity as an actor that can issue vehicle commands. Its
/// `Transform` is taken as the actor's feet, facing `-Z`.
#[derive(Component, Debug, Clone, Copy)]
pub struct SpawnerActor {
    pub id: ActorId,
}

/// The permission grants held by an actor entity.
#[derive(Component, Debug, Clone, Default)]
pub struct Grants(pub HashSet<Capability>);

impl Grants {
    pub fn new(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self(capabilities.into_iter().collect())
    }
}

/// A vehicle created through the spawner. The entity also carries its
/// `ResourceHandle`, which is what the ledger knows it by.
#[derive(Component, Debug, Clone)]
pub struct SpawnedVehicle {
    pub prefab: String,
}

/// A player-built structure. Actors looking at one cannot fetch.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Structure;
