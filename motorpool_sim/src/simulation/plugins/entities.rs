// motorpool_sim/src/simulation/plugins/entities.rs

//! The entity engine on top of Bevy `Commands`. World changes are deferred
//! until the commands are applied, so the engine keeps its own view of which
//! vehicles are alive, seeded from a query and updated as it queues spawns
//! and despawns. Later commands in the same frame see those changes.
//!
//! Vehicles are found by the `ResourceHandle` component they carry, never by
//! `Entity` bits, which a fresh world hands out again after a restart.

use avian3d::prelude::{AngularVelocity, Collider, LinearVelocity, Mass, RigidBody};
use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

use motorpool_core::services::EntityEngine;
use motorpool_core::types::{Placement, ResourceHandle};

use crate::simulation::config::{VehiclePrefab, VehiclesConfig};
use crate::simulation::core::components::SpawnedVehicle;
use crate::simulation::plugins::placement::placement_to_transform;

/// Uniform choice among a kind's variants; `None` if none are configured.
pub fn pick_prefab<'a, R: Rng + ?Sized>(
    variants: &'a [VehiclePrefab],
    rng: &mut R,
) -> Option<&'a VehiclePrefab> {
    variants.choose(rng)
}

pub struct CommandsEngine<'a, 'w, 's, R: Rng> {
    commands: &'a mut Commands<'w, 's>,
    catalog: &'a VehiclesConfig,
    rng: &'a mut R,
    /// Vehicles that exist as of the commands queued so far.
    live: HashMap<ResourceHandle, Entity>,
}

impl<'a, 'w, 's, R: Rng> CommandsEngine<'a, 'w, 's, R> {
    pub fn new(
        commands: &'a mut Commands<'w, 's>,
        live: impl IntoIterator<Item = (ResourceHandle, Entity)>,
        catalog: &'a VehiclesConfig,
        rng: &'a mut R,
    ) -> Self {
        Self {
            commands,
            catalog,
            rng,
            live: live.into_iter().collect(),
        }
    }
}

impl<R: Rng> EntityEngine for CommandsEngine<'_, '_, '_, R> {
    fn spawn(&mut self, handle: ResourceHandle, placement: &Placement) -> bool {
        if self.live.contains_key(&handle) {
            warn!("A vehicle with handle {} already exists.", handle);
            return false;
        }
        let catalog = self.catalog;
        let Some(prefab) = pick_prefab(catalog.variants(handle.kind), &mut *self.rng) else {
            warn!("No prefab configured for kind '{}'.", handle.kind);
            return false;
        };
        let [hx, hy, hz] = prefab.half_extents;

        let entity = self
            .commands
            .spawn((
                Name::new(prefab.name.clone()),
                SpawnedVehicle {
                    prefab: prefab.name.clone(),
                },
                handle,
                placement_to_transform(placement),
                RigidBody::Dynamic,
                Collider::cuboid(hx * 2.0, hy * 2.0, hz * 2.0),
                Mass(prefab.mass),
            ))
            .id();
        self.live.insert(handle, entity);
        debug!("Spawning '{}' as {} ({:?}).", prefab.name, handle, entity);
        true
    }

    fn destroy(&mut self, handle: ResourceHandle) -> bool {
        let Some(entity) = self.live.remove(&handle) else {
            return false;
        };
        self.commands.entity(entity).try_despawn();
        true
    }

    fn relocate(&mut self, handle: ResourceHandle, placement: &Placement) -> bool {
        let Some(&entity) = self.live.get(&handle) else {
            return false;
        };
        // Arrive at rest, not with whatever motion it had where it was.
        self.commands.entity(entity).try_insert((
            placement_to_transform(placement),
            LinearVelocity::ZERO,
            AngularVelocity::ZERO,
        ));
        true
    }

    fn exists(&self, handle: ResourceHandle) -> bool {
        self.live.contains_key(&handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::world::CommandQueue;
    use motorpool_core::types::{Placement, ResourceKind};
    use nalgebra::{Point3, UnitQuaternion};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn somewhere() -> Placement {
        Placement::new(Point3::new(0.0, 2.0, -4.0), UnitQuaternion::identity())
    }

    #[test]
    fn engine_tracks_its_own_queued_changes() {
        let world = World::new();
        let mut queue = CommandQueue::default();
        let mut commands = Commands::new(&mut queue, &world);
        let catalog = VehiclesConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut engine = CommandsEngine::new(&mut commands, [], &catalog, &mut rng);

        let handle = ResourceHandle::new(1, ResourceKind::Car);
        assert!(engine.spawn(handle, &somewhere()));
        assert!(engine.exists(handle));
        assert!(!engine.exists(ResourceHandle::new(1, ResourceKind::Helicopter)));
        assert!(!engine.spawn(handle, &somewhere()));

        assert!(engine.relocate(handle, &somewhere()));
        assert!(engine.destroy(handle));
        assert!(!engine.exists(handle));
        assert!(!engine.destroy(handle));
        assert!(!engine.relocate(handle, &somewhere()));
    }

    #[test]
    fn entity_bits_from_a_fresh_world_do_not_make_a_handle_live() {
        // Two worlds hand out the same first entity; the engine must not care.
        let mut world = World::new();
        let parked = world.spawn_empty().id();
        let mut other_run = World::new();
        assert_eq!(other_run.spawn_empty().id(), parked);

        let mut queue = CommandQueue::default();
        let mut commands = Commands::new(&mut queue, &world);
        let catalog = VehiclesConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let live = ResourceHandle::new(12, ResourceKind::Car);
        let engine = CommandsEngine::new(&mut commands, [(live, parked)], &catalog, &mut rng);

        assert!(engine.exists(live));
        assert!(!engine.exists(ResourceHandle::new(parked.to_bits(), ResourceKind::Car)));
    }

    #[test]
    fn unconfigured_kinds_are_refused() {
        let world = World::new();
        let mut queue = CommandQueue::default();
        let mut commands = Commands::new(&mut queue, &world);
        let catalog = VehiclesConfig {
            car: Vec::new(),
            ..VehiclesConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut engine = CommandsEngine::new(&mut commands, [], &catalog, &mut rng);

        let car = ResourceHandle::new(1, ResourceKind::Car);
        assert!(!engine.spawn(car, &somewhere()));
        assert!(!engine.exists(car));
        assert!(engine.spawn(ResourceHandle::new(2, ResourceKind::Helicopter), &somewhere()));
    }

    #[test]
    fn seeded_rng_repeats_the_same_variant_sequence() {
        let cars = VehiclesConfig::default().car;
        let picks = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..16)
                .map(|_| pick_prefab(&cars, &mut rng).map(|p| p.name.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(7), picks(7));
        assert!(picks(7).iter().all(Option::is_some));
    }

    #[test]
    fn every_car_variant_gets_picked_eventually() {
        let cars = VehiclesConfig::default().car;
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let seen: HashSet<String> = (0..200)
            .filter_map(|_| pick_prefab(&cars, &mut rng).map(|p| p.name.clone()))
            .collect();
        assert_eq!(seen.len(), cars.len());
    }

    #[test]
    fn single_variant_and_empty_catalogs() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let helis = VehiclesConfig::default().helicopter;
        assert_eq!(pick_prefab(&helis, &mut rng).unwrap().name, "minicopter");
        assert!(pick_prefab(&[], &mut rng).is_none());
    }
}
