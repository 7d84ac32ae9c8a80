// motorpool_sim/src/lib.rs

use bevy::prelude::*;

use crate::simulation::plugins::spawner::VehicleSpawnerPlugin;

// This prelude is for convenience for other files WITHIN the motorpool_sim crate.
pub mod prelude;

// Host-side wiring: config, components, events and the Bevy services.
pub mod cli;
pub mod simulation;

/// The main plugin. Insert a `MotorpoolConfig` resource before adding it,
/// otherwise the defaults are used. Expects avian3d's `PhysicsPlugins` for
/// the spatial queries behind vehicle placement.
pub struct MotorpoolPlugin;

impl Plugin for MotorpoolPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(VehicleSpawnerPlugin);
    }
}
