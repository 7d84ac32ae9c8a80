// motorpool_sim/src/prelude.rs

// Re-export the entire Bevy prelude for convenience.
pub use bevy::prelude::*;

// Re-export the motorpool_core prelude so you can easily access pure types
// like `ActorId`, `Capability`, `VehicleCommand`, etc.
pub use motorpool_core::prelude::*;

// Re-export common host-side types.
pub use crate::simulation::config::MotorpoolConfig;
pub use crate::simulation::core::app_state::MotorpoolSet;
pub use crate::simulation::core::components::{Grants, SpawnedVehicle, SpawnerActor, Structure};
pub use crate::simulation::core::events::{
    PlayerSessionStarted, ServerSaveEvent, SetQuotaEvent, VehicleCommandEvent,
    VehicleCommandResult, WorldResetEvent,
};
pub use crate::simulation::plugins::spawner::SpawnerState;
pub use crate::MotorpoolPlugin;
