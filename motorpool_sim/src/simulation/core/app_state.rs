// motorpool_sim/src/simulation/core/app_state.rs

use bevy::ecs::schedule::SystemSet;

/// Per-frame ordering of the motorpool systems on `Update`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MotorpoolSet {
    /// Host hooks: session starts, quota overrides, world resets, saves.
    Lifecycle,
    /// Actor commands against the ledger and the world.
    Commands,
    /// Rendering command results for the requester.
    Presentation,
}
