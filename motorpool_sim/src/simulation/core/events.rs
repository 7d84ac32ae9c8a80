// motorpool_sim/src/simulation/core/events.rs

use bevy::prelude::Event;
use motorpool_core::spawner::{CommandResult, VehicleCommand};
use motorpool_core::types::ActorId;

/// An actor asked for something: open the menu, spawn, fetch or destroy.
#[derive(Event, Debug, Clone, Copy)]
pub struct VehicleCommandEvent {
    pub actor: ActorId,
    pub command: VehicleCommand,
}

/// The structured answer to one `VehicleCommandEvent`.
#[derive(Event, Debug)]
pub struct VehicleCommandResult {
    pub actor: ActorId,
    pub command: VehicleCommand,
    pub result: CommandResult,
}

/// An actor joined; their quota tier is re-evaluated.
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerSessionStarted {
    pub actor: ActorId,
}

/// Operator override of an actor's quota.
#[derive(Event, Debug, Clone, Copy)]
pub struct SetQuotaEvent {
    pub actor: ActorId,
    pub quota: u32,
}

/// The world was reset (new save). Every ledger record is dropped.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct WorldResetEvent;

/// The host is saving; the ledger is flushed alongside it.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct ServerSaveEvent;
