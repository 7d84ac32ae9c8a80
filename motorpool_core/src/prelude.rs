// motorpool_core/src/prelude.rs

// --- Core Abstractions (the seams a host implements) ---
pub use crate::capabilities::PermissionService;
pub use crate::services::{EntityEngine, PlacementService};
pub use crate::store::LedgerStore;

// --- Core Data Structures ---
pub use crate::capabilities::{Capability, CapabilitySet};
pub use crate::ledger::{ActorRecord, Ledger, LedgerDocument};
pub use crate::policy::{CooldownTier, SpawnPolicy};
pub use crate::types::{ActorId, Placement, Remaining, ResourceHandle, ResourceKind, Timestamp};

// --- Decisions and Errors ---
pub use crate::error::CommandError;
pub use crate::evaluator::{Decision, DenyReason, Evaluator};

// --- Orchestration and Storage ---
pub use crate::spawner::{CommandOutcome, VehicleCommand, VehicleSpawner, WorldServices};
pub use crate::store::{JsonFileStore, MemoryStore};
