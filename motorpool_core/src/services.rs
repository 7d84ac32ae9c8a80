// motorpool_core/src/services.rs

use crate::types::{ActorId, Placement, ResourceHandle};

// --- PLACEMENT SERVICE TRAIT ---
// Finds where a vehicle should go for an actor. The Bevy adapter implements
// this with spatial queries against the physics world; tests use a scripted fake.
pub trait PlacementService {
    /// A placement point and orientation near `actor`, or `None` if nothing suitable exists.
    fn find_placement(&self, actor: ActorId) -> Option<Placement>;

    /// Whether `actor` is looking at a player-built structure, which blocks fetching.
    fn is_facing_structure(&self, actor: ActorId) -> bool {
        let _ = actor;
        false
    }
}

// --- ENTITY ENGINE TRAIT ---
// Creates, moves and destroys world objects.
pub trait EntityEngine {
    /// Creates a world entity of `handle.kind` identified by `handle`.
    /// Returns `false` if the engine refused.
    fn spawn(&mut self, handle: ResourceHandle, placement: &Placement) -> bool;

    /// Removes the entity. Returns `false` if it no longer existed.
    fn destroy(&mut self, handle: ResourceHandle) -> bool;

    /// Moves the entity. Returns `false` if it no longer existed.
    fn relocate(&mut self, handle: ResourceHandle, placement: &Placement) -> bool;

    /// Whether the handle still refers to a live world entity.
    fn exists(&self, handle: ResourceHandle) -> bool;
}
