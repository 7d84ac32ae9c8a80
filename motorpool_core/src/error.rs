// motorpool_core/src/error.rs

use crate::evaluator::DenyReason;
use crate::ledger::LedgerError;
use crate::store::StoreError;
use crate::types::{ActorId, ResourceHandle};

/// Everything a command can fail with. Only `PersistenceFailure` needs
/// operator attention; the rest are ordinary outcomes for the requester.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Denied(#[from] DenyReason),
    #[error("no suitable placement point found")]
    PlacementUnavailable,
    #[error("cannot place a vehicle while looking at a structure")]
    PlacementObstructed,
    #[error("the entity engine did not create the vehicle")]
    SpawnFailed,
    #[error("ledger write failed, world and ledger may disagree: {0}")]
    PersistenceFailure(#[source] StoreError),
    #[error("{handle} is already owned by actor {owner}")]
    HandleConflict {
        handle: ResourceHandle,
        owner: ActorId,
    },
}

impl CommandError {
    pub fn is_denial(&self) -> bool {
        matches!(self, CommandError::Denied(_))
    }

    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, CommandError::PersistenceFailure(_))
    }
}

impl From<LedgerError> for CommandError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Store(source) => CommandError::PersistenceFailure(source),
            LedgerError::AlreadyOwned { handle, owner } => {
                CommandError::HandleConflict { handle, owner }
            }
            // The spawner only releases handles it just selected from the
            // same record, so this reads as the resource having gone missing.
            LedgerError::NotOwned { handle, .. } => {
                CommandError::Denied(DenyReason::NotFound { kind: handle.kind })
            }
        }
    }
}
