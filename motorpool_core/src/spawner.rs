// motorpool_core/src/spawner.rs

//! Command orchestration. Each command checks entitlement first, then asks
//! the external services to act on the world, and only after they succeed
//! commits the change to the ledger (effect-then-commit).

use crate::capabilities::{Capability, PermissionService};
use crate::error::CommandError;
use crate::evaluator::{DenyReason, Evaluator};
use crate::ledger::{Ledger, LedgerError, LedgerResult};
use crate::policy::SpawnPolicy;
use crate::services::{EntityEngine, PlacementService};
use crate::store::LedgerStore;
use crate::types::{ActorId, Placement, ResourceHandle, ResourceKind, Timestamp};
use tracing::{debug, info, warn};

/// The actor-facing command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleCommand {
    OpenMenu,
    Spawn(ResourceKind),
    Fetch(ResourceKind),
    Destroy(ResourceKind),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    MenuOpened,
    Spawned {
        handle: ResourceHandle,
        placement: Placement,
    },
    Fetched {
        handle: ResourceHandle,
        placement: Placement,
    },
    Destroyed {
        handle: ResourceHandle,
    },
}

/// The services a command may need to touch the world.
pub struct WorldServices<'a> {
    pub permissions: &'a dyn PermissionService,
    pub placement: &'a dyn PlacementService,
    pub engine: &'a mut dyn EntityEngine,
}

pub type CommandResult = Result<CommandOutcome, CommandError>;

#[derive(Debug)]
pub struct VehicleSpawner {
    ledger: Ledger,
    policy: SpawnPolicy,
}

impl VehicleSpawner {
    pub fn open(store: impl LedgerStore + 'static, policy: SpawnPolicy) -> LedgerResult<Self> {
        let ledger = Ledger::open(store, policy.default_quota)?;
        Ok(Self { ledger, policy })
    }

    pub fn with_ledger(ledger: Ledger, policy: SpawnPolicy) -> Self {
        Self { ledger, policy }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn policy(&self) -> &SpawnPolicy {
        &self.policy
    }

    pub fn evaluator<'a>(&'a self, permissions: &'a dyn PermissionService) -> Evaluator<'a> {
        Evaluator::new(&self.ledger, permissions, &self.policy)
    }

    /// Runs one command for `actor` to completion.
    pub fn execute(
        &mut self,
        actor: ActorId,
        command: VehicleCommand,
        now: Timestamp,
        world: WorldServices<'_>,
    ) -> CommandResult {
        let result = match command {
            VehicleCommand::OpenMenu => self.open_menu(actor, world.permissions),
            VehicleCommand::Spawn(kind) => self.spawn(actor, kind, now, world),
            VehicleCommand::Fetch(kind) => self.fetch(actor, kind, now, world),
            VehicleCommand::Destroy(kind) => self.destroy(actor, kind, now, world),
        };
        if let Err(err) = &result {
            debug!("Actor {} {:?} refused: {}", actor, command, err);
        }
        result
    }

    /// The menu itself is presentation; only the `UseMenu` grant is checked here.
    pub fn open_menu(
        &self,
        actor: ActorId,
        permissions: &dyn PermissionService,
    ) -> CommandResult {
        self.evaluator(permissions)
            .require(actor, Capability::UseMenu)
            .into_result()?;
        Ok(CommandOutcome::MenuOpened)
    }

    pub fn spawn(
        &mut self,
        actor: ActorId,
        kind: ResourceKind,
        now: Timestamp,
        world: WorldServices<'_>,
    ) -> CommandResult {
        // Grants may have changed since the session started.
        let quota = self.policy.quota_for(world.permissions, actor);
        self.ledger.refresh_quota(actor, quota)?;

        {
            let evaluator = self.evaluator(world.permissions);
            evaluator.resolve_capability_kind(actor, kind)?;
            evaluator.can_spawn(actor, kind, now).into_result()?;
        }

        let placement = world
            .placement
            .find_placement(actor)
            .ok_or(CommandError::PlacementUnavailable)?
            .with_yaw_offset(self.policy.spawn_yaw_offset_deg);

        let handle = self.ledger.reserve_handle(kind);
        if !world.engine.spawn(handle, &placement) {
            return Err(CommandError::SpawnFailed);
        }

        match self.ledger.register_spawn(actor, handle, now) {
            Ok(()) => {}
            Err(LedgerError::AlreadyOwned { handle, owner }) => {
                // Nothing may stay in the world that no actor owns.
                world.engine.destroy(handle);
                warn!(
                    "Actor {} spawned {}, already owned by actor {}; removed it again.",
                    actor, handle, owner
                );
                return Err(CommandError::HandleConflict { handle, owner });
            }
            Err(err) => return Err(err.into()),
        }
        info!("Actor {} spawned {}.", actor, handle);
        Ok(CommandOutcome::Spawned { handle, placement })
    }

    pub fn fetch(
        &mut self,
        actor: ActorId,
        kind: ResourceKind,
        now: Timestamp,
        world: WorldServices<'_>,
    ) -> CommandResult {
        self.evaluator(world.permissions)
            .can_fetch_or_destroy(actor, now)
            .into_result()?;

        let handle = self.select_live(actor, kind, world.engine)?;
        // The limiter counts any matched request, even if placement fails below.
        self.ledger.relocate_mark(actor, handle, now)?;

        if world.placement.is_facing_structure(actor) {
            return Err(CommandError::PlacementObstructed);
        }
        let placement = world
            .placement
            .find_placement(actor)
            .ok_or(CommandError::PlacementUnavailable)?
            .with_yaw_offset(self.policy.spawn_yaw_offset_deg);

        if !world.engine.relocate(handle, &placement) {
            self.ledger.prune(actor, handle)?;
            return Err(DenyReason::NotFound { kind }.into());
        }
        info!("Actor {} fetched {}.", actor, handle);
        Ok(CommandOutcome::Fetched { handle, placement })
    }

    pub fn destroy(
        &mut self,
        actor: ActorId,
        kind: ResourceKind,
        now: Timestamp,
        world: WorldServices<'_>,
    ) -> CommandResult {
        {
            let evaluator = self.evaluator(world.permissions);
            evaluator
                .require(actor, Capability::DespawnOthers)
                .into_result()?;
            evaluator.can_fetch_or_destroy(actor, now).into_result()?;
        }

        let handle = self.select_live(actor, kind, world.engine)?;
        self.ledger.mark_rate_limited(actor, now);

        if !world.engine.destroy(handle) {
            self.ledger.prune(actor, handle)?;
            return Err(DenyReason::NotFound { kind }.into());
        }
        self.ledger.release(actor, handle)?;
        info!("Actor {} destroyed {}.", actor, handle);
        Ok(CommandOutcome::Destroyed { handle })
    }

    /// Newest handle of `kind` that still resolves to a world entity. Handles
    /// whose entity vanished are pruned on the way.
    fn select_live(
        &mut self,
        actor: ActorId,
        kind: ResourceKind,
        engine: &dyn EntityEngine,
    ) -> Result<ResourceHandle, CommandError> {
        loop {
            let Some(handle) = self.ledger.select_for_operation(actor, kind) else {
                return Err(DenyReason::NotFound { kind }.into());
            };
            if engine.exists(handle) {
                return Ok(handle);
            }
            self.ledger.prune(actor, handle)?;
        }
    }

    /// Drops every ledger handle `is_live` rejects, e.g. at host startup when
    /// the world did not survive the restart. Returns how many were dropped.
    pub fn prune_vanished(
        &mut self,
        is_live: impl Fn(ResourceHandle) -> bool,
    ) -> Result<usize, CommandError> {
        Ok(self.ledger.retain_live(is_live)?)
    }

        /// Re-evaluates `actor`'s quota tier, e.g. when their session starts.
    pub fn session_start(
        &mut self,
        actor: ActorId,
        permissions: &dyn PermissionService,
    ) -> Result<u32, CommandError> {
        let quota = self.policy.quota_for(permissions, actor);
        self.ledger.refresh_quota(actor, quota)?;
        Ok(quota)
    }

    /// Operator override of an actor's quota.
    pub fn set_quota(&mut self, actor: ActorId, quota: u32) -> Result<(), CommandError> {
        Ok(self.ledger.set_quota(actor, quota)?)
    }

    /// World reset: forget every actor.
    pub fn wipe(&mut self) -> Result<(), CommandError> {
        Ok(self.ledger.wipe_all()?)
    }

    /// Host save tick.
    pub fn save(&self) -> Result<(), CommandError> {
        Ok(self.ledger.flush()?)
    }
}
