// motorpool_sim/src/simulation/plugins/spawner.rs

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use motorpool_core::capabilities::{Capability, PermissionService};
use motorpool_core::error::CommandError;
use motorpool_core::ledger::Ledger;
use motorpool_core::spawner::{CommandOutcome, VehicleCommand, VehicleSpawner, WorldServices};
use motorpool_core::store::{JsonFileStore, MemoryStore};
use motorpool_core::types::{ActorId, ResourceHandle, Timestamp};
use std::collections::HashSet;

use crate::simulation::config::MotorpoolConfig;
use crate::simulation::core::app_state::MotorpoolSet;
use crate::simulation::core::components::{Grants, SpawnedVehicle, SpawnerActor};
use crate::simulation::core::events::{
    PlayerSessionStarted, ServerSaveEvent, SetQuotaEvent, VehicleCommandEvent,
    VehicleCommandResult, WorldResetEvent,
};
use crate::simulation::core::prng::SpawnerRng;
use crate::simulation::plugins::entities::CommandsEngine;
use crate::simulation::plugins::placement::SpatialPlacement;

// =========================================================================
// == Resources & Plugin ==
// =========================================================================

/// The ledger-owning spawner, shared by every system that touches it.
#[derive(Resource, Debug)]
pub struct SpawnerState(pub VehicleSpawner);

#[derive(Resource)]
pub struct AutosaveTimer(pub Timer);

pub struct VehicleSpawnerPlugin;

impl Plugin for VehicleSpawnerPlugin {
    fn build(&self, app: &mut App) {
        let config = match app.world().get_resource::<MotorpoolConfig>() {
            Some(config) => config.clone(),
            None => {
                warn!("No MotorpoolConfig resource inserted; using defaults.");
                let config = MotorpoolConfig::default();
                app.insert_resource(config.clone());
                config
            }
        };

        app.insert_resource(SpawnerState(open_spawner(&config)))
            .insert_resource(SpawnerRng::from_seed(config.seed));

        if config.ledger.autosave_secs > 0.0 {
            app.insert_resource(AutosaveTimer(Timer::from_seconds(
                config.ledger.autosave_secs,
                TimerMode::Repeating,
            )));
        }

        app.add_event::<VehicleCommandEvent>()
            .add_event::<VehicleCommandResult>()
            .add_event::<PlayerSessionStarted>()
            .add_event::<SetQuotaEvent>()
            .add_event::<WorldResetEvent>()
            .add_event::<ServerSaveEvent>();

        app.configure_sets(
            Update,
            (
                MotorpoolSet::Lifecycle,
                MotorpoolSet::Commands,
                MotorpoolSet::Presentation,
            )
                .chain(),
        );

        app.add_systems(PostStartup, prune_vanished_vehicles);

        app.add_systems(
            Update,
            (
                announce_new_actors,
                handle_session_starts,
                handle_quota_overrides,
                // A reset runs before queued commands so they see the empty ledger.
                handle_world_resets,
                tick_autosave.run_if(resource_exists::<AutosaveTimer>),
                handle_server_saves,
            )
                .chain()
                .in_set(MotorpoolSet::Lifecycle),
        )
        .add_systems(
            Update,
            process_vehicle_commands.in_set(MotorpoolSet::Commands),
        )
        .add_systems(
            Update,
            present_command_results.in_set(MotorpoolSet::Presentation),
        );
    }
}

/// Opens the ledger file named in the config. A document that cannot be read
/// is left on disk untouched and the host runs on an in-memory ledger.
fn open_spawner(config: &MotorpoolConfig) -> VehicleSpawner {
    let path = &config.ledger.path;
    match VehicleSpawner::open(JsonFileStore::new(path), config.policy.clone()) {
        Ok(spawner) => {
            info!("Vehicle ledger at {:?}.", path);
            spawner
        }
        Err(err) => {
            error!(
                "Could not read vehicle ledger at {:?}: {}. Ownership will NOT be saved this session.",
                path, err
            );
            let ledger = Ledger::empty(MemoryStore::new(), config.policy.default_quota);
            VehicleSpawner::with_ledger(ledger, config.policy.clone())
        }
    }
}

// =========================================================================
// == Permission Lookup ==
// =========================================================================

/// Answers capability questions from the `Grants` on actor entities.
#[derive(SystemParam)]
pub struct ActorGrants<'w, 's> {
    actors: Query<'w, 's, (&'static SpawnerActor, &'static Grants)>,
}

impl PermissionService for ActorGrants<'_, '_> {
    fn has_permission(&self, actor: ActorId, capability: Capability) -> bool {
        self.actors
            .iter()
            .any(|(spawner_actor, grants)| spawner_actor.id == actor && grants.0.contains(&capability))
    }
}

// =========================================================================
// == Lifecycle Systems ==
// =========================================================================

/// The world is not saved with the ledger. Handles whose vehicle is not in
/// the world once startup has run are dropped so they hold no quota.
fn prune_vanished_vehicles(
    mut state: ResMut<SpawnerState>,
    vehicles: Query<&ResourceHandle, With<SpawnedVehicle>>,
) {
    let live: HashSet<ResourceHandle> = vehicles.iter().copied().collect();
    match state.0.prune_vanished(|handle| live.contains(&handle)) {
        Ok(0) => {}
        Ok(dropped) => info!("Dropped {} vehicle(s) missing from the world.", dropped),
        Err(err) => error!("Dropping vanished vehicles failed: {}", err),
    }
}

fn announce_new_actors(
    new_actors: Query<&SpawnerActor, Added<SpawnerActor>>,
    mut sessions: EventWriter<PlayerSessionStarted>,
) {
    for actor in &new_actors {
        sessions.write(PlayerSessionStarted { actor: actor.id });
    }
}

fn handle_session_starts(
    mut sessions: EventReader<PlayerSessionStarted>,
    mut state: ResMut<SpawnerState>,
    grants: ActorGrants,
) {
    for session in sessions.read() {
        match state.0.session_start(session.actor, &grants) {
            Ok(quota) => debug!("Actor {} session started, quota {}.", session.actor, quota),
            Err(err) => error!("Session start for actor {} failed: {}", session.actor, err),
        }
    }
}

fn handle_quota_overrides(mut overrides: EventReader<SetQuotaEvent>, mut state: ResMut<SpawnerState>) {
    for request in overrides.read() {
        if let Err(err) = state.0.set_quota(request.actor, request.quota) {
            error!("Setting quota for actor {} failed: {}", request.actor, err);
        }
    }
}

fn handle_world_resets(mut resets: EventReader<WorldResetEvent>, mut state: ResMut<SpawnerState>) {
    if resets.is_empty() {
        return;
    }
    resets.clear();
    info!("World reset: wiping vehicle ledger.");
    if let Err(err) = state.0.wipe() {
        error!("Wiping the vehicle ledger failed: {}", err);
    }
}

fn tick_autosave(
    time: Res<Time>,
    mut timer: ResMut<AutosaveTimer>,
    mut saves: EventWriter<ServerSaveEvent>,
) {
    if timer.0.tick(time.delta()).just_finished() {
        saves.write(ServerSaveEvent);
    }
}

fn handle_server_saves(mut saves: EventReader<ServerSaveEvent>, state: Res<SpawnerState>) {
    if saves.is_empty() {
        return;
    }
    // Several save signals in one frame need only one write.
    saves.clear();
    match state.0.save() {
        Ok(()) => debug!("Vehicle ledger saved."),
        Err(err) => error!("Saving the vehicle ledger failed: {}", err),
    }
}

// =========================================================================
// == Command System ==
// =========================================================================

/// Runs every queued command in arrival order against the ledger and the world.
#[allow(clippy::too_many_arguments)]
fn process_vehicle_commands(
    mut commands: Commands,
    mut requests: EventReader<VehicleCommandEvent>,
    mut results: EventWriter<VehicleCommandResult>,
    mut state: ResMut<SpawnerState>,
    mut rng: ResMut<SpawnerRng>,
    grants: ActorGrants,
    placement: SpatialPlacement,
    vehicles: Query<(Entity, &ResourceHandle), With<SpawnedVehicle>>,
    config: Res<MotorpoolConfig>,
) {
    if requests.is_empty() {
        return;
    }
    let live = vehicles.iter().map(|(entity, handle)| (*handle, entity));
    let mut engine = CommandsEngine::new(&mut commands, live, &config.vehicles, &mut rng.0);
    let now = Timestamp::now();

    for request in requests.read() {
        let world = WorldServices {
            permissions: &grants,
            placement: &placement,
            engine: &mut engine,
        };
        let result = state.0.execute(request.actor, request.command, now, world);
        results.write(VehicleCommandResult {
            actor: request.actor,
            command: request.command,
            result,
        });
    }
}

// =========================================================================
// == Presentation ==
// =========================================================================

pub fn command_label(command: VehicleCommand) -> String {
    match command {
        VehicleCommand::OpenMenu => "open the vehicle menu".to_string(),
        VehicleCommand::Spawn(kind) => format!("spawn a {}", kind),
        VehicleCommand::Fetch(kind) => format!("fetch your {}", kind),
        VehicleCommand::Destroy(kind) => format!("destroy your {}", kind),
    }
}

/// The text shown to the requesting actor.
pub fn describe(result: &VehicleCommandResult) -> String {
    match &result.result {
        Ok(CommandOutcome::MenuOpened) => "Vehicle menu opened.".to_string(),
        Ok(CommandOutcome::Spawned { handle, .. }) => format!("Your {} has been spawned.", handle.kind),
        Ok(CommandOutcome::Fetched { handle, .. }) => {
            format!("Your {} has been brought to you.", handle.kind)
        }
        Ok(CommandOutcome::Destroyed { handle }) => format!("Your {} has been destroyed.", handle.kind),
        Err(err) => format!("Cannot {}: {}.", command_label(result.command), err),
    }
}

fn present_command_results(mut results: EventReader<VehicleCommandResult>) {
    for result in results.read() {
        let text = describe(result);
        match &result.result {
            Ok(_) => info!("[actor {}] {}", result.actor, text),
            Err(CommandError::PersistenceFailure(_)) | Err(CommandError::HandleConflict { .. }) => {
                error!("[actor {}] {}", result.actor, text)
            }
            Err(err) if err.is_denial() => info!("[actor {}] {}", result.actor, text),
            Err(_) => warn!("[actor {}] {}", result.actor, text),
        }
    }
}
