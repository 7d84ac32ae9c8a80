// motorpool_sim/examples/headless_server.rs

//! A scripted motorpool session.
//!
//! This example demonstrates how to:
//! 1. Load the motorpool configuration from TOML (plus `MOTORPOOL_` env vars).
//! 2. Set up a Bevy app with avian3d physics, windowed or headless.
//! 3. Add the `MotorpoolPlugin` and drive it purely through events.
//!
//! Two actors issue a fixed timeline of commands; every result is logged.
//!
//! To run this example:
//! `cargo run --example headless_server -- --headless --ledger /tmp/ledger.json`

use std::collections::VecDeque;

use avian3d::prelude::*;
use bevy::{log::LogPlugin, prelude::*};
use clap::Parser;

use motorpool_sim::cli::Cli;
use motorpool_sim::prelude::*;

const ALICE: ActorId = ActorId(76561198000000001);
const BOB: ActorId = ActorId(76561198000000002);

fn main() {
    // --- 1. Load Configuration ---
    let cli = Cli::parse();
    let config = match MotorpoolConfig::load(&cli.config) {
        Ok(config) => config.with_ledger_override(cli.ledger.clone()),
        Err(err) => {
            eprintln!("Failed to load configuration from {:?}: {}", cli.config, err);
            std::process::exit(2);
        }
    };

    let log = LogPlugin {
        level: bevy::log::Level::INFO,
        filter: "info,wgpu_core=error,wgpu_hal=error,motorpool_sim=debug,motorpool_core=debug"
            .to_string(),
        ..default()
    };

    let mut app = App::new();

    // --- 2. Add Core Bevy Plugins & Resources ---
    if cli.headless {
        app.add_plugins((
            MinimalPlugins,
            log,
            TransformPlugin,
            AssetPlugin::default(),
            bevy::scene::ScenePlugin,
        ))
        .init_asset::<Mesh>();
    } else {
        app.add_plugins(DefaultPlugins.set(log))
            .add_plugins(PhysicsDebugPlugin::default());
    }
    app.add_plugins(PhysicsPlugins::default())
        .insert_resource(config)
        .insert_resource(cli);

    // --- 3. Add the Motorpool Plugin ---
    app.add_plugins(MotorpoolPlugin);

    // --- 4. Add Example-Specific Systems ---
    app.insert_resource(Script::demo())
        .add_systems(Startup, build_scene)
        .add_systems(Update, run_script.before(MotorpoolSet::Lifecycle));

    // --- 5. Run the App ---
    app.run();
}

/// Flat ground, one player-built wall, two actors.
fn build_scene(mut commands: Commands, cli: Res<Cli>) {
    commands.spawn((
        Name::new("Ground"),
        RigidBody::Static,
        Collider::cuboid(200.0, 1.0, 200.0),
        Transform::from_xyz(0.0, -0.5, 0.0),
    ));
    commands.spawn((
        Name::new("Wall"),
        Structure,
        RigidBody::Static,
        Collider::cuboid(10.0, 4.0, 1.0),
        Transform::from_xyz(10.0, 2.0, -20.0),
    ));

    commands.spawn((
        Name::new("Alice"),
        SpawnerActor { id: ALICE },
        Grants::new([
            Capability::UseMenu,
            Capability::SpawnCar,
            Capability::SpawnHeli,
            Capability::DespawnOthers,
            Capability::CooldownShort,
            Capability::QuotaTier3,
        ]),
        Transform::default(),
    ));
    // Bob stands a few meters from the wall, looking at it.
    commands.spawn((
        Name::new("Bob"),
        SpawnerActor { id: BOB },
        Grants::new([Capability::SpawnCar]),
        Transform::from_xyz(10.0, 0.0, -14.0),
    ));

    if !cli.headless {
        commands.spawn((
            Camera3d::default(),
            Transform::from_xyz(-20.0, 15.0, 20.0).looking_at(Vec3::new(5.0, 0.0, -10.0), Vec3::Y),
        ));
        commands.spawn((
            DirectionalLight::default(),
            Transform::from_xyz(10.0, 30.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
        ));
    }
}

enum Step {
    Command(ActorId, VehicleCommand),
    SetQuota(ActorId, u32),
    Save,
    Reset,
    Exit,
}

#[derive(Resource)]
struct Script {
    elapsed: f32,
    steps: VecDeque<(f32, Step)>,
}

impl Script {
    fn demo() -> Self {
        use ResourceKind::{Car, Helicopter};
        use VehicleCommand::{Destroy, Fetch, OpenMenu, Spawn};

        let steps = [
            (0.5, Step::Command(ALICE, OpenMenu)),
            (1.0, Step::Command(ALICE, Spawn(Car))),
            // Denied: the one-minute cooldown is running.
            (1.2, Step::Command(ALICE, Spawn(Car))),
            (1.5, Step::Command(ALICE, Spawn(Helicopter))),
            (2.0, Step::Command(ALICE, Fetch(Car))),
            // Denied: fetch/destroy throttle.
            (2.5, Step::Command(ALICE, Fetch(Car))),
            // Denied: no helicopter grant.
            (3.0, Step::Command(BOB, Spawn(Helicopter))),
            (3.2, Step::Command(BOB, Spawn(Car))),
            // Refused: Bob is looking at the wall.
            (3.5, Step::Command(BOB, Fetch(Car))),
            // Denied: no despawn grant.
            (4.0, Step::Command(BOB, Destroy(Car))),
            (5.5, Step::Command(ALICE, Destroy(Helicopter))),
            (6.0, Step::SetQuota(BOB, 2)),
            (6.5, Step::Save),
            (7.0, Step::Reset),
            (7.5, Step::Command(ALICE, Spawn(Car))),
            (8.5, Step::Exit),
        ];
        Self {
            elapsed: 0.0,
            steps: steps.into_iter().collect(),
        }
    }
}

fn run_script(
    time: Res<Time>,
    mut script: ResMut<Script>,
    mut vehicle_commands: EventWriter<VehicleCommandEvent>,
    mut quotas: EventWriter<SetQuotaEvent>,
    mut saves: EventWriter<ServerSaveEvent>,
    mut resets: EventWriter<WorldResetEvent>,
    mut exit: EventWriter<AppExit>,
) {
    script.elapsed += time.delta_secs();
    let elapsed = script.elapsed;
    while script.steps.front().is_some_and(|(at, _)| *at <= elapsed) {
        let Some((_, step)) = script.steps.pop_front() else {
            break;
        };
        match step {
            Step::Command(actor, command) => {
                vehicle_commands.write(VehicleCommandEvent { actor, command });
            }
            Step::SetQuota(actor, quota) => {
                quotas.write(SetQuotaEvent { actor, quota });
            }
            Step::Save => {
                saves.write(ServerSaveEvent);
            }
            Step::Reset => {
                resets.write(WorldResetEvent);
            }
            Step::Exit => {
                info!("Script finished.");
                exit.write(AppExit::Success);
            }
        }
    }
}
