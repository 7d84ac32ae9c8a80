// motorpool_sim/src/simulation/config/structs.rs

use bevy::prelude::Resource;
use motorpool_core::policy::SpawnPolicy;
use motorpool_core::types::ResourceKind;
use serde::Deserialize;
use std::path::PathBuf;

// =========================================================================
// == Top-Level Configuration Resource ==
// =========================================================================

/// # MotorpoolConfig
/// The Bevy resource holding all configuration for a motorpool host.
/// This struct is the root of the data parsed from `motorpool.toml`.
#[derive(Resource, Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct MotorpoolConfig {
    /// Optional seed for the prefab-variant PRNG, for deterministic runs.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub ledger: LedgerSettings,

    /// Cooldown tiers, quota tiers and throttles. Lives in the core crate.
    #[serde(default)]
    pub policy: SpawnPolicy,

    #[serde(default)]
    pub placement: PlacementSettings,

    #[serde(default)]
    pub vehicles: VehiclesConfig,
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LedgerSettings {
    /// The JSON document the ledger is read from and rewritten to.
    pub path: PathBuf,
    /// Interval of the periodic save, in seconds. Zero disables it.
    pub autosave_secs: f32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            path: "data/vehicle_ledger.json".into(),
            autosave_secs: 300.0,
        }
    }
}

/// Tuning for the spatial-query placement search. Distances in meters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PlacementSettings {
    /// Height of the actor's eyes above its transform origin.
    pub eye_height: f32,
    /// How far ahead of the eyes the downward probes start.
    pub probe_ahead: f32,
    pub down_ray_length: f32,
    /// Steepest ground, in degrees from horizontal, a vehicle may be placed on.
    pub max_slope_deg: f32,
    /// Clearance added above the found ground point.
    pub lift: f32,
    pub sphere_radius: f32,
    pub sphere_cast_length: f32,
    /// Origin height of the last-resort forward ray.
    pub chest_height: f32,
    pub forward_ray_length: f32,
    /// Horizontal distance used when the forward ray is the one that hit.
    pub forward_offset: f32,
    /// Reach of the "looking at a structure" check that blocks fetching.
    pub structure_check_distance: f32,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            eye_height: 1.5,
            probe_ahead: 4.0,
            down_ray_length: 50.0,
            max_slope_deg: 30.0,
            lift: 2.0,
            sphere_radius: 1.5,
            sphere_cast_length: 10.0,
            chest_height: 1.0,
            forward_ray_length: 10.0,
            forward_offset: 7.0,
            structure_check_distance: 10.0,
        }
    }
}

/// One spawnable body variant.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VehiclePrefab {
    pub name: String,
    /// Collider half extents [x, y, z].
    pub half_extents: [f32; 3],
    #[serde(default = "default_mass")]
    pub mass: f32,
}

fn default_mass() -> f32 {
    1200.0
}

impl VehiclePrefab {
    fn new(name: &str, half_extents: [f32; 3], mass: f32) -> Self {
        Self {
            name: name.to_string(),
            half_extents,
            mass,
        }
    }
}

/// The prefab variants each kind spawns as. A kind with several variants
/// picks one at random per spawn.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct VehiclesConfig {
    pub car: Vec<VehiclePrefab>,
    pub helicopter: Vec<VehiclePrefab>,
}

impl Default for VehiclesConfig {
    fn default() -> Self {
        Self {
            car: vec![
                VehiclePrefab::new("car_2module", [1.0, 0.8, 2.0], 900.0),
                VehiclePrefab::new("car_3module", [1.0, 0.8, 2.75], 1200.0),
                VehiclePrefab::new("car_4module", [1.0, 0.8, 3.5], 1500.0),
            ],
            helicopter: vec![VehiclePrefab::new("minicopter", [1.0, 1.0, 2.0], 600.0)],
        }
    }
}

impl VehiclesConfig {
    pub fn variants(&self, kind: ResourceKind) -> &[VehiclePrefab] {
        match kind {
            ResourceKind::Car => &self.car,
            ResourceKind::Helicopter => &self.helicopter,
        }
    }
}
