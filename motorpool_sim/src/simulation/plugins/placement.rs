// motorpool_sim/src/simulation/plugins/placement.rs

//! The placement service on top of avian3d spatial queries. The search
//! itself is written against the small `SpatialProbe` trait so it can be
//! exercised without a physics world.

use avian3d::prelude::{Collider, ShapeCastConfig, SpatialQuery, SpatialQueryFilter};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use nalgebra::{Point3, UnitQuaternion, Vector3};

use motorpool_core::services::PlacementService;
use motorpool_core::types::{ActorId, Placement};

use crate::simulation::config::{MotorpoolConfig, PlacementSettings};
use crate::simulation::core::components::{SpawnerActor, Structure};

// =========================================================================
// == Probe Abstraction ==
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    pub entity: Entity,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Ray and sphere casts against static geometry, ignoring `exclude`.
pub trait SpatialProbe {
    fn ray(&self, origin: Vec3, direction: Dir3, max_distance: f32, exclude: Entity)
        -> Option<ProbeHit>;

    fn sphere(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Dir3,
        max_distance: f32,
        exclude: Entity,
    ) -> Option<ProbeHit>;
}

impl SpatialProbe for SpatialQuery<'_, '_> {
    fn ray(
        &self,
        origin: Vec3,
        direction: Dir3,
        max_distance: f32,
        exclude: Entity,
    ) -> Option<ProbeHit> {
        let filter = SpatialQueryFilter::from_excluded_entities([exclude]);
        self.cast_ray(origin, direction, max_distance, true, &filter)
            .map(|hit| ProbeHit {
                entity: hit.entity,
                point: origin + *direction * hit.distance,
                normal: hit.normal,
            })
    }

    fn sphere(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Dir3,
        max_distance: f32,
        exclude: Entity,
    ) -> Option<ProbeHit> {
        let filter = SpatialQueryFilter::from_excluded_entities([exclude]);
        let shape = Collider::sphere(radius);
        self.cast_shape(
            &shape,
            origin,
            Quat::IDENTITY,
            direction,
            &ShapeCastConfig::from_max_distance(max_distance),
            &filter,
        )
        .map(|hit| ProbeHit {
            entity: hit.entity,
            point: hit.point1,
            normal: hit.normal1,
        })
    }
}

// =========================================================================
// == Placement Search ==
// =========================================================================

/// Where an actor stands and looks.
#[derive(Debug, Clone, Copy)]
pub struct ActorPose {
    pub entity: Entity,
    pub feet: Vec3,
    pub forward: Vec3,
}

impl ActorPose {
    pub fn eyes(&self, settings: &PlacementSettings) -> Vec3 {
        self.feet + Vec3::Y * settings.eye_height
    }
}

/// Angle between a surface normal and world up, in degrees.
pub fn slope_deg(normal: Vec3) -> f32 {
    normal.angle_between(Vec3::Y).to_degrees()
}

/// Three probes in order of preference:
/// 1. a ray straight down from a point ahead of the eyes,
/// 2. a sphere cast down from the same point,
/// 3. a ray forward from chest height, placing the vehicle a fixed distance
///    ahead at the hit's height.
///
/// The downward probes only accept ground flatter than `max_slope_deg`.
pub fn search_placement(
    probe: &impl SpatialProbe,
    pose: &ActorPose,
    settings: &PlacementSettings,
) -> Option<Vec3> {
    let lift = Vec3::Y * settings.lift;
    let walkable = |hit: &ProbeHit| slope_deg(hit.normal) < settings.max_slope_deg;
    let start = pose.eyes(settings) + pose.forward * settings.probe_ahead;

    if let Some(hit) = probe.ray(start, Dir3::NEG_Y, settings.down_ray_length, pose.entity) {
        if walkable(&hit) {
            return Some(hit.point + lift);
        }
    }

    if let Some(hit) = probe.sphere(
        start,
        settings.sphere_radius,
        Dir3::NEG_Y,
        settings.sphere_cast_length,
        pose.entity,
    ) {
        if walkable(&hit) {
            return Some(hit.point + lift);
        }
    }

    let forward = Dir3::new(pose.forward).ok()?;
    let chest = pose.feet + Vec3::Y * settings.chest_height;
    let hit = probe.ray(chest, forward, settings.forward_ray_length, pose.entity)?;
    let mut position = pose.feet + pose.forward * settings.forward_offset;
    position.y = hit.point.y + settings.lift;
    Some(position)
}

// =========================================================================
// == Conversions ==
// =========================================================================

/// Rotation about world up that turns `-Z` onto the horizontal part of `forward`.
pub fn yaw_facing(forward: Vec3) -> UnitQuaternion<f64> {
    let yaw = (-forward.x as f64).atan2(-forward.z as f64);
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
}

pub fn to_placement(position: Vec3, forward: Vec3) -> Placement {
    Placement::new(
        Point3::new(position.x as f64, position.y as f64, position.z as f64),
        yaw_facing(forward),
    )
}

pub fn placement_to_transform(placement: &Placement) -> Transform {
    let p = placement.position;
    let r = placement.rotation.coords;
    Transform::from_xyz(p.x as f32, p.y as f32, p.z as f32).with_rotation(Quat::from_xyzw(
        r.x as f32, r.y as f32, r.z as f32, r.w as f32,
    ))
}

// =========================================================================
// == Bevy Placement Service ==
// =========================================================================

#[derive(SystemParam)]
pub struct SpatialPlacement<'w, 's> {
    spatial_query: SpatialQuery<'w, 's>,
    actors: Query<'w, 's, (Entity, &'static SpawnerActor, &'static GlobalTransform)>,
    structures: Query<'w, 's, (), With<Structure>>,
    config: Res<'w, MotorpoolConfig>,
}

impl SpatialPlacement<'_, '_> {
    fn pose_of(&self, actor: ActorId) -> Option<ActorPose> {
        self.actors
            .iter()
            .find(|(_, spawner_actor, _)| spawner_actor.id == actor)
            .map(|(entity, _, transform)| ActorPose {
                entity,
                feet: transform.translation(),
                forward: transform.forward().as_vec3(),
            })
    }
}

impl PlacementService for SpatialPlacement<'_, '_> {
    fn find_placement(&self, actor: ActorId) -> Option<Placement> {
        let pose = self.pose_of(actor)?;
        let position = search_placement(&self.spatial_query, &pose, &self.config.placement)?;
        Some(to_placement(position, pose.forward))
    }

    fn is_facing_structure(&self, actor: ActorId) -> bool {
        let settings = &self.config.placement;
        let Some(pose) = self.pose_of(actor) else {
            return false;
        };
        let Ok(forward) = Dir3::new(pose.forward) else {
            return false;
        };
        self.spatial_query
            .ray(
                pose.eyes(settings),
                forward,
                settings.structure_check_distance,
                pose.entity,
            )
            .is_some_and(|hit| self.structures.contains(hit.entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Scripted geometry: optional answers for the downward ray, the sphere
    /// cast and the forward ray, each as (hit height, surface normal).
    #[derive(Default)]
    struct FakeProbe {
        down: Option<(f32, Vec3)>,
        sphere: Option<(f32, Vec3)>,
        forward: Option<f32>,
    }

    fn hit_below(origin: Vec3, max: f32, ground: Option<(f32, Vec3)>) -> Option<ProbeHit> {
        let (height, normal) = ground?;
        (origin.y - height <= max).then(|| ProbeHit {
            entity: Entity::PLACEHOLDER,
            point: Vec3::new(origin.x, height, origin.z),
            normal,
        })
    }

    impl SpatialProbe for FakeProbe {
        fn ray(&self, origin: Vec3, direction: Dir3, max: f32, _: Entity) -> Option<ProbeHit> {
            if direction == Dir3::NEG_Y {
                return hit_below(origin, max, self.down);
            }
            self.forward.map(|height| ProbeHit {
                entity: Entity::PLACEHOLDER,
                point: Vec3::new(origin.x, height, origin.z - 3.0),
                normal: -direction.as_vec3(),
            })
        }

        fn sphere(&self, origin: Vec3, _: f32, _: Dir3, max: f32, _: Entity) -> Option<ProbeHit> {
            hit_below(origin, max, self.sphere)
        }
    }

    fn pose() -> ActorPose {
        ActorPose {
            entity: Entity::PLACEHOLDER,
            feet: Vec3::ZERO,
            forward: Vec3::NEG_Z,
        }
    }

    fn steep() -> Vec3 {
        Vec3::new(1.0, 1.0, 0.0).normalize()
    }

    #[test]
    fn slope_of_flat_and_tilted_ground() {
        assert_relative_eq!(slope_deg(Vec3::Y), 0.0);
        assert_relative_eq!(slope_deg(steep()), 45.0, epsilon = 1e-4);
    }

    #[test]
    fn flat_ground_ahead_uses_the_down_ray() {
        let probe = FakeProbe {
            down: Some((0.0, Vec3::Y)),
            ..default()
        };
        let spot = search_placement(&probe, &pose(), &PlacementSettings::default()).unwrap();
        assert_relative_eq!(spot.x, 0.0);
        assert_relative_eq!(spot.y, 2.0);
        assert_relative_eq!(spot.z, -4.0);
    }

    #[test]
    fn steep_ground_falls_back_to_sphere_cast() {
        let probe = FakeProbe {
            down: Some((0.0, steep())),
            sphere: Some((0.5, Vec3::Y)),
            ..default()
        };
        let spot = search_placement(&probe, &pose(), &PlacementSettings::default()).unwrap();
        assert_relative_eq!(spot.y, 2.5);
        assert_relative_eq!(spot.z, -4.0);
    }

    #[test]
    fn forward_ray_places_vehicle_further_ahead() {
        let probe = FakeProbe {
            down: Some((0.0, steep())),
            sphere: Some((0.0, steep())),
            forward: Some(1.2),
        };
        let spot = search_placement(&probe, &pose(), &PlacementSettings::default()).unwrap();
        assert_relative_eq!(spot.x, 0.0);
        assert_relative_eq!(spot.y, 3.2, epsilon = 1e-5);
        assert_relative_eq!(spot.z, -7.0);
    }

    #[test]
    fn ground_out_of_reach_means_no_placement() {
        let probe = FakeProbe {
            down: Some((-60.0, Vec3::Y)),
            sphere: Some((-60.0, Vec3::Y)),
            forward: None,
        };
        assert!(search_placement(&probe, &pose(), &PlacementSettings::default()).is_none());
    }

    #[test]
    fn yaw_follows_heading_and_ignores_pitch() {
        assert_relative_eq!(yaw_facing(Vec3::NEG_Z).angle(), 0.0);

        let left = yaw_facing(Vec3::NEG_X);
        assert_relative_eq!(
            left.scaled_axis(),
            Vector3::new(0.0, std::f64::consts::FRAC_PI_2, 0.0),
            epsilon = 1e-9
        );

        let pitched_down = yaw_facing(Vec3::new(0.0, -0.5, -1.0));
        assert_relative_eq!(pitched_down.angle(), 0.0);
    }

    #[test]
    fn placement_converts_to_bevy_transform() {
        let placement = to_placement(Vec3::new(1.0, 2.0, 3.0), Vec3::X);
        let transform = placement_to_transform(&placement);
        assert_relative_eq!(transform.translation.y, 2.0);
        let facing = transform.rotation * Vec3::NEG_Z;
        assert_relative_eq!(facing.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(facing.z, 0.0, epsilon = 1e-6);
    }
}
