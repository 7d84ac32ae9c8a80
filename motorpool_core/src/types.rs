// motorpool_core/src/types.rs

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

// --- Core Identifiers ---

/// A player/session identity. One format is used end-to-end: the ledger, the
/// rate limiter and the permission lookups all key on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The category of a spawnable world entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Car,
    Helicopter,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Car, ResourceKind::Helicopter];

    /// The tag used in persisted documents and command names.
    pub fn tag(self) -> &'static str {
        match self {
            ResourceKind::Car => "car",
            ResourceKind::Helicopter => "helicopter",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "car" => Ok(ResourceKind::Car),
            // "heli" is the short form used by the console bindings.
            "helicopter" | "heli" | "minicopter" => Ok(ResourceKind::Helicopter),
            other => Err(format!("unknown resource kind '{}'", other)),
        }
    }
}

/// Identifier of a world entity created through the spawner, tagged with the
/// kind it was spawned as. Ids are issued by the ledger and never repeat, so
/// a handle persisted by an earlier run cannot alias a newer entity.
/// In the Bevy sim the handle rides on the vehicle entity as a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(bevy_ecs::component::Component))]
pub struct ResourceHandle {
    pub id: u64,
    pub kind: ResourceKind,
}

impl ResourceHandle {
    pub fn new(id: u64, kind: ResourceKind) -> Self {
        Self { id, kind }
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

// --- Time ---

/// Wall-clock instant in seconds since the UNIX epoch.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub f64);

impl Timestamp {
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        Self(secs)
    }

    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// Seconds elapsed from `earlier` to `self`.
    pub fn seconds_since(self, earlier: Timestamp) -> f64 {
        self.0 - earlier.0
    }

    pub fn max(self, other: Timestamp) -> Timestamp {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }
}

/// A positive amount of time still to wait before an action is allowed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Remaining(pub f64);

impl Remaining {
    pub fn secs(self) -> f64 {
        self.0
    }

    /// Formats the remaining time as `HH:MM:SS`, truncating fractional seconds.
    pub fn hms(self) -> String {
        let total = self.0.max(0.0) as u64;
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

// --- Placement ---

/// A point and orientation in the host world (Y-up) where a resource should be
/// placed. Produced by the placement service, consumed by the entity engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Point3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl Placement {
    pub fn new(position: Point3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self { position, rotation }
    }

    /// Returns a copy turned about the world up axis by `degrees`.
    pub fn with_yaw_offset(&self, degrees: f64) -> Self {
        let turn = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), degrees.to_radians());
        Self {
            position: self.position,
            rotation: turn * self.rotation,
        }
    }
}
