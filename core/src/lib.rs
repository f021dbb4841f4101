#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Berry Grove simulation.
//!
//! This crate defines the vocabulary that connects the event channel, the
//! projectile and collectible systems, the world aggregate and the adapters.
//! Systems publish [`Event`] values through a shared channel, report flight
//! results as [`FlightOutcome`] values and talk to the host scene exclusively
//! through the [`Scene`] trait so that the simulation never depends on a
//! concrete engine.

use std::{cell::Cell, time::Duration};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod scene;

pub use scene::{Container, NullScene, RecordingScene, Scene, SceneCall, SceneNode};

/// Upward angle, in degrees, used when no launch angle is configured.
pub const DEFAULT_LAUNCH_ANGLE_DEGREES: f32 = 45.0;

/// Gravitational acceleration applied to projectiles when none is configured.
pub const DEFAULT_GRAVITY: f32 = 9.81;

/// Identifier shared by a collectible group and every entity it owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(u32);

impl GroupId {
    /// Creates a new group identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a collectible entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectibleId(u32);

impl CollectibleId {
    /// Creates a new collectible identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Slot index of a projectile actor inside its pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided slot index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the slot index of the actor.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Discriminant used to route events to their subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    /// A collectible was consumed.
    ResourceCollected,
    /// A projectile reached its target.
    TargetHit,
}

/// Notifications broadcast through the event channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// A collectible belonging to the provided group was consumed.
    ResourceCollected {
        /// Group that owns the consumed collectible.
        group: GroupId,
    },
    /// A projectile landed within the hit radius of its target.
    TargetHit,
}

impl Event {
    /// Reports the routing kind of the event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ResourceCollected { .. } => EventKind::ResourceCollected,
            Self::TargetHit => EventKind::TargetHit,
        }
    }
}

/// Lifecycle state of a collectible entity.
///
/// The `collectable` and `growing` flags are derived from the variant, so the
/// combination "collectable while growing" cannot be represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectState {
    /// Present in the world and available for collection.
    Ready,
    /// Consumed and waiting for its group to schedule regrowth.
    Collected,
    /// Regrowth has been scheduled and has not finished yet.
    Growing,
}

impl CollectState {
    /// Whether a consumer may currently collect the entity.
    #[must_use]
    pub const fn is_collectable(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether a regrowth continuation is outstanding for the entity.
    #[must_use]
    pub const fn is_growing(self) -> bool {
        matches!(self, Self::Growing)
    }
}

/// Terminal result of a projectile flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightOutcome {
    /// The projectile ended its flight within the target's hit radius.
    Hit,
    /// The projectile ended its flight elsewhere or could not be launched.
    Miss,
}

/// Position provider a projectile flies towards.
pub trait Target {
    /// Current world-space position of the target.
    fn position(&self) -> Vec3;

    /// Size of the target; a projectile closer than this counts as a hit.
    fn size(&self) -> f32;
}

/// Target placed in the world that may be relocated between ticks.
#[derive(Debug)]
pub struct PlacedTarget {
    position: Cell<Vec3>,
    size: f32,
}

impl PlacedTarget {
    /// Creates a target at the provided position with the provided size.
    #[must_use]
    pub fn new(position: Vec3, size: f32) -> Self {
        Self {
            position: Cell::new(position),
            size,
        }
    }

    /// Moves the target to a new position.
    pub fn relocate(&self, position: Vec3) {
        self.position.set(position);
    }
}

impl Target for PlacedTarget {
    fn position(&self) -> Vec3 {
        self.position.get()
    }

    fn size(&self) -> f32 {
        self.size
    }
}

/// Capability implemented by anything driven by the fixed simulation tick.
pub trait Advanceable {
    /// Result produced by a single advance.
    type Outcome;

    /// Advances the implementor by `dt` of simulated time.
    fn tick(&mut self, dt: Duration) -> Self::Outcome;
}

/// Reasons the trajectory solver rejects a launch.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum TrajectoryError {
    /// The launch angle and gravity combination cannot produce a finite flight.
    #[error("launch angle and gravity cannot produce a finite trajectory")]
    InvalidTrajectory,
}

/// Reasons a projectile actor refuses a launch request.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum LaunchError {
    /// The actor already owns an active flight.
    #[error("projectile actor {} is already in flight", .0.get())]
    Busy(ActorId),
}

/// Reasons a projectile pool cannot fire.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum PoolError {
    /// Every actor in the pool is currently in flight.
    #[error("no idle projectile is available")]
    Exhausted,
    /// The claimed actor rejected the launch.
    #[error(transparent)]
    Launch(#[from] LaunchError),
}
