#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Closed-form launch solver for arcing projectiles.
//!
//! Given an origin, a target position, a fixed launch angle and the gravity
//! magnitude, [`solve`] derives the forward and upward launch speeds together
//! with the time the projectile needs to cover the distance. Speeds are
//! expressed in the projectile's own frame returned by [`facing`]: the local
//! `z` axis points at the target and the local `y` axis is the "up" the arc
//! rises along.

use berry_grove_core::TrajectoryError;
use glam::{Mat3, Quat, Vec3};

/// Smallest `sin(2·angle)` accepted before a launch is considered degenerate.
const MIN_DOUBLE_ANGLE_SINE: f32 = 1.0e-6;

/// Launch parameters derived for a single flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlightPlan {
    /// Straight-line distance between origin and target.
    pub distance: f32,
    /// Speed along the local forward axis.
    pub horizontal_velocity: f32,
    /// Initial speed along the local up axis.
    pub vertical_velocity: f32,
    /// Seconds needed to cover `distance` at `horizontal_velocity`.
    pub total_time: f32,
}

impl FlightPlan {
    /// Plan for a target that coincides with the origin.
    pub const STATIONARY: Self = Self {
        distance: 0.0,
        horizontal_velocity: 0.0,
        vertical_velocity: 0.0,
        total_time: 0.0,
    };
}

/// Derives the flight plan from `origin` to `target`.
///
/// The launch speed follows the range relationship
/// `flight = distance / (sin(2·angle) / gravity)`; the square root of that
/// quantity is split into its forward (`cos`) and upward (`sin`) components.
/// Angles whose double-angle sine is not positive (0°, 90° and anything that
/// would fire backwards), non-positive gravity and non-finite inputs are
/// rejected with [`TrajectoryError::InvalidTrajectory`].
pub fn solve(
    origin: Vec3,
    target: Vec3,
    launch_angle_degrees: f32,
    gravity: f32,
) -> Result<FlightPlan, TrajectoryError> {
    if !origin.is_finite() || !target.is_finite() {
        return Err(TrajectoryError::InvalidTrajectory);
    }
    if !gravity.is_finite() || gravity <= 0.0 || !launch_angle_degrees.is_finite() {
        return Err(TrajectoryError::InvalidTrajectory);
    }

    let angle = launch_angle_degrees.to_radians();
    let double_angle_sine = (2.0 * angle).sin();
    if double_angle_sine <= MIN_DOUBLE_ANGLE_SINE {
        return Err(TrajectoryError::InvalidTrajectory);
    }

    let distance = origin.distance(target);
    if distance == 0.0 {
        return Ok(FlightPlan::STATIONARY);
    }

    let flight_velocity = distance / (double_angle_sine / gravity);
    let launch_speed = flight_velocity.sqrt();
    let horizontal_velocity = launch_speed * angle.cos();
    let vertical_velocity = launch_speed * angle.sin();
    if !horizontal_velocity.is_finite() || horizontal_velocity <= 0.0 {
        return Err(TrajectoryError::InvalidTrajectory);
    }

    let total_time = distance / horizontal_velocity;
    if !total_time.is_finite() || !vertical_velocity.is_finite() {
        return Err(TrajectoryError::InvalidTrajectory);
    }

    Ok(FlightPlan {
        distance,
        horizontal_velocity,
        vertical_velocity,
        total_time,
    })
}

/// Orientation that looks from `origin` towards `target`.
///
/// World up (`+Y`) is the reference up axis. When the target lies straight
/// above or below the origin, world `+X` is used as the right axis instead.
/// Coincident points yield the identity rotation.
#[must_use]
pub fn facing(origin: Vec3, target: Vec3) -> Quat {
    let forward = (target - origin).normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }

    let right = Vec3::Y.cross(forward);
    let right = if right.length_squared() <= f32::EPSILON {
        Vec3::X
    } else {
        right.normalize()
    };
    let up = forward.cross(right);

    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}
