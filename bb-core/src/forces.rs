//! Aerodynamic and gravitational forces acting on a baseball.
//!
//! - **Gravity**: constant downward acceleration
//! - **Drag**: air resistance opposing motion, proportional to v²
//! - **Magnus**: lift from spin, perpendicular to spin axis and velocity
//!
//! ```text
//! Backspin (axis -X, ball heading +Z):
//!     ↑ Magnus force lifts the ball, fly balls carry
//!
//! Topspin (axis +X, ball heading +Z):
//!     ↓ Magnus force pushes the ball down, grounders dive
//! ```
//!
//! The two force functions are free so the pitch solver can reuse them for
//! its analytic seed without building a force model.

use serde::{Deserialize, Serialize};

use crate::integrator::ForceModel;
use crate::types::{constants, BallProperties, BallState, SpinState, Vec3};

/// Drag force: F = -0.5 · ρ · Cd · A · |v|² · v̂
///
/// Returns zero below the minimum speed instead of normalizing a tiny vector.
pub fn drag_force(vel: &Vec3, air_density: f64, props: &BallProperties) -> Vec3 {
    let speed_sq = vel.magnitude_squared();
    if speed_sq < constants::MIN_DRAG_VELOCITY_SQ {
        return Vec3::ZERO;
    }

    let magnitude = 0.5 * air_density * props.drag_coefficient * props.area() * speed_sq;
    vel.normalized() * (-magnitude)
}

/// Magnus force: F = 0.5 · ρ · Cl · A · |v|² · normalize(ω × v)
///
/// Zero when the ball is nearly at rest or the spin axis is (anti)parallel to
/// the velocity, where the direction is undefined.
pub fn magnus_force(
    vel: &Vec3,
    spin: &SpinState,
    air_density: f64,
    props: &BallProperties,
) -> Vec3 {
    let speed_sq = vel.magnitude_squared();
    if speed_sq < constants::MIN_DRAG_VELOCITY_SQ || spin.rpm.abs() < constants::EPSILON {
        return Vec3::ZERO;
    }

    let cross = spin.angular_velocity().cross(vel);
    if cross.magnitude() < constants::MIN_MAGNUS_CROSS {
        return Vec3::ZERO;
    }

    let magnitude = 0.5 * air_density * spin.lift_coefficient * props.area() * speed_sq;
    cross.normalized() * magnitude
}

/// Complete force model for a baseball in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseballForces {
    /// Air density in kg/m³
    pub air_density: f64,

    pub gravity: Vec3,

    /// Enable/disable individual forces (useful for testing)
    pub enable_gravity: bool,
    pub enable_drag: bool,
    pub enable_magnus: bool,
}

impl Default for BaseballForces {
    fn default() -> Self {
        Self {
            air_density: constants::AIR_DENSITY,
            gravity: Vec3::new(0.0, -constants::GRAVITY, 0.0),
            enable_gravity: true,
            enable_drag: true,
            enable_magnus: true,
        }
    }
}

impl BaseballForces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vacuum: gravity only.
    pub fn gravity_only() -> Self {
        Self {
            enable_drag: false,
            enable_magnus: false,
            ..Self::default()
        }
    }
}

impl ForceModel for BaseballForces {
    fn linear_acceleration(
        &self,
        state: &BallState,
        spin: &SpinState,
        props: &BallProperties,
    ) -> Vec3 {
        let mut force = Vec3::ZERO;

        if self.enable_drag {
            force += drag_force(&state.vel, self.air_density, props);
        }

        if self.enable_magnus {
            force += magnus_force(&state.vel, spin, self.air_density, props);
        }

        let mut acc = force / props.mass;
        if self.enable_gravity {
            acc += self.gravity;
        }
        acc
    }
}

// =============================================================================
// Tests
// =============================================================================
