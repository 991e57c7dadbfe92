//! Core types for the ball-flight simulation.
//!
//! All units are SI:
//! - Position: meters (m)
//! - Velocity: meters per second (m/s)
//! - Spin rate: revolutions per minute at the API, rad/s internally
//! - Mass: kilograms (kg)
//! - Force: Newtons (N)

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

// =============================================================================
// Vec3 - 3D Vector
// =============================================================================

/// A 3D vector used for positions, velocities, forces, and spin axes.
///
/// Coordinate system (home plate at the origin):
/// - X: horizontal, positive toward first base
/// - Y: vertical (positive upward)
/// - Z: horizontal, positive toward center field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const UP: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared magnitude (avoids sqrt for comparisons)
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Returns a unit vector in the same direction, or zero if magnitude is zero
    pub fn normalized(&self) -> Self {
        let mag = self.magnitude();
        if mag < constants::EPSILON {
            Self::ZERO
        } else {
            *self / mag
        }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Linear interpolation between two vectors
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        *self + (*other - *self) * t
    }

    /// Reflect vector around a unit normal
    pub fn reflect(&self, normal: &Self) -> Self {
        *self - *normal * 2.0 * self.dot(normal)
    }

    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).magnitude()
    }

    /// The same vector projected onto the ground plane (y = 0).
    pub fn horizontal(&self) -> Self {
        Self::new(self.x, 0.0, self.z)
    }

    /// Distance measured on the ground plane, ignoring height.
    pub fn horizontal_distance(&self, other: &Self) -> f64 {
        (self.horizontal() - other.horizontal()).magnitude()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
        self.z -= other.z;
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

// =============================================================================
// Ball State
// =============================================================================

/// Kinematic state of the ball in flight.
///
/// Spin is carried separately from the state: it does not decay over a
/// single flight, so the simulator holds a constant [`SpinState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    pub pos: Vec3,
    pub vel: Vec3,
}

impl BallState {
    pub fn new(pos: Vec3, vel: Vec3) -> Self {
        Self { pos, vel }
    }

    pub fn at_rest(pos: Vec3) -> Self {
        Self {
            pos,
            vel: Vec3::ZERO,
        }
    }
}

impl Default for BallState {
    fn default() -> Self {
        Self::at_rest(Vec3::ZERO)
    }
}

/// Spin applied to a ball for the whole flight.
///
/// The axis follows the right-hand rule. With the ball travelling toward
/// +Z, an axis of -X is backspin (lift upward) and +X is topspin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinState {
    /// Unit spin axis
    pub axis: Vec3,
    /// Spin rate in revolutions per minute
    pub rpm: f64,
    /// Lift coefficient used by the Magnus model
    pub lift_coefficient: f64,
}

impl SpinState {
    pub fn new(axis: Vec3, rpm: f64, lift_coefficient: f64) -> Self {
        Self {
            axis: axis.normalized(),
            rpm,
            lift_coefficient,
        }
    }

    pub fn none() -> Self {
        Self {
            axis: Vec3::ZERO,
            rpm: 0.0,
            lift_coefficient: 0.0,
        }
    }

    /// Angular velocity vector in rad/s
    pub fn angular_velocity(&self) -> Vec3 {
        self.axis * rpm_to_rad_per_sec(self.rpm)
    }
}

impl Default for SpinState {
    fn default() -> Self {
        Self::none()
    }
}

pub fn rpm_to_rad_per_sec(rpm: f64) -> f64 {
    rpm * 2.0 * std::f64::consts::PI / 60.0
}

// =============================================================================
// Ball Properties
// =============================================================================

/// Physical properties of a ball.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallProperties {
    pub name: String,
    pub mass: f64,
    pub radius: f64,
    pub drag_coefficient: f64,
}

impl BallProperties {
    /// Regulation baseball: 145 g, 73 mm diameter
    pub fn official() -> Self {
        Self {
            name: "Official baseball".to_string(),
            mass: 0.145,
            radius: 0.0366,
            drag_coefficient: 0.35,
        }
    }

    /// Cross-sectional area (πr²)
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }
}

impl Default for BallProperties {
    fn default() -> Self {
        Self::official()
    }
}

// =============================================================================
// Surfaces and Obstacles
// =============================================================================

/// What the ball touched. Landing surfaces come from the field layout,
/// reflecting surfaces from [`Obstacle`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceKind {
    /// Playing field
    Ground,
    /// Backstop netting
    Net,
    /// Outfield fence
    Wall,
    /// Seating beyond the fence
    Stands,
}

/// Axis-aligned box the ball can rebound from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub min: Vec3,
    pub max: Vec3,
    pub kind: SurfaceKind,
}

impl Obstacle {
    pub fn new(min: Vec3, max: Vec3, kind: SurfaceKind) -> Self {
        Self { min, max, kind }
    }

    pub fn contains(&self, p: &Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

/// A recorded contact between the ball and a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceContact {
    /// Index of the trajectory sample at the contact point
    pub index: usize,
    pub point: Vec3,
    pub kind: SurfaceKind,
    /// True for ground landings, false for wall/net rebounds
    pub landing: bool,
}

// =============================================================================
// Physical Constants
// =============================================================================

pub mod constants {
    /// Gravitational acceleration (m/s²)
    pub const GRAVITY: f64 = 9.81;

    /// Air density at sea level, 15°C (kg/m³)
    pub const AIR_DENSITY: f64 = 1.225;

    /// Small value for floating-point comparisons
    pub const EPSILON: f64 = 1e-10;

    /// Below this squared speed (m²/s²) aerodynamic forces are skipped
    pub const MIN_DRAG_VELOCITY_SQ: f64 = 1e-4;

    /// Below this |spin × velocity| the Magnus direction is undefined
    pub const MIN_MAGNUS_CROSS: f64 = 1e-6;

    /// Stand-in for "never" when a divisor such as a speed is zero (s)
    pub const LONG_TIME: f64 = 1.0e6;
}

/// `distance / speed`, or [`constants::LONG_TIME`] when the speed is not positive.
pub fn travel_time(distance: f64, speed: f64) -> f64 {
    if speed <= constants::EPSILON {
        constants::LONG_TIME
    } else {
        distance / speed
    }
}

// =============================================================================
// Tests
// =============================================================================
