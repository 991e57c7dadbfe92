//! Contact response: bounces, rolling friction and rebounds.
//!
//! ## Model Assumptions
//!
//! - **Surfaces have infinite mass**: ground, fence and netting never move.
//! - **Instantaneous contact**: coefficients capture the integrated effect of
//!   the deformation; spin is not changed by a bounce.
//!
//! ```text
//! Incoming ball hitting the ground:
//!
//!     ↘ velocity
//!      ●
//!   ════════ ground
//!
//! vertical:   vy' = -vy · restitution
//! horizontal: vh' =  vh · (1 - friction)
//! ```

use serde::{Deserialize, Serialize};

use crate::types::Vec3;

/// Ground and rebound settings for batted balls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BounceConfig {
    /// Height of the playing surface (m)
    pub ground_height: f64,
    /// Fraction of vertical speed kept by a bounce
    pub restitution: f64,
    /// Fraction of horizontal speed lost on each bounce
    pub friction: f64,
    /// Horizontal speed kept per step while rolling
    pub roll_decay: f64,
    /// Post-bounce vertical speed (m/s) under which the ball starts rolling
    pub roll_threshold: f64,
    /// Bounce count after which the ball rolls regardless of speed
    pub max_bounces: u32,
    /// Rolling speed (m/s) under which the ball is considered settled
    pub stop_speed: f64,
    /// Fraction of speed kept when rebounding off a fence or net
    pub wall_restitution: f64,
    /// Distance (m) the ball is pushed off a wall after a rebound
    pub wall_nudge: f64,
}

impl Default for BounceConfig {
    fn default() -> Self {
        Self {
            ground_height: 0.0,
            restitution: 0.45,
            friction: 0.25,
            roll_decay: 0.985,
            roll_threshold: 1.0,
            max_bounces: 6,
            stop_speed: 0.3,
            wall_restitution: 0.4,
            wall_nudge: 0.05,
        }
    }
}

pub struct CollisionResolver;

impl CollisionResolver {
    /// Velocity after a ground bounce.
    ///
    /// Coefficients are clamped to [0, 1] so a bounce can never add energy.
    pub fn bounce(vel: &Vec3, restitution: f64, friction: f64) -> Vec3 {
        let keep_vertical = restitution.clamp(0.0, 1.0);
        let keep_horizontal = 1.0 - friction.clamp(0.0, 1.0);
        Vec3::new(
            vel.x * keep_horizontal,
            -vel.y * keep_vertical,
            vel.z * keep_horizontal,
        )
    }

    /// Velocity after one rolling step: no vertical motion, horizontal decay.
    pub fn roll(vel: &Vec3, decay: f64) -> Vec3 {
        let keep = decay.clamp(0.0, 1.0);
        Vec3::new(vel.x * keep, 0.0, vel.z * keep)
    }

    /// Velocity after rebounding off a face with unit `normal`.
    pub fn rebound(vel: &Vec3, normal: &Vec3, restitution: f64) -> Vec3 {
        vel.reflect(normal) * restitution.clamp(0.0, 1.0)
    }
}

// =============================================================================
// Tests
// =============================================================================
