//! Numerical integration for advancing the ball in time.
//!
//! The simulator uses semi-implicit (symplectic) Euler at a fixed step:
//!
//! ```text
//! 1. a     = a(x, v)
//! 2. v_new = v + a*dt
//! 3. x_new = x + v_new*dt
//! ```
//!
//! Updating velocity first keeps a bouncing ball from gaining energy over
//! long rolls, and a fixed step makes every trajectory sample line up with
//! `i * dt` for the defense planner.

use crate::types::{BallProperties, BallState, SpinState, Vec3};

/// Computes the acceleration acting on the ball.
///
/// Implementations provide the physics model (gravity, drag, Magnus).
pub trait ForceModel {
    fn linear_acceleration(
        &self,
        state: &BallState,
        spin: &SpinState,
        props: &BallProperties,
    ) -> Vec3;
}

/// Forward Euler integrator, velocity updated before position.
pub struct Euler;

impl Euler {
    /// Advance the ball by one step.
    ///
    /// # Arguments
    /// * `state` - Current position and velocity
    /// * `spin` - Spin acting on the ball
    /// * `props` - Ball mass, radius and drag coefficient
    /// * `forces` - Force model providing the acceleration
    /// * `dt` - Time step (s)
    ///
    /// # Returns
    /// The state after `dt`.
    pub fn step<F: ForceModel>(
        state: &BallState,
        spin: &SpinState,
        props: &BallProperties,
        forces: &F,
        dt: f64,
    ) -> BallState {
        let acceleration = forces.linear_acceleration(state, spin, props);
        let vel = state.vel + acceleration * dt;
        BallState {
            pos: state.pos + vel * dt,
            vel,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
