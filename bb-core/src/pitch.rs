//! Pitch velocity solver (shooting method).
//!
//! Finds the release velocity that carries a pitch with a given speed and
//! spin to a target point on the plate plane.
//!
//! ## Algorithm
//!
//! ```text
//! seed:    t  ≈ horizontal_distance / speed · drag_inflation
//!          v0 = Δ/t + (0, ½·g·t, 0) - ½·a_magnus·t
//!
//! repeat:  simulate v → end point e, error ε = target - e
//!          |ε|w = sqrt((w·εz)² + εx² + εy²)
//!          stop if |ε|w < tolerance
//!          v += ε / flight_time · gain(i)        (gain decays linearly)
//!          pull |v| toward the desired speed if it drifted too far
//! ```
//!
//! Refinement is not monotonic, so the best iterate is kept and returned
//! even when the iteration cap is reached.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::forces::magnus_force;
use crate::trajectory::{Trajectory, TrajectoryConfig, TrajectorySimulator};
use crate::types::{constants, SpinState, Vec3};

/// Tuning for the shooting method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iterations: usize,
    /// Weighted end-point error accepted as a hit (m)
    pub tolerance: f64,
    /// Weight of the along-path (Z) error relative to lateral/vertical error
    pub along_weight: f64,
    /// Flight-time multiplier compensating for drag in the seed
    pub drag_inflation: f64,
    pub along_gain_start: f64,
    pub along_gain_end: f64,
    pub lateral_gain_start: f64,
    pub lateral_gain_end: f64,
    pub speed_gain_start: f64,
    pub speed_gain_end: f64,
    /// Relative speed drift tolerated before rescaling
    pub speed_drift_threshold: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            tolerance: 0.02,
            along_weight: 2.0,
            drag_inflation: 1.06,
            along_gain_start: 0.9,
            along_gain_end: 0.4,
            lateral_gain_start: 0.9,
            lateral_gain_end: 0.4,
            speed_gain_start: 0.5,
            speed_gain_end: 0.2,
            speed_drift_threshold: 0.05,
        }
    }
}

/// A pitch to be thrown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchRequest {
    pub release: Vec3,
    pub target: Vec3,
    pub spin: SpinState,
    /// Desired release speed (m/s)
    pub speed: f64,
}

/// Best release velocity found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchSolution {
    pub velocity: Vec3,
    /// Weighted end-point error of `velocity` (m)
    pub error: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Weighted error of every iterate, in order
    pub errors: Vec<f64>,
}

pub struct PitchSolver<'a> {
    simulator: &'a TrajectorySimulator,
    config: SolverConfig,
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl<'a> PitchSolver<'a> {
    pub fn new(simulator: &'a TrajectorySimulator, config: SolverConfig) -> Self {
        Self { simulator, config }
    }

    /// Analytic first guess from straight-line flight time, gravity drop and
    /// an approximate Magnus lift.
    pub fn initial_guess(&self, request: &PitchRequest) -> Vec3 {
        let delta = request.target - request.release;
        let horizontal = delta.horizontal().magnitude();
        let speed = request.speed.max(constants::EPSILON);
        let flight_time = (horizontal / speed * self.config.drag_inflation).max(1e-3);

        let mut velocity = delta / flight_time;
        velocity.y += 0.5 * constants::GRAVITY * flight_time;

        let props = &self.simulator.props;
        let lift = magnus_force(
            &(delta.normalized() * speed),
            &request.spin,
            self.simulator.forces.air_density,
            props,
        ) / props.mass;
        velocity.y -= 0.5 * lift.y * flight_time;

        velocity
    }

    /// Simulate a pitch with the given release velocity.
    pub fn simulate(&self, request: &PitchRequest, velocity: Vec3) -> Trajectory {
        self.simulator.simulate(
            request.release,
            velocity,
            &request.spin,
            &TrajectoryConfig::pitch(request.target.z),
        )
    }

    /// Shooting-method search for the release velocity.
    ///
    /// # Arguments
    /// * `request` - Release point, target, spin and desired speed
    ///
    /// # Returns
    /// The best velocity seen, its weighted end-point error and whether the
    /// tolerance was reached within the iteration cap.
    pub fn solve(&self, request: &PitchRequest) -> PitchSolution {
        let cfg = &self.config;
        let iterations = cfg.max_iterations.max(1);
        let mut velocity = self.initial_guess(request);
        let mut best = velocity;
        let mut best_error = f64::INFINITY;
        let mut errors = Vec::with_capacity(iterations);

        for i in 0..iterations {
            let trajectory = self.simulate(request, velocity);
            let miss = request.target - trajectory.end();
            let error = ((cfg.along_weight * miss.z).powi(2) + miss.x.powi(2) + miss.y.powi(2)).sqrt();
            errors.push(error);

            if error < best_error {
                best_error = error;
                best = velocity;
            }

            if error < cfg.tolerance {
                debug!(
                    "pitch solved in {} iterations, error {:.4}m, speed {:.2}m/s",
                    i + 1,
                    error,
                    velocity.magnitude()
                );
                return PitchSolution {
                    velocity,
                    error,
                    iterations: i + 1,
                    converged: true,
                    errors,
                };
            }

            let progress = if iterations > 1 {
                i as f64 / (iterations - 1) as f64
            } else {
                0.0
            };
            let along_gain = lerp(cfg.along_gain_start, cfg.along_gain_end, progress);
            let lateral_gain = lerp(cfg.lateral_gain_start, cfg.lateral_gain_end, progress);
            let speed_gain = lerp(cfg.speed_gain_start, cfg.speed_gain_end, progress);

            let flight_time = trajectory.duration().max(trajectory.dt);
            velocity.z += miss.z / flight_time * along_gain;
            velocity.x += miss.x / flight_time * lateral_gain;
            velocity.y += miss.y / flight_time * lateral_gain;

            let speed = velocity.magnitude();
            if request.speed > constants::EPSILON
                && ((speed - request.speed) / request.speed).abs() > cfg.speed_drift_threshold
            {
                velocity = velocity.normalized() * lerp(speed, request.speed, speed_gain);
            }
        }

        warn!(
            "pitch solver hit {} iterations, best error {:.4}m",
            iterations, best_error
        );
        PitchSolution {
            velocity: best,
            error: best_error,
            iterations,
            converged: false,
            errors,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fastball() -> PitchRequest {
        PitchRequest {
            release: Vec3::new(-0.5, 1.8, 17.0),
            target: Vec3::new(0.1, 0.8, 0.0),
            // Ball travels -Z: +X axis is backspin
            spin: SpinState::new(Vec3::new(1.0, 0.0, 0.0), 2200.0, 0.2),
            speed: 40.0,
        }
    }

    #[test]
    fn test_initial_guess_points_at_plate() {
        let sim = TrajectorySimulator::default();
        let solver = PitchSolver::new(&sim, SolverConfig::default());
        let v = solver.initial_guess(&fastball());

        assert!(v.z < 0.0, "Pitch should head toward home, vz={}", v.z);
        assert!((v.magnitude() - 40.0).abs() < 4.0, "Seed speed {}", v.magnitude());
    }

    #[test]
    fn test_solution_lands_on_target() {
        let sim = TrajectorySimulator::default();
        let config = SolverConfig::default();
        let solver = PitchSolver::new(&sim, config.clone());
        let request = fastball();

        let solution = solver.solve(&request);
        assert!(solution.converged, "errors: {:?}", solution.errors);

        let landing = solver.simulate(&request, solution.velocity).end();
        let miss = landing.distance(&request.target);
        assert!(miss < config.tolerance, "Missed target by {}m", miss);
        assert!(
            (solution.velocity.magnitude() - request.speed).abs() / request.speed < 0.1,
            "Speed drifted to {}",
            solution.velocity.magnitude()
        );
    }

    #[test]
    fn test_solver_is_deterministic() {
        let sim = TrajectorySimulator::default();
        let solver = PitchSolver::new(&sim, SolverConfig::default());

        let a = solver.solve(&fastball());
        let b = solver.solve(&fastball());

        assert_eq!(a, b);
    }

    #[test]
    fn test_curveball_breaks_down() {
        let sim = TrajectorySimulator::default();
        let solver = PitchSolver::new(&sim, SolverConfig::default());
        let fastball = fastball();
        let curve = PitchRequest {
            spin: SpinState::new(Vec3::new(-1.0, 0.0, 0.0), 2500.0, 0.25),
            speed: 33.0,
            ..fastball
        };

        let fb = solver.solve(&fastball);
        let cb = solver.solve(&curve);

        // Topspin needs a higher launch to reach the same spot
        let fb_angle = (fb.velocity.y / -fb.velocity.z).atan();
        let cb_angle = (cb.velocity.y / -cb.velocity.z).atan();
        assert!(cb_angle > fb_angle, "curve {} vs fastball {}", cb_angle, fb_angle);
    }

    #[test]
    fn test_unconverged_returns_best_iterate() {
        let sim = TrajectorySimulator::default();
        let config = SolverConfig {
            max_iterations: 4,
            tolerance: 1e-9,
            ..SolverConfig::default()
        };
        let solver = PitchSolver::new(&sim, config);

        let solution = solver.solve(&fastball());

        assert!(!solution.converged);
        assert_eq!(solution.iterations, 4);
        let min = solution.errors.iter().copied().fold(f64::INFINITY, f64::min);
        assert_eq!(solution.error, min);
    }
}
