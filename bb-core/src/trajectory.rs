//! Fixed-timestep trajectory simulation.
//!
//! Produces the sampled flight path every downstream component reads. Each
//! step integrates gravity, drag and Magnus forces, then checks the step
//! segment for, in order:
//!
//! 1. the target plane (pitches): interpolate the crossing and stop
//! 2. the ground: interpolate the contact, bounce, eventually roll
//! 3. fences and netting: rebound off the nearest face
//! 4. the play area bounds: stop
//!
//! Sample `i` sits at time `i * dt`; contact points replace the step end
//! so the index/time relation is kept.

use std::thread::{self, JoinHandle};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::collision::{BounceConfig, CollisionDetector, CollisionResolver, CollisionTarget};
use crate::error::SimulationError;
use crate::field::FieldGeometry;
use crate::forces::BaseballForces;
use crate::integrator::Euler;
use crate::types::{
    BallProperties, BallState, Obstacle, SpinState, SurfaceContact, SurfaceKind, Vec3,
};

/// Default floor for flights simulated without ground handling (m).
pub const NO_BOUNCE_FLOOR: f64 = -0.5;

/// Simulation settings for a single flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Fixed step (s)
    pub dt: f64,
    /// Simulated time budget (s)
    pub max_time: f64,
    /// Sample ceiling, including the start point
    pub max_points: usize,
    /// Stop when the ball crosses `z = target_plane_z`
    pub target_plane_z: Option<f64>,
    /// Ground handling; `None` stops the flight at `floor`
    pub bounce: Option<BounceConfig>,
    /// Rebound off the field's obstacles
    pub walls: bool,
    /// Surface lookup, obstacles and play area bounds
    pub field: Option<FieldGeometry>,
    /// Height at which a flight without ground handling ends
    pub floor: f64,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,
            max_time: 12.0,
            max_points: 2000,
            target_plane_z: None,
            bounce: None,
            walls: false,
            field: None,
            floor: NO_BOUNCE_FLOOR,
        }
    }
}

impl TrajectoryConfig {
    /// In-flight-only pitch toward the plate plane.
    pub fn pitch(target_plane_z: f64) -> Self {
        Self {
            dt: 0.002,
            max_time: 2.0,
            max_points: 1200,
            target_plane_z: Some(target_plane_z),
            ..Self::default()
        }
    }

    /// Batted ball with ground, fence and bounds handling.
    pub fn batted(field: FieldGeometry, bounce: BounceConfig) -> Self {
        Self {
            bounce: Some(bounce),
            walls: true,
            field: Some(field),
            ..Self::default()
        }
    }
}

/// Why a simulation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    TargetPlane,
    Settled,
    Floor,
    OutOfBounds,
    TimeLimit,
    PointLimit,
}

/// Sampled flight path. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub points: Vec<Vec3>,
    pub dt: f64,
    pub contacts: Vec<SurfaceContact>,
    pub termination: TerminationReason,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn time_at(&self, index: usize) -> f64 {
        index as f64 * self.dt
    }

    /// Simulated time of the last sample.
    pub fn duration(&self) -> f64 {
        self.time_at(self.points.len().saturating_sub(1))
    }

    pub fn start(&self) -> Vec3 {
        self.points.first().copied().unwrap_or_default()
    }

    pub fn end(&self) -> Vec3 {
        self.points.last().copied().unwrap_or_default()
    }

    /// First time the ball came down on a surface.
    pub fn first_landing(&self) -> Option<&SurfaceContact> {
        self.contacts.iter().find(|c| c.landing)
    }

    pub fn first_landing_surface(&self) -> Option<SurfaceKind> {
        self.first_landing().map(|c| c.kind)
    }

    /// First landing point, or the final sample if the ball never landed.
    pub fn landing_point(&self) -> Vec3 {
        self.first_landing().map_or_else(|| self.end(), |c| c.point)
    }

    /// Horizontal distance from the start to the landing point.
    pub fn carry_distance(&self) -> f64 {
        self.start().horizontal_distance(&self.landing_point())
    }
}

/// Integrates ball flights for one ball type.
#[derive(Debug, Clone)]
pub struct TrajectorySimulator {
    pub props: BallProperties,
    pub forces: BaseballForces,
}

impl Default for TrajectorySimulator {
    fn default() -> Self {
        Self::new(BallProperties::default())
    }
}

impl TrajectorySimulator {
    pub fn new(props: BallProperties) -> Self {
        Self {
            props,
            forces: BaseballForces::default(),
        }
    }

    pub fn with_forces(props: BallProperties, forces: BaseballForces) -> Self {
        Self { props, forces }
    }

    /// Run a flight from `start` with initial `velocity`.
    ///
    /// # Arguments
    /// * `start` - Initial position (m)
    /// * `velocity` - Initial velocity (m/s)
    /// * `spin` - Spin axis, rate and lift coefficient, constant over the flight
    /// * `config` - Step size, budgets and which stop conditions apply
    ///
    /// # Returns
    /// The sampled path, every surface contact and why the flight ended.
    pub fn simulate(
        &self,
        start: Vec3,
        velocity: Vec3,
        spin: &SpinState,
        config: &TrajectoryConfig,
    ) -> Trajectory {
        let dt = config.dt;
        let max_points = config.max_points.max(1);
        let max_steps = (config.max_time / dt).ceil().max(0.0) as usize;
        let wall_restitution = config
            .bounce
            .as_ref()
            .map_or(BounceConfig::default().wall_restitution, |b| b.wall_restitution);
        let wall_nudge = config
            .bounce
            .as_ref()
            .map_or(BounceConfig::default().wall_nudge, |b| b.wall_nudge);
        let obstacles: &[Obstacle] = match (&config.field, config.walls) {
            (Some(field), true) => field.obstacles.as_slice(),
            _ => &[],
        };

        let mut points = Vec::with_capacity(max_points.min(max_steps + 1));
        points.push(start);
        let mut contacts = Vec::new();
        let mut state = BallState::new(start, velocity);
        let mut bounces = 0u32;
        let mut rolling = false;
        let mut step = 0usize;

        let termination = loop {
            if points.len() >= max_points {
                break TerminationReason::PointLimit;
            }
            if step >= max_steps {
                break TerminationReason::TimeLimit;
            }
            step += 1;

            let next = match (&config.bounce, rolling) {
                (Some(bounce), true) => {
                    let vel = CollisionResolver::roll(&state.vel, bounce.roll_decay);
                    let mut pos = state.pos + vel * dt;
                    pos.y = bounce.ground_height;
                    BallState::new(pos, vel)
                }
                _ => Euler::step(&state, spin, &self.props, &self.forces, dt),
            };

            // (a) target plane
            if let Some(plane_z) = config.target_plane_z {
                if let Some(hit) =
                    CollisionDetector::detect_target_plane(&state.pos, &next.pos, plane_z)
                {
                    points.push(hit.point);
                    break TerminationReason::TargetPlane;
                }
            }

            // (b) ground
            match &config.bounce {
                Some(bounce) if !rolling => {
                    if let Some(hit) =
                        CollisionDetector::detect_ground(&state.pos, &next.pos, bounce.ground_height)
                    {
                        let kind = config
                            .field
                            .as_ref()
                            .map_or(SurfaceKind::Ground, |f| f.surface_at(&hit.point));
                        contacts.push(SurfaceContact {
                            index: points.len(),
                            point: hit.point,
                            kind,
                            landing: true,
                        });

                        let mut vel =
                            CollisionResolver::bounce(&next.vel, bounce.restitution, bounce.friction);
                        bounces += 1;
                        if vel.y.abs() < bounce.roll_threshold || bounces >= bounce.max_bounces {
                            rolling = true;
                            vel.y = 0.0;
                        }
                        trace!(
                            "bounce {} on {:?} at ({:.2}, {:.2}), vy'={:.2}, rolling={}",
                            bounces,
                            kind,
                            hit.point.x,
                            hit.point.z,
                            vel.y,
                            rolling
                        );

                        state = BallState::new(hit.point, vel);
                        points.push(hit.point);
                        continue;
                    }
                }
                Some(_) => {}
                None => {
                    if let Some(hit) =
                        CollisionDetector::detect_ground(&state.pos, &next.pos, config.floor)
                    {
                        points.push(hit.point);
                        break TerminationReason::Floor;
                    }
                }
            }

            // (c) fences and netting
            if let Some(hit) = CollisionDetector::detect_obstacle(&state.pos, &next.pos, obstacles) {
                if let CollisionTarget::Obstacle(kind) = hit.target {
                    contacts.push(SurfaceContact {
                        index: points.len(),
                        point: hit.point,
                        kind,
                        landing: false,
                    });
                    trace!("rebound off {:?} at ({:.2}, {:.2}, {:.2})", kind, hit.point.x, hit.point.y, hit.point.z);
                }
                let vel = CollisionResolver::rebound(&next.vel, &hit.normal, wall_restitution);
                let pos = hit.point + hit.normal * wall_nudge;
                state = BallState::new(pos, vel);
                points.push(pos);
                continue;
            }

            // (d) play area
            if let Some(field) = &config.field {
                if !field.in_bounds(&next.pos) {
                    let exit = CollisionDetector::detect_exit(
                        &state.pos,
                        &next.pos,
                        &field.bounds_min,
                        &field.bounds_max,
                    )
                    .map_or(next.pos, |hit| hit.point);
                    points.push(exit);
                    break TerminationReason::OutOfBounds;
                }
            }

            state = next;
            points.push(next.pos);

            if let (Some(bounce), true) = (&config.bounce, rolling) {
                if state.vel.horizontal().magnitude() < bounce.stop_speed {
                    break TerminationReason::Settled;
                }
            }
        };

        debug!(
            "trajectory: {} points over {:.2}s, {} contacts, ended by {:?}",
            points.len(),
            (points.len() - 1) as f64 * dt,
            contacts.len(),
            termination
        );

        Trajectory {
            points,
            dt,
            contacts,
            termination,
        }
    }

    /// Run the simulation on a worker thread.
    ///
    /// The caller must [`TrajectoryJob::join`] before anything downstream
    /// reads the result.
    pub fn spawn(
        self,
        start: Vec3,
        velocity: Vec3,
        spin: SpinState,
        config: TrajectoryConfig,
    ) -> TrajectoryJob {
        let handle = thread::spawn(move || self.simulate(start, velocity, &spin, &config));
        TrajectoryJob { handle }
    }
}

/// Handle to a trajectory computed on a worker thread.
pub struct TrajectoryJob {
    handle: JoinHandle<Trajectory>,
}

impl TrajectoryJob {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn join(self) -> Result<Trajectory, SimulationError> {
        self.handle.join().map_err(|_| SimulationError::WorkerPanicked)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::constants;
    use proptest::prelude::*;

    fn vacuum() -> TrajectorySimulator {
        TrajectorySimulator::with_forces(BallProperties::default(), BaseballForces::gravity_only())
    }

    #[test]
    fn test_vacuum_flight_matches_parabola() {
        let sim = vacuum();
        let start = Vec3::new(0.0, 1.0, 0.0);
        let v0 = Vec3::new(0.0, 15.0, 20.0);
        let config = TrajectoryConfig {
            dt: 0.001,
            max_points: 10_000,
            ..TrajectoryConfig::default()
        };

        let traj = sim.simulate(start, v0, &SpinState::none(), &config);
        assert_eq!(traj.termination, TerminationReason::Floor);

        // Skip the interpolated floor sample
        for (i, p) in traj.points[..traj.len() - 1].iter().enumerate() {
            let t = traj.time_at(i);
            let y = start.y + v0.y * t - 0.5 * constants::GRAVITY * t * t;
            let z = v0.z * t;
            assert!((p.y - y).abs() < 0.02, "y at t={:.3}: {} vs {}", t, p.y, y);
            assert!((p.z - z).abs() < 1e-6, "z at t={:.3}: {} vs {}", t, p.z, z);
        }
    }

    #[test]
    fn test_zero_drag_zero_spin_through_force_model() {
        let props = BallProperties {
            drag_coefficient: 0.0,
            ..BallProperties::default()
        };
        let sim = TrajectorySimulator::new(props);
        let config = TrajectoryConfig {
            dt: 0.001,
            max_points: 10_000,
            ..TrajectoryConfig::default()
        };

        let traj = sim.simulate(Vec3::ZERO, Vec3::new(0.0, 10.0, 10.0), &SpinState::none(), &config);

        // Apex height v²/2g ≈ 5.097m
        let apex = traj.points.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        assert!((apex - 5.097).abs() < 0.02, "apex {}", apex);
    }

    #[test]
    fn test_pitch_stops_at_target_plane() {
        let sim = TrajectorySimulator::default();
        let traj = sim.simulate(
            Vec3::new(0.0, 1.8, 17.0),
            Vec3::new(0.0, -1.0, -38.0),
            &SpinState::none(),
            &TrajectoryConfig::pitch(0.0),
        );

        assert_eq!(traj.termination, TerminationReason::TargetPlane);
        assert!(traj.end().z.abs() < 1e-9);
        assert!(traj.contacts.is_empty());
    }

    #[test]
    fn test_ground_ball_bounces_then_settles() {
        let sim = TrajectorySimulator::default();
        let config = TrajectoryConfig::batted(FieldGeometry::standard(), BounceConfig::default());

        let traj = sim.simulate(
            Vec3::new(0.0, 1.0, 0.5),
            Vec3::new(2.0, -2.0, 25.0),
            &SpinState::none(),
            &config,
        );

        assert_eq!(traj.termination, TerminationReason::Settled);
        assert!(!traj.contacts.is_empty());
        assert_eq!(traj.first_landing_surface(), Some(SurfaceKind::Ground));
        for p in &traj.points {
            assert!(p.y >= -1e-9, "ball went below ground: {}", p.y);
        }
    }

    #[test]
    fn test_no_bounce_config_never_records_contacts() {
        let sim = TrajectorySimulator::default();
        let traj = sim.simulate(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 5.0, 10.0),
            &SpinState::none(),
            &TrajectoryConfig::default(),
        );
        assert_eq!(traj.termination, TerminationReason::Floor);
        assert!((traj.end().y - NO_BOUNCE_FLOOR).abs() < 1e-9);
        assert!(traj.contacts.is_empty());
    }

    #[test]
    fn test_line_drive_rebounds_off_fence() {
        let sim = vacuum();
        let field = FieldGeometry::standard();
        let config = TrajectoryConfig::batted(field.clone(), BounceConfig::default());

        // Flat, low and fast straight at the center-field fence
        let traj = sim.simulate(
            Vec3::new(0.0, 1.5, 0.0),
            Vec3::new(0.0, 6.5, 80.0),
            &SpinState::none(),
            &config,
        );

        let wall_hit = traj
            .contacts
            .iter()
            .find(|c| !c.landing)
            .expect("ball should reach the fence");
        assert_eq!(wall_hit.kind, SurfaceKind::Wall);
        assert!(
            traj.end().z < field.fence_distance,
            "ball should stay in the park, ended at z={}",
            traj.end().z
        );
    }

    #[test]
    fn test_home_run_lands_in_stands() {
        let sim = vacuum();
        let config = TrajectoryConfig::batted(FieldGeometry::standard(), BounceConfig::default());

        let traj = sim.simulate(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 25.0, 25.0),
            &SpinState::none(),
            &config,
        );

        assert_eq!(traj.first_landing_surface(), Some(SurfaceKind::Stands));
        assert!(traj.carry_distance() > 110.0);
    }

    #[test]
    fn test_ball_leaving_play_area_stops() {
        let sim = vacuum();
        let field = FieldGeometry::standard();
        let config = TrajectoryConfig::batted(field.clone(), BounceConfig::default());

        // Pulled hard down the left-field side, still climbing at the edge
        let traj = sim.simulate(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(-60.0, 20.0, 5.0),
            &SpinState::none(),
            &config,
        );

        assert_eq!(traj.termination, TerminationReason::OutOfBounds);
        assert!(traj.contacts.is_empty());
        assert_eq!(traj.end().x, field.bounds_min.x);
        for p in &traj.points {
            assert!(field.in_bounds(p), "sample outside play area: {:?}", p);
        }
    }

    #[test]
    fn test_bounce_cap_starts_roll() {
        let sim = vacuum();
        let bounce = BounceConfig {
            restitution: 1.0,
            roll_threshold: 0.0,
            max_bounces: 2,
            ..BounceConfig::default()
        };
        let config = TrajectoryConfig::batted(FieldGeometry::standard(), bounce);

        let traj = sim.simulate(
            Vec3::new(0.0, 1.0, 0.5),
            Vec3::new(0.0, 0.0, 5.0),
            &SpinState::none(),
            &config,
        );

        // Lossless bounces would go on forever without the cap
        assert_eq!(traj.termination, TerminationReason::Settled);
        assert_eq!(traj.contacts.iter().filter(|c| c.landing).count(), 2);
        let roll_start = traj.contacts[1].index;
        for p in &traj.points[roll_start..] {
            assert_eq!(p.y, 0.0, "ball left the ground while rolling");
        }
    }

    #[test]
    fn test_background_job_matches_inline() {
        let config = TrajectoryConfig::batted(FieldGeometry::standard(), BounceConfig::default());
        let spin = SpinState::new(Vec3::new(-1.0, 0.0, 0.0), 2000.0, 0.2);
        let start = Vec3::new(0.0, 1.0, 0.0);
        let v0 = Vec3::new(3.0, 15.0, 35.0);

        let inline = TrajectorySimulator::default().simulate(start, v0, &spin, &config);
        let job = TrajectorySimulator::default().spawn(start, v0, spin, config);
        let threaded = job.join().expect("worker finished");

        assert_eq!(inline, threaded);
    }

    proptest! {
        #[test]
        fn prop_simulation_respects_budget(
            vx in -40.0f64..40.0,
            vy in -20.0f64..50.0,
            vz in -20.0f64..60.0,
            rpm in 0.0f64..3000.0,
            max_points in 2usize..400,
        ) {
            let sim = TrajectorySimulator::default();
            let config = TrajectoryConfig {
                max_time: 3.0,
                max_points,
                ..TrajectoryConfig::batted(FieldGeometry::standard(), BounceConfig::default())
            };
            let spin = SpinState::new(Vec3::new(-1.0, 0.2, 0.0), rpm, 0.2);

            let traj = sim.simulate(Vec3::new(0.0, 1.0, 0.0), Vec3::new(vx, vy, vz), &spin, &config);

            prop_assert!(traj.len() <= max_points);
            prop_assert!(traj.duration() <= config.max_time + config.dt + 1e-9);
            prop_assert!(traj.points.iter().all(|p| p.is_finite()));
        }
    }
}
