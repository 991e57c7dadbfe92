//! Python bindings for the bb-core baseball play simulator.
//!
//! ```python
//! from bb_physics import Engine, Vec3
//!
//! engine = Engine("config", profile="default", roster="standard")
//! engine.set_situation(on_first=True, outs=1)
//!
//! velocity, error, converged = engine.solve_pitch(
//!     Vec3(-0.5, 1.8, 17.0), Vec3(0.1, 0.8, 0.0), 40.0, Vec3(1.0, 0.0, 0.0), 2200.0, 0.2
//! )
//! ball = engine.swing(0.01, Vec3(0.0, 0.01, 0.0), 32.0, 40.0, Vec3(0.0, 0.9, 0.4))
//! print(ball.outcome, ball.exit_speed, ball.carry_distance)
//!
//! play = engine.resolve_play(ball)
//! for base, runner, out in play.judgements():
//!     print(base, runner, "out" if out else "safe")
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use bb_core::batting::{BattedBallResult, BattingCalculator, SwingInput};
use bb_core::config::{ConfigLoader, EngineProfile};
use bb_core::play::{
    DefenseSituation, PlayController, PlayOutcome, PlayResolver, Roster, RunningSummary,
};
use bb_core::pitch::{PitchRequest, PitchSolver};
use bb_core::trajectory::{TrajectoryConfig, TrajectorySimulator};
use bb_core::types::{BallProperties, SpinState, Vec3 as CoreVec3};

/// 3D vector for positions, velocities, etc.
#[pyclass]
#[derive(Clone, Copy)]
pub struct Vec3 {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
    #[pyo3(get, set)]
    pub z: f64,
}

#[pymethods]
impl Vec3 {
    #[new]
    fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn __repr__(&self) -> String {
        format!("Vec3({:.4}, {:.4}, {:.4})", self.x, self.y, self.z)
    }

    fn magnitude(&self) -> f64 {
        CoreVec3::from(*self).magnitude()
    }

    fn to_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

impl From<CoreVec3> for Vec3 {
    fn from(v: CoreVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3> for CoreVec3 {
    fn from(v: Vec3) -> Self {
        CoreVec3::new(v.x, v.y, v.z)
    }
}

fn to_py_err(err: bb_core::ConfigError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Result of one swing. Read-only.
#[pyclass(frozen)]
pub struct BattedBall {
    inner: BattedBallResult,
}

#[pymethods]
impl BattedBall {
    /// "Miss", "Foul", "Hit", "HomeRun" or "GroundBall".
    #[getter]
    fn outcome(&self) -> String {
        format!("{:?}", self.inner.outcome)
    }

    #[getter]
    fn exit_speed(&self) -> f64 {
        self.inner.exit_speed
    }

    /// Degrees above horizontal.
    #[getter]
    fn launch_angle(&self) -> f64 {
        self.inner.launch_angle
    }

    /// Degrees from center field, positive toward first base.
    #[getter]
    fn horizontal_angle(&self) -> f64 {
        self.inner.horizontal_angle
    }

    #[getter]
    fn spin_rpm(&self) -> f64 {
        self.inner.spin.rpm
    }

    #[getter]
    fn efficiency(&self) -> f64 {
        self.inner.efficiency
    }

    #[getter]
    fn carry_distance(&self) -> f64 {
        self.inner.carry_distance
    }

    #[getter]
    fn landing_position(&self) -> Vec3 {
        self.inner.landing_position.into()
    }

    #[getter]
    fn dt(&self) -> f64 {
        self.inner.trajectory.dt
    }

    /// Sampled flight path.
    fn trajectory(&self) -> Vec<Vec3> {
        self.inner.trajectory.points.iter().map(|&p| p.into()).collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "BattedBall({:?}, {:.1} m/s, {:.1}°, carry {:.1} m)",
            self.inner.outcome, self.inner.exit_speed, self.inner.launch_angle, self.inner.carry_distance
        )
    }
}

/// Resolved play. Read-only.
#[pyclass(frozen)]
pub struct PlayReport {
    inner: PlayOutcome,
    fielder_names: Vec<String>,
}

impl PlayReport {
    fn name(&self, index: usize) -> String {
        self.fielder_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("#{}", index))
    }
}

#[pymethods]
impl PlayReport {
    /// "Miss", "Foul", "HomeRun", "FlyOut", "InPlay" or "NoDefensePlan".
    #[getter]
    fn kind(&self) -> String {
        format!("{:?}", self.inner.kind)
    }

    #[getter]
    fn has_judgement(&self) -> bool {
        self.inner.has_judgement()
    }

    #[getter]
    fn is_home_run(&self) -> bool {
        self.inner.is_home_run()
    }

    #[getter]
    fn runs_scored(&self) -> usize {
        self.inner.runs_scored()
    }

    #[getter]
    fn outs_recorded(&self) -> usize {
        self.inner.outs_recorded()
    }

    /// (fielder, catch time, caught in the air) or None.
    fn catch(&self) -> Option<(String, f64, bool)> {
        self.inner
            .catch_plan
            .as_ref()
            .map(|plan| (self.name(plan.fielder), plan.catch_time, plan.is_fly))
    }

    /// [(plan, thrower, receiver, arrival time)]
    fn throws(&self) -> Vec<(String, String, String, f64)> {
        self.inner
            .throws
            .iter()
            .map(|step| {
                (
                    format!("{:?}", step.plan),
                    self.name(step.thrower),
                    self.name(step.receiver),
                    step.arrival_time,
                )
            })
            .collect()
    }

    /// [(base, runner, out)]
    fn judgements(&self) -> Vec<(String, String, bool)> {
        self.inner
            .judgements
            .values()
            .map(|j| (format!("{:?}", j.base), format!("{:?}", j.runner), j.out))
            .collect()
    }

    /// [(runner, from, to, out)]
    fn runner_actions(&self) -> Vec<(String, String, String, bool)> {
        self.inner
            .runner_actions
            .iter()
            .map(|a| {
                (
                    format!("{:?}", a.slot),
                    format!("{:?}", a.from),
                    format!("{:?}", a.to),
                    a.out,
                )
            })
            .collect()
    }
}

/// [(runner, start base, end base, out)]
type SummaryRows = Vec<(String, String, String, bool)>;

fn summary_rows(summary: &RunningSummary) -> SummaryRows {
    summary
        .runners
        .iter()
        .map(|r| {
            (
                format!("{:?}", r.slot),
                format!("{:?}", r.start),
                format!("{:?}", r.end),
                r.out,
            )
        })
        .collect()
}

/// Pitching, batting and play resolution with one configuration.
#[pyclass]
pub struct Engine {
    profile: EngineProfile,
    ball: BallProperties,
    roster: Roster,
    situation: DefenseSituation,
    controller: PlayController,
}

impl Engine {
    fn simulator(&self) -> TrajectorySimulator {
        TrajectorySimulator::with_forces(self.ball.clone(), self.profile.forces.clone())
    }
}

#[pymethods]
impl Engine {
    /// Built-in settings, or YAML files from `config_dir` when given.
    #[new]
    #[pyo3(signature = (config_dir=None, profile="default", roster="standard", ball="official"))]
    fn new(config_dir: Option<&str>, profile: &str, roster: &str, ball: &str) -> PyResult<Self> {
        let (profile, roster, ball) = match config_dir {
            Some(dir) => {
                let loader = ConfigLoader::new(dir);
                (
                    loader.load_profile(profile).map_err(to_py_err)?,
                    loader.load_roster(roster).map_err(to_py_err)?,
                    loader.load_ball(ball).map_err(to_py_err)?,
                )
            }
            None => (
                EngineProfile::default(),
                Roster::standard(),
                BallProperties::official(),
            ),
        };
        Ok(Self {
            profile,
            ball,
            roster,
            situation: DefenseSituation::default(),
            controller: PlayController::new(),
        })
    }

    #[getter]
    fn profile_name(&self) -> String {
        self.profile.name.clone()
    }

    #[pyo3(signature = (on_first=false, on_second=false, on_third=false, outs=0))]
    fn set_situation(&mut self, on_first: bool, on_second: bool, on_third: bool, outs: u8) {
        self.situation = DefenseSituation::new(on_first, on_second, on_third, outs);
    }

    /// Release velocity reaching `target`: (velocity, error m, converged).
    fn solve_pitch(
        &self,
        release: Vec3,
        target: Vec3,
        speed: f64,
        spin_axis: Vec3,
        rpm: f64,
        lift_coefficient: f64,
    ) -> (Vec3, f64, bool) {
        let simulator = self.simulator();
        let solver = PitchSolver::new(&simulator, self.profile.solver.clone());
        let solution = solver.solve(&PitchRequest {
            release: release.into(),
            target: target.into(),
            spin: SpinState::new(spin_axis.into(), rpm, lift_coefficient),
            speed,
        });
        (solution.velocity.into(), solution.error, solution.converged)
    }

    /// Sampled pitch flight up to the plate plane at `plate_z`.
    #[pyo3(signature = (release, velocity, spin_axis, rpm, lift_coefficient, plate_z=0.0))]
    fn simulate_pitch(
        &self,
        release: Vec3,
        velocity: Vec3,
        spin_axis: Vec3,
        rpm: f64,
        lift_coefficient: f64,
        plate_z: f64,
    ) -> Vec<Vec3> {
        let spin = SpinState::new(spin_axis.into(), rpm, lift_coefficient);
        self.simulator()
            .simulate(
                release.into(),
                velocity.into(),
                &spin,
                &TrajectoryConfig::pitch(plate_z),
            )
            .points
            .into_iter()
            .map(Vec3::from)
            .collect()
    }

    fn swing(
        &self,
        timing_offset: f64,
        contact_offset: Vec3,
        bat_speed: f64,
        pitch_speed: f64,
        contact_point: Vec3,
    ) -> BattedBall {
        let calculator = BattingCalculator::new(self.profile.impact.clone());
        let input = SwingInput {
            timing_offset,
            contact_offset: contact_offset.into(),
            bat_speed,
            pitch_speed,
            contact_point: contact_point.into(),
        };
        BattedBall {
            inner: calculator.swing(
                &input,
                &self.simulator(),
                &self.profile.field,
                &self.profile.bounce,
            ),
        }
    }

    fn resolve_play(&self, batted: PyRef<'_, BattedBall>) -> PlayReport {
        let resolver = PlayResolver::new(self.profile.field.clone(), self.profile.runners.clone());
        PlayReport {
            inner: resolver.resolve(&batted.inner, &self.situation, &self.roster.fielders),
            fielder_names: self.roster.fielders.iter().map(|f| f.name.clone()).collect(),
        }
    }

    /// Start the runners of a resolved play.
    ///
    /// Returns `([(runner, seconds)], summary)`. `summary` holds the
    /// [(runner, start, end, out)] rows when nobody has to run; otherwise it
    /// is None and `tick` reports it later.
    fn start_running(
        &mut self,
        play: PyRef<'_, PlayReport>,
    ) -> (Vec<(String, f64)>, Option<SummaryRows>) {
        let start = self.controller.begin_play(&play.inner, &self.profile.runners);
        let tickets = start
            .tickets
            .iter()
            .map(|t| (format!("{:?}", t.slot), t.duration))
            .collect();
        (tickets, start.summary.as_ref().map(summary_rows))
    }

    /// Advance running runners. Returns [(runner, start, end, out)] once,
    /// on the tick the last runner stops.
    fn tick(&mut self, dt: f64) -> Option<SummaryRows> {
        self.controller.advance(dt).as_ref().map(summary_rows)
    }

    /// Abandon the play in progress.
    fn reset(&mut self) {
        self.controller.reset();
    }

    fn new_half_inning(&mut self) {
        self.controller.new_half_inning();
        self.situation = DefenseSituation::default();
    }
}

/// Python module definition.
#[pymodule]
fn bb_physics(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Vec3>()?;
    m.add_class::<BattedBall>()?;
    m.add_class::<PlayReport>()?;
    m.add_class::<Engine>()?;
    Ok(())
}
