//! Bat-ball impact model.
//!
//! Turns swing timing and the bat/ball contact offset into a batted ball:
//!
//! ```text
//! contact distance ──▶ efficiency η (1.0 inside the sweet spot)
//! pitch + bat speed ──▶ exit speed  = (q·v_pitch + (1+q)·v_bat) · η
//! vertical offset  ──▶ launch angle = ideal ± k·|dy/d_max|^p
//! timing offset    ──▶ spray angle  (fair inside the foul threshold)
//! exit speed/angle ──▶ spin rate ──▶ lift coefficient
//! ```
//!
//! The resulting flight is simulated with ground, fence and bounds handling
//! and then classified.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::collision::BounceConfig;
use crate::field::FieldGeometry;
use crate::trajectory::{TerminationReason, Trajectory, TrajectoryConfig, TrajectorySimulator};
use crate::types::{constants, rpm_to_rad_per_sec, SpinState, SurfaceKind, Vec3};

/// Outcome class of a single swing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattingBallType {
    Miss,
    Foul,
    Hit,
    HomeRun,
    GroundBall,
}

/// Tuning for the impact model. Angles in degrees, distances in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    pub sweet_spot_radius: f64,
    pub max_impact_distance: f64,
    /// Efficiency at (and beyond) the max impact distance
    pub min_efficiency: f64,
    /// Exponent of the efficiency falloff curve
    pub efficiency_falloff: f64,

    /// Coefficient of restitution of the bat
    pub bat_restitution: f64,
    /// Ball mass over effective bat mass at the contact point
    pub mass_ratio: f64,

    pub ideal_launch_angle: f64,
    pub launch_gain: f64,
    pub launch_exponent: f64,
    pub min_launch_angle: f64,
    pub max_launch_angle: f64,

    /// Timing error (s) at which the ball reaches the foul line
    pub foul_timing_threshold: f64,
    /// Timing error (s) at which the ball leaves at `max_foul_angle`
    pub max_timing_offset: f64,
    pub max_foul_angle: f64,

    /// Spin per unit exit speed (rpm per m/s)
    pub spin_per_speed: f64,
    /// Extra spin per unit sin(launch angle)
    pub spin_launch_factor: f64,
    pub min_spin: f64,
    pub max_spin: f64,

    /// Lift coefficient Cl = S / (lift_a + lift_b·S), S = ωr/v
    pub lift_a: f64,
    pub lift_b: f64,
    pub max_lift: f64,

    /// Launch angle under which a batted ball is a grounder
    pub ground_ball_angle: f64,
    /// Carry distance over which an airborne ball counts as a hit
    pub hit_carry_distance: f64,
    /// Sample used for the foul check
    pub foul_check_index: usize,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            sweet_spot_radius: 0.02,
            max_impact_distance: 0.08,
            min_efficiency: 0.2,
            efficiency_falloff: 1.5,
            bat_restitution: 0.5,
            mass_ratio: 0.2,
            ideal_launch_angle: 25.0,
            launch_gain: 45.0,
            launch_exponent: 0.8,
            min_launch_angle: -20.0,
            max_launch_angle: 70.0,
            foul_timing_threshold: 0.03,
            max_timing_offset: 0.1,
            max_foul_angle: 90.0,
            spin_per_speed: 40.0,
            spin_launch_factor: 0.8,
            min_spin: 500.0,
            max_spin: 4000.0,
            lift_a: 0.4,
            lift_b: 2.32,
            max_lift: 0.35,
            ground_ball_angle: 10.0,
            hit_carry_distance: 30.0,
            foul_check_index: 15,
        }
    }
}

/// One swing at one pitch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingInput {
    /// Seconds early (negative) or late (positive) relative to perfect timing
    pub timing_offset: f64,
    /// Ball center minus bat sweet spot at contact
    pub contact_offset: Vec3,
    pub bat_speed: f64,
    pub pitch_speed: f64,
    /// Where the ball meets the bat
    pub contact_point: Vec3,
}

/// Immutable record of a batting event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattedBallResult {
    pub initial_velocity: Vec3,
    pub exit_speed: f64,
    pub launch_angle: f64,
    pub horizontal_angle: f64,
    pub spin: SpinState,
    pub efficiency: f64,
    pub contact_distance: f64,
    pub trajectory: Trajectory,
    pub outcome: BattingBallType,
    pub landing_position: Vec3,
    pub carry_distance: f64,
}

impl BattedBallResult {
    fn miss(input: &SwingInput, contact_distance: f64, dt: f64) -> Self {
        Self {
            initial_velocity: Vec3::ZERO,
            exit_speed: 0.0,
            launch_angle: 0.0,
            horizontal_angle: 0.0,
            spin: SpinState::none(),
            efficiency: 0.0,
            contact_distance,
            trajectory: Trajectory {
                points: vec![input.contact_point],
                dt,
                contacts: Vec::new(),
                termination: TerminationReason::Settled,
            },
            outcome: BattingBallType::Miss,
            landing_position: input.contact_point,
            carry_distance: 0.0,
        }
    }
}

/// Stateless impact calculations, parameterized by an [`ImpactConfig`].
pub struct BattingCalculator {
    pub config: ImpactConfig,
}

impl Default for BattingCalculator {
    fn default() -> Self {
        Self::new(ImpactConfig::default())
    }
}

impl BattingCalculator {
    pub fn new(config: ImpactConfig) -> Self {
        Self { config }
    }

    /// Fraction of ideal energy transfer for a contact `distance` from the
    /// sweet spot.
    pub fn efficiency(&self, distance: f64) -> f64 {
        let c = &self.config;
        if distance <= c.sweet_spot_radius {
            return 1.0;
        }
        if distance >= c.max_impact_distance {
            return c.min_efficiency;
        }
        let span = (c.max_impact_distance - c.sweet_spot_radius).max(constants::EPSILON);
        let x = (distance - c.sweet_spot_radius) / span;
        1.0 - (1.0 - c.min_efficiency) * x.powf(c.efficiency_falloff)
    }

    pub fn is_miss(&self, distance: f64) -> bool {
        distance > self.config.max_impact_distance
    }

    /// Exit speed from a bat-ball collision with collision efficiency
    /// q = (e - r) / (1 + r).
    pub fn exit_speed(&self, pitch_speed: f64, bat_speed: f64, efficiency: f64) -> f64 {
        let c = &self.config;
        let q = (c.bat_restitution - c.mass_ratio) / (1.0 + c.mass_ratio);
        ((q * pitch_speed.abs() + (1.0 + q) * bat_speed.abs()) * efficiency).max(0.0)
    }

    /// Launch angle (degrees). Positive `vertical_offset` means the ball sat
    /// above the bat, so the bat got under it.
    pub fn launch_angle(&self, vertical_offset: f64) -> f64 {
        let c = &self.config;
        let normalized = (vertical_offset.abs() / c.max_impact_distance).min(1.0);
        let delta = c.launch_gain * normalized.powf(c.launch_exponent);
        (c.ideal_launch_angle + delta.copysign(vertical_offset))
            .clamp(c.min_launch_angle, c.max_launch_angle)
    }

    /// Spray angle (degrees). Early swings pull toward third base.
    pub fn horizontal_angle(&self, timing_offset: f64, fair_angle: f64) -> f64 {
        let c = &self.config;
        let t = timing_offset.abs();
        let magnitude = if t <= c.foul_timing_threshold {
            fair_angle * t / c.foul_timing_threshold.max(constants::EPSILON)
        } else {
            let span = (c.max_timing_offset - c.foul_timing_threshold).max(constants::EPSILON);
            let x = ((t - c.foul_timing_threshold) / span).min(1.0);
            fair_angle + (c.max_foul_angle - fair_angle) * x
        };
        magnitude.copysign(timing_offset)
    }

    /// Spin rate (rpm) from exit speed and launch angle.
    pub fn spin_rate(&self, exit_speed: f64, launch_angle: f64) -> f64 {
        let c = &self.config;
        let rpm = c.spin_per_speed
            * exit_speed
            * (1.0 + c.spin_launch_factor * launch_angle.to_radians().sin().abs());
        rpm.clamp(c.min_spin, c.max_spin)
    }

    /// Saturating lift coefficient from the spin parameter S = ωr/v.
    pub fn lift_coefficient(&self, rpm: f64, speed: f64, radius: f64) -> f64 {
        let c = &self.config;
        if speed <= constants::EPSILON {
            return 0.0;
        }
        let s = rpm_to_rad_per_sec(rpm) * radius / speed;
        (s / (c.lift_a + c.lift_b * s)).clamp(0.0, c.max_lift)
    }

    /// Full swing: impact, flight and classification.
    pub fn swing(
        &self,
        input: &SwingInput,
        simulator: &TrajectorySimulator,
        field: &FieldGeometry,
        bounce: &BounceConfig,
    ) -> BattedBallResult {
        let config = TrajectoryConfig::batted(field.clone(), bounce.clone());
        let contact_distance = input.contact_offset.magnitude();

        if self.is_miss(contact_distance) {
            debug!("swing missed: contact {:.3}m from sweet spot", contact_distance);
            return BattedBallResult::miss(input, contact_distance, config.dt);
        }

        let efficiency = self.efficiency(contact_distance);
        let exit_speed = self.exit_speed(input.pitch_speed, input.bat_speed, efficiency);
        let launch_angle = self.launch_angle(input.contact_offset.y);
        let horizontal_angle = self.horizontal_angle(input.timing_offset, field.fair_angle_deg);

        let (launch, spray) = (launch_angle.to_radians(), horizontal_angle.to_radians());
        let direction = Vec3::new(
            spray.sin() * launch.cos(),
            launch.sin(),
            spray.cos() * launch.cos(),
        );
        let initial_velocity = direction * exit_speed;

        // Backspin lifts balls hit in the air, topspin drives grounders down
        let backspin_axis = direction.cross(&Vec3::UP).normalized();
        let axis = if launch_angle >= 0.0 {
            backspin_axis
        } else {
            -backspin_axis
        };
        let rpm = self.spin_rate(exit_speed, launch_angle);
        let lift = self.lift_coefficient(rpm, exit_speed, simulator.props.radius);
        let spin = SpinState::new(axis, rpm, lift);

        let trajectory = simulator.simulate(input.contact_point, initial_velocity, &spin, &config);
        let outcome = self.classify(&trajectory, launch_angle, field);
        let landing_position = trajectory.landing_point();
        let carry_distance = trajectory.carry_distance();

        debug!(
            "batted ball {:?}: {:.1}m/s, launch {:.1}°, spray {:.1}°, {:.0}rpm, carry {:.1}m",
            outcome, exit_speed, launch_angle, horizontal_angle, rpm, carry_distance
        );

        BattedBallResult {
            initial_velocity,
            exit_speed,
            launch_angle,
            horizontal_angle,
            spin,
            efficiency,
            contact_distance,
            trajectory,
            outcome,
            landing_position,
            carry_distance,
        }
    }

    /// Classify a simulated batted ball, checking foul, home run, ground ball
    /// and carry in that order.
    pub fn classify(
        &self,
        trajectory: &Trajectory,
        launch_angle: f64,
        field: &FieldGeometry,
    ) -> BattingBallType {
        let c = &self.config;
        let origin = trajectory.start();
        let early = trajectory
            .points
            .get(c.foul_check_index.min(trajectory.len().saturating_sub(1)))
            .copied()
            .unwrap_or(origin);

        if early.horizontal_distance(&origin) > constants::EPSILON
            && !field.is_fair_direction(&origin, &early)
        {
            return BattingBallType::Foul;
        }

        if let Some(surface) = trajectory.first_landing_surface() {
            if surface != SurfaceKind::Ground && surface != SurfaceKind::Net {
                return BattingBallType::HomeRun;
            }
        }

        if launch_angle < c.ground_ball_angle {
            return BattingBallType::GroundBall;
        }

        if trajectory.carry_distance() > c.hit_carry_distance {
            BattingBallType::Hit
        } else {
            BattingBallType::GroundBall
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn swing(timing: f64, offset: Vec3) -> SwingInput {
        SwingInput {
            timing_offset: timing,
            contact_offset: offset,
            bat_speed: 32.0,
            pitch_speed: 40.0,
            contact_point: Vec3::new(0.0, 0.9, 0.4),
        }
    }

    fn run(input: &SwingInput) -> BattedBallResult {
        BattingCalculator::default().swing(
            input,
            &TrajectorySimulator::default(),
            &FieldGeometry::standard(),
            &BounceConfig::default(),
        )
    }

    #[test]
    fn test_efficiency_at_sweet_spot_edge() {
        let calc = BattingCalculator::default();
        assert_eq!(calc.efficiency(0.0), 1.0);
        assert_eq!(calc.efficiency(calc.config.sweet_spot_radius), 1.0);
    }

    #[test]
    fn test_efficiency_at_max_distance() {
        let calc = BattingCalculator::default();
        let max = calc.config.max_impact_distance;
        assert_eq!(calc.efficiency(max), calc.config.min_efficiency);
        assert_eq!(calc.efficiency(max * 2.0), calc.config.min_efficiency);
        assert!(!calc.is_miss(max));
        assert!(calc.is_miss(max + 1e-6));
    }

    #[test]
    fn test_exit_speed_formula() {
        let calc = BattingCalculator::default();
        // q = (0.5 - 0.2) / 1.2 = 0.25
        let v = calc.exit_speed(40.0, 32.0, 1.0);
        assert!((v - 50.0).abs() < 1e-9, "exit speed {}", v);
        assert!((calc.exit_speed(40.0, 32.0, 0.5) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_launch_angle_direction_and_clamp() {
        let calc = BattingCalculator::default();
        assert_eq!(calc.launch_angle(0.0), calc.config.ideal_launch_angle);
        assert!(calc.launch_angle(0.03) > calc.config.ideal_launch_angle);
        assert!(calc.launch_angle(-0.03) < calc.config.ideal_launch_angle);
        assert_eq!(calc.launch_angle(-0.08), calc.config.min_launch_angle);
    }

    #[test]
    fn test_horizontal_angle_regions() {
        let calc = BattingCalculator::default();
        assert_eq!(calc.horizontal_angle(0.0, 45.0), 0.0);
        assert!((calc.horizontal_angle(0.015, 45.0) - 22.5).abs() < 1e-9);
        assert!((calc.horizontal_angle(-0.03, 45.0) + 45.0).abs() < 1e-9);
        assert!((calc.horizontal_angle(0.5, 45.0) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_spin_clamped() {
        let calc = BattingCalculator::default();
        assert_eq!(calc.spin_rate(0.0, 0.0), calc.config.min_spin);
        assert_eq!(calc.spin_rate(500.0, 45.0), calc.config.max_spin);
    }

    #[test]
    fn test_lift_coefficient_saturates() {
        let calc = BattingCalculator::default();
        let low = calc.lift_coefficient(1000.0, 45.0, 0.0366);
        let high = calc.lift_coefficient(4000.0, 45.0, 0.0366);
        assert!(high > low && low > 0.0);
        assert!(calc.lift_coefficient(1.0e6, 1.0, 0.0366) <= calc.config.max_lift);
        assert_eq!(calc.lift_coefficient(2000.0, 0.0, 0.0366), 0.0);
    }

    #[test]
    fn test_swing_and_miss() {
        let result = run(&swing(0.0, Vec3::new(0.0, 0.2, 0.0)));
        assert_eq!(result.outcome, BattingBallType::Miss);
        assert_eq!(result.exit_speed, 0.0);
    }

    #[test]
    fn test_very_late_swing_is_foul() {
        let result = run(&swing(0.08, Vec3::ZERO));
        assert_eq!(result.outcome, BattingBallType::Foul);
    }

    #[test]
    fn test_chopped_ball_is_grounder() {
        let result = run(&swing(0.0, Vec3::new(0.0, -0.05, 0.0)));
        assert!(result.launch_angle < 0.0);
        assert_eq!(result.outcome, BattingBallType::GroundBall);
    }

    #[test]
    fn test_squared_up_ball_carries() {
        let result = run(&swing(0.005, Vec3::ZERO));
        assert!(
            matches!(result.outcome, BattingBallType::Hit | BattingBallType::HomeRun),
            "got {:?}, carry {}",
            result.outcome,
            result.carry_distance
        );
        assert!(result.carry_distance > 30.0);
    }

    proptest! {
        #[test]
        fn prop_efficiency_bounded_and_monotonic(a in 0.0f64..0.2, b in 0.0f64..0.2) {
            let calc = BattingCalculator::default();
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            let (en, ef) = (calc.efficiency(near), calc.efficiency(far));
            prop_assert!(en >= ef);
            prop_assert!(ef >= calc.config.min_efficiency && en <= 1.0);
        }
    }
}
