//! Data exchanged between the defense, throw and runner components.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::field::FieldGeometry;
use crate::types::{constants, travel_time, Vec3};

// =============================================================================
// Bases
// =============================================================================

/// Base identifiers in running order: `None < First < Second < Third < Home`.
///
/// `None` is the batter's box (a batter who has not reached base).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Base {
    None,
    First,
    Second,
    Third,
    Home,
}

impl Base {
    /// Bases a throw can be made to.
    pub const TARGETS: [Base; 4] = [Base::First, Base::Second, Base::Third, Base::Home];

    fn ordinal(self) -> u8 {
        match self {
            Base::None => 0,
            Base::First => 1,
            Base::Second => 2,
            Base::Third => 3,
            Base::Home => 4,
        }
    }

    /// Following base; `Home` is terminal.
    pub fn next(self) -> Base {
        match self {
            Base::None => Base::First,
            Base::First => Base::Second,
            Base::Second => Base::Third,
            Base::Third | Base::Home => Base::Home,
        }
    }

    /// Number of bases a runner covers going from `self` to `target`.
    pub fn bases_to(self, target: Base) -> u8 {
        target.ordinal().saturating_sub(self.ordinal())
    }

    /// Ground position of the base. The batter's box is home plate.
    pub fn position(self, field: &FieldGeometry) -> Vec3 {
        match self {
            Base::None | Base::Home => field.home,
            Base::First => field.first,
            Base::Second => field.second,
            Base::Third => field.third,
        }
    }
}

/// One value per throwable base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseTimes {
    pub first: f64,
    pub second: f64,
    pub third: f64,
    pub home: f64,
}

impl BaseTimes {
    pub fn splat(value: f64) -> Self {
        Self {
            first: value,
            second: value,
            third: value,
            home: value,
        }
    }

    /// Time for `base`; the batter's box is never thrown to.
    pub fn get(&self, base: Base) -> f64 {
        match base {
            Base::First => self.first,
            Base::Second => self.second,
            Base::Third => self.third,
            Base::Home => self.home,
            Base::None => constants::LONG_TIME,
        }
    }

    pub fn set(&mut self, base: Base, value: f64) {
        match base {
            Base::First => self.first = value,
            Base::Second => self.second = value,
            Base::Third => self.third = value,
            Base::Home => self.home = value,
            Base::None => {}
        }
    }
}

impl Default for BaseTimes {
    fn default() -> Self {
        Self::splat(constants::LONG_TIME)
    }
}

// =============================================================================
// Game state
// =============================================================================

/// A runner slot: the batter or the runner who started on a base.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RunnerSlot {
    Batter,
    OnFirst,
    OnSecond,
    OnThird,
}

impl RunnerSlot {
    pub const ALL: [RunnerSlot; 4] = [
        RunnerSlot::Batter,
        RunnerSlot::OnFirst,
        RunnerSlot::OnSecond,
        RunnerSlot::OnThird,
    ];

    pub fn starting_base(self) -> Base {
        match self {
            RunnerSlot::Batter => Base::None,
            RunnerSlot::OnFirst => Base::First,
            RunnerSlot::OnSecond => Base::Second,
            RunnerSlot::OnThird => Base::Third,
        }
    }
}

/// Occupied bases and outs at the start of an at-bat. Read-only input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseSituation {
    pub on_first: bool,
    pub on_second: bool,
    pub on_third: bool,
    pub outs: u8,
}

impl DefenseSituation {
    pub fn new(on_first: bool, on_second: bool, on_third: bool, outs: u8) -> Self {
        Self {
            on_first,
            on_second,
            on_third,
            outs,
        }
    }

    pub fn is_occupied(&self, base: Base) -> bool {
        match base {
            Base::First => self.on_first,
            Base::Second => self.on_second,
            Base::Third => self.on_third,
            Base::None | Base::Home => false,
        }
    }

    /// Runners on base, lead runner last.
    pub fn base_runners(&self) -> Vec<RunnerSlot> {
        [RunnerSlot::OnFirst, RunnerSlot::OnSecond, RunnerSlot::OnThird]
            .into_iter()
            .filter(|slot| self.is_occupied(slot.starting_base()))
            .collect()
    }

    /// The batter followed by every runner on base.
    pub fn active_runners(&self) -> Vec<RunnerSlot> {
        let mut runners = vec![RunnerSlot::Batter];
        runners.extend(self.base_runners());
        runners
    }
}

// =============================================================================
// Fielders
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Pitcher,
    Catcher,
    FirstBase,
    SecondBase,
    ThirdBase,
    Shortstop,
    LeftField,
    CenterField,
    RightField,
}

impl Position {
    /// Infielders eligible as cutoff men. Battery players are not.
    pub fn is_infielder(self) -> bool {
        matches!(
            self,
            Position::FirstBase | Position::SecondBase | Position::ThirdBase | Position::Shortstop
        )
    }

    pub fn is_outfielder(self) -> bool {
        matches!(
            self,
            Position::LeftField | Position::CenterField | Position::RightField
        )
    }
}

/// A defender and its capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fielder {
    pub name: String,
    pub position: Position,
    /// Where the fielder stands when the ball is hit
    pub field_position: Vec3,
    /// Running speed (m/s)
    pub move_speed: f64,
    /// Delay before the first step (s)
    pub reaction_time: f64,
    /// Highest ball the fielder can reach (m)
    pub catch_height: f64,
    /// Time from securing the ball to release (s)
    pub throw_delay: f64,
    /// Throw speed (m/s)
    pub throw_speed: f64,
}

impl Fielder {
    pub fn new(name: &str, position: Position, field_position: Vec3) -> Self {
        let outfield = position.is_outfielder();
        Self {
            name: name.to_string(),
            position,
            field_position,
            move_speed: if outfield { 8.0 } else { 7.0 },
            reaction_time: 0.3,
            catch_height: if outfield { 3.0 } else { 2.5 },
            throw_delay: if outfield { 0.8 } else { 0.6 },
            throw_speed: if outfield { 38.0 } else { 35.0 },
        }
    }

    /// Time to run from the starting spot to `point`, reaction included.
    pub fn time_to_reach(&self, point: &Vec3) -> f64 {
        self.reaction_time
            + travel_time(self.field_position.horizontal_distance(point), self.move_speed)
    }
}

/// A named set of fielders in planning order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub name: String,
    pub fielders: Vec<Fielder>,
}

impl Roster {
    /// Straight-up alignment on a standard field.
    pub fn standard() -> Self {
        let fielders = vec![
            Fielder::new("P", Position::Pitcher, Vec3::new(0.0, 0.0, 18.44)),
            Fielder::new("C", Position::Catcher, Vec3::new(0.0, 0.0, -1.0)),
            Fielder::new("1B", Position::FirstBase, Vec3::new(18.0, 0.0, 22.0)),
            Fielder::new("2B", Position::SecondBase, Vec3::new(9.0, 0.0, 36.0)),
            Fielder::new("3B", Position::ThirdBase, Vec3::new(-18.0, 0.0, 22.0)),
            Fielder::new("SS", Position::Shortstop, Vec3::new(-9.0, 0.0, 36.0)),
            Fielder::new("LF", Position::LeftField, Vec3::new(-32.0, 0.0, 78.0)),
            Fielder::new("CF", Position::CenterField, Vec3::new(0.0, 0.0, 92.0)),
            Fielder::new("RF", Position::RightField, Vec3::new(32.0, 0.0, 78.0)),
        ];
        Self {
            name: "Standard".to_string(),
            fielders,
        }
    }

    pub fn index_of(&self, position: Position) -> Option<usize> {
        find_position(&self.fielders, position)
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::standard()
    }
}

pub(crate) fn find_position(fielders: &[Fielder], position: Position) -> Option<usize> {
    fielders.iter().position(|f| f.position == position)
}

// =============================================================================
// Plans
// =============================================================================

/// Earliest feasible catch (or pickup) for one batted ball.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchPlan {
    /// False when nobody could reach the ball before it stopped
    pub feasible: bool,
    /// Index of the fielder in the roster
    pub fielder: usize,
    pub catch_point: Vec3,
    pub catch_time: f64,
    pub catch_index: usize,
    /// Caught before touching any surface
    pub is_fly: bool,
    pub is_infield: bool,
    /// Absolute ball-arrival time for a throw to each base
    pub throw_arrival: BaseTimes,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseCoverAssignment {
    pub base: Base,
    pub fielder: usize,
    pub arrival_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThrowPlan {
    First,
    Second,
    Third,
    Home,
    /// Relay to an infielder
    Cutoff,
    /// Back to the pitcher (or a hold)
    Return,
}

impl ThrowPlan {
    pub fn to_base(base: Base) -> Option<ThrowPlan> {
        match base {
            Base::First => Some(ThrowPlan::First),
            Base::Second => Some(ThrowPlan::Second),
            Base::Third => Some(ThrowPlan::Third),
            Base::Home => Some(ThrowPlan::Home),
            Base::None => None,
        }
    }

    pub fn target_base(self) -> Option<Base> {
        match self {
            ThrowPlan::First => Some(Base::First),
            ThrowPlan::Second => Some(Base::Second),
            ThrowPlan::Third => Some(Base::Third),
            ThrowPlan::Home => Some(Base::Home),
            ThrowPlan::Cutoff | ThrowPlan::Return => None,
        }
    }
}

/// One leg of the defensive throw sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrowStep {
    pub plan: ThrowPlan,
    pub thrower: usize,
    pub receiver: usize,
    pub target: Vec3,
    pub speed: f64,
    /// Absolute time the ball gets there (s after contact)
    pub arrival_time: f64,
}

/// Where a runner is headed and when it gets there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunnerEta {
    pub slot: RunnerSlot,
    pub from: Base,
    pub target: Base,
    /// Absolute arrival time (s after contact); zero for a runner holding
    pub eta: f64,
}

impl RunnerEta {
    pub fn is_advancing(&self) -> bool {
        self.target > self.from
    }
}

/// Out/safe call at one contested base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseJudgement {
    pub base: Base,
    pub runner: RunnerSlot,
    pub target: Base,
    pub ball_time: f64,
    pub runner_time: f64,
    pub out: bool,
}

/// Instruction for one runner in the execution layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerAction {
    pub slot: RunnerSlot,
    pub from: Base,
    pub to: Base,
    pub out: bool,
}

// =============================================================================
// Running
// =============================================================================

/// Live state of one runner, owned by the play controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunnerState {
    pub slot: RunnerSlot,
    pub current: Base,
    /// `None` while stationary
    pub target: Option<Base>,
    pub running: bool,
    pub remaining_time: f64,
    pub total_time: f64,
}

impl RunnerState {
    pub fn idle(slot: RunnerSlot, base: Base) -> Self {
        Self {
            slot,
            current: base,
            target: None,
            running: false,
            remaining_time: 0.0,
            total_time: 0.0,
        }
    }

    pub fn start(&mut self, target: Base, time: f64) {
        self.target = Some(target);
        self.running = true;
        self.remaining_time = time.max(0.0);
        self.total_time = self.remaining_time;
    }

    /// Advance the clock; returns true on the tick the runner arrives.
    pub fn tick(&mut self, dt: f64) -> bool {
        if !self.running {
            return false;
        }
        self.remaining_time = (self.remaining_time - dt).max(0.0);
        self.remaining_time <= 0.0
    }

    pub fn arrive(&mut self) {
        if let Some(target) = self.target.take() {
            self.current = target;
        }
        self.running = false;
        self.remaining_time = 0.0;
    }
}

/// How one runner's play ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerResult {
    pub slot: RunnerSlot,
    pub start: Base,
    pub end: Base,
    pub bases_advanced: u8,
    pub reached_home: bool,
    pub out: bool,
}

/// Emitted once per play when every runner has stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningSummary {
    pub epoch: u64,
    pub runners: Vec<RunnerResult>,
}

impl RunningSummary {
    pub fn runs_scored(&self) -> usize {
        self.runners
            .iter()
            .filter(|r| r.reached_home && !r.out)
            .count()
    }

    pub fn outs_recorded(&self) -> usize {
        self.runners.iter().filter(|r| r.out).count()
    }
}

/// Per-base judgements of a play, keyed by base.
pub type Judgements = BTreeMap<Base, BaseJudgement>;

// =============================================================================
// Tests
// =============================================================================
