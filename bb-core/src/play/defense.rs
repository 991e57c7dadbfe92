//! Defense planning: who fields the ball, who covers which base, and when a
//! throw can get to each base.
//!
//! ```text
//! trajectory ──scan samples──▶ CatchPlan (first fielder able to get there)
//!                                   │
//! occupancy ──lookup──▶ bases ──greedy nearest──▶ BaseCoverAssignment[]
//!                                   │
//!        max(catch, coverer) + throw delay + distance / throw speed
//!                                   ▼
//!                           throw arrival per base
//! ```

use log::debug;

use crate::field::FieldGeometry;
use crate::play::types::{
    Base, BaseCoverAssignment, BaseTimes, CatchPlan, DefenseSituation, Fielder,
};
use crate::trajectory::Trajectory;
use crate::types::{constants, travel_time, Vec3};

pub struct DefensePlanner;

impl DefensePlanner {
    /// Earliest catch along the sampled path.
    ///
    /// Samples are scanned in time order and fielders in roster order; the
    /// first fielder able to reach a catchable sample takes it. If nobody
    /// can, the fielder reaching the final sample soonest picks the ball up.
    ///
    /// # Arguments
    /// * `trajectory` - Sampled path of the batted ball
    /// * `fielders` - Defenders in planning order
    /// * `field` - Used to tell infield from outfield catches
    ///
    /// # Returns
    /// The catch (or pickup) plan with throw arrivals still unset, or `None`
    /// when there is no trajectory or no fielder.
    pub fn plan_catch(
        trajectory: &Trajectory,
        fielders: &[Fielder],
        field: &FieldGeometry,
    ) -> Option<CatchPlan> {
        if trajectory.is_empty() || fielders.is_empty() {
            return None;
        }
        let first_contact = trajectory.contacts.first().map(|c| c.index);

        let caught = trajectory.points.iter().enumerate().find_map(|(i, point)| {
            let t = trajectory.time_at(i);
            fielders
                .iter()
                .position(|f| point.y <= f.catch_height && time_to_field(f, point) <= t)
                .map(|fielder| (i, fielder))
        });

        let plan = match caught {
            Some((index, fielder)) => {
                let catch_point = trajectory.points[index];
                CatchPlan {
                    feasible: true,
                    fielder,
                    catch_point,
                    catch_time: trajectory.time_at(index),
                    catch_index: index,
                    is_fly: first_contact.map_or(true, |c| index < c),
                    is_infield: field.is_infield(&catch_point),
                    throw_arrival: BaseTimes::default(),
                }
            }
            None => {
                let index = trajectory.len() - 1;
                let end = trajectory.end();
                let (fielder, arrival) = fielders
                    .iter()
                    .enumerate()
                    .map(|(i, f)| (i, time_to_field(f, &end)))
                    .fold((0, f64::INFINITY), |best, candidate| {
                        if candidate.1 < best.1 {
                            candidate
                        } else {
                            best
                        }
                    });
                CatchPlan {
                    feasible: false,
                    fielder,
                    catch_point: end,
                    catch_time: arrival.max(trajectory.duration()),
                    catch_index: index,
                    is_fly: false,
                    is_infield: field.is_infield(&end),
                    throw_arrival: BaseTimes::default(),
                }
            }
        };

        debug!(
            "catch plan: {} ({}) at t={:.2}s, fly={}, infield={}",
            fielders[plan.fielder].name,
            if plan.feasible { "catch" } else { "pickup" },
            plan.catch_time,
            plan.is_fly,
            plan.is_infield
        );
        Some(plan)
    }

    /// Bases needing a coverer for an occupancy pattern.
    pub fn bases_to_cover(situation: &DefenseSituation) -> &'static [Base] {
        use Base::{First, Home, Second, Third};
        match (situation.on_first, situation.on_second, situation.on_third) {
            (false, false, false) => &[First],
            (true, false, false) => &[First, Second],
            (false, true, false) => &[First, Third],
            (false, false, true) => &[First, Home],
            (true, true, false) => &[First, Second, Third],
            (true, false, true) => &[First, Second, Home],
            (false, true, true) => &[First, Third, Home],
            (true, true, true) => &[First, Second, Third, Home],
        }
    }

    /// Send the nearest uncommitted fielder to each base, in lookup order.
    /// The fielder making the play is never assigned.
    pub fn assign_coverage(
        fielders: &[Fielder],
        catcher: usize,
        situation: &DefenseSituation,
        field: &FieldGeometry,
    ) -> Vec<BaseCoverAssignment> {
        let mut committed = vec![false; fielders.len()];
        if let Some(c) = committed.get_mut(catcher) {
            *c = true;
        }

        let mut assignments = Vec::new();
        for &base in Self::bases_to_cover(situation) {
            let target = base.position(field);
            let nearest = fielders
                .iter()
                .enumerate()
                .filter(|(i, _)| !committed[*i])
                .map(|(i, f)| (i, f.field_position.horizontal_distance(&target)))
                .min_by(|a, b| a.1.total_cmp(&b.1));

            if let Some((fielder, distance)) = nearest {
                committed[fielder] = true;
                assignments.push(BaseCoverAssignment {
                    base,
                    fielder,
                    arrival_time: travel_time(distance, fielders[fielder].move_speed),
                });
            }
        }
        assignments
    }

    /// Absolute time a throw from the catch point reaches each base.
    ///
    /// Bases without an assigned coverer are timed against the nearest
    /// fielder other than the thrower.
    pub fn throw_arrival_times(
        plan: &CatchPlan,
        coverage: &[BaseCoverAssignment],
        fielders: &[Fielder],
        field: &FieldGeometry,
    ) -> BaseTimes {
        let mut times = BaseTimes::default();
        let Some(thrower) = fielders.get(plan.fielder) else {
            return times;
        };

        for base in Base::TARGETS {
            let target = base.position(field);
            let receiver_arrival = coverage
                .iter()
                .find(|a| a.base == base)
                .map(|a| a.arrival_time)
                .or_else(|| {
                    fielders
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != plan.fielder)
                        .map(|(_, f)| {
                            travel_time(f.field_position.horizontal_distance(&target), f.move_speed)
                        })
                        .min_by(f64::total_cmp)
                })
                .unwrap_or(constants::LONG_TIME);

            let flight = travel_time(plan.catch_point.distance(&target), thrower.throw_speed);
            times.set(
                base,
                plan.catch_time.max(receiver_arrival) + thrower.throw_delay + flight,
            );
        }
        times
    }
}

/// Time for a fielder to get to a ball at `point`. A ball already at the
/// fielder's feet needs no reaction.
fn time_to_field(fielder: &Fielder, point: &Vec3) -> f64 {
    if fielder.field_position.horizontal_distance(point) <= constants::EPSILON {
        0.0
    } else {
        fielder.time_to_reach(point)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::play::types::{Position, Roster};
    use crate::trajectory::TerminationReason;
    use crate::types::{SurfaceContact, SurfaceKind};

    fn path(points: Vec<Vec3>, dt: f64) -> Trajectory {
        Trajectory {
            points,
            dt,
            contacts: Vec::new(),
            termination: TerminationReason::Settled,
        }
    }

    #[test]
    fn test_stationary_ball_at_fielders_feet() {
        let field = FieldGeometry::standard();
        let roster = Roster::standard();
        let ss = roster.index_of(Position::Shortstop).expect("shortstop");
        let spot = roster.fielders[ss].field_position;

        let plan = DefensePlanner::plan_catch(&path(vec![spot], 0.01), &roster.fielders, &field)
            .expect("plan");

        assert!(plan.feasible);
        assert_eq!(plan.fielder, ss);
        assert_eq!(plan.catch_time, 0.0);
        assert_eq!(plan.catch_index, 0);
    }

    #[test]
    fn test_first_fit_prefers_roster_order() {
        let field = FieldGeometry::standard();
        let ball = Vec3::new(0.0, 1.0, 10.0);
        let traj = path(vec![ball; 5], 0.5);

        let mut slow = Fielder::new("slow", Position::SecondBase, Vec3::new(0.0, 0.0, 16.0));
        slow.move_speed = 6.0;
        let fast = Fielder::new("fast", Position::Shortstop, Vec3::new(0.0, 0.0, 11.0));
        // Only the fast fielder is there by t=0.5s
        let plan = DefensePlanner::plan_catch(&traj, &[slow, fast], &field).expect("plan");
        assert_eq!(plan.fielder, 1);
        assert_eq!(plan.catch_index, 1);

        let mut slow = Fielder::new("slow", Position::SecondBase, Vec3::new(0.0, 0.0, 11.0));
        slow.move_speed = 6.0;
        let fast = Fielder::new("fast", Position::Shortstop, Vec3::new(0.0, 0.0, 9.0));
        // Both qualify at the same sample: the one listed first wins
        let plan = DefensePlanner::plan_catch(&traj, &[slow, fast], &field).expect("plan");
        assert_eq!(plan.fielder, 0);
    }

    #[test]
    fn test_ball_too_high_is_picked_up_at_end() {
        let field = FieldGeometry::standard();
        let fielder = Fielder::new("CF", Position::CenterField, Vec3::new(0.0, 0.0, 60.0));
        let points = vec![Vec3::new(0.0, 20.0, 60.0), Vec3::new(0.0, 10.0, 70.0)];

        let plan = DefensePlanner::plan_catch(&path(points, 0.5), &[fielder], &field).expect("plan");

        assert!(!plan.feasible);
        assert!(!plan.is_fly);
        assert_eq!(plan.catch_index, 1);
        // 10m at 8 m/s plus reaction
        assert!((plan.catch_time - 1.55).abs() < 1e-9, "pickup at {}", plan.catch_time);
    }

    #[test]
    fn test_catch_after_landing_is_not_fly() {
        let field = FieldGeometry::standard();
        let fielder = Fielder::new("SS", Position::Shortstop, Vec3::new(-9.0, 0.0, 30.0));
        let mut points = Vec::new();
        for i in 0..=20 {
            points.push(Vec3::new(-9.0, 0.0, 20.0 + i as f64 * 0.5));
        }
        let mut traj = path(points, 0.1);
        traj.contacts.push(SurfaceContact {
            index: 0,
            point: traj.points[0],
            kind: SurfaceKind::Ground,
            landing: true,
        });

        let plan = DefensePlanner::plan_catch(&traj, &[fielder], &field).expect("plan");
        assert!(plan.feasible);
        assert!(!plan.is_fly);
        assert!(plan.is_infield, "catch at {:?}", plan.catch_point);
    }

    #[test]
    fn test_no_fielders_no_plan() {
        let field = FieldGeometry::standard();
        assert!(DefensePlanner::plan_catch(&path(vec![Vec3::ZERO], 0.01), &[], &field).is_none());
    }

    #[test]
    fn test_coverage_table() {
        let cases = [
            ((false, false, false), vec![Base::First]),
            ((true, false, false), vec![Base::First, Base::Second]),
            ((false, true, false), vec![Base::First, Base::Third]),
            ((false, false, true), vec![Base::First, Base::Home]),
            ((true, true, false), vec![Base::First, Base::Second, Base::Third]),
            ((true, false, true), vec![Base::First, Base::Second, Base::Home]),
            ((false, true, true), vec![Base::First, Base::Third, Base::Home]),
            (
                (true, true, true),
                vec![Base::First, Base::Second, Base::Third, Base::Home],
            ),
        ];
        for ((a, b, c), expected) in cases {
            let situation = DefenseSituation::new(a, b, c, 0);
            assert_eq!(
                DefensePlanner::bases_to_cover(&situation),
                expected.as_slice(),
                "occupancy {:?}",
                (a, b, c)
            );
        }
    }

    #[test]
    fn test_coverage_excludes_catcher_and_is_greedy() {
        let field = FieldGeometry::standard();
        let roster = Roster::standard();
        let first_baseman = roster.index_of(Position::FirstBase).expect("1B");
        let situation = DefenseSituation::new(true, true, true, 0);

        let coverage =
            DefensePlanner::assign_coverage(&roster.fielders, first_baseman, &situation, &field);

        assert_eq!(coverage.len(), 4);
        assert!(coverage.iter().all(|a| a.fielder != first_baseman));
        let mut seen: Vec<usize> = coverage.iter().map(|a| a.fielder).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 4, "each fielder covers at most one base");

        let home = coverage.iter().find(|a| a.base == Base::Home).expect("home");
        assert_eq!(roster.fielders[home.fielder].position, Position::Catcher);
    }

    #[test]
    fn test_throw_arrival_waits_for_coverer() {
        let field = FieldGeometry::standard();
        let thrower = Fielder::new("SS", Position::Shortstop, Vec3::new(-9.0, 0.0, 36.0));
        let receiver = Fielder::new("1B", Position::FirstBase, field.first);
        let fielders = vec![thrower, receiver];
        let plan = CatchPlan {
            feasible: true,
            fielder: 0,
            catch_point: Vec3::new(-9.0, 0.0, 36.0),
            catch_time: 1.0,
            catch_index: 100,
            is_fly: false,
            is_infield: true,
            throw_arrival: BaseTimes::default(),
        };
        let coverage = vec![BaseCoverAssignment {
            base: Base::First,
            fielder: 1,
            arrival_time: 2.0,
        }];

        let times = DefensePlanner::throw_arrival_times(&plan, &coverage, &fielders, &field);

        let flight = plan.catch_point.distance(&field.first) / 35.0;
        assert!((times.first - (2.0 + 0.6 + flight)).abs() < 1e-9);
        // Second is timed against the first baseman running over
        let run = field.first.horizontal_distance(&field.second) / 7.0;
        let flight = plan.catch_point.distance(&field.second) / 35.0;
        assert!((times.second - (run.max(1.0) + 0.6 + flight)).abs() < 1e-9);
    }
}
