//! Throw decisions.
//!
//! Rules, first match wins:
//!
//! 1. fly caught by an outfielder: relay through a cutoff, then return
//! 2. fly caught by anyone else: return to the pitcher
//! 3. two outs: first base, if covered
//! 4. Home, Third, Second, First: first covered base where the ball beats
//!    the fastest runner headed there
//! 5. first base, if covered
//! 6. hold the ball

use log::debug;

use crate::field::FieldGeometry;
use crate::play::types::{
    find_position, Base, BaseCoverAssignment, CatchPlan, Fielder, Position, RunnerEta,
    ThrowPlan, ThrowStep,
};
use crate::types::{travel_time, Vec3};

/// Everything the engine needs to choose a throw.
pub struct ThrowContext<'a> {
    pub plan: &'a CatchPlan,
    pub coverage: &'a [BaseCoverAssignment],
    pub runners: &'a [RunnerEta],
    pub outs: u8,
    pub fielders: &'a [Fielder],
    pub field: &'a FieldGeometry,
}

impl ThrowContext<'_> {
    fn receiver(&self, base: Base) -> Option<&BaseCoverAssignment> {
        self.coverage.iter().find(|a| a.base == base)
    }

    /// Fastest arrival among runners advancing to `base`.
    fn runner_eta(&self, base: Base) -> Option<f64> {
        self.runners
            .iter()
            .filter(|r| r.target == base && r.is_advancing())
            .map(|r| r.eta)
            .min_by(f64::total_cmp)
    }
}

pub struct ThrowDecisionEngine;

impl ThrowDecisionEngine {
    pub fn decide(ctx: &ThrowContext) -> Vec<ThrowStep> {
        let plan = ctx.plan;
        let Some(thrower) = ctx.fielders.get(plan.fielder) else {
            return Vec::new();
        };

        if plan.is_fly {
            return if thrower.position.is_outfielder() {
                Self::relay(ctx)
            } else {
                Self::return_to_pitcher(ctx, plan.fielder, plan.catch_point, plan.catch_time)
                    .into_iter()
                    .collect()
            };
        }

        if ctx.outs >= 2 {
            if let Some(step) = Self::throw_to_base(ctx, Base::First) {
                debug!("two outs: throwing to first");
                return vec![step];
            }
        }

        for base in [Base::Home, Base::Third, Base::Second, Base::First] {
            if ctx.receiver(base).is_none() {
                continue;
            }
            let Some(runner_eta) = ctx.runner_eta(base) else {
                continue;
            };
            let flight = travel_time(
                plan.catch_point.distance(&base.position(ctx.field)),
                thrower.throw_speed,
            );
            let ball_time = plan.catch_time + thrower.throw_delay + flight;
            if ball_time < runner_eta {
                if let Some(step) = Self::throw_to_base(ctx, base) {
                    debug!(
                        "throw to {:?}: ball {:.2}s beats runner {:.2}s",
                        base, ball_time, runner_eta
                    );
                    return vec![step];
                }
            }
        }

        if let Some(step) = Self::throw_to_base(ctx, Base::First) {
            debug!("no runner catchable, taking the out at first");
            return vec![step];
        }

        debug!("no receiver, holding the ball");
        vec![ThrowStep {
            plan: ThrowPlan::Return,
            thrower: plan.fielder,
            receiver: plan.fielder,
            target: plan.catch_point,
            speed: thrower.throw_speed,
            arrival_time: plan.catch_time,
        }]
    }

    fn throw_to_base(ctx: &ThrowContext, base: Base) -> Option<ThrowStep> {
        let receiver = ctx.receiver(base)?;
        let thrower = ctx.fielders.get(ctx.plan.fielder)?;
        Some(ThrowStep {
            plan: ThrowPlan::to_base(base)?,
            thrower: ctx.plan.fielder,
            receiver: receiver.fielder,
            target: base.position(ctx.field),
            speed: thrower.throw_speed,
            arrival_time: ctx.plan.throw_arrival.get(base),
        })
    }

    /// Outfield catch: throw to the nearest infielder, who returns the ball
    /// to the pitcher. Without infielders the outfielder returns it directly.
    fn relay(ctx: &ThrowContext) -> Vec<ThrowStep> {
        let plan = ctx.plan;
        let cutoff = ctx
            .fielders
            .iter()
            .enumerate()
            .filter(|(i, f)| *i != plan.fielder && f.position.is_infielder())
            .map(|(i, f)| (i, f.field_position.horizontal_distance(&plan.catch_point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);

        let Some(cutoff) = cutoff else {
            return Self::return_to_pitcher(ctx, plan.fielder, plan.catch_point, plan.catch_time)
                .into_iter()
                .collect();
        };

        let thrower = &ctx.fielders[plan.fielder];
        let relay_man = &ctx.fielders[cutoff];
        let target = relay_man.field_position;
        let arrival_time = plan.catch_time
            + thrower.throw_delay
            + travel_time(plan.catch_point.distance(&target), thrower.throw_speed);
        debug!("relay: {} -> cutoff {}", thrower.name, relay_man.name);

        let mut steps = vec![ThrowStep {
            plan: ThrowPlan::Cutoff,
            thrower: plan.fielder,
            receiver: cutoff,
            target,
            speed: thrower.throw_speed,
            arrival_time,
        }];
        steps.extend(Self::return_to_pitcher(ctx, cutoff, target, arrival_time));
        steps
    }

    fn return_to_pitcher(
        ctx: &ThrowContext,
        from: usize,
        origin: Vec3,
        start_time: f64,
    ) -> Option<ThrowStep> {
        let thrower = ctx.fielders.get(from)?;
        let (receiver, target) = match find_position(ctx.fielders, Position::Pitcher) {
            Some(p) => (p, ctx.fielders[p].field_position),
            None => (from, origin),
        };
        let flight = if receiver == from {
            0.0
        } else {
            thrower.throw_delay + travel_time(origin.distance(&target), thrower.throw_speed)
        };
        Some(ThrowStep {
            plan: ThrowPlan::Return,
            thrower: from,
            receiver,
            target,
            speed: thrower.throw_speed,
            arrival_time: start_time + flight,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
