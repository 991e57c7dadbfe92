//! Per-play orchestration.
//!
//! ```text
//! Miss / Foul ─────────────────────────────▶ nobody moves
//! HomeRun ─────────────────────────────────▶ everyone scores
//! in play: catch plan ─▶ coverage ─▶ throw arrival times
//!              │ fly ──────────────────────▶ batter out, relay
//!              ▼
//!          runner advancement ─▶ throw decision ─▶ judgements
//! ```
//!
//! The resulting [`PlayOutcome`] is the complete instruction set for one
//! play; nothing in it is revised afterwards.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::batting::{BattedBallResult, BattingBallType};
use crate::field::FieldGeometry;
use crate::play::defense::DefensePlanner;
use crate::play::running::{RunnerAdvancement, RunnerConfig};
use crate::play::throws::{ThrowContext, ThrowDecisionEngine};
use crate::play::types::{
    Base, BaseCoverAssignment, BaseJudgement, CatchPlan, DefenseSituation, Fielder, Judgements,
    RunnerAction, RunnerEta, RunnerSlot, ThrowStep,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayKind {
    Miss,
    Foul,
    HomeRun,
    /// Caught in the air; the batter is out
    FlyOut,
    InPlay,
    /// No defense could be planned; scored as a single
    NoDefensePlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayOutcome {
    pub kind: PlayKind,
    pub catch_plan: Option<CatchPlan>,
    pub coverage: Vec<BaseCoverAssignment>,
    pub throws: Vec<ThrowStep>,
    pub judgements: Judgements,
    pub runner_actions: Vec<RunnerAction>,
}

impl PlayOutcome {
    fn without_defense(kind: PlayKind, runner_actions: Vec<RunnerAction>) -> Self {
        Self {
            kind,
            catch_plan: None,
            coverage: Vec::new(),
            throws: Vec::new(),
            judgements: Judgements::new(),
            runner_actions,
        }
    }

    pub fn has_judgement(&self) -> bool {
        !self.judgements.is_empty()
    }

    pub fn is_home_run(&self) -> bool {
        self.kind == PlayKind::HomeRun
    }

    pub fn action_for(&self, slot: RunnerSlot) -> Option<&RunnerAction> {
        self.runner_actions.iter().find(|a| a.slot == slot)
    }

    pub fn runs_scored(&self) -> usize {
        self.runner_actions
            .iter()
            .filter(|a| a.to == Base::Home && !a.out)
            .count()
    }

    pub fn outs_recorded(&self) -> usize {
        self.runner_actions.iter().filter(|a| a.out).count()
    }
}

fn hold(slot: RunnerSlot) -> RunnerAction {
    let base = slot.starting_base();
    RunnerAction {
        slot,
        from: base,
        to: base,
        out: false,
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlayResolver {
    pub field: FieldGeometry,
    pub runners: RunnerConfig,
}

impl PlayResolver {
    pub fn new(field: FieldGeometry, runners: RunnerConfig) -> Self {
        Self { field, runners }
    }

    pub fn resolve(
        &self,
        batted: &BattedBallResult,
        situation: &DefenseSituation,
        fielders: &[Fielder],
    ) -> PlayOutcome {
        let runners = situation.active_runners();

        match batted.outcome {
            BattingBallType::Miss => {
                return PlayOutcome::without_defense(
                    PlayKind::Miss,
                    runners.into_iter().map(hold).collect(),
                )
            }
            BattingBallType::Foul => {
                return PlayOutcome::without_defense(
                    PlayKind::Foul,
                    runners.into_iter().map(hold).collect(),
                )
            }
            BattingBallType::HomeRun => {
                let actions = runners
                    .into_iter()
                    .map(|slot| RunnerAction {
                        slot,
                        from: slot.starting_base(),
                        to: Base::Home,
                        out: false,
                    })
                    .collect();
                debug!("home run, {} runs", situation.base_runners().len() + 1);
                return PlayOutcome::without_defense(PlayKind::HomeRun, actions);
            }
            BattingBallType::Hit | BattingBallType::GroundBall => {}
        }

        let Some(mut plan) = DefensePlanner::plan_catch(&batted.trajectory, fielders, &self.field)
        else {
            warn!(
                "no defense plan ({} fielders, {} samples), scoring a single",
                fielders.len(),
                batted.trajectory.len()
            );
            return PlayOutcome::without_defense(PlayKind::NoDefensePlan, default_single(situation, &self.runners));
        };

        let coverage = DefensePlanner::assign_coverage(fielders, plan.fielder, situation, &self.field);
        plan.throw_arrival =
            DefensePlanner::throw_arrival_times(&plan, &coverage, fielders, &self.field);

        if plan.is_fly {
            return self.fly_out(plan, coverage, situation, fielders);
        }

        let etas = RunnerAdvancement::solve(situation, &plan.throw_arrival, &self.runners);
        let throws = ThrowDecisionEngine::decide(&ThrowContext {
            plan: &plan,
            coverage: &coverage,
            runners: &etas,
            outs: situation.outs,
            fielders,
            field: &self.field,
        });
        let judgements = judge(&throws, &etas);

        let runner_actions = etas
            .iter()
            .map(|eta| RunnerAction {
                slot: eta.slot,
                from: eta.from,
                to: eta.target,
                out: judgements
                    .values()
                    .any(|j| j.runner == eta.slot && j.out),
            })
            .collect();

        PlayOutcome {
            kind: PlayKind::InPlay,
            catch_plan: Some(plan),
            coverage,
            throws,
            judgements,
            runner_actions,
        }
    }

    fn fly_out(
        &self,
        plan: CatchPlan,
        coverage: Vec<BaseCoverAssignment>,
        situation: &DefenseSituation,
        fielders: &[Fielder],
    ) -> PlayOutcome {
        let throws = ThrowDecisionEngine::decide(&ThrowContext {
            plan: &plan,
            coverage: &coverage,
            runners: &[],
            outs: situation.outs,
            fielders,
            field: &self.field,
        });

        let mut judgements = Judgements::new();
        judgements.insert(
            Base::First,
            BaseJudgement {
                base: Base::First,
                runner: RunnerSlot::Batter,
                target: Base::First,
                ball_time: plan.catch_time,
                runner_time: self.runners.run_time(RunnerSlot::Batter, Base::None, Base::First),
                out: true,
            },
        );

        let runner_actions = situation
            .active_runners()
            .into_iter()
            .map(|slot| match slot {
                RunnerSlot::Batter => RunnerAction {
                    slot,
                    from: Base::None,
                    to: Base::None,
                    out: true,
                },
                _ => hold(slot),
            })
            .collect();

        debug!("fly out at t={:.2}s", plan.catch_time);
        PlayOutcome {
            kind: PlayKind::FlyOut,
            catch_plan: Some(plan),
            coverage,
            throws,
            judgements,
            runner_actions,
        }
    }
}

/// Out/safe for every base a throw goes to with a runner advancing there.
fn judge(throws: &[ThrowStep], etas: &[RunnerEta]) -> Judgements {
    let mut judgements = Judgements::new();
    for step in throws {
        let Some(base) = step.plan.target_base() else {
            continue;
        };
        let lead = etas
            .iter()
            .filter(|e| e.target == base && e.is_advancing())
            .min_by(|a, b| a.eta.total_cmp(&b.eta));
        if let Some(runner) = lead {
            let out = runner.eta >= step.arrival_time;
            debug!(
                "{:?} at {:?}: runner {:.2}s vs ball {:.2}s -> {}",
                runner.slot,
                base,
                runner.eta,
                step.arrival_time,
                if out { "out" } else { "safe" }
            );
            judgements.insert(
                base,
                BaseJudgement {
                    base,
                    runner: runner.slot,
                    target: runner.target,
                    ball_time: step.arrival_time,
                    runner_time: runner.eta,
                    out,
                },
            );
        }
    }
    judgements
}

/// Batter to first; runners move up only when forced.
fn default_single(situation: &DefenseSituation, config: &RunnerConfig) -> Vec<RunnerAction> {
    let mut etas: Vec<RunnerEta> = situation
        .active_runners()
        .into_iter()
        .map(|slot| {
            let from = slot.starting_base();
            let target = if slot == RunnerSlot::Batter { Base::First } else { from };
            RunnerEta {
                slot,
                from,
                target,
                eta: config.run_time(slot, from, target),
            }
        })
        .collect();
    RunnerAdvancement::apply_forces(&mut etas, config);
    etas.into_iter()
        .map(|eta| RunnerAction {
            slot: eta.slot,
            from: eta.from,
            to: eta.target,
            out: false,
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
