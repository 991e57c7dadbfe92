//! Play epoch bookkeeping for asynchronous runner completions.
//!
//! Runner movement is carried out elsewhere (animation, timers, threads).
//! Every task gets a [`RunnerTicket`] stamped with the play epoch active when
//! it started. A new play, a reset or a half-inning change bumps the epoch,
//! so completions arriving from a superseded play are ignored:
//!
//! ```text
//! epoch 7: begin_play ─▶ tickets {7, Batter}, {7, OnFirst}
//! epoch 8: begin_play ─▶ tickets {8, Batter}
//!          complete {7, OnFirst}  → ignored (stale)
//!          complete {8, Batter}   → running = 0 → RunningSummary (once)
//! ```
//!
//! The controller is owned by a single driver; tasks report back through
//! whatever channel the driver reads from.

use std::collections::BTreeMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::play::resolver::PlayOutcome;
use crate::play::running::RunnerConfig;
use crate::play::types::{Base, RunnerResult, RunnerSlot, RunnerState, RunningSummary};

/// Handle for one runner task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunnerTicket {
    pub epoch: u64,
    pub slot: RunnerSlot,
    /// Running time the task should take (s)
    pub duration: f64,
}

/// Tickets for a freshly started play.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayStart {
    pub epoch: u64,
    pub tickets: Vec<RunnerTicket>,
    /// Present when nobody had to run
    pub summary: Option<RunningSummary>,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    state: RunnerState,
    start: Base,
    out: bool,
}

#[derive(Debug, Default)]
pub struct PlayController {
    epoch: u64,
    runners: BTreeMap<RunnerSlot, Entry>,
    running: usize,
    summarized: bool,
}

impl PlayController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn running(&self) -> usize {
        self.running
    }

    pub fn runner(&self, slot: RunnerSlot) -> Option<&RunnerState> {
        self.runners.get(&slot).map(|e| &e.state)
    }

    /// Start executing a resolved play. Supersedes any play in progress.
    pub fn begin_play(&mut self, outcome: &PlayOutcome, config: &RunnerConfig) -> PlayStart {
        self.advance_epoch();

        let mut tickets = Vec::new();
        for action in &outcome.runner_actions {
            let mut state = RunnerState::idle(action.slot, action.from);
            if action.to > action.from {
                let time = config.run_time(action.slot, action.from, action.to);
                state.start(action.to, time);
                tickets.push(RunnerTicket {
                    epoch: self.epoch,
                    slot: action.slot,
                    duration: time,
                });
            }
            self.runners.insert(
                action.slot,
                Entry {
                    state,
                    start: action.from,
                    out: action.out,
                },
            );
        }
        self.running = tickets.len();
        debug!("play epoch {}: {} runners moving", self.epoch, self.running);

        let summary = if self.running == 0 {
            self.summarize()
        } else {
            None
        };
        PlayStart {
            epoch: self.epoch,
            tickets,
            summary,
        }
    }

    /// Record a finished runner task. Returns the summary exactly once, when
    /// the last runner of the current play stops.
    pub fn complete_runner(&mut self, ticket: RunnerTicket) -> Option<RunningSummary> {
        if ticket.epoch != self.epoch {
            trace!(
                "ignoring stale completion for {:?} (epoch {} != {})",
                ticket.slot,
                ticket.epoch,
                self.epoch
            );
            return None;
        }
        let entry = self.runners.get_mut(&ticket.slot)?;
        if !entry.state.running {
            return None;
        }
        entry.state.arrive();
        self.running = self.running.saturating_sub(1);

        if self.running == 0 {
            self.summarize()
        } else {
            None
        }
    }

    /// Advance every running runner's clock; returns tickets for runners
    /// that arrived during this tick.
    pub fn tick(&mut self, dt: f64) -> Vec<RunnerTicket> {
        let epoch = self.epoch;
        self.runners
            .values_mut()
            .filter_map(|entry| {
                let total = entry.state.total_time;
                entry.state.tick(dt).then_some(RunnerTicket {
                    epoch,
                    slot: entry.state.slot,
                    duration: total,
                })
            })
            .collect()
    }

    /// Tick and complete in one call, for drivers without their own
    /// runner tasks. Returns the summary on the tick the last runner stops.
    pub fn advance(&mut self, dt: f64) -> Option<RunningSummary> {
        let mut finished = None;
        for ticket in self.tick(dt) {
            if let Some(summary) = self.complete_runner(ticket) {
                finished = Some(summary);
            }
        }
        finished
    }

    /// Abandon the current play (e.g. a foul ball's run).
    pub fn reset(&mut self) {
        self.advance_epoch();
    }

    pub fn new_half_inning(&mut self) {
        self.advance_epoch();
        debug!("new half-inning, epoch {}", self.epoch);
    }

    fn advance_epoch(&mut self) {
        self.epoch += 1;
        self.runners.clear();
        self.running = 0;
        self.summarized = false;
    }

    fn summarize(&mut self) -> Option<RunningSummary> {
        if self.summarized {
            return None;
        }
        self.summarized = true;

        let runners = self
            .runners
            .values()
            .map(|entry| {
                let end = entry.state.current;
                RunnerResult {
                    slot: entry.state.slot,
                    start: entry.start,
                    end,
                    bases_advanced: entry.start.bases_to(end),
                    reached_home: end == Base::Home,
                    out: entry.out,
                }
            })
            .collect();
        let summary = RunningSummary {
            epoch: self.epoch,
            runners,
        };
        debug!(
            "play epoch {} finished: {} runs, {} outs",
            self.epoch,
            summary.runs_scored(),
            summary.outs_recorded()
        );
        Some(summary)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::play::resolver::PlayKind;
    use crate::play::types::{Judgements, RunnerAction};
    use std::sync::mpsc;
    use std::thread;

    fn outcome(actions: Vec<RunnerAction>) -> PlayOutcome {
        PlayOutcome {
            kind: PlayKind::InPlay,
            catch_plan: None,
            coverage: Vec::new(),
            throws: Vec::new(),
            judgements: Judgements::new(),
            runner_actions: actions,
        }
    }

    fn action(slot: RunnerSlot, to: Base) -> RunnerAction {
        RunnerAction {
            slot,
            from: slot.starting_base(),
            to,
            out: false,
        }
    }

    #[test]
    fn test_summary_fires_once_when_last_runner_stops() {
        let mut controller = PlayController::new();
        let play = outcome(vec![
            action(RunnerSlot::Batter, Base::First),
            action(RunnerSlot::OnSecond, Base::Home),
        ]);

        let start = controller.begin_play(&play, &RunnerConfig::default());
        assert_eq!(start.tickets.len(), 2);
        assert!(start.summary.is_none());

        assert!(controller.complete_runner(start.tickets[0]).is_none());
        let summary = controller
            .complete_runner(start.tickets[1])
            .expect("last runner finishes the play");
        assert_eq!(summary.runs_scored(), 1);
        assert_eq!(summary.runners.len(), 2);

        // Duplicate completions never produce a second summary
        assert!(controller.complete_runner(start.tickets[1]).is_none());
        assert!(controller.complete_runner(start.tickets[0]).is_none());
    }

    #[test]
    fn test_stale_completions_are_ignored() {
        let mut controller = PlayController::new();
        let config = RunnerConfig::default();

        let foul_run = controller.begin_play(
            &outcome(vec![action(RunnerSlot::Batter, Base::First)]),
            &config,
        );
        let play = controller.begin_play(
            &outcome(vec![
                action(RunnerSlot::Batter, Base::Second),
                action(RunnerSlot::OnFirst, Base::Third),
            ]),
            &config,
        );
        assert!(play.epoch > foul_run.epoch);

        assert!(controller.complete_runner(foul_run.tickets[0]).is_none());
        assert_eq!(controller.running(), 2, "stale ticket must not count");

        assert!(controller.complete_runner(play.tickets[0]).is_none());
        let summary = controller.complete_runner(play.tickets[1]).expect("summary");
        assert_eq!(summary.epoch, play.epoch);
        let batter = summary
            .runners
            .iter()
            .find(|r| r.slot == RunnerSlot::Batter)
            .expect("batter");
        assert_eq!(batter.end, Base::Second);
        assert_eq!(batter.bases_advanced, 2);
    }

    #[test]
    fn test_half_inning_invalidates_running_play() {
        let mut controller = PlayController::new();
        let start = controller.begin_play(
            &outcome(vec![action(RunnerSlot::Batter, Base::First)]),
            &RunnerConfig::default(),
        );

        controller.new_half_inning();

        assert!(controller.complete_runner(start.tickets[0]).is_none());
        assert_eq!(controller.running(), 0);
    }

    #[test]
    fn test_nobody_running_summarizes_immediately() {
        let mut controller = PlayController::new();
        let start = controller.begin_play(
            &outcome(vec![action(RunnerSlot::Batter, Base::None)]),
            &RunnerConfig::default(),
        );
        assert!(start.tickets.is_empty());
        let summary = start.summary.expect("immediate summary");
        assert_eq!(summary.runners[0].bases_advanced, 0);
    }

    #[test]
    fn test_immediate_summary_is_not_repeated() {
        let mut controller = PlayController::new();
        let start = controller.begin_play(
            &outcome(vec![
                action(RunnerSlot::Batter, Base::None),
                action(RunnerSlot::OnSecond, Base::Second),
            ]),
            &RunnerConfig::default(),
        );

        let summary = start.summary.expect("summary at start");
        assert_eq!(summary.epoch, start.epoch);
        assert_eq!(summary.runners.len(), 2);
        for _ in 0..10 {
            assert!(controller.advance(0.5).is_none());
        }
    }

    #[test]
    fn test_advance_reports_summary_once() {
        let mut controller = PlayController::new();
        let config = RunnerConfig {
            seconds_per_base: 1.0,
            ..RunnerConfig::default()
        };
        let start = controller.begin_play(
            &outcome(vec![action(RunnerSlot::Batter, Base::Second)]),
            &config,
        );
        assert!(start.summary.is_none());

        let summaries: Vec<_> = (0..40).filter_map(|_| controller.advance(0.1)).collect();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].runners[0].end, Base::Second);
    }

    #[test]
    fn test_tick_drives_runners_to_completion() {
        let mut controller = PlayController::new();
        let config = RunnerConfig {
            seconds_per_base: 1.0,
            ..RunnerConfig::default()
        };
        controller.begin_play(
            &outcome(vec![
                action(RunnerSlot::Batter, Base::First),
                action(RunnerSlot::OnFirst, Base::Third),
            ]),
            &config,
        );

        let mut summary = None;
        for _ in 0..30 {
            for ticket in controller.tick(0.1) {
                if let Some(s) = controller.complete_runner(ticket) {
                    assert!(summary.is_none(), "summary emitted twice");
                    summary = Some(s);
                }
            }
        }
        let summary = summary.expect("play finished");
        let runner = controller.runner(RunnerSlot::OnFirst).expect("runner");
        assert_eq!(runner.current, Base::Third);
        assert_eq!(summary.outs_recorded(), 0);
    }

    #[test]
    fn test_threaded_runners_race_to_completion() {
        let mut controller = PlayController::new();
        let config = RunnerConfig::default();
        let (tx, rx) = mpsc::channel();

        let stale = controller.begin_play(
            &outcome(vec![action(RunnerSlot::Batter, Base::First)]),
            &config,
        );
        let play = controller.begin_play(
            &outcome(vec![
                action(RunnerSlot::Batter, Base::First),
                action(RunnerSlot::OnFirst, Base::Second),
                action(RunnerSlot::OnThird, Base::Home),
            ]),
            &config,
        );

        let handles: Vec<_> = stale
            .tickets
            .iter()
            .chain(play.tickets.iter())
            .copied()
            .map(|ticket| {
                let tx = tx.clone();
                thread::spawn(move || tx.send(ticket).expect("controller listening"))
            })
            .collect();
        drop(tx);
        for handle in handles {
            handle.join().expect("runner task");
        }

        let summaries: Vec<_> = rx
            .iter()
            .filter_map(|ticket| controller.complete_runner(ticket))
            .collect();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].epoch, play.epoch);
        assert_eq!(summaries[0].runs_scored(), 1);
    }
}
