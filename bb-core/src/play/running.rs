//! Runner advancement: how far each runner can go without being thrown out.
//!
//! A candidate base is taken when
//!
//! ```text
//! bases_to_advance · seconds_per_base + safety_margin < throw_arrival(base)
//! ```
//!
//! Candidates are tried furthest first, so the first one accepted is the
//! furthest safe base.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::play::types::{Base, BaseTimes, DefenseSituation, RunnerEta, RunnerSlot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Time to run one base (s)
    pub seconds_per_base: f64,
    /// Buffer a runner keeps over the throw (s)
    pub safety_margin: f64,
    /// Per-runner override of `seconds_per_base`
    pub overrides: BTreeMap<RunnerSlot, f64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            seconds_per_base: 3.9,
            safety_margin: 0.3,
            overrides: BTreeMap::new(),
        }
    }
}

impl RunnerConfig {
    pub fn seconds_per_base(&self, slot: RunnerSlot) -> f64 {
        self.overrides
            .get(&slot)
            .copied()
            .unwrap_or(self.seconds_per_base)
    }

    /// Time for `slot` to run from `from` to `to`.
    pub fn run_time(&self, slot: RunnerSlot, from: Base, to: Base) -> f64 {
        f64::from(from.bases_to(to)) * self.seconds_per_base(slot)
    }
}

pub struct RunnerAdvancement;

impl RunnerAdvancement {
    fn beats_throw(bases: u8, seconds_per_base: f64, margin: f64, throw_time: f64) -> bool {
        f64::from(bases) * seconds_per_base + margin < throw_time
    }

    /// Furthest safe base for a runner standing on `current`, or `current`.
    pub fn target_for_runner(
        current: Base,
        throw_times: &BaseTimes,
        seconds_per_base: f64,
        margin: f64,
    ) -> Base {
        [Base::Home, Base::Third, Base::Second, Base::First]
            .into_iter()
            .filter(|&candidate| candidate > current)
            .find(|&candidate| {
                Self::beats_throw(
                    current.bases_to(candidate),
                    seconds_per_base,
                    margin,
                    throw_times.get(candidate),
                )
            })
            .unwrap_or(current)
    }

    /// Furthest safe base for the batter; first base when nothing is safe.
    pub fn target_for_batter(throw_times: &BaseTimes, seconds_per_base: f64, margin: f64) -> Base {
        [Base::Home, Base::Third, Base::Second, Base::First]
            .into_iter()
            .find(|&candidate| {
                Self::beats_throw(
                    Base::None.bases_to(candidate),
                    seconds_per_base,
                    margin,
                    throw_times.get(candidate),
                )
            })
            .unwrap_or(Base::First)
    }

    /// Target and arrival time for the batter and every runner on base.
    ///
    /// Each runner first picks its own furthest safe base; runners are then
    /// pushed ahead of whoever trails them, so no two finish on one base.
    pub fn solve(
        situation: &DefenseSituation,
        throw_times: &BaseTimes,
        config: &RunnerConfig,
    ) -> Vec<RunnerEta> {
        let mut etas: Vec<RunnerEta> = situation
            .active_runners()
            .into_iter()
            .map(|slot| {
                let from = slot.starting_base();
                let spb = config.seconds_per_base(slot);
                let target = match slot {
                    RunnerSlot::Batter => {
                        Self::target_for_batter(throw_times, spb, config.safety_margin)
                    }
                    _ => Self::target_for_runner(from, throw_times, spb, config.safety_margin),
                };
                let eta = config.run_time(slot, from, target);
                debug!("runner {:?}: {:?} -> {:?} in {:.2}s", slot, from, target, eta);
                RunnerEta {
                    slot,
                    from,
                    target,
                    eta,
                }
            })
            .collect();
        Self::apply_forces(&mut etas, config);
        etas
    }

    /// Raise each runner to at least the base after the trailing runner's
    /// target. `etas` must be ordered batter first, lead runner last.
    pub fn apply_forces(etas: &mut [RunnerEta], config: &RunnerConfig) {
        let mut trailing: Option<Base> = None;
        for runner in etas.iter_mut() {
            if let Some(behind) = trailing {
                let needed = behind.next();
                if runner.target < needed {
                    debug!(
                        "runner {:?} forced: {:?} -> {:?}",
                        runner.slot, runner.target, needed
                    );
                    runner.target = needed;
                    runner.eta = config.run_time(runner.slot, runner.from, needed);
                }
            }
            trailing = Some(runner.target);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
