//! Defensive play decisions.
//!
//! - `types`: bases, fielders, plans and judgements
//! - `defense`: catch plan, base coverage, throw arrival times
//! - `throws`: which base to throw to
//! - `running`: how far each runner can go
//! - `resolver`: one play end to end
//! - `controller`: play epochs for asynchronous runner completion

pub mod controller;
pub mod defense;
pub mod resolver;
pub mod running;
pub mod throws;
pub mod types;

pub use controller::{PlayController, PlayStart, RunnerTicket};
pub use defense::DefensePlanner;
pub use resolver::{PlayKind, PlayOutcome, PlayResolver};
pub use running::{RunnerAdvancement, RunnerConfig};
pub use throws::{ThrowContext, ThrowDecisionEngine};
pub use types::*;
