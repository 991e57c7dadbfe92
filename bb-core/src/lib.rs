//! # BB Core
//!
//! A baseball play-simulation engine: ball flight, pitching, batting and the
//! defensive decisions that turn a batted ball into outs and runs.
//!
//! ## Architecture
//!
//! - `types`: Core data structures (Vec3, ball state, spin, ball properties)
//! - `field`: Field layout, surfaces and play area
//! - `integrator`: Numerical integration (semi-implicit Euler)
//! - `forces`: Physical forces (gravity, drag, Magnus effect)
//! - `collision`: Ground, plane and obstacle contact; bounce and roll
//! - `trajectory`: Fixed-step flight simulation
//! - `pitch`: Release velocity solver (shooting method)
//! - `batting`: Bat-ball impact model and batted-ball classification
//! - `play`: Catch plans, base coverage, throws, runners, judgements
//! - `config`: YAML-based configuration loader
//! - `error`: Error types
//!
//! ## Data flow per play
//!
//! ```text
//! SwingInput ─▶ batting ─▶ trajectory ─▶ play::defense ─▶ play::throws
//!                                              │               │
//!                                              └▶ play::running ┘
//!                                                      │
//!                                          play::resolver ─▶ PlayOutcome
//! ```

pub mod batting;
pub mod collision;
pub mod config;
pub mod error;
pub mod field;
pub mod forces;
pub mod integrator;
pub mod pitch;
pub mod play;
pub mod trajectory;
pub mod types;

pub use batting::{BattedBallResult, BattingBallType, BattingCalculator, ImpactConfig, SwingInput};
pub use config::{ConfigLoader, EngineProfile};
pub use error::{ConfigError, SimulationError};
pub use field::FieldGeometry;
pub use pitch::{PitchRequest, PitchSolution, PitchSolver, SolverConfig};
pub use trajectory::{Trajectory, TrajectoryConfig, TrajectorySimulator};
pub use types::{BallProperties, SpinState, Vec3};
