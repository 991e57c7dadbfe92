//! Ground and boundary interaction for batted and pitched balls.
//!
//! This module handles:
//! - **Detection**: finding where a step segment crosses the target plane,
//!   the ground, or an obstacle (swept segment, never point sampling)
//! - **Resolution**: post-contact velocity for bounces, rolls and rebounds
//!
//! ```text
//! step start           step end
//!    ●──────────────────●
//!         \      ↓
//!          \   ground
//! ══════════╳═══════════
//!           └─ contact point (interpolated)
//! ```
//!
//! Interpolating along the step keeps fast balls from tunnelling through a
//! surface when `dt` is large.

pub mod detection;
pub mod resolution;

pub use detection::*;
pub use resolution::*;
