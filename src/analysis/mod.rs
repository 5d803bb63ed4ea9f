//! Trajectory analysis
//!
//! Turns the recent cursor trajectory and the current fixation into a warp
//! decision.

pub mod warp_trigger;

pub use warp_trigger::{evaluate, Decision, NoOpReason, WarpTarget, WarpThresholds};
