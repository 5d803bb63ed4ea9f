//! Workflow Module
//!
//! Recorded session traces and their offline replay through the engine.

pub mod trace;

pub use trace::{ReplayReport, SessionTrace, TraceEvent, TraceMetadata};
