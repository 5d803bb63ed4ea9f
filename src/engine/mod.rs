//! Warp engine
//!
//! Composition root tying the trajectory window, trigger and saliency
//! refinement together, plus the worker thread that feeds it from the input
//! queue and the cursor sink it emits to.

pub mod cursor;
pub mod warp_engine;
pub mod worker;

pub use cursor::{CursorMoveCommand, CursorSink, RecordingSink};
pub use warp_engine::{
    EngineSettings, EngineStats, EngineStatsSnapshot, SaliencyRefiner, WarpEngine,
    DEFAULT_CAPTURE_SIZE,
};
pub use worker::{EngineWorker, WorkerReport};
