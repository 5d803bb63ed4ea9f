//! # Gaze Warp
//!
//! Gaze-assisted pointer warping. When the cursor is already travelling
//! toward the point the user is looking at, it is jumped most of the way
//! there and optionally nudged onto the nearest visually distinctive pixel.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gaze_warp::{EngineSettings, Point, RecordingSink, WarpEngine};
//!
//! let sink = RecordingSink::new();
//! let engine = WarpEngine::new(EngineSettings::default(), sink.clone())
//!     .expect("valid settings");
//!
//! engine.on_fixation(Point::new(800, 400));
//! for (i, x) in (0..=100).step_by(10).enumerate() {
//!     engine.on_sample(Point::new(x, 400), 1000 + i as u64 * 20);
//! }
//!
//! for command in sink.moves() {
//!     println!("warp to {:?}", command.target);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`capture`]: cursor samples, trajectory window, input queue, screen seam
//! - [`analysis`]: the warp trigger
//! - [`saliency`]: vertical gradient and square-spiral search
//! - [`engine`]: composition root, worker thread, cursor sink
//! - [`workflow`]: recorded session traces and replay
//! - [`app`]: CLI and configuration management
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │ Pointer/Eye │───▶│ Input Queue │───▶│  Trajectory │───▶│    Warp     │
//! │   Sources   │    │ (lock-free) │    │   Window    │    │   Trigger   │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//!                                                                 │
//!                                                                 ▼
//!                    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!                    │ Cursor Sink │◀───│   Spiral    │◀───│   Screen    │
//!                    │             │    │   Search    │    │   Capture   │
//!                    └─────────────┘    └─────────────┘    └─────────────┘
//! ```

pub mod capture;
pub mod analysis;
pub mod saliency;
pub mod engine;
pub mod workflow;
pub mod app;

// Re-export commonly used types
pub use analysis::warp_trigger::{Decision, NoOpReason, WarpTarget, WarpThresholds};
pub use capture::types::{Offset, Point, Sample};
pub use capture::ring_buffer::{InputEvent, InputQueue};
pub use capture::trajectory_window::TrajectoryWindow;
pub use engine::{CursorMoveCommand, CursorSink, EngineSettings, RecordingSink, WarpEngine};
pub use saliency::{SaliencyDetector, VerticalGradientDetector};
pub use workflow::{SessionTrace, TraceEvent};

/// Result type alias for the warp kernel
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the warp kernel
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Screen capture error: {0}")]
    Capture(String),

    #[error("Saliency error: {0}")]
    Saliency(String),

    #[error("Cursor error: {0}")]
    Cursor(String),

    #[error("Replay error: {0}")]
    Replay(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
