//! Input capture module
//!
//! Cursor samples, the rolling trajectory window, the lock-free input queue
//! feeding the engine worker, and the screen-capture seam used by saliency
//! refinement.

pub mod types;
pub mod trajectory_window;
pub mod ring_buffer;
pub mod screen;

pub use types::*;
pub use trajectory_window::TrajectoryWindow;
pub use ring_buffer::{InputConsumer, InputEvent, InputProducer, InputQueue};
pub use screen::{CaptureRegion, FrameCapture, ScreenCapture};
