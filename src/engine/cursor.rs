//! Cursor Placement Seam
//!
//! The engine emits a [`CursorMoveCommand`] per warp. Moving the real
//! pointer is platform code outside this crate; it plugs in as a
//! [`CursorSink`].

use crate::capture::types::{Offset, Point};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Instruction to place the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CursorMoveCommand {
    /// Final pointer position
    pub target: Point,
    /// Landing point before saliency refinement
    pub unrefined: Point,
    /// Refinement applied (`target - unrefined`)
    pub offset: Offset,
    /// Fixation that triggered the warp
    pub fixation: Point,
    /// Timestamp of the sample that triggered the warp
    pub timestamp_ms: u64,
}

impl CursorMoveCommand {
    pub fn was_refined(&self) -> bool {
        !self.offset.is_zero()
    }
}

/// Receives cursor moves
///
/// Errors are logged by the engine and not retried.
pub trait CursorSink: Send {
    fn move_cursor(&mut self, command: &CursorMoveCommand) -> crate::Result<()>;
}

/// Sink that keeps every command it receives
///
/// Clones share the same log, so a test or replay can hand one clone to the
/// engine and read moves back through another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    moves: Arc<Mutex<Vec<CursorMoveCommand>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the moves received so far
    pub fn moves(&self) -> Vec<CursorMoveCommand> {
        self.moves.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.moves.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.lock().is_empty()
    }

    /// Remove and return all recorded moves
    pub fn drain(&self) -> Vec<CursorMoveCommand> {
        std::mem::take(&mut *self.moves.lock())
    }
}

impl CursorSink for RecordingSink {
    fn move_cursor(&mut self, command: &CursorMoveCommand) -> crate::Result<()> {
        self.moves.lock().push(*command);
        Ok(())
    }
}
