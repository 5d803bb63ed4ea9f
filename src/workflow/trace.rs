//! Session Traces
//!
//! Serialization format for recorded pointer/gaze sessions, and offline
//! replay of a trace through a [`WarpEngine`].
//!
//! ```json
//! {
//!   "metadata": { "name": "reading", "format_version": "1.0", "created_at": "..." },
//!   "events": [
//!     { "kind": "fixation", "x": 300, "y": 0 },
//!     { "kind": "sample", "x": 0, "y": 0, "t": 1000 },
//!     { "kind": "clear_fixation" }
//!   ]
//! }
//! ```

use crate::capture::ring_buffer::InputEvent;
use crate::capture::types::Point;
use crate::engine::cursor::CursorMoveCommand;
use crate::engine::warp_engine::{EngineStatsSnapshot, WarpEngine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Current trace format version
pub const CURRENT_FORMAT_VERSION: &str = "1.0";

/// Trace metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceMetadata {
    pub name: String,
    /// Free-form note about how the trace was captured
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Version of the trace format
    pub format_version: String,
}

impl TraceMetadata {
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }
}

impl Default for TraceMetadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            created_at: Utc::now(),
            format_version: CURRENT_FORMAT_VERSION.to_string(),
        }
    }
}

/// One recorded input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEvent {
    /// Cursor position at `t` milliseconds
    Sample { x: i32, y: i32, t: u64 },
    Fixation { x: i32, y: i32 },
    ClearFixation,
}

impl From<TraceEvent> for InputEvent {
    fn from(event: TraceEvent) -> Self {
        match event {
            TraceEvent::Sample { x, y, t } => InputEvent::Sample {
                position: Point::new(x, y),
                timestamp_ms: t,
            },
            TraceEvent::Fixation { x, y } => InputEvent::Fixation(Point::new(x, y)),
            TraceEvent::ClearFixation => InputEvent::ClearFixation,
        }
    }
}

/// A recorded session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTrace {
    pub metadata: TraceMetadata,
    pub events: Vec<TraceEvent>,
}

/// Outcome of replaying a trace
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    pub samples: usize,
    pub fixations: usize,
    /// Fixations the engine refused because a warp was in flight
    pub fixations_dropped: usize,
    pub moves: Vec<CursorMoveCommand>,
    pub stats: EngineStatsSnapshot,
}

impl ReplayReport {
    pub fn warps(&self) -> usize {
        self.moves.len()
    }
}

impl SessionTrace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: TraceMetadata::new(name.into()),
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn push_sample(&mut self, x: i32, y: i32, t: u64) {
        self.push(TraceEvent::Sample { x, y, t });
    }

    pub fn push_fixation(&mut self, x: i32, y: i32) {
        self.push(TraceEvent::Fixation { x, y });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of cursor samples in the trace
    pub fn sample_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TraceEvent::Sample { .. }))
            .count()
    }

    /// Save trace to a file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load trace from a file.
    ///
    /// Traces written by another format version still load; missing
    /// metadata fields take their defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let trace: SessionTrace = serde_json::from_str(&content)?;
        if trace.metadata.format_version != CURRENT_FORMAT_VERSION {
            warn!(
                name = %trace.metadata.name,
                found = %trace.metadata.format_version,
                expected = CURRENT_FORMAT_VERSION,
                "Trace has different format version; some fields may use default values"
            );
        }
        debug!(name = %trace.metadata.name, events = trace.len(), "Loaded trace");
        Ok(trace)
    }

    /// Feed every event to `engine` in order on the calling thread
    pub fn replay(&self, engine: &WarpEngine) -> crate::Result<ReplayReport> {
        if self.is_empty() {
            return Err(crate::Error::Replay(format!(
                "trace '{}' has no events",
                self.metadata.name
            )));
        }

        let mut report = ReplayReport::default();
        for event in &self.events {
            match *event {
                TraceEvent::Sample { x, y, t } => {
                    report.samples += 1;
                    if let Some(command) = engine.on_sample(Point::new(x, y), t) {
                        report.moves.push(command);
                    }
                }
                TraceEvent::Fixation { x, y } => {
                    report.fixations += 1;
                    if !engine.on_fixation(Point::new(x, y)) {
                        report.fixations_dropped += 1;
                    }
                }
                TraceEvent::ClearFixation => engine.clear_fixation(),
            }
        }
        report.stats = engine.stats();

        info!(
            name = %self.metadata.name,
            samples = report.samples,
            warps = report.warps(),
            "Replay finished"
        );
        Ok(report)
    }
}

impl Default for SessionTrace {
    fn default() -> Self {
        Self::new("untitled")
    }
}
