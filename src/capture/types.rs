//! Core Input Types
//!
//! Pixel points, timestamped cursor samples and pixel offsets shared by the
//! trigger, the saliency search and the engine.

use serde::{Deserialize, Serialize};

/// Integer screen position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Screen origin
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    /// Create a point
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Shift this point by an offset
    pub fn offset_by(&self, offset: Offset) -> Point {
        Point::new(
            self.x.saturating_add(offset.dx),
            self.y.saturating_add(offset.dy),
        )
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Relative displacement in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    /// The identity offset: refine to the original point unchanged
    pub const ZERO: Offset = Offset { dx: 0, dy: 0 };

    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// A single cursor position observation
///
/// Immutable once created; owned by the trajectory window while resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Monotonic timestamp in milliseconds
    pub timestamp_ms: u64,
    /// Cursor position
    pub position: Point,
}

impl Sample {
    pub const fn new(position: Point, timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            position,
        }
    }

    /// Distance between the positions of two samples
    pub fn distance(&self, other: &Sample) -> f64 {
        self.position.distance(&other.position)
    }
}
