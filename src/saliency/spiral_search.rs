//! Square-Spiral Search
//!
//! Walks outward from the center of a gradient image in a square spiral and
//! reports the first cell with any contrast.
//!
//! The walk cycles `down -> left -> up -> right`. Legs start one cell long and
//! grow by one after each `left` leg and each `right` leg, giving the visiting
//! order
//!
//! ```text
//! (0,1) (-1,1) (-1,0) (-1,-1) (0,-1) (1,-1) (1,0) (1,1) (1,2) (0,2) ...
//! ```
//!
//! The center cell itself is never examined: every leg moves before it looks.
//! The walk is bounded to the capture radius. It stops once the leg length
//! reaches the side length or the offset reaches half the side on either
//! axis, and individual steps are cut short one cell before that half-side
//! boundary. A leg that is cut short still turns the walk.
//!
//! Results follow visiting order, not Euclidean distance: an earlier-visited
//! diagonal cell wins over a later-visited orthogonal neighbour.

use super::gradient::GradientImage;
use crate::capture::types::Offset;

/// Heading of the current leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Left,
    Up,
    Right,
}

impl Direction {
    fn turn(self) -> Self {
        match self {
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
        }
    }

    /// Legs grow after these directions complete
    fn grows_leg(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// Iterator over spiral offsets for a grid of a given side
#[derive(Debug, Clone)]
pub struct SpiralWalk {
    half: i32,
    side: i32,
    direction: Direction,
    leg_size: i32,
    /// Steps taken on the current leg
    leg_progress: i32,
    offset: Offset,
}

impl SpiralWalk {
    pub fn new(side: u32) -> Self {
        let side = i32::try_from(side).unwrap_or(i32::MAX);
        Self {
            half: side / 2,
            side,
            direction: Direction::Down,
            leg_size: 1,
            leg_progress: 0,
            offset: Offset::ZERO,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn leg_size(&self) -> i32 {
        self.leg_size
    }

    /// Outer bound: the walk is still inside the capture radius
    fn in_bounds(&self) -> bool {
        self.leg_size < self.side && self.offset.dx.abs() < self.half && self.offset.dy.abs() < self.half
    }

    /// Per-step bound for the current heading
    fn can_step(&self) -> bool {
        let limit = self.half - 1;
        match self.direction {
            Direction::Down => self.offset.dy < limit,
            Direction::Left => -self.offset.dx < limit,
            Direction::Up => -self.offset.dy < limit,
            Direction::Right => self.offset.dx < limit,
        }
    }

    fn finish_leg(&mut self) {
        if self.direction.grows_leg() {
            self.leg_size += 1;
        }
        self.direction = self.direction.turn();
        self.leg_progress = 0;
    }
}

impl Iterator for SpiralWalk {
    type Item = Offset;

    fn next(&mut self) -> Option<Offset> {
        loop {
            if self.leg_progress == 0 && !self.in_bounds() {
                return None;
            }

            if self.leg_progress < self.leg_size && self.can_step() {
                match self.direction {
                    Direction::Down => self.offset.dy += 1,
                    Direction::Left => self.offset.dx -= 1,
                    Direction::Up => self.offset.dy -= 1,
                    Direction::Right => self.offset.dx += 1,
                }
                self.leg_progress += 1;
                return Some(self.offset);
            }

            self.finish_leg();
        }
    }
}

/// Offset from the grid center to the first salient cell in spiral order
///
/// The search always starts at the grid center `(side / 2, side / 2)`; there
/// is no caller-chosen center. Captures are taken centered on the point being
/// refined (see [`CaptureRegion::centered_on`]), so that center is the point.
///
/// Returns [`Offset::ZERO`] when the walk finds nothing.
///
/// [`CaptureRegion::centered_on`]: crate::capture::screen::CaptureRegion::centered_on
pub fn search(gradient: &GradientImage) -> Offset {
    let center = i64::from(gradient.side() / 2);
    SpiralWalk::new(gradient.side())
        .find(|o| gradient.is_salient(center + i64::from(o.dx), center + i64::from(o.dy)))
        .unwrap_or(Offset::ZERO)
}
