//! Warp Trigger
//!
//! Decides from the recent cursor trajectory whether the user is heading for
//! the current fixation, and where a warp should land.
//!
//! The gates run in a fixed order and the first failing one ends evaluation:
//!
//! 1. a fixation must be known
//! 2. the cursor must be outside the home radius around the fixation
//! 3. the cursor must have travelled at least `distance_px` across the window
//! 4. both the whole-window heading (oldest -> newest) and the latest step
//!    (second newest -> newest) must point at the fixation within `angle_deg`
//! 5. the landing point, `travel` pixels out from the fixation toward the
//!    cursor, must not be farther from the fixation than the cursor already is
//!
//! Evaluation is pure: the caller consumes the fixation and resets the window
//! after acting on a warp.

use crate::capture::trajectory_window::TrajectoryWindow;
use crate::capture::types::Point;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Gate thresholds, fixed for a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WarpThresholds {
    angle_deg: f64,
    distance_px: f64,
    home_radius_px: f64,
}

impl WarpThresholds {
    /// Validate and build thresholds
    ///
    /// Out-of-range values are rejected rather than clamped.
    pub fn new(angle_deg: f64, distance_px: f64, home_radius_px: f64) -> crate::Result<Self> {
        if !angle_deg.is_finite() || !(0.0..=180.0).contains(&angle_deg) {
            return Err(crate::Error::Config(format!(
                "angle_deg must be in [0, 180], got {}",
                angle_deg
            )));
        }
        if !distance_px.is_finite() || distance_px < 0.0 {
            return Err(crate::Error::Config(format!(
                "distance_px must be >= 0, got {}",
                distance_px
            )));
        }
        if !home_radius_px.is_finite() || home_radius_px < 0.0 {
            return Err(crate::Error::Config(format!(
                "home_radius_px must be >= 0, got {}",
                home_radius_px
            )));
        }
        Ok(Self {
            angle_deg,
            distance_px,
            home_radius_px,
        })
    }

    pub fn angle_deg(&self) -> f64 {
        self.angle_deg
    }

    pub fn distance_px(&self) -> f64 {
        self.distance_px
    }

    pub fn home_radius_px(&self) -> f64 {
        self.home_radius_px
    }
}

impl Default for WarpThresholds {
    fn default() -> Self {
        Self {
            angle_deg: 10.0,
            distance_px: 50.0,
            home_radius_px: 20.0,
        }
    }
}

/// Why no warp was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoOpReason {
    /// No fixation is known
    NoFixation,
    /// Cursor already inside the home radius
    WithinHomeRadius,
    /// Not enough movement across the window
    InsufficientTravel,
    /// Heading does not point at the fixation
    OffCourse,
    /// Landing point would be farther from the fixation than the cursor
    WouldOvershoot,
}

/// Landing point of a warp
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WarpTarget {
    /// Exact landing point
    pub x: f64,
    pub y: f64,
    /// Distance from the fixation to the landing point
    pub set_radius: f64,
    /// Heading error over the whole window (degrees)
    pub angle_first: f64,
    /// Heading error of the latest step (degrees)
    pub angle_second: f64,
}

impl WarpTarget {
    /// Landing point rounded to the nearest pixel
    pub fn to_point(&self) -> Point {
        Point::new(self.x.round() as i32, self.y.round() as i32)
    }
}

/// Outcome of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Decision {
    NoOp(NoOpReason),
    Warp(WarpTarget),
}

impl Decision {
    pub fn is_warp(&self) -> bool {
        matches!(self, Decision::Warp(_))
    }

    pub fn target(&self) -> Option<&WarpTarget> {
        match self {
            Decision::Warp(target) => Some(target),
            Decision::NoOp(_) => None,
        }
    }
}

/// Angle in degrees between the rays `start -> end` and `start -> fixation`
///
/// This is the absolute difference of the two `atan2` headings with no
/// wraparound into `[0, 180]`: rays on either side of the negative x axis
/// can report up to 360 degrees and fail any threshold.
pub fn heading_error_deg(start: Point, end: Point, fixation: Point) -> f64 {
    let trace_angle = (f64::from(start.y) - f64::from(end.y))
        .atan2(f64::from(start.x) - f64::from(end.x));
    let gaze_angle = (f64::from(start.y) - f64::from(fixation.y))
        .atan2(f64::from(start.x) - f64::from(fixation.x));
    ((gaze_angle - trace_angle) * 180.0 / std::f64::consts::PI).abs()
}

/// Point `radius` pixels from `fixation` along the ray toward `cursor`
pub fn landing_point(fixation: Point, cursor: Point, radius: f64) -> (f64, f64) {
    let phi = (f64::from(cursor.y) - f64::from(fixation.y))
        .atan2(f64::from(cursor.x) - f64::from(fixation.x));
    (
        f64::from(fixation.x) + radius * phi.cos(),
        f64::from(fixation.y) + radius * phi.sin(),
    )
}

/// Evaluate the trajectory against the fixation
pub fn evaluate(
    window: &TrajectoryWindow,
    fixation: Option<Point>,
    thresholds: &WarpThresholds,
) -> Decision {
    let fixation = match fixation {
        Some(f) => f,
        None => return Decision::NoOp(NoOpReason::NoFixation),
    };

    let newest = window.newest().position;
    let oldest = window.oldest().position;

    let distance_to_fix = newest.distance(&fixation);
    if distance_to_fix < thresholds.home_radius_px {
        return Decision::NoOp(NoOpReason::WithinHomeRadius);
    }

    let travel = window.travel();
    if travel < thresholds.distance_px {
        return Decision::NoOp(NoOpReason::InsufficientTravel);
    }

    let angle_first = heading_error_deg(oldest, newest, fixation);
    if angle_first > thresholds.angle_deg {
        trace!(angle_first, "Window heading off course");
        return Decision::NoOp(NoOpReason::OffCourse);
    }
    let angle_second = heading_error_deg(window.second_newest().position, newest, fixation);
    if angle_second > thresholds.angle_deg {
        trace!(angle_second, "Latest step off course");
        return Decision::NoOp(NoOpReason::OffCourse);
    }

    let set_radius = travel;
    let (x, y) = landing_point(fixation, newest, set_radius);

    if set_radius > distance_to_fix {
        return Decision::NoOp(NoOpReason::WouldOvershoot);
    }

    Decision::Warp(WarpTarget {
        x,
        y,
        set_radius,
        angle_first,
        angle_second,
    })
}
