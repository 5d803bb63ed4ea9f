//! Screen Capture Seam
//!
//! The engine asks a [`ScreenCapture`] for a square region around a warp
//! target before saliency refinement. Real screen grabbing lives outside this
//! crate; [`FrameCapture`] serves regions out of an already captured frame,
//! which is what offline replay and tests use.

use super::types::Point;
use image::{DynamicImage, GenericImageView};
use tracing::debug;

/// Square screen region, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    /// Top-left corner
    pub origin: Point,
    /// Side length
    pub size: u32,
}

impl CaptureRegion {
    /// Region of side `size` whose center pixel is `center`
    ///
    /// The center pixel sits at `(size / 2, size / 2)` inside the region,
    /// which is where the saliency search starts.
    pub fn centered_on(center: Point, size: u32) -> Self {
        let half = (size / 2) as i32;
        Self {
            origin: Point::new(center.x - half, center.y - half),
            size,
        }
    }

    /// Screen position of the region's center pixel
    pub fn center(&self) -> Point {
        let half = (self.size / 2) as i32;
        Point::new(self.origin.x + half, self.origin.y + half)
    }
}

/// Source of screen pixels
///
/// Implementations may block. Failure is not fatal: the engine skips
/// refinement and warps to the unrefined target.
pub trait ScreenCapture: Send + Sync {
    fn capture(&self, region: &CaptureRegion) -> crate::Result<DynamicImage>;
}

/// Captures regions from a fixed frame
pub struct FrameCapture {
    frame: DynamicImage,
}

impl FrameCapture {
    pub fn new(frame: DynamicImage) -> Self {
        Self { frame }
    }

    /// Load the frame from an image file
    pub fn open(path: &std::path::Path) -> crate::Result<Self> {
        let frame = image::open(path)?;
        debug!(
            path = %path.display(),
            width = frame.width(),
            height = frame.height(),
            "Loaded capture frame"
        );
        Ok(Self::new(frame))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }
}

impl ScreenCapture for FrameCapture {
    fn capture(&self, region: &CaptureRegion) -> crate::Result<DynamicImage> {
        let (width, height) = self.frame.dimensions();
        let x = region.origin.x;
        let y = region.origin.y;
        let size = i64::from(region.size);

        if region.size == 0
            || x < 0
            || y < 0
            || i64::from(x) + size > i64::from(width)
            || i64::from(y) + size > i64::from(height)
        {
            return Err(crate::Error::Capture(format!(
                "region {}x{} at ({}, {}) is outside the {}x{} frame",
                region.size, region.size, x, y, width, height
            )));
        }

        Ok(self
            .frame
            .crop_imm(x as u32, y as u32, region.size, region.size))
    }
}
