//! Saliency refinement
//!
//! Nudges a warp target onto the nearest visually distinctive pixel:
//! - [`gradient`]: vertical luma-difference edge map
//! - [`spiral_search`]: square-spiral walk from the capture center
//!
//! Detectors are stateless and may be called from any thread.

pub mod gradient;
pub mod spiral_search;

pub use gradient::GradientImage;
pub use spiral_search::{search, SpiralWalk};

use crate::capture::types::Offset;
use image::DynamicImage;
use tracing::debug;

/// Finds a salient point in a captured region
///
/// The returned offset is relative to the region's center pixel
/// `(height / 2, height / 2)`.
pub trait SaliencyDetector: Send + Sync {
    /// Short name for logs and reports
    fn name(&self) -> &'static str;

    fn analyse(&self, image: &DynamicImage) -> crate::Result<Offset>;
}

/// Edge detector over the vertical gradient with spiral search
#[derive(Debug, Clone, Copy, Default)]
pub struct VerticalGradientDetector;

impl VerticalGradientDetector {
    pub fn new() -> Self {
        Self
    }
}

impl SaliencyDetector for VerticalGradientDetector {
    fn name(&self) -> &'static str {
        "vertical-gradient"
    }

    fn analyse(&self, image: &DynamicImage) -> crate::Result<Offset> {
        let gradient = GradientImage::derive(&image.to_luma8())?;
        let offset = search(&gradient);
        debug!(
            side = gradient.side(),
            dx = offset.dx,
            dy = offset.dy,
            "Saliency search finished"
        );
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage, Rgb};

    #[test]
    fn test_flat_capture_returns_identity() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([90])));
        let offset = VerticalGradientDetector::new().analyse(&img).unwrap();
        assert_eq!(offset, Offset::ZERO);
    }

    #[test]
    fn test_finds_edge_below_center() {
        // Light above row 19, dark from row 19: edge cells on row 18
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(32, 32, |_, y| {
            if y < 19 { Luma([240]) } else { Luma([20]) }
        }));
        let offset = VerticalGradientDetector::new().analyse(&img).unwrap();
        // Center is (16,16); the walk reaches row 18 first at (1,2), before (0,2)
        assert_eq!(offset, Offset::new(1, 2));
    }

    #[test]
    fn test_color_capture_uses_luma() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(16, 16, |_, y| {
            if y < 7 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
        }));
        let offset = VerticalGradientDetector::new().analyse(&img).unwrap();
        // Center (8,8); edge row 6 is two rows up
        assert_eq!(offset.dy, -2);
    }

    #[test]
    fn test_tall_capture_is_an_error() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(8, 16));
        assert!(VerticalGradientDetector::new().analyse(&img).is_err());
    }

    #[test]
    fn test_detector_name() {
        assert_eq!(VerticalGradientDetector.name(), "vertical-gradient");
    }
}
