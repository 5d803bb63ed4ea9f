//! Vertical Gradient Image
//!
//! One-directional edge map: each cell holds the luma difference between a
//! pixel and the pixel directly below it. Cheap, and enough to find local
//! contrast such as text baselines and widget borders near a fixation.
//!
//! The grid is square with side equal to the source height. Columns past the
//! height are ignored, so non-square captures lose information on the right;
//! callers capture square regions. The last row has no pixel below it and
//! stays zero.

use image::GrayImage;

/// Largest magnitude a cell can hold
pub const MAX_CONTRAST: i16 = 255;

/// Square grid of signed vertical luma differences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradientImage {
    side: u32,
    cells: Vec<i16>,
}

impl GradientImage {
    /// Derive the gradient of a luma image
    ///
    /// Fails when the image is narrower than it is tall, since the square
    /// grid would need columns that do not exist.
    pub fn derive(image: &GrayImage) -> crate::Result<Self> {
        let (width, height) = image.dimensions();
        if width < height {
            return Err(crate::Error::Saliency(format!(
                "capture is {}x{}; gradient needs width >= height",
                width, height
            )));
        }

        let side = height;
        let mut cells = vec![0i16; (side as usize) * (side as usize)];

        for y in 0..side.saturating_sub(1) {
            for x in 0..side {
                let here = i16::from(image.get_pixel(x, y)[0]);
                let below = i16::from(image.get_pixel(x, y + 1)[0]);
                cells[(y * side + x) as usize] =
                    (here - below).clamp(-MAX_CONTRAST, MAX_CONTRAST);
            }
        }

        Ok(Self { side, cells })
    }

    /// Build directly from cell values (row-major, `side * side` long)
    pub fn from_cells(side: u32, cells: Vec<i16>) -> crate::Result<Self> {
        let expected = (side as usize) * (side as usize);
        if cells.len() != expected {
            return Err(crate::Error::Saliency(format!(
                "expected {} cells for side {}, got {}",
                expected,
                side,
                cells.len()
            )));
        }
        Ok(Self { side, cells })
    }

    /// All-background grid
    pub fn zeroed(side: u32) -> Self {
        Self {
            side,
            cells: vec![0; (side as usize) * (side as usize)],
        }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    /// Cell value, or `None` outside the grid
    pub fn get(&self, x: i64, y: i64) -> Option<i16> {
        let side = i64::from(self.side);
        if x < 0 || y < 0 || x >= side || y >= side {
            return None;
        }
        Some(self.cells[(y * side + x) as usize])
    }

    /// Overwrite a cell (no-op outside the grid)
    pub fn set(&mut self, x: u32, y: u32, value: i16) {
        if x < self.side && y < self.side {
            self.cells[(y * self.side + x) as usize] = value;
        }
    }

    /// True if the cell carries any contrast
    pub fn is_salient(&self, x: i64, y: i64) -> bool {
        self.get(x, y).is_some_and(|v| v != 0)
    }

    /// Number of non-zero cells
    pub fn salient_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v != 0).count()
    }
}
