//! Read-only image pyramids consumed by the patch residuals.
//!
//! A [`PyramidLevel`] holds an intensity grid, its precomputed x/y gradient
//! grids (same extent, row = image y) and the level's scale relative to the
//! full-resolution image. Levels are validated once at construction and never
//! mutated afterwards, so pyramids are shared between edges behind an `Arc`.

pub mod sampler;

pub use sampler::{sample_gradient, sample_intensity};

use crate::error::{PhotobaError, PhotobaResult};
use nalgebra::DMatrix;

/// One resolution tier of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct PyramidLevel {
    intensity: DMatrix<f32>,
    gradient_x: DMatrix<f32>,
    gradient_y: DMatrix<f32>,
    scale: f64,
}

impl PyramidLevel {
    /// Builds a level from its intensity and gradient grids.
    ///
    /// The three grids must share their extent, hold at least 2×2 cells, and
    /// `scale` must be finite and positive.
    pub fn new(
        intensity: DMatrix<f32>,
        gradient_x: DMatrix<f32>,
        gradient_y: DMatrix<f32>,
        scale: f64,
    ) -> PhotobaResult<Self> {
        if intensity.nrows() < 2 || intensity.ncols() < 2 {
            return Err(PhotobaError::InvalidPyramid(format!(
                "intensity grid {}x{} is smaller than 2x2",
                intensity.nrows(),
                intensity.ncols()
            )));
        }
        if gradient_x.shape() != intensity.shape() || gradient_y.shape() != intensity.shape() {
            return Err(PhotobaError::InvalidPyramid(format!(
                "gradient grids {:?}/{:?} do not match intensity grid {:?}",
                gradient_x.shape(),
                gradient_y.shape(),
                intensity.shape()
            )));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(PhotobaError::InvalidPyramid(format!(
                "scale must be finite and positive, got {scale}"
            )));
        }
        Ok(Self {
            intensity,
            gradient_x,
            gradient_y,
            scale,
        })
    }

    /// Builds a level whose gradients are central differences of `intensity`.
    ///
    /// Border cells use one-sided differences. Gradients are expressed per
    /// level pixel.
    pub fn from_intensity(intensity: DMatrix<f32>, scale: f64) -> PhotobaResult<Self> {
        let (rows, cols) = intensity.shape();
        if rows < 2 || cols < 2 {
            return Err(PhotobaError::InvalidPyramid(format!(
                "intensity grid {rows}x{cols} is smaller than 2x2"
            )));
        }

        let gradient_x = DMatrix::from_fn(rows, cols, |r, c| {
            let (lo, hi) = (c.saturating_sub(1), (c + 1).min(cols - 1));
            (intensity[(r, hi)] - intensity[(r, lo)]) / (hi - lo) as f32
        });
        let gradient_y = DMatrix::from_fn(rows, cols, |r, c| {
            let (lo, hi) = (r.saturating_sub(1), (r + 1).min(rows - 1));
            (intensity[(hi, c)] - intensity[(lo, c)]) / (hi - lo) as f32
        });

        Self::new(intensity, gradient_x, gradient_y, scale)
    }

    pub fn width(&self) -> usize {
        self.intensity.ncols()
    }

    pub fn height(&self) -> usize {
        self.intensity.nrows()
    }

    /// Resolution factor relative to the full image (1, 2, 4, ...).
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn intensity(&self) -> &DMatrix<f32> {
        &self.intensity
    }

    pub fn gradient_x(&self) -> &DMatrix<f32> {
        &self.gradient_x
    }

    pub fn gradient_y(&self) -> &DMatrix<f32> {
        &self.gradient_y
    }
}

/// Multi-resolution image, finest level first.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePyramid {
    levels: Vec<PyramidLevel>,
}

impl ImagePyramid {
    pub fn new(levels: Vec<PyramidLevel>) -> PhotobaResult<Self> {
        if levels.is_empty() {
            return Err(PhotobaError::InvalidPyramid(
                "a pyramid needs at least one level".to_string(),
            ));
        }
        Ok(Self { levels })
    }

    pub fn level(&self, index: usize) -> Option<&PyramidLevel> {
        self.levels.get(index)
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }
}
