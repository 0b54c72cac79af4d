//! Bilinear subpixel sampling of intensity and gradient grids.
//!
//! Coordinates are level pixels, `u` along columns and `v` along rows. A sample
//! needs the four cells around `(floor(u), floor(v))`; when any of them lies
//! outside the grid, intensity sampling reports `None` and gradient sampling
//! degrades to the zero vector.

use super::PyramidLevel;
use nalgebra::{DMatrix, Vector2};

/// Integer cell and fractional offsets of an in-range sample.
#[derive(Debug, Clone, Copy)]
struct Cell {
    col: usize,
    row: usize,
    tx: f64,
    ty: f64,
}

fn locate(width: usize, height: usize, u: f64, v: f64) -> Option<Cell> {
    if !u.is_finite() || !v.is_finite() {
        return None;
    }
    let uf = u.floor();
    let vf = v.floor();
    if uf < 0.0 || vf < 0.0 || uf + 1.0 >= width as f64 || vf + 1.0 >= height as f64 {
        return None;
    }
    Some(Cell {
        col: uf as usize,
        row: vf as usize,
        tx: u - uf,
        ty: v - vf,
    })
}

fn blend(grid: &DMatrix<f32>, cell: Cell) -> f64 {
    let p00 = f64::from(grid[(cell.row, cell.col)]);
    let p10 = f64::from(grid[(cell.row, cell.col + 1)]);
    let p01 = f64::from(grid[(cell.row + 1, cell.col)]);
    let p11 = f64::from(grid[(cell.row + 1, cell.col + 1)]);

    let top = p00 * (1.0 - cell.tx) + p10 * cell.tx;
    let bottom = p01 * (1.0 - cell.tx) + p11 * cell.tx;
    top * (1.0 - cell.ty) + bottom * cell.ty
}

/// Interpolated intensity at `(u, v)`, or `None` out of range.
pub fn sample_intensity(level: &PyramidLevel, u: f64, v: f64) -> Option<f64> {
    let cell = locate(level.width(), level.height(), u, v)?;
    Some(blend(level.intensity(), cell))
}

/// Interpolated `(∂I/∂u, ∂I/∂v)` at `(u, v)`, zero out of range.
pub fn sample_gradient(level: &PyramidLevel, u: f64, v: f64) -> Vector2<f64> {
    match locate(level.width(), level.height(), u, v) {
        Some(cell) => Vector2::new(
            blend(level.gradient_x(), cell),
            blend(level.gradient_y(), cell),
        ),
        None => Vector2::zeros(),
    }
}
