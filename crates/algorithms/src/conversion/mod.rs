//! Raster/point conversion
//!
//! - Rasterize: points to a grid, keeping the largest value per cell
//! - Vectorize: one point per valid cell centre
//! - Resample: nearest or bilinear onto a new cell size
//! - Mask: clip or erase a raster by polygons

mod mask;
mod rasterize;
mod resample;
mod vectorize;

pub use mask::{mask_raster, MaskMode};
pub use rasterize::{rasterize_points, RasterizeParams};
pub use resample::{resample, ResampleParams};
pub use vectorize::raster_to_points;

/// A located value: a tree top, a cell centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuePoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl ValuePoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }
}
