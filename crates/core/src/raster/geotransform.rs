//! Affine geotransformation for north-up rasters

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and map coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// Only north-up grids are produced by the pipeline, so rotation terms are
/// not modelled; `pixel_height` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, negative for north-up)
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Create a new north-up GeoTransform
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Square-cell transform whose origin is snapped outward to a multiple
    /// of `cell_size`, so grids built from different layers line up.
    pub fn snapped(min_x: f64, max_y: f64, cell_size: f64) -> Self {
        let origin_x = (min_x / cell_size).floor() * cell_size;
        let origin_y = (max_y / cell_size).ceil() * cell_size;
        Self::new(origin_x, origin_y, cell_size, -cell_size)
    }

    /// Map coordinates of the pixel center
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        let x = self.origin_x + (col as f64 + 0.5) * self.pixel_width;
        let y = self.origin_y + (row as f64 + 0.5) * self.pixel_height;
        (x, y)
    }

    /// Map coordinates of the pixel's top-left corner
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        let x = self.origin_x + col as f64 * self.pixel_width;
        let y = self.origin_y + row as f64 * self.pixel_height;
        (x, y)
    }

    /// Convert map coordinates to fractional pixel coordinates (col, row).
    ///
    /// Use `.floor()` to get integer indices.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let col = (x - self.origin_x) / self.pixel_width;
        let row = (y - self.origin_y) / self.pixel_height;
        (col, row)
    }

    /// Cell size (square pixels)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Bounding box (min_x, min_y, max_x, max_y) for a grid of the given size
    pub fn bounds(&self, cols: usize, rows: usize) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.pixel_to_geo_corner(0, 0);
        let (x1, y1) = self.pixel_to_geo_corner(cols, rows);
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_to_geo_roundtrip() {
        let gt = GeoTransform::new(100.0, 200.0, 5.0, -5.0);

        let (x, y) = gt.pixel_to_geo(3, 7);
        assert_relative_eq!(x, 117.5, epsilon = 1e-10);
        assert_relative_eq!(y, 162.5, epsilon = 1e-10);

        let (col, row) = gt.geo_to_pixel(x, y);
        assert_relative_eq!(col, 3.5, epsilon = 1e-10);
        assert_relative_eq!(row, 7.5, epsilon = 1e-10);
    }

    #[test]
    fn test_snapped_origin() {
        let gt = GeoTransform::snapped(12.0, 48.0, 5.0);
        assert_relative_eq!(gt.origin_x, 10.0);
        assert_relative_eq!(gt.origin_y, 50.0);
        assert_relative_eq!(gt.pixel_height, -5.0);
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::new(0.0, 100.0, 1.0, -1.0);
        let (min_x, min_y, max_x, max_y) = gt.bounds(100, 100);

        assert_relative_eq!(min_x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(min_y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(max_x, 100.0, epsilon = 1e-10);
        assert_relative_eq!(max_y, 100.0, epsilon = 1e-10);
    }
}
