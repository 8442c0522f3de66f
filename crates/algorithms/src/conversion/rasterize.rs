//! Point to raster conversion

use silva_core::raster::{GeoTransform, Raster};
use silva_core::{Error, Result};

use super::ValuePoint;

/// Parameters for rasterizing points
#[derive(Debug, Clone)]
pub struct RasterizeParams {
    /// Output cell size in CRS units
    pub cell_size: f64,
}

impl Default for RasterizeParams {
    fn default() -> Self {
        Self { cell_size: 5.0 }
    }
}

/// Rasterize points onto a grid covering their extent.
///
/// The grid origin is snapped outward to a multiple of the cell size.
/// A cell hit by several points keeps the largest value; cells without
/// points are NaN. Points with non-finite values are skipped. With no
/// usable points the result is a single NaN cell.
pub fn rasterize_points(points: &[ValuePoint], params: &RasterizeParams) -> Result<Raster<f64>> {
    let cell = params.cell_size;
    if !(cell.is_finite() && cell > 0.0) {
        return Err(Error::InvalidParameter {
            name: "cell_size",
            value: cell.to_string(),
            reason: "must be a positive number".into(),
        });
    }

    let usable: Vec<&ValuePoint> = points
        .iter()
        .filter(|p| p.value.is_finite() && p.x.is_finite() && p.y.is_finite())
        .collect();

    if usable.is_empty() {
        let mut empty = Raster::filled(1, 1, f64::NAN).with_transform(GeoTransform::new(0.0, cell, cell, -cell));
        empty.set_nodata(Some(f64::NAN));
        return Ok(empty);
    }

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in &usable {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }

    let transform = GeoTransform::snapped(min_x, max_y, cell);
    let cols = ((max_x - transform.origin_x) / cell).floor() as usize + 1;
    let rows = ((transform.origin_y - min_y) / cell).floor() as usize + 1;

    let mut grid = Raster::filled(rows, cols, f64::NAN).with_transform(transform);
    grid.set_nodata(Some(f64::NAN));

    let data = grid.data_mut();
    for p in usable {
        let (col, row) = transform.geo_to_pixel(p.x, p.y);
        let row = (row.floor().max(0.0) as usize).min(rows - 1);
        let col = (col.floor().max(0.0) as usize).min(cols - 1);
        let cell = &mut data[[row, col]];
        if cell.is_nan() || p.value > *cell {
            *cell = p.value;
        }
    }

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rasterize_snaps_grid() {
        let points = vec![ValuePoint::new(112.5, 52.5, 20.0), ValuePoint::new(121.0, 41.0, 15.0)];
        let grid = rasterize_points(&points, &RasterizeParams { cell_size: 5.0 }).unwrap();

        assert_eq!(grid.transform().origin_x, 110.0);
        assert_eq!(grid.transform().origin_y, 55.0);
        assert_eq!(grid.shape(), (3, 3));
        assert_eq!(grid.get(0, 0).unwrap(), 20.0);
        assert_eq!(grid.get(2, 2).unwrap(), 15.0);
        assert_eq!(grid.valid_cells().count(), 2);
    }

    #[test]
    fn test_rasterize_keeps_maximum() {
        let points = vec![
            ValuePoint::new(1.0, 1.0, 12.0),
            ValuePoint::new(2.0, 2.0, 30.0),
            ValuePoint::new(3.0, 3.0, -3.0),
        ];
        let grid = rasterize_points(&points, &RasterizeParams::default()).unwrap();
        assert_eq!(grid.shape(), (1, 1));
        assert_eq!(grid.get(0, 0).unwrap(), 30.0);
    }

    #[test]
    fn test_rasterize_without_points() {
        let grid = rasterize_points(&[ValuePoint::new(0.0, 0.0, f64::NAN)], &RasterizeParams::default()).unwrap();
        assert_eq!(grid.valid_cells().count(), 0);
    }

    #[test]
    fn test_rasterize_rejects_bad_cell_size() {
        let result = rasterize_points(&[], &RasterizeParams { cell_size: 0.0 });
        assert!(matches!(result, Err(Error::InvalidParameter { name: "cell_size", .. })));
    }
}
