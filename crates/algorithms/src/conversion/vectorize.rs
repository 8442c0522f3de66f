//! Raster to point conversion

use silva_core::raster::Raster;

use super::ValuePoint;

/// One point at the centre of every valid cell, in row-major order
pub fn raster_to_points(raster: &Raster<f64>) -> Vec<ValuePoint> {
    raster
        .valid_cells()
        .map(|(row, col, value)| {
            let (x, y) = raster.cell_center(row, col);
            ValuePoint::new(x, y, value)
        })
        .collect()
}
