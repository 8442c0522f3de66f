//! Masking rasters by polygons

use crate::maybe_rayon::*;
use crate::vector::{point_covered, BoundingBox};
use geo::{BoundingRect, MultiPolygon, Point};
use silva_core::raster::Raster;
use silva_core::Result;

/// Which cells survive the mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskMode {
    /// Keep cells whose centre is covered (clip)
    KeepInside,
    /// Keep cells whose centre is not covered (erase)
    KeepOutside,
}

/// Set cells to NaN by testing their centres against `polygons`.
///
/// The grid, transform and CRS are unchanged.
pub fn mask_raster(raster: &Raster<f64>, polygons: &MultiPolygon<f64>, mode: MaskMode) -> Result<Raster<f64>> {
    let envelope = polygons.bounding_rect().map(BoundingBox::from);
    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let v = raster.data()[[row, col]];
                    if raster.is_nodata(v) {
                        return f64::NAN;
                    }
                    let (x, y) = raster.cell_center(row, col);
                    let covered = envelope.is_some_and(|b| b.contains_point(x, y))
                        && point_covered(&Point::new(x, y), polygons);
                    let keep = match mode {
                        MaskMode::KeepInside => covered,
                        MaskMode::KeepOutside => !covered,
                    };
                    if keep {
                        v
                    } else {
                        f64::NAN
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let mut output = Raster::from_vec(data, rows, cols)?;
    output.set_transform(*raster.transform());
    output.set_crs(raster.crs().cloned());
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use silva_core::raster::GeoTransform;

    fn grid() -> Raster<f64> {
        Raster::filled(4, 4, 7.0).with_transform(GeoTransform::new(0.0, 20.0, 5.0, -5.0))
    }

    fn left_half() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 20.0),
            (x: 0.0, y: 20.0),
        ]])
    }

    #[test]
    fn test_keep_inside() {
        let clipped = mask_raster(&grid(), &left_half(), MaskMode::KeepInside).unwrap();
        assert_eq!(clipped.valid_cells().count(), 8);
        assert_eq!(clipped.get(0, 0).unwrap(), 7.0);
        assert!(clipped.get(0, 3).unwrap().is_nan());
        assert_eq!(clipped.transform(), grid().transform());
    }

    #[test]
    fn test_keep_outside() {
        let erased = mask_raster(&grid(), &left_half(), MaskMode::KeepOutside).unwrap();
        assert_eq!(erased.valid_cells().count(), 8);
        assert!(erased.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_empty_mask() {
        let none = MultiPolygon::new(vec![]);
        assert_eq!(mask_raster(&grid(), &none, MaskMode::KeepInside).unwrap().valid_cells().count(), 0);
        assert_eq!(mask_raster(&grid(), &none, MaskMode::KeepOutside).unwrap().valid_cells().count(), 16);
    }
}
