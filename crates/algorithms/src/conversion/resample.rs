//! Raster resampling

use crate::maybe_rayon::*;
use silva_core::raster::{GeoTransform, Raster};
use silva_core::{Error, ResampleMethod, Result};

/// Parameters for resampling
#[derive(Debug, Clone)]
pub struct ResampleParams {
    /// Output cell size in CRS units
    pub cell_size: f64,
    pub method: ResampleMethod,
}

impl Default for ResampleParams {
    fn default() -> Self {
        Self {
            cell_size: 5.0,
            method: ResampleMethod::Bilinear,
        }
    }
}

/// Resample onto a grid of `params.cell_size` anchored at the same
/// upper-left corner and covering the same extent.
///
/// Bilinear interpolation weighs the four source cells around each output
/// centre. Output cells whose centre falls on a NoData source cell stay
/// NoData; otherwise missing neighbours are dropped and the remaining
/// weights renormalized. On an identical grid every cell keeps its value.
pub fn resample(raster: &Raster<f64>, params: ResampleParams) -> Result<Raster<f64>> {
    let cell = params.cell_size;
    if !(cell.is_finite() && cell > 0.0) {
        return Err(Error::InvalidParameter {
            name: "cell_size",
            value: cell.to_string(),
            reason: "must be a positive number".into(),
        });
    }

    let (min_x, min_y, max_x, max_y) = raster.bounds();
    let cols = (((max_x - min_x) / cell) - 1e-9).ceil().max(1.0) as usize;
    let rows = (((max_y - min_y) / cell) - 1e-9).ceil().max(1.0) as usize;
    let transform = GeoTransform::new(min_x, max_y, cell, -cell);

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let (x, y) = transform.pixel_to_geo(col, row);
                    match params.method {
                        ResampleMethod::Nearest => nearest(raster, x, y),
                        ResampleMethod::Bilinear => bilinear(raster, x, y),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let mut output = Raster::from_vec(data, rows, cols)?;
    output.set_transform(transform);
    output.set_crs(raster.crs().cloned());
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}

fn value_at(raster: &Raster<f64>, row: i64, col: i64) -> Option<f64> {
    if row < 0 || col < 0 {
        return None;
    }
    let v = raster.get(row as usize, col as usize).ok()?;
    (!raster.is_nodata(v)).then_some(v)
}

fn nearest(raster: &Raster<f64>, x: f64, y: f64) -> f64 {
    raster
        .cell_at(x, y)
        .and_then(|(row, col)| value_at(raster, row as i64, col as i64))
        .unwrap_or(f64::NAN)
}

/// Treat coordinates within float noise of a cell centre as exact
fn snap(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < 1e-9 {
        r
    } else {
        v
    }
}

fn bilinear(raster: &Raster<f64>, x: f64, y: f64) -> f64 {
    if nearest(raster, x, y).is_nan() {
        return f64::NAN;
    }

    // Fractional position relative to source cell centres
    let (col_f, row_f) = raster.transform().geo_to_pixel(x, y);
    let (u, v) = (snap(col_f - 0.5), snap(row_f - 0.5));
    let (c0, r0) = (u.floor(), v.floor());
    let (tx, ty) = (u - c0, v - r0);

    let mut sum = 0.0;
    let mut weight = 0.0;
    for (dr, wy) in [(0, 1.0 - ty), (1, ty)] {
        for (dc, wx) in [(0, 1.0 - tx), (1, tx)] {
            let w = wx * wy;
            if w <= 0.0 {
                continue;
            }
            if let Some(val) = value_at(raster, r0 as i64 + dr, c0 as i64 + dc) {
                sum += w * val;
                weight += w;
            }
        }
    }

    if weight > 0.0 {
        sum / weight
    } else {
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn chm() -> Raster<f64> {
        let mut r: Raster<f64> = Raster::from_vec(
            vec![
                10.0, 20.0, f64::NAN, 5.0, //
                30.0, 40.0, 12.0, -3.0, //
            ],
            2,
            4,
        )
        .unwrap()
        .with_transform(GeoTransform::new(500.0, 1000.0, 5.0, -5.0));
        r.set_nodata(Some(f64::NAN));
        r
    }

    #[test]
    fn test_same_grid_is_identity() {
        let src = chm();
        for method in [ResampleMethod::Bilinear, ResampleMethod::Nearest] {
            let out = resample(&src, ResampleParams { cell_size: 5.0, method }).unwrap();
            assert_eq!(out.shape(), src.shape());
            assert_eq!(out.transform(), src.transform());
            for row in 0..2 {
                for col in 0..4 {
                    let (a, b) = (src.get(row, col).unwrap(), out.get(row, col).unwrap());
                    assert!(a == b || (a.is_nan() && b.is_nan()), "({row}, {col}): {a} vs {b}");
                }
            }
        }
    }

    #[test]
    fn test_coarser_nearest() {
        let out = resample(&chm(), ResampleParams { cell_size: 10.0, method: ResampleMethod::Nearest }).unwrap();
        assert_eq!(out.shape(), (1, 2));
        // centres at (505, 995) and (515, 995) sit on cell corners; floor picks row 1
        assert_eq!(out.get(0, 0).unwrap(), 40.0);
        assert_eq!(out.get(0, 1).unwrap(), -3.0);
    }

    #[test]
    fn test_coarser_bilinear_averages() {
        let out = resample(&chm(), ResampleParams { cell_size: 10.0, method: ResampleMethod::Bilinear }).unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap(), 25.0);
        // NaN neighbour dropped, remaining three renormalized
        assert_relative_eq!(out.get(0, 1).unwrap(), (5.0 + 12.0 - 3.0) / 3.0);
    }

    #[test]
    fn test_finer_bilinear_interpolates() {
        let mut flat: Raster<f64> = Raster::from_vec(vec![0.0, 10.0], 1, 2)
            .unwrap()
            .with_transform(GeoTransform::new(0.0, 10.0, 10.0, -10.0));
        flat.set_nodata(Some(f64::NAN));
        let out = resample(&flat, ResampleParams { cell_size: 5.0, method: ResampleMethod::Bilinear }).unwrap();
        assert_eq!(out.shape(), (2, 4));
        // centre x = 7.5 lies a quarter of the way between source centres 5 and 15
        assert_relative_eq!(out.get(0, 1).unwrap(), 2.5);
        // centre x = 2.5 has only the edge cell to its right
        assert_relative_eq!(out.get(0, 0).unwrap(), 0.0);
    }
}
