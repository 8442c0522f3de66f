//! Main Raster type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::Array2;

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a row-major grid with associated
/// geographic metadata (transform and CRS). Canopy height models and the
/// generalized height rasters derived from them are `Raster<f64>` with NaN
/// as no-data.
///
/// # Example
///
/// ```ignore
/// use silva_core::Raster;
///
/// let mut chm: Raster<f64> = Raster::filled(20, 20, f64::NAN);
/// chm.set(10, 12, 18.5)?;
/// assert_eq!(chm.valid_cells().count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// Affine transformation
    transform: GeoTransform,
    /// Coordinate reference system
    crs: Option<CRS>,
    /// No-data value
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Raster of `rows` x `cols` cells, all set to `value`
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Raster from row-major cell values
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        let array = Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Builder-style transform setter
    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = transform;
        self
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            }),
        }
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Iterate over cells that hold data, as `(row, col, value)`
    pub fn valid_cells(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.data
            .indexed_iter()
            .filter(|(_, v)| !self.is_nodata(**v))
            .map(|((row, col), v)| (row, col, *v))
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the CRS
    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Set the CRS
    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    // Coordinate conversion

    /// Map coordinates of the center of cell (row, col)
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Cell containing the map coordinate, if it falls inside the grid
    pub fn cell_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (col, row) = self.transform.geo_to_pixel(x, y);
        if !(col.is_finite() && row.is_finite()) || col < 0.0 || row < 0.0 {
            return None;
        }
        let (row, col) = (row.floor() as usize, col.floor() as usize);
        (row < self.rows() && col < self.cols()).then_some((row, col))
    }

    // Value checks

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Min, max and mean over cells holding data
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut stats = RasterStatistics {
            min: None,
            max: None,
            mean: None,
            valid_count: 0,
        };
        let mut sum = 0.0;
        for (_, _, v) in self.valid_cells() {
            stats.min = Some(stats.min.map_or(v, |m: T| m.min(v)));
            stats.max = Some(stats.max.map_or(v, |m: T| m.max(v)));
            sum += v.to_f64().unwrap_or(0.0);
            stats.valid_count += 1;
        }
        stats.mean = (stats.valid_count > 0).then(|| sum / stats.valid_count as f64);
        stats
    }
}

/// Summary of the valid cells of a raster
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub valid_count: usize,
}
