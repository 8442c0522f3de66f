//! Cell value types

use num_traits::Float;
use std::fmt::Debug;

/// Floating point cell value.
///
/// NaN always marks a cell without data. A raster may declare an extra
/// sentinel (for example `-9999` from a GeoTIFF `GDAL_NODATA` tag), which
/// is compared exactly.
pub trait RasterElement: Float + Debug + Send + Sync + 'static {
    fn default_nodata() -> Self {
        Self::nan()
    }

    fn is_nodata(&self, nodata: Option<Self>) -> bool {
        self.is_nan() || nodata.is_some_and(|nd| *self == nd)
    }
}

impl RasterElement for f32 {}
impl RasterElement for f64 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_is_always_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!(f32::NAN.is_nodata(Some(-9999.0)));
        assert!(!0.0_f64.is_nodata(None));
    }

    #[test]
    fn test_sentinel_nodata() {
        assert!((-9999.0_f64).is_nodata(Some(-9999.0)));
        assert!(!(-9998.5_f64).is_nodata(Some(-9999.0)));
        assert!(f64::default_nodata().is_nan());
    }
}
